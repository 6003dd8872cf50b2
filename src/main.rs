use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use axum::Router;
use meridian::{
    application::{
        admin::{AdminAuditService, AdminDashboardService, AdminPostService},
        contact::{CaptchaVerifier, ContactService, Mailer},
        error::AppError,
        posts::{HybridPostService, PostsError},
        repos::{AuditRepo, ContactRepo, PostsRepo, PostsWriteRepo, StaticPostSource},
        site::SiteProfile,
        sitemap::SitemapService,
    },
    config,
    infra::{
        captcha::TurnstileVerifier,
        content::FsStaticPosts,
        db::PostgresRepositories,
        error::InfraError,
        http::{
            self, AdminCredentials, AdminState, ContactRateLimiter, HttpState, SecurityPolicy,
        },
        mail::HttpMailer,
        telemetry,
    },
};
use metrics::counter;
use time::OffsetDateTime;
use tokio::{sync::watch, task::JoinHandle, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SCHEDULED_METRIC: &str = "meridian_scheduled_posts_published_total";
const LIMITER_PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::CheckContent(_) => run_check_content(settings).await,
        config::Command::Sitemap(_) => run_sitemap(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = connect_optional(&settings).await?;
    let app = build_application_context(repositories, &settings)?;

    let scheduler = app
        .admin_posts
        .clone()
        .map(|posts| spawn_scheduler(posts, settings.scheduler.cadence));
    let purger = spawn_limiter_purge(app.http_state.limiter.clone());

    let result = serve_http(&settings, app.http_state, app.admin_state).await;

    for handle in scheduler.into_iter().chain(Some(purger)) {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_check_content(settings: config::Settings) -> Result<(), AppError> {
    let source = FsStaticPosts::new(settings.content.posts_dir.clone());
    let results = source.load_all().await.map_err(PostsError::from)?;

    let mut failures = 0usize;
    for result in &results {
        match result {
            Ok(post) => info!(
                target = "meridian::check_content",
                slug = %post.slug,
                locale = post.locale.code(),
                "ok"
            ),
            Err(err) => {
                failures += 1;
                error!(target = "meridian::check_content", error = %err, "invalid post");
            }
        }
    }

    info!(
        target = "meridian::check_content",
        path = %source.root().display(),
        posts = results.len(),
        failures,
        "Content check finished"
    );

    if failures > 0 {
        return Err(AppError::validation(format!(
            "{failures} static post(s) failed to parse"
        )));
    }
    Ok(())
}

async fn run_sitemap(settings: config::Settings) -> Result<(), AppError> {
    let repositories = connect_optional(&settings).await?;
    let site = SiteProfile::from_settings(&settings);
    let posts = Arc::new(build_post_service(repositories, &settings));
    let xml = SitemapService::new(posts, site).sitemap_xml().await?;
    print!("{xml}");
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    info!(target = "meridian::migrate", "Migrations applied");
    Ok(())
}

/// Connect and migrate when a database is configured. The site runs on static posts alone otherwise.
async fn connect_optional(
    settings: &config::Settings,
) -> Result<Option<Arc<PostgresRepositories>>, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "meridian::bootstrap",
            "No database configured; serving static posts only"
        );
        return Ok(None);
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    Ok(Some(Arc::new(PostgresRepositories::new(pool))))
}

struct ApplicationContext {
    http_state: HttpState,
    admin_state: Option<AdminState>,
    admin_posts: Option<Arc<AdminPostService>>,
}

fn build_post_service(
    repositories: Option<Arc<PostgresRepositories>>,
    settings: &config::Settings,
) -> HybridPostService {
    let dynamic = repositories.map(|repos| repos as Arc<dyn PostsRepo>);
    let statics: Arc<dyn StaticPostSource> =
        Arc::new(FsStaticPosts::new(settings.content.posts_dir.clone()));
    HybridPostService::new(
        dynamic,
        statics,
        settings.site.default_locale,
        settings.site.posts_per_page.get() as usize,
    )
}

fn build_contact_service(
    repositories: Option<&Arc<PostgresRepositories>>,
    settings: &config::Settings,
) -> Result<ContactService, AppError> {
    let repo = repositories.map(|repos| repos.clone() as Arc<dyn ContactRepo>);

    let captcha: Option<Arc<dyn CaptchaVerifier>> = match (
        settings.captcha.site_key.as_ref(),
        settings.captcha.secret_key.as_ref(),
    ) {
        (Some(_), Some(secret)) => Some(Arc::new(TurnstileVerifier::new(
            settings.captcha.verify_url.clone(),
            secret.clone(),
        )?)),
        _ => None,
    };

    let mailer: Option<Arc<dyn Mailer>> = match (
        settings.contact.recipient.as_ref(),
        settings.contact.mail_api_key.as_ref(),
    ) {
        (Some(recipient), Some(api_key)) => Some(Arc::new(HttpMailer::new(
            settings.contact.mail_api_url.clone(),
            api_key.clone(),
            settings.contact.sender.clone(),
            recipient.clone(),
        )?)),
        _ => None,
    };

    if repo.is_none() && mailer.is_none() {
        warn!(
            target = "meridian::bootstrap",
            "Contact form has neither a database nor a mail provider; submissions are disabled"
        );
    }

    Ok(ContactService::new(repo, captcha, mailer))
}

fn build_application_context(
    repositories: Option<Arc<PostgresRepositories>>,
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let mut site = SiteProfile::from_settings(settings);
    if settings.captcha.secret_key.is_none() {
        site.captcha_site_key = None;
    }

    let posts = Arc::new(build_post_service(repositories.clone(), settings));
    let sitemap = Arc::new(SitemapService::new(posts.clone(), site.clone()));
    let contact = Arc::new(build_contact_service(repositories.as_ref(), settings)?);
    let limiter = ContactRateLimiter::new(
        settings.contact.rate_limit_window,
        settings.contact.rate_limit_max_requests.get(),
    );

    let http_state = HttpState {
        posts,
        sitemap,
        contact,
        limiter,
        site: Arc::new(site.clone()),
        security: Arc::new(SecurityPolicy::public(&site, settings.site.hsts)),
        db: repositories.clone(),
    };

    let Some(repos) = repositories else {
        return Ok(ApplicationContext {
            http_state,
            admin_state: None,
            admin_posts: None,
        });
    };

    let posts_repo: Arc<dyn PostsRepo> = repos.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repos.clone();
    let contact_repo: Arc<dyn ContactRepo> = repos.clone();
    let audit_repo: Arc<dyn AuditRepo> = repos.clone();

    let audit_service = AdminAuditService::new(audit_repo);
    let admin_post_service = AdminPostService::new(posts_repo, posts_write_repo, audit_service.clone());
    let dashboard = Arc::new(AdminDashboardService::new(
        admin_post_service.clone(),
        contact_repo,
        audit_service,
    ));
    let admin_posts = Arc::new(admin_post_service);

    let admin_state = match settings.admin.token.as_deref() {
        Some(token) => Some(AdminState {
            db: Some(repos),
            dashboard,
            posts: admin_posts.clone(),
            credentials: Arc::new(AdminCredentials::new(token)),
            security: Arc::new(SecurityPolicy::admin(settings.site.hsts)),
            brand: settings.site.brand.clone(),
            default_locale: settings.site.default_locale,
        }),
        None => {
            warn!(
                target = "meridian::bootstrap",
                "No admin token configured; the admin listener is disabled"
            );
            None
        }
    };

    Ok(ApplicationContext {
        http_state,
        admin_state,
        admin_posts: Some(admin_posts),
    })
}

fn spawn_scheduler(posts: Arc<AdminPostService>, cadence: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        loop {
            interval.tick().await;
            match posts.publish_due(OffsetDateTime::now_utc()).await {
                Ok(published) if !published.is_empty() => {
                    counter!(SCHEDULED_METRIC).increment(published.len() as u64);
                    info!(
                        target = "meridian::scheduler",
                        count = published.len(),
                        "Published scheduled posts"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        target = "meridian::scheduler",
                        error = %err,
                        "Scheduled post promotion failed"
                    );
                }
            }
        }
    })
}

fn spawn_limiter_purge(limiter: ContactRateLimiter) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.purge_idle();
        }
    })
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: Option<AdminState>,
) -> Result<(), AppError> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let public_router = http::build_router(http_state);
    let public_server = serve_listener(
        "public",
        settings.server.public_addr,
        public_router,
        shutdown_rx.clone(),
    );

    let admin_server = async move {
        match admin_state {
            Some(state) => {
                let router = http::build_admin_router(state);
                serve_listener("admin", settings.server.admin_addr, router, shutdown_rx).await
            }
            None => Ok(()),
        }
    };

    let servers = async { try_join!(public_server, admin_server).map(|_| ()) };
    tokio::pin!(servers);

    tokio::select! {
        result = &mut servers => result,
        () = shutdown_signal() => {
            info!(target = "meridian::bootstrap", "Shutdown requested; draining connections");
            let _ = shutdown_tx.send(true);
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut servers).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target = "meridian::bootstrap",
                        "Graceful shutdown timed out; closing remaining connections"
                    );
                    Ok(())
                }
            }
        }
    }
}

async fn serve_listener(
    name: &'static str,
    addr: SocketAddr,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "meridian::bootstrap", listener = name, addr = %addr, "Listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown.wait_for(|stop| *stop).await;
    })
    .await
    .map_err(|err| AppError::unexpected(format!("{name} server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "meridian::bootstrap", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "meridian::bootstrap", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
