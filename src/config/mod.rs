//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::locale::Locale;

mod cli;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "meridian";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_POSTS_DIR: &str = "content/posts";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_BRAND: &str = "Meridian Systems";
const DEFAULT_POSTS_PER_PAGE: u64 = 9;
const DEFAULT_MAIL_SENDER: &str = "Meridian <no-reply@localhost>";
const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_CONTACT_WINDOW_SECS: u64 = 600;
const DEFAULT_CONTACT_MAX_REQUESTS: u64 = 5;
const DEFAULT_CAPTCHA_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";
const DEFAULT_SCHEDULER_CADENCE_SECS: u64 = 60;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub content: ContentSettings,
    pub site: SiteSettings,
    pub admin: AdminSettings,
    pub contact: ContactSettings,
    pub captcha: CaptchaSettings,
    pub analytics: AnalyticsSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub posts_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Absolute origin without a trailing slash, e.g. `https://example.com`.
    pub public_url: String,
    pub brand: String,
    pub default_locale: Locale,
    pub posts_per_page: NonZeroU32,
    pub hsts: bool,
}

#[derive(Debug, Clone)]
pub struct AdminSettings {
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContactSettings {
    pub recipient: Option<String>,
    pub sender: String,
    pub mail_api_url: Url,
    pub mail_api_key: Option<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CaptchaSettings {
    pub site_key: Option<String>,
    pub secret_key: Option<String>,
    pub verify_url: Url,
}

#[derive(Debug, Clone)]
pub struct AnalyticsSettings {
    pub measurement_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub cadence: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("MERIDIAN").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckContent(args)) => raw.apply_content_override(&args.content),
        Some(Command::Sitemap(args)) => {
            raw.apply_database_override(&args.database);
            raw.apply_content_override(&args.content);
        }
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    content: RawContentSettings,
    site: RawSiteSettings,
    admin: RawAdminSettings,
    contact: RawContactSettings,
    captcha: RawCaptchaSettings,
    analytics: RawAnalyticsSettings,
    scheduler: RawSchedulerSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(url) = overrides.site_public_url.as_ref() {
            self.site.public_url = Some(url.clone());
        }
        if let Some(cadence) = overrides.scheduler_cadence_seconds {
            self.scheduler.cadence_seconds = Some(cadence);
        }

        self.apply_content_override(&overrides.content);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }

    fn apply_content_override(&mut self, overrides: &ContentOverride) {
        if let Some(dir) = overrides.posts_dir.as_ref() {
            self.content.posts_dir = Some(dir.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            content,
            site,
            admin,
            contact,
            captcha,
            analytics,
            scheduler,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            content: build_content_settings(content)?,
            site: build_site_settings(site)?,
            admin: build_admin_settings(admin),
            contact: build_contact_settings(contact)?,
            captcha: build_captcha_settings(captcha)?,
            analytics: build_analytics_settings(analytics)?,
            scheduler: build_scheduler_settings(scheduler)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        public_addr,
        admin_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = non_zero_u32(max_value.into(), "database.max_connections")?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let posts_dir = content
        .posts_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTS_DIR));
    if posts_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "content.posts_dir",
            "path must not be empty",
        ));
    }

    Ok(ContentSettings { posts_dir })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let raw_url = non_blank(site.public_url).unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string());
    let parsed = parse_http_url(&raw_url, "site.public_url")?;
    let public_url = parsed.as_str().trim_end_matches('/').to_string();

    let brand = non_blank(site.brand).unwrap_or_else(|| DEFAULT_BRAND.to_string());

    let default_locale = match non_blank(site.default_locale) {
        Some(code) => Locale::parse(&code).ok_or_else(|| {
            LoadError::invalid(
                "site.default_locale",
                format!("unsupported locale `{code}`"),
            )
        })?,
        None => Locale::En,
    };

    let posts_per_page = non_zero_u32(
        site.posts_per_page.unwrap_or(DEFAULT_POSTS_PER_PAGE),
        "site.posts_per_page",
    )?;

    Ok(SiteSettings {
        public_url,
        brand,
        default_locale,
        posts_per_page,
        hsts: site.hsts.unwrap_or(false),
    })
}

fn build_admin_settings(admin: RawAdminSettings) -> AdminSettings {
    AdminSettings {
        token: non_blank(admin.token),
    }
}

fn build_contact_settings(contact: RawContactSettings) -> Result<ContactSettings, LoadError> {
    let recipient = non_blank(contact.recipient);
    if let Some(address) = recipient.as_ref()
        && !address.contains('@')
    {
        return Err(LoadError::invalid(
            "contact.recipient",
            "must be an email address",
        ));
    }

    let sender = non_blank(contact.sender).unwrap_or_else(|| DEFAULT_MAIL_SENDER.to_string());
    let mail_api_url = parse_http_url(
        contact.mail_api_url.as_deref().unwrap_or(DEFAULT_MAIL_API_URL),
        "contact.mail_api_url",
    )?;

    let window_seconds = contact
        .rate_limit_window_seconds
        .unwrap_or(DEFAULT_CONTACT_WINDOW_SECS);
    if window_seconds == 0 {
        return Err(LoadError::invalid(
            "contact.rate_limit_window_seconds",
            "must be greater than zero",
        ));
    }
    let rate_limit_max_requests = non_zero_u32(
        contact
            .rate_limit_max_requests
            .unwrap_or(DEFAULT_CONTACT_MAX_REQUESTS),
        "contact.rate_limit_max_requests",
    )?;

    Ok(ContactSettings {
        recipient,
        sender,
        mail_api_url,
        mail_api_key: non_blank(contact.mail_api_key),
        rate_limit_window: Duration::from_secs(window_seconds),
        rate_limit_max_requests,
    })
}

fn build_captcha_settings(captcha: RawCaptchaSettings) -> Result<CaptchaSettings, LoadError> {
    let verify_url = parse_http_url(
        captcha
            .verify_url
            .as_deref()
            .unwrap_or(DEFAULT_CAPTCHA_VERIFY_URL),
        "captcha.verify_url",
    )?;

    Ok(CaptchaSettings {
        site_key: non_blank(captcha.site_key),
        secret_key: non_blank(captcha.secret_key),
        verify_url,
    })
}

fn build_analytics_settings(
    analytics: RawAnalyticsSettings,
) -> Result<AnalyticsSettings, LoadError> {
    let measurement_id = non_blank(analytics.measurement_id);
    if let Some(id) = measurement_id.as_ref()
        && !id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
    {
        return Err(LoadError::invalid(
            "analytics.measurement_id",
            "only ASCII letters, digits and `-` are allowed",
        ));
    }

    Ok(AnalyticsSettings { measurement_id })
}

fn build_scheduler_settings(
    scheduler: RawSchedulerSettings,
) -> Result<SchedulerSettings, LoadError> {
    let cadence_seconds = scheduler
        .cadence_seconds
        .unwrap_or(DEFAULT_SCHEDULER_CADENCE_SECS);
    if cadence_seconds == 0 {
        return Err(LoadError::invalid(
            "scheduler.cadence_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SchedulerSettings {
        cadence: Duration::from_secs(cadence_seconds),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    posts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    public_url: Option<String>,
    brand: Option<String>,
    default_locale: Option<String>,
    posts_per_page: Option<u64>,
    hsts: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdminSettings {
    token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContactSettings {
    recipient: Option<String>,
    sender: Option<String>,
    mail_api_url: Option<String>,
    mail_api_key: Option<String>,
    rate_limit_window_seconds: Option<u64>,
    rate_limit_max_requests: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCaptchaSettings {
    site_key: Option<String>,
    secret_key: Option<String>,
    verify_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAnalyticsSettings {
    measurement_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSchedulerSettings {
    cadence_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
