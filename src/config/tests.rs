use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.public_port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        public_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.public_addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_describe_a_static_only_site() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.database.url.is_none());
    assert!(settings.admin.token.is_none());
    assert_eq!(settings.site.public_url, "http://localhost:3000");
    assert_eq!(settings.site.default_locale, Locale::En);
    assert_eq!(settings.site.posts_per_page.get(), 9);
    assert_eq!(settings.content.posts_dir, PathBuf::from("content/posts"));
    assert_eq!(settings.contact.rate_limit_max_requests.get(), 5);
}

#[test]
fn blank_database_url_is_treated_as_absent() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn public_url_loses_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.site.public_url = Some("https://example.com/".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.public_url, "https://example.com");
}

#[test]
fn public_url_must_be_http() {
    let mut raw = RawSettings::default();
    raw.site.public_url = Some("ftp://example.com".to_string());

    let err = Settings::from_raw(raw).expect_err("ftp is rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.public_url",
            ..
        }
    ));
}

#[test]
fn default_locale_accepts_region_codes() {
    let mut raw = RawSettings::default();
    raw.site.default_locale = Some("ja-JP".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.default_locale, Locale::Ja);
}

#[test]
fn unknown_default_locale_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.default_locale = Some("fr".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn measurement_id_rejects_script_characters() {
    let mut raw = RawSettings::default();
    raw.analytics.measurement_id = Some("G-1');alert(1".to_string());

    let err = Settings::from_raw(raw).expect_err("unsafe id");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "analytics.measurement_id",
            ..
        }
    ));
}

#[test]
fn zero_posts_per_page_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.posts_per_page = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["meridian"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "meridian",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--content-posts-dir",
        "/srv/posts",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(
                serve.overrides.content.posts_dir.as_deref(),
                Some(std::path::Path::new("/srv/posts"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_sitemap_arguments() {
    let args = CliArgs::parse_from([
        "meridian",
        "sitemap",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("sitemap command") {
        Command::Sitemap(sitemap) => {
            assert_eq!(
                sitemap.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert!(sitemap.content.posts_dir.is_none());
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_check_content_arguments() {
    let args = CliArgs::parse_from([
        "meridian",
        "check-content",
        "--content-posts-dir",
        "fixtures/posts",
    ]);

    match args.command.expect("check-content command") {
        Command::CheckContent(check) => {
            assert_eq!(
                check.content.posts_dir.as_deref(),
                Some(std::path::Path::new("fixtures/posts"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn sitemap_overrides_apply_to_raw_settings() {
    let mut raw = RawSettings::default();
    raw.apply_database_override(&DatabaseOverride {
        database_url: Some("postgres://sitemap".to_string()),
    });
    raw.apply_content_override(&ContentOverride {
        posts_dir: Some(PathBuf::from("other/posts")),
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.database.url.as_deref(), Some("postgres://sitemap"));
    assert_eq!(settings.content.posts_dir, PathBuf::from("other/posts"));
}
