//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use yatube_core::pagination::DEFAULT_PER_PAGE;
use yatube_infra::database::DatabaseConfig;

/// Stylesheets shipped with the crate.
const DEFAULT_STATIC_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Settings the handlers consult on every request.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub posts_per_page: u64,
    pub login_url: String,
    /// URL prefix uploaded images are served under.
    pub media_url: String,
    pub secure_cookies: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_PER_PAGE,
            login_url: "/auth/login/".to_string(),
            media_url: "/media/".to_string(),
            secure_cookies: false,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub run_migrations: bool,
    pub templates_dir: String,
    pub static_root: PathBuf,
    pub media_root: PathBuf,
    pub seed_groups_file: Option<PathBuf>,
    pub site: SiteSettings,
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parsed("DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parsed("DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        let defaults = SiteSettings::default();
        let site = SiteSettings {
            posts_per_page: parsed("POSTS_PER_PAGE").unwrap_or(defaults.posts_per_page),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),
            media_url: defaults.media_url,
            secure_cookies: flag("SESSION_COOKIE_SECURE", false),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT").unwrap_or(8080),
            database,
            run_migrations: flag("RUN_MIGRATIONS", true),
            templates_dir: env::var("TEMPLATES_DIR")
                .unwrap_or_else(|_| crate::templates::DEFAULT_DIR.to_string()),
            static_root: env::var("STATIC_ROOT")
                .unwrap_or_else(|_| DEFAULT_STATIC_ROOT.to_string())
                .into(),
            media_root: env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| "media".to_string())
                .into(),
            seed_groups_file: env::var("SEED_GROUPS_FILE").ok().map(PathBuf::from),
            site,
        }
    }
}
