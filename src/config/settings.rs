use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Production mode: secure cookies, error details hidden from clients
    #[serde(default)]
    pub in_production: bool,
}

/// What the renderer does when a handler asks for a page that was never compiled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTemplatePolicy {
    /// Log and terminate the process
    Abort,
    /// Answer the request with a 500 and keep serving
    #[default]
    Respond,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding page and layout sources
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_page_pattern")]
    pub page_pattern: String,
    #[serde(default = "default_layout_pattern")]
    pub layout_pattern: String,
    /// Compile once at startup and reuse; `false` recompiles on every request
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    #[serde(default)]
    pub missing_template: MissingTemplatePolicy,
    /// Values injected into every page's string map unless the handler set them
    #[serde(default)]
    pub globals: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in seconds
    #[serde(default = "default_session_lifetime")]
    pub lifetime_seconds: u64,
    /// Send Max-Age so the cookie survives browser restarts
    #[serde(default = "default_persist")]
    pub persist: bool,
    /// Expired-session sweep interval in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("./templates")
}

fn default_page_pattern() -> String {
    "*.page.tmpl".to_string()
}

fn default_layout_pattern() -> String {
    "*.layout.tmpl".to_string()
}

fn default_use_cache() -> bool {
    true
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_session_lifetime() -> u64 {
    24 * 60 * 60 // 24 hours
}

fn default_persist() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("app.in_production", false)?
            .set_default("templates.dir", "./templates")?
            .set_default("templates.use_cache", true)?
            .set_default("session.lifetime_seconds", 86400)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // BOOKINGS_SERVER__PORT, BOOKINGS_TEMPLATES__USE_CACHE, etc.
            // `__` separates sections so that snake_case keys survive.
            .add_source(
                Environment::with_prefix("BOOKINGS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            page_pattern: default_page_pattern(),
            layout_pattern: default_layout_pattern(),
            use_cache: default_use_cache(),
            missing_template: MissingTemplatePolicy::default(),
            globals: HashMap::new(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            lifetime_seconds: default_session_lifetime(),
            persist: default_persist(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}
