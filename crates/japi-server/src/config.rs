use japi_openapi::OpenApiConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// OpenAPI document generation
    #[serde(default)]
    pub openapi: OpenApiConfig,
    /// Resource model the documents describe
    #[serde(default)]
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let base_path = &self.server.base_path;
        if !base_path.is_empty() && (!base_path.starts_with('/') || base_path.ends_with('/')) {
            return Err("server.base_path must be empty or start with '/' and not end with '/'".into());
        }
        if !["http", "https"].contains(&self.server.public_scheme.as_str()) {
            return Err("server.public_scheme must be 'http' or 'https'".into());
        }
        if self.server.allowed_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err("server.allowed_hosts must not contain empty entries".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // OpenAPI validation
        self.openapi
            .validate()
            .map_err(|e| format!("openapi config error: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Host used in generated server URLs when a request carries no usable `Host` header.
    pub fn fallback_host(&self) -> String {
        match self.server.allowed_hosts.first() {
            Some(host) => normalize_host(host, &self.server.public_scheme),
            None => format!("{}:{}", self.server.host, self.server.port),
        }
    }
}

/// Lowercases `host` and drops the port implied by `scheme`.
pub fn normalize_host(host: &str, scheme: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let default_port = if scheme == "https" { ":443" } else { ":80" };
    match host.strip_suffix(default_port) {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix every route is mounted under, e.g. "/api".
    #[serde(default)]
    pub base_path: String,
    /// Scheme of the generated `servers` URL.
    #[serde(default = "default_public_scheme")]
    pub public_scheme: String,
    /// Hosts accepted from the `Host` header, e.g. "api.example.com".
    /// Other hosts are served the first entry. Empty accepts any host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_public_scheme() -> String {
    "http".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: String::new(),
            public_scheme: default_public_scheme(),
            allowed_hosts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    /// Model file (`.toml` or `.json`). Without one the graph is empty.
    #[serde(default)]
    pub path: Option<String>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("japi.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., JAPI__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("JAPI")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
