use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").unwrap());

/// Converter kinds understood by the service.
pub const CONVERTER_KINDS: &[&str] = &["pdf", "simulated"];

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub cors: Option<CorsSection>,
    #[serde(default)]
    pub storage: Option<StorageSection>,
    #[serde(default)]
    pub uploads: Option<UploadsSection>,
    #[serde(default)]
    pub backend: Option<BackendSection>,
    #[serde(default)]
    pub jobs: Option<JobsSection>,
    #[serde(default)]
    pub converter: Option<ConverterSection>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CorsSection {
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub allow_all_origins: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub input_dir: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadsSection {
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BackendSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct JobsSection {
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub conversion_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ConverterSection {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub simulated_delay_ms: Option<u64>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub uploads: UploadsConfig,
    pub backend: BackendConfig,
    pub jobs: JobsConfig,
    pub converter: ConverterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_all_origins: bool,
}

/// Locations of the input (uploaded PDFs) and output (Markdown artifacts) areas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageConfig {
    pub input_dir: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadsConfig {
    pub max_body_bytes: usize,
}

/// Where completion webhooks are delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobsConfig {
    pub concurrency: usize,
    pub queue_capacity: usize,
    pub conversion_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConverterConfig {
    pub kind: String,
    pub language: String,
    pub simulated_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            cors: CorsConfig {
                allowed_origins: Vec::new(),
                allow_all_origins: true,
            },
            storage: StorageConfig {
                input_dir: "/app/input".to_string(),
                output_dir: "/app/output".to_string(),
            },
            uploads: UploadsConfig {
                max_body_bytes: 50 * 1024 * 1024,
            },
            backend: BackendConfig {
                url: "http://backend:3001".to_string(),
                timeout_secs: 30,
            },
            jobs: JobsConfig {
                concurrency: 4,
                queue_capacity: 64,
                conversion_timeout_secs: 300,
            },
            converter: ConverterConfig {
                kind: "pdf".to_string(),
                language: "fr".to_string(),
                simulated_delay_ms: 5000,
            },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

#[inline]
fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .filter_map(|p| {
            let trimmed = p.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        apply_raw(&mut cfg, raw);
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw(cfg: &mut Config, raw: RawConfigFile) {
    if let Some(server) = raw.server {
        apply_opt!(cfg.server.host, server.host);
        apply_opt!(cfg.server.port, server.port);
    }
    if let Some(logging) = raw.logging {
        apply_opt!(cfg.logging.level, logging.level);
        apply_opt!(cfg.logging.json, logging.json);
    }
    if let Some(cors) = raw.cors {
        apply_opt!(cfg.cors.allowed_origins, cors.allowed_origins);
        apply_opt!(cfg.cors.allow_all_origins, cors.allow_all_origins);
    }
    if let Some(storage) = raw.storage {
        apply_opt!(cfg.storage.input_dir, storage.input_dir);
        apply_opt!(cfg.storage.output_dir, storage.output_dir);
    }
    if let Some(uploads) = raw.uploads {
        apply_opt!(cfg.uploads.max_body_bytes, uploads.max_body_bytes);
    }
    if let Some(backend) = raw.backend {
        apply_opt!(cfg.backend.url, backend.url);
        apply_opt!(cfg.backend.timeout_secs, backend.timeout_secs);
    }
    if let Some(jobs) = raw.jobs {
        apply_opt!(cfg.jobs.concurrency, jobs.concurrency);
        apply_opt!(cfg.jobs.queue_capacity, jobs.queue_capacity);
        apply_opt!(
            cfg.jobs.conversion_timeout_secs,
            jobs.conversion_timeout_secs
        );
    }
    if let Some(converter) = raw.converter {
        apply_opt!(cfg.converter.kind, converter.kind);
        apply_opt!(cfg.converter.language, converter.language);
        apply_opt!(
            cfg.converter.simulated_delay_ms,
            converter.simulated_delay_ms
        );
    }
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Server
    if let Some(v) = env_str("DOCLING_SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16>("DOCLING_SERVER_PORT")? {
        cfg.server.port = v;
    }

    // Logging
    if let Some(v) = env_str("DOCLING_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("DOCLING_LOG_JSON")? {
        cfg.logging.json = v;
    }

    // CORS
    if let Some(v) = env_str("DOCLING_CORS_ALLOWED_ORIGINS") {
        cfg.cors.allowed_origins = split_csv(&v);
    }
    if let Some(v) = env_bool("DOCLING_CORS_ALLOW_ALL_ORIGINS")? {
        cfg.cors.allow_all_origins = v;
    }

    // Storage
    if let Some(v) = env_str("DOCLING_INPUT_DIR") {
        cfg.storage.input_dir = v;
    }
    if let Some(v) = env_str("DOCLING_OUTPUT_DIR") {
        cfg.storage.output_dir = v;
    }

    // Uploads
    if let Some(v) = env_parse::<usize>("DOCLING_MAX_BODY_BYTES")? {
        cfg.uploads.max_body_bytes = v;
    }

    // Backend webhook; the bare BACKEND_URL is what deployments set
    if let Some(v) = env_str("BACKEND_URL") {
        cfg.backend.url = v;
    }
    if let Some(v) = env_str("DOCLING_BACKEND_URL") {
        cfg.backend.url = v;
    }
    if let Some(v) = env_parse::<u64>("DOCLING_BACKEND_TIMEOUT_SECS")? {
        cfg.backend.timeout_secs = v;
    }

    // Jobs
    if let Some(v) = env_parse::<usize>("DOCLING_JOBS_CONCURRENCY")? {
        cfg.jobs.concurrency = v;
    }
    if let Some(v) = env_parse::<usize>("DOCLING_JOBS_QUEUE_CAPACITY")? {
        cfg.jobs.queue_capacity = v;
    }
    if let Some(v) = env_parse::<u64>("DOCLING_JOBS_CONVERSION_TIMEOUT_SECS")? {
        cfg.jobs.conversion_timeout_secs = v;
    }

    // Converter
    if let Some(v) = env_str("DOCLING_CONVERTER") {
        cfg.converter.kind = v;
    }
    if let Some(v) = env_str("DOCLING_CONVERTER_LANGUAGE") {
        cfg.converter.language = v;
    }
    if let Some(v) = env_parse::<u64>("DOCLING_SIMULATED_DELAY_MS")? {
        cfg.converter.simulated_delay_ms = v;
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.port == 0 {
        return Err(ConfigError::Validation("server.port must be > 0".into()));
    }
    let host_ok = cfg.server.host.parse::<std::net::IpAddr>().is_ok()
        || HOSTNAME_REGEX.is_match(&cfg.server.host);
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid server.host: {}",
            cfg.server.host
        )));
    }

    match url::Url::parse(&cfg.backend.url) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        Ok(_) => {
            return Err(ConfigError::Validation(format!(
                "backend.url must be http or https: {}",
                cfg.backend.url
            )))
        }
        Err(_) => {
            return Err(ConfigError::Validation(format!(
                "invalid backend.url: {}",
                cfg.backend.url
            )))
        }
    }
    if cfg.backend.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "backend.timeout_secs must be > 0".into(),
        ));
    }

    if cfg.jobs.concurrency == 0 {
        return Err(ConfigError::Validation(
            "jobs.concurrency must be > 0".into(),
        ));
    }
    if cfg.jobs.queue_capacity == 0 {
        return Err(ConfigError::Validation(
            "jobs.queue_capacity must be > 0".into(),
        ));
    }

    if !CONVERTER_KINDS.contains(&cfg.converter.kind.as_str()) {
        return Err(ConfigError::Validation(format!(
            "unsupported converter kind: {} (expected one of {})",
            cfg.converter.kind,
            CONVERTER_KINDS.join(", ")
        )));
    }

    if cfg.storage.input_dir.trim().is_empty() || cfg.storage.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage.input_dir and storage.output_dir must be set".into(),
        ));
    }

    for origin in &cfg.cors.allowed_origins {
        if origin == "*" {
            continue;
        }
        match url::Url::parse(origin) {
            Ok(u) => {
                let scheme = u.scheme();
                if scheme != "http" && scheme != "https" {
                    return Err(ConfigError::Validation(format!(
                        "CORS origin must be http or https: {}",
                        origin
                    )));
                }
            }
            Err(_) => {
                return Err(ConfigError::Validation(format!(
                    "invalid CORS origin: {}",
                    origin
                )))
            }
        }
    }
    Ok(())
}
