use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DEFAULT_JELLYSEERR_URL: &str = "http://jellyseerr:5055";
const DEFAULT_RADARR_URL: &str = "http://radarr:7878";
const DEFAULT_SONARR_URL: &str = "http://sonarr:8989";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub jellyfin: JellyfinConfig,

    pub jellyseerr: ServiceConfig,

    pub radarr: ServiceConfig,

    pub sonarr: ServiceConfig,

    pub qbittorrent: QBittorrentConfig,

    pub compose: ComposeConfig,

    pub observability: ObservabilityConfig,

    #[serde(skip)]
    pub origin: ConfigOrigin,
}

/// Files a loaded config was read from. Loading happens before tracing is
/// set up, so this is logged afterwards by [`Config::log_origin`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOrigin {
    pub file: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON when stdout is not a terminal, human-readable otherwise.
    #[default]
    Auto,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    pub log_format: LogFormat,

    /// Compute and report orphans without deleting anything (default: true)
    pub dry_run: bool,

    /// Per-request timeout applied to every HTTP call (default: 30)
    pub request_timeout_seconds: u64,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Auto,
            dry_run: true,
            request_timeout_seconds: 30,
            worker_threads: 2,
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// URL and API key of an *arr-style service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub url: String,

    pub api_key: String,
}

impl ServiceConfig {
    fn with_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JellyfinConfig {
    pub url: String,

    pub api_key: String,

    /// Host directories holding the media library.
    pub library_roots: Vec<String>,

    /// `(jellyfin_path_prefix, host_path_prefix)` pairs. Empty means Jellyfin
    /// sees the same paths as this host.
    pub path_mappings: Vec<(String, String)>,
}

impl Default for JellyfinConfig {
    fn default() -> Self {
        Self {
            url: "http://jellyfin:8096".to_string(),
            api_key: String::new(),
            library_roots: vec!["/data/media".to_string()],
            path_mappings: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QBittorrentConfig {
    pub url: String,

    /// Leave empty when the WebUI bypasses authentication for this host.
    pub username: String,

    pub password: String,

    /// Host directories completed torrents are saved to.
    pub download_roots: Vec<String>,

    /// `(qbittorrent_path_prefix, host_path_prefix)` pairs.
    pub path_mappings: Vec<(String, String)>,
}

impl Default for QBittorrentConfig {
    fn default() -> Self {
        Self {
            url: "http://qbittorrent:8080".to_string(),
            username: String::new(),
            password: String::new(),
            download_roots: vec!["/data/downloads".to_string()],
            path_mappings: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub directory: String,

    /// Images whose name contains any of these are not checked.
    pub skip_images: Vec<String>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            directory: "/opt/homeserver/compose".to_string(),
            skip_images: vec!["homeserver-portal".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = HashMap::new();
        labels.insert("app".to_string(), "reconcilarr".to_string());

        Self {
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            jellyfin: JellyfinConfig::default(),
            jellyseerr: ServiceConfig::with_url(DEFAULT_JELLYSEERR_URL),
            radarr: ServiceConfig::with_url(DEFAULT_RADARR_URL),
            sonarr: ServiceConfig::with_url(DEFAULT_SONARR_URL),
            qbittorrent: QBittorrentConfig::default(),
            compose: ComposeConfig::default(),
            observability: ObservabilityConfig::default(),
            origin: ConfigOrigin::default(),
        }
    }
}

/// Services a command may need credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Jellyfin,
    Jellyseerr,
    Radarr,
    Sonarr,
}

impl Service {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Jellyfin => "Jellyfin",
            Self::Jellyseerr => "Jellyseerr",
            Self::Radarr => "Radarr",
            Self::Sonarr => "Sonarr",
        }
    }

    const fn env_key(self) -> &'static str {
        match self {
            Self::Jellyfin => "JELLYFIN_API_KEY",
            Self::Jellyseerr => "JELLYSEERR_API_KEY",
            Self::Radarr => "RADARR_API_KEY",
            Self::Sonarr => "SONARR_API_KEY",
        }
    }
}

impl Config {
    /// Loads the config file, then applies `.env` and the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_from_search_paths()?,
        };

        config.origin.env_file = dotenvy::dotenv().ok();
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    fn load_from_search_paths() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.origin.file = Some(path.to_path_buf());
        Ok(config)
    }

    /// Reports where the config came from. Call once tracing is initialised.
    pub fn log_origin(&self) {
        match &self.origin.file {
            Some(path) => info!("Loaded config from: {}", path.display()),
            None => info!("No config file found, using defaults"),
        }
        if let Some(path) = &self.origin.env_file {
            info!("Loaded environment from: {}", path.display());
        }
    }

    /// Parses TOML. A service section that sets only `api_key` keeps the
    /// default endpoint.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        for (service, default_url) in [
            (&mut config.jellyseerr, DEFAULT_JELLYSEERR_URL),
            (&mut config.radarr, DEFAULT_RADARR_URL),
            (&mut config.sonarr, DEFAULT_SONARR_URL),
        ] {
            if service.url.is_empty() {
                service.url = default_url.to_string();
            }
        }
        Ok(config)
    }

    /// Overrides values from environment variables.
    ///
    /// Takes a lookup function so tests don't have to touch the real
    /// process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set(&mut self.jellyfin.url, "JELLYFIN_URL");
        set(&mut self.jellyfin.api_key, Service::Jellyfin.env_key());
        set(&mut self.jellyseerr.url, "JELLYSEERR_URL");
        set(&mut self.jellyseerr.api_key, Service::Jellyseerr.env_key());
        set(&mut self.radarr.url, "RADARR_URL");
        set(&mut self.radarr.api_key, Service::Radarr.env_key());
        set(&mut self.sonarr.url, "SONARR_URL");
        set(&mut self.sonarr.api_key, Service::Sonarr.env_key());
        set(&mut self.qbittorrent.url, "QBITTORRENT_URL");
        set(&mut self.qbittorrent.username, "QBITTORRENT_USERNAME");
        set(&mut self.qbittorrent.password, "QBITTORRENT_PASSWORD");
        set(&mut self.compose.directory, "COMPOSE_DIR");

        if let Some(value) = lookup("DRY_RUN") {
            self.general.dry_run = value.trim().eq_ignore_ascii_case("true");
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("reconcilarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".reconcilarr").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes a default config file. Returns `false` if one already exists.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(path)?;
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("jellyfin", &self.jellyfin.url),
            ("jellyseerr", &self.jellyseerr.url),
            ("radarr", &self.radarr.url),
            ("sonarr", &self.sonarr.url),
            ("qbittorrent", &self.qbittorrent.url),
        ];

        for (name, url) in urls {
            url::Url::parse(url).with_context(|| format!("Invalid {name} URL: '{url}'"))?;
        }

        if self.general.request_timeout_seconds == 0 {
            anyhow::bail!("request_timeout_seconds must be > 0");
        }

        if self.observability.loki_enabled {
            url::Url::parse(&self.observability.loki_url).context("Invalid Loki URL")?;
        }

        Ok(())
    }

    /// Returns the API key for `service`, failing when it is not configured.
    pub fn require_api_key(&self, service: Service) -> Result<&str> {
        let key = match service {
            Service::Jellyfin => &self.jellyfin.api_key,
            Service::Jellyseerr => &self.jellyseerr.api_key,
            Service::Radarr => &self.radarr.api_key,
            Service::Sonarr => &self.sonarr.api_key,
        };

        if key.is_empty() {
            anyhow::bail!(
                "{} API key not set (config [{}] api_key or {})",
                service.label(),
                service.label().to_lowercase(),
                service.env_key()
            );
        }

        Ok(key)
    }
}
