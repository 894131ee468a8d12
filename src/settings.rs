use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Path of the provider callback, relative to `application.root_url`
pub const CALLBACK_PATH: &str = "/auth/github/callback";

/// Scope requested from GitHub on every login attempt
pub const DEFAULT_SCOPE: &str = "user,public_repo,repo,repo:status,write:repo_hook";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: basic_toml::Error,
    },
    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IdlinkSettings {
    pub application: ApplicationSettings,
    pub github: GitHubSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL; the provider redirects back below it
    pub root_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// Whether "Login with GitHub" is switched on at all
    pub enabled: bool,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_endpoint: String,
    pub scope: String,
    /// Upper bound for each outbound provider call
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_secure: bool,
    /// Discard the stored state token after the first completion attempt
    pub single_use_state: bool,
    /// Lifetime of a browser session, both cookie and server side
    pub session_duration_hours: u32,
    /// Upper bound on sessions held in memory
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            root_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            client_id: None,
            client_secret: None,
            client_id_env: None,
            client_secret_env: None,
            authorization_endpoint: "https://github.com/login/oauth/authorize".to_string(),
            token_endpoint: "https://github.com/login/oauth/access_token".to_string(),
            user_endpoint: "https://api.github.com/user".to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_secure: true, // Default to secure cookies
            single_use_state: true,
            session_duration_hours: crate::session::DEFAULT_SESSION_TTL_HOURS,
            max_sessions: crate::session::DEFAULT_MAX_SESSIONS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl IdlinkSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Settings.toml in `IDLINK_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::load_from_path(default_config_path)?;
            log::info!("Loaded base settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var("IDLINK_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::load_from_path(&secrets_path)?;
                log::info!("Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "IDLINK_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Self::apply_env_overrides(&mut settings);
        Ok(settings)
    }

    /// Parse a single TOML settings file, without environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Install `env_logger` as the global logger using the configured level
    ///
    /// # Errors
    ///
    /// Returns an error if a global logger is already installed
    pub fn initialize_logging(&self) -> Result<(), SettingsError> {
        env_logger::Builder::new()
            .parse_filters(&self.logging.level)
            .try_init()?;
        Ok(())
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_github_env_overrides(&mut settings.github);
        Self::apply_session_env_overrides(&mut settings.session);
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            settings.logging.level = log_level;
        }
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(root_url) = std::env::var("ROOT_URL") {
            app_settings.root_url = root_url;
        }
    }

    /// Apply environment overrides for the GitHub connection
    pub fn apply_github_env_overrides(github: &mut GitHubSettings) {
        if let Ok(client_id) = std::env::var("GITHUB_CLIENT_ID") {
            github.client_id = Some(client_id);
        }
        if let Ok(client_secret) = std::env::var("GITHUB_CLIENT_SECRET") {
            github.client_secret = Some(client_secret);
        }
        if let Ok(enabled) = std::env::var("GITHUB_AUTH_ENABLED") {
            if let Ok(enabled) = enabled.parse::<bool>() {
                github.enabled = enabled;
            }
        }
        if let Ok(timeout) = std::env::var("PROVIDER_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                github.timeout_seconds = timeout;
            }
        }
    }

    fn apply_session_env_overrides(session: &mut SessionSettings) {
        if let Ok(secure) = std::env::var("COOKIE_SECURE") {
            if let Ok(secure) = secure.parse::<bool>() {
                session.cookie_secure = secure;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if line.trim_start().starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Report configuration problems that leave GitHub login inactive or broken
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.github.enabled && self.github.connection_credentials().is_none() {
            problems.push(
                "GitHub authentication is inactive: no GitHub connection (client id and secret) is configured"
                    .to_string(),
            );
        }
        if url::Url::parse(&self.application.root_url).is_err() {
            problems.push(format!(
                "application.root_url is not a valid URL: {}",
                self.application.root_url
            ));
        }
        if self.github.timeout_seconds == 0 {
            problems.push("github.timeout_seconds must be greater than zero".to_string());
        }
        if self.session.session_duration_hours == 0 {
            problems.push("session.session_duration_hours must be greater than zero".to_string());
        }
        problems
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Absolute URL the provider redirects back to
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!(
            "{}{CALLBACK_PATH}",
            self.application.root_url.trim_end_matches('/')
        )
    }
}

impl GitHubSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        Self::env_or_value(self.client_id_env.as_deref(), self.client_id.as_ref())
    }

    /// Get the client secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        Self::env_or_value(self.client_secret_env.as_deref(), self.client_secret.as_ref())
    }

    /// Client id and secret, when both are present and non-empty
    #[must_use]
    pub fn connection_credentials(&self) -> Option<(String, String)> {
        match (self.get_client_id(), self.get_client_secret()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }

    fn env_or_value(env_var: Option<&str>, value: Option<&String>) -> Option<String> {
        if let Some(env_var) = env_var {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        value.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clean_env_vars() {
        for var in [
            "GITHUB_CLIENT_ID",
            "GITHUB_CLIENT_SECRET",
            "GITHUB_AUTH_ENABLED",
            "PROVIDER_TIMEOUT_SECONDS",
            "COOKIE_SECURE",
            "HOST",
            "PORT",
            "ROOT_URL",
            "IDLINK_TEST_CLIENT_ID",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = IdlinkSettings::default();
        assert!(settings.github.enabled);
        assert_eq!(settings.github.scope, DEFAULT_SCOPE);
        assert_eq!(settings.github.timeout_seconds, 10);
        assert!(settings.session.single_use_state);
        assert_eq!(settings.get_bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_callback_url_trims_trailing_slash() {
        let mut settings = IdlinkSettings::default();
        settings.application.root_url = "https://ci.example.com/".to_string();
        assert_eq!(
            settings.callback_url(),
            "https://ci.example.com/auth/github/callback"
        );
    }

    #[test]
    #[serial]
    fn test_github_env_overrides() {
        clean_env_vars();
        std::env::set_var("GITHUB_CLIENT_ID", "env-client");
        std::env::set_var("GITHUB_CLIENT_SECRET", "env-secret");
        std::env::set_var("GITHUB_AUTH_ENABLED", "false");
        std::env::set_var("PROVIDER_TIMEOUT_SECONDS", "3");

        let mut github = GitHubSettings::default();
        IdlinkSettings::apply_github_env_overrides(&mut github);

        assert_eq!(github.client_id.as_deref(), Some("env-client"));
        assert_eq!(github.client_secret.as_deref(), Some("env-secret"));
        assert!(!github.enabled);
        assert_eq!(github.timeout_seconds, 3);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_client_id_env_indirection_takes_precedence() {
        clean_env_vars();
        std::env::set_var("IDLINK_TEST_CLIENT_ID", "from-env");
        let github = GitHubSettings {
            client_id: Some("from-file".to_string()),
            client_id_env: Some("IDLINK_TEST_CLIENT_ID".to_string()),
            ..Default::default()
        };
        assert_eq!(github.get_client_id().as_deref(), Some("from-env"));
        clean_env_vars();
    }

    #[test]
    fn test_validate_reports_missing_connection() {
        let settings = IdlinkSettings::default();
        let problems = settings.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("GitHub authentication is inactive"));
    }

    #[test]
    fn test_validate_ignores_missing_connection_when_disabled() {
        let mut settings = IdlinkSettings::default();
        settings.github.enabled = false;
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let mut settings = IdlinkSettings::default();
        settings.github.client_id = Some(String::new());
        settings.github.client_secret = Some("secret".to_string());
        assert!(settings.github.connection_credentials().is_none());
        assert!(!settings.validate().is_empty());
    }

    #[test]
    fn test_load_from_path_with_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[application]
root_url = "https://ci.example.com"

[github]
client_id = "Iv1.file"
client_secret = "file-secret"
timeout_seconds = 5
"#
        )
        .unwrap();

        let settings = IdlinkSettings::load_from_path(file.path()).unwrap();
        assert_eq!(settings.application.root_url, "https://ci.example.com");
        assert_eq!(settings.application.port, 8080);
        assert_eq!(settings.github.timeout_seconds, 5);
        assert_eq!(settings.github.scope, DEFAULT_SCOPE);
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_load_from_path_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[github\nclient_id = 1").unwrap();
        let err = IdlinkSettings::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
