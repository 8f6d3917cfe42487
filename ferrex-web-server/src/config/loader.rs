use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use ferrex_web::Theme;
use once_cell::sync::Lazy;
use thiserror::Error;
use url::Url;

use super::{
    models::{ApiConfig, ConfigMetadata, CookieConfig, ServerConfig, ThemeConfig, WebConfig},
    sources::{EnvConfig, FileConfig},
    validation::ConfigWarnings,
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("ferrex-web.toml"),
        PathBuf::from("config/ferrex-web.toml"),
    ]
});

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_API_URL: &str = "http://localhost:3000/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ACCOUNT_COOKIE: &str = "ferrex_account";
pub const DEFAULT_THEME_COOKIE: &str = "ferrex_theme";
/// Only suitable for local development; startup warns when it is in use.
pub const DEV_COOKIE_SECRET: &str = "ferrex-web-development-cookie-secret";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub env: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Use these values instead of the process environment. No `.env` file
    /// is read.
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env_config, env_file_loaded) = match &self.options.env {
            Some(env) => (env.clone(), false),
            None => {
                let env_file_loaded = self.load_env_file()?;
                (EnvConfig::gather(), env_file_loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env_config)?;
        let (config, warnings) =
            compose_config(file_config, env_config, config_path, env_file_loaded)?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        match &self.options.env_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingEnvFile { path: path.clone() });
                }
                dotenvy::from_path(path)?;
                Ok(true)
            }
            None => match dotenvy::dotenv() {
                Ok(_) => Ok(true),
                Err(dotenvy::Error::Io(_)) => Ok(false),
                Err(err) => Err(err.into()),
            },
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env_config.config_path) {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS.iter().find(|p| p.exists()) {
                Some(path) => (path.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge sources: environment over file over defaults.
fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<(WebConfig, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No ferrex-web.toml detected; using environment variables and defaults",
            "Create ferrex-web.toml or set FERREX_WEB_CONFIG",
        );
    }

    let FileConfig {
        server: file_server,
        api: file_api,
        cookies: file_cookies,
        theme: file_theme,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
    };

    let internal_raw = env
        .api_url
        .or(file_api.internal_url)
        .unwrap_or_else(|| {
            warnings.push_with_hint(
                format!("API URL not configured; defaulting to {DEFAULT_API_URL}"),
                "Set FERREX_WEB_API_URL to the Ferrex server address",
            );
            DEFAULT_API_URL.to_string()
        });
    let internal_url = parse_url("api.internal_url", &internal_raw)?;

    let public_url = match env.public_api_url.or(file_api.public_url) {
        Some(raw) => parse_url("api.public_url", &raw)?,
        None => internal_url.clone(),
    };

    let request_timeout = match env.request_timeout.or(file_api.request_timeout) {
        Some(raw) => humantime::parse_duration(&raw).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                field: "api.request_timeout",
                value: raw.clone(),
                source,
            }
        })?,
        None => DEFAULT_REQUEST_TIMEOUT,
    };

    let signing_secret = match env.cookie_secret.or(file_cookies.signing_secret) {
        Some(secret) => secret,
        None => {
            warnings.push_with_hint(
                "Cookie signing secret not configured; using the development secret",
                "Set FERREX_WEB_COOKIE_SECRET to a long random value in production",
            );
            DEV_COOKIE_SECRET.to_string()
        }
    };

    let cookies = CookieConfig {
        account_cookie: file_cookies
            .account_cookie
            .unwrap_or_else(|| DEFAULT_ACCOUNT_COOKIE.to_string()),
        theme_cookie: file_cookies
            .theme_cookie
            .unwrap_or_else(|| DEFAULT_THEME_COOKIE.to_string()),
        signing_secret,
        secure: env.cookie_secure.or(file_cookies.secure).unwrap_or(false),
    };

    let theme = ThemeConfig {
        fallback: env
            .theme_fallback
            .or(file_theme.fallback)
            .unwrap_or(Theme::Dark),
    };

    let config = WebConfig {
        server,
        api: ApiConfig {
            internal_url,
            public_url,
            request_timeout,
        },
        cookies,
        theme,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };

    Ok((config, warnings))
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigLoadError> {
    Url::parse(raw).map_err(|source| ConfigLoadError::InvalidUrl {
        field,
        value: raw.to_string(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("env file missing: {path}")]
    MissingEnvFile { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid URL for {field}: '{value}'")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid duration for {field}: '{value}'")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: WebConfig,
    pub warnings: ConfigWarnings,
}
