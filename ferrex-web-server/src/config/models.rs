use std::{net::SocketAddr, path::PathBuf, time::Duration};

use ferrex_web::{CookieNames, Theme};
use url::Url;

/// Fully resolved host configuration
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub cookies: CookieConfig,
    pub theme: ThemeConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.bind_addr().parse().ok()
    }
}

/// Where the Ferrex API lives
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL used for server-side fetches
    pub internal_url: Url,
    /// Base URL the browser uses after hydration
    pub public_url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub account_cookie: String,
    pub theme_cookie: String,
    pub signing_secret: String,
    /// Adds `Secure` to issued cookies
    pub secure: bool,
}

impl CookieConfig {
    pub fn names(&self) -> CookieNames {
        CookieNames {
            account: self.account_cookie.clone(),
            theme: self.theme_cookie.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThemeConfig {
    /// Theme used for `auto` when the browser sends no color scheme hint
    pub fallback: Theme,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
