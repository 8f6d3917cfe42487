use std::path::PathBuf;

use ferrex_web::Theme;
use serde::{Deserialize, Serialize};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub api: FileApiConfig,
    #[serde(default)]
    pub cookies: FileCookieConfig,
    #[serde(default)]
    pub theme: FileThemeConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// Humantime duration, e.g. `"10s"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCookieConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_cookie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_cookie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Theme>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub api_url: Option<String>,
    pub public_api_url: Option<String>,
    pub request_timeout: Option<String>,
    pub cookie_secret: Option<String>,
    pub cookie_secure: Option<bool>,
    pub theme_fallback: Option<Theme>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            config_path: non_empty("FERREX_WEB_CONFIG").map(PathBuf::from),
            server_host: non_empty("FERREX_WEB_HOST"),
            server_port: non_empty("FERREX_WEB_PORT").and_then(|s| s.parse().ok()),
            api_url: non_empty("FERREX_WEB_API_URL"),
            public_api_url: non_empty("FERREX_WEB_PUBLIC_API_URL"),
            request_timeout: non_empty("FERREX_WEB_REQUEST_TIMEOUT"),
            cookie_secret: non_empty("FERREX_WEB_COOKIE_SECRET"),
            cookie_secure: non_empty("FERREX_WEB_COOKIE_SECURE").and_then(|raw| parse_bool(&raw)),
            theme_fallback: non_empty("FERREX_WEB_THEME").and_then(|raw| raw.parse().ok()),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reads_prefixed_variables_and_skips_blank_ones() {
        let vars = HashMap::from([
            ("FERREX_WEB_PORT", "8080"),
            ("FERREX_WEB_HOST", "  "),
            ("FERREX_WEB_COOKIE_SECURE", "yes"),
            ("FERREX_WEB_THEME", "light"),
        ]);
        let env = EnvConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(env.server_port, Some(8080));
        assert_eq!(env.server_host, None);
        assert_eq!(env.cookie_secure, Some(true));
        assert_eq!(env.theme_fallback, Some(Theme::Light));
    }
}
