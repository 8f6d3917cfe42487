//! Host configuration: TOML file, environment and `.env`, layered over
//! built-in defaults.

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    ApiConfig, ConfigMetadata, CookieConfig, ServerConfig, ThemeConfig, WebConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigWarning, ConfigWarnings};
