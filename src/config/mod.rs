// Configuration management module
// TOML-backed settings plus the interactive setup flow

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    API_TOKEN_ENV, Config, ConfigError, EmbeddingProvider, IndexConfig, ServiceConfig, api_token,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("askdocs"))
        .ok_or(ConfigError::DirectoryError)
}
