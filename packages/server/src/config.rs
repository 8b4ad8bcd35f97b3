//! Command-line / environment configuration for the server binary.

use std::path::PathBuf;

use clap::Parser;

use crate::{
    domain::GameSettings,
    usecase::{GameError, night::validate_night_duration},
};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "jinro-server")]
#[command(about = "One-night werewolf game session server", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "JINRO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "JINRO_PORT", default_value = "8080")]
    pub port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Default night length in seconds (10-600)
    #[arg(long, env = "JINRO_NIGHT_SECONDS", default_value = "45")]
    pub night_seconds: u64,

    /// JSON file for game records; in-memory when omitted
    #[arg(long, env = "JINRO_STORE_PATH")]
    pub store_path: Option<PathBuf>,

    /// URL notices are POSTed to; notices are only logged when omitted
    #[arg(long, env = "JINRO_PUSH_ENDPOINT")]
    pub push_endpoint: Option<String>,
}

impl ServerConfig {
    /// Initial process-wide game settings.
    pub fn game_settings(&self) -> Result<GameSettings, GameError> {
        let night = validate_night_duration(self.night_seconds)?;
        Ok(GameSettings::with_night_duration(night, false))
    }
}
