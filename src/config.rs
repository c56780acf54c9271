// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

use thiserror::Error;

use crate::proximity::DEFAULT_RADIUS_M;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingBotToken,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot authentication token. Its absence is the only thing that
    /// aborts startup.
    pub bot_token: String,
    /// Path to the trail data file.
    pub trails_file: PathBuf,
    /// Port to bind the webhook HTTP server to.
    pub port: u16,
    /// Expected value of the webhook secret-token header, if any.
    pub webhook_secret: Option<String>,
    /// Proximity search radius in meters.
    pub search_radius_m: f64,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `BOT_TOKEN` - Bot API token (required)
    /// - `TRAILS_FILE` - Path to the trail data file (default: `trails.json`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `WEBHOOK_SECRET` - Secret-token header value to require on the webhook
    /// - `SEARCH_RADIUS_KM` - Proximity search radius (default: 10)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--trails <FILE>` - Override the trail data file
    pub fn load() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().collect();

        let bot_token = std::env::var("BOT_TOKEN").map_err(|_| ConfigError::MissingBotToken)?;

        let trails_file = Self::parse_cli_value(&args, "--trails")
            .or_else(|| std::env::var("TRAILS_FILE").ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("trails.json"));

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(3000);

        let webhook_secret = std::env::var("WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let search_radius_m = std::env::var("SEARCH_RADIUS_KM")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|km| km * 1000.0)
            .unwrap_or(DEFAULT_RADIUS_M);

        Ok(Config {
            bot_token,
            trails_file,
            port,
            webhook_secret,
            search_radius_m,
        })
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
