//! Service configuration, read from flags or the environment.

use clap::Parser;
use history_atlas_assembly::DEFAULT_FETCH_CONCURRENCY;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "history-atlas")]
#[command(about = "Read-only API over historical routes, points of interest and participants")]
pub struct Config {
    /// Base URL of the Supabase project
    #[arg(long, env = "SUPABASE_URL", value_parser = non_empty)]
    pub supabase_url: String,

    /// Anonymous API key for the Supabase project
    #[arg(long, env = "SUPABASE_ANON_KEY", value_parser = non_empty, hide_env_values = true)]
    pub supabase_anon_key: String,

    /// Port to listen on
    #[arg(long, env = "BACKEND_PORT", default_value = "8080")]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Entities assembled concurrently per request
    #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = DEFAULT_FETCH_CONCURRENCY)]
    pub fetch_concurrency: usize,

    /// Deadline for a whole request, store calls included
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Config {
    /// Socket address the server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn non_empty(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("value must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let config = Config::try_parse_from([
            "history-atlas",
            "--supabase-url",
            "https://atlas.supabase.co",
            "--supabase-anon-key",
            "anon",
            "--port",
            "9000",
        ])
        .unwrap();

        assert_eq!(config.listen_address(), "0.0.0.0:9000");
        assert_eq!(config.fetch_concurrency, 8);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_credentials_are_rejected() {
        let result = Config::try_parse_from([
            "history-atlas",
            "--supabase-url",
            "",
            "--supabase-anon-key",
            "anon",
        ]);
        assert!(result.is_err());
    }
}
