//! Server configuration via CLI args and environment variables.
//!
//! A `.env` file in the working directory is loaded before parsing, so its
//! entries act as environment variables.

use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;

use storefront_http::HttpConfig;
use storefront_http::middleware::cors::{CorsPolicy, DEFAULT_ALLOWED_ORIGINS};
use storefront_http::state::DEFAULT_BODY_LIMIT;
use storefront_service::ServiceConfig;

/// HTTP server for the Storefront e-commerce backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "storefront-server", version, about)]
pub struct Config {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: IpAddr,

    /// Bind port.
    #[arg(long, env = "PORT")]
    pub port: u16,

    /// MongoDB connection string.
    #[arg(long, env = "MONGO_URI")]
    pub mongo_uri: String,

    /// Database name. Defaults to the one named in the URI.
    #[arg(long, env = "MONGO_DATABASE")]
    pub mongo_database: Option<String>,

    /// Allowed cross-origin callers (comma-separated). "*" allows any origin.
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_values = DEFAULT_ALLOWED_ORIGINS
    )]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT, env = "BODY_LIMIT")]
    pub body_limit: usize,

    /// Request timeout in seconds (0 = disabled).
    #[arg(long, default_value_t = 30, env = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    /// Log level.
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[arg(long, default_value = "text", env = "LOG_FORMAT")]
    pub log_format: String,
}

impl Config {
    /// Parses configuration from CLI args and env vars, after loading `.env`.
    pub fn parse() -> Self {
        dotenvy::dotenv().ok();
        <Self as Parser>::parse()
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            mongo_uri: self.mongo_uri.clone(),
            mongo_database: self.mongo_database.clone(),
        }
    }

    /// Transport settings. Fails when an origin is not a valid header value.
    pub fn http_config(&self) -> Result<HttpConfig, String> {
        let cors = CorsPolicy::new(&self.cors_origins)
            .map_err(|e| format!("invalid CORS origin in {:?}: {e}", self.cors_origins))?;
        Ok(HttpConfig {
            cors,
            body_limit: self.body_limit,
            request_timeout: Duration::from_secs(self.request_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("storefront-server").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_given() {
        let config = parse(&["--port", "5000", "--mongo-uri", "mongodb://localhost/shop"]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.cors_origins, DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(config.body_limit, 100 * 1024 * 1024);

        let http = config.http_config().unwrap();
        assert_eq!(http.cors, CorsPolicy::default());
        assert_eq!(http.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn cors_origins_are_comma_separated() {
        let config = parse(&[
            "--port",
            "5000",
            "--mongo-uri",
            "mongodb://localhost",
            "--cors-origins",
            "https://a.example,https://b.example",
        ])
        .unwrap();
        assert_eq!(config.cors_origins, ["https://a.example", "https://b.example"]);
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(parse(&["--port", "not-a-port", "--mongo-uri", "mongodb://localhost"]).is_err());
        assert!(parse(&["--port", "70000", "--mongo-uri", "mongodb://localhost"]).is_err());
    }
}
