// Configuration module entry point
// Loads layered configuration and owns the process-scoped runtime state

mod state;
mod types;
mod version;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    AppConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig, TelemetryConfig,
};
pub use version::{short_version, BUILD_TIME, GIT_COMMIT, VERSION};

/// Well-known variables read without the `DEMO_` prefix, as deployment
/// manifests of the pipeline set them.
const ENV_PORT: &str = "PORT";
const ENV_APP_ENV: &str = "APP_ENV";
const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const ENV_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
const ENV_SDK_DISABLED: &str = "OTEL_SDK_DISABLED";

impl Config {
    /// Load configuration from specified file path (without extension).
    /// The file is optional; any format the `config` crate recognises works.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let sdk_disabled = non_empty_env(ENV_SDK_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DEMO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("app.environment", "development")?
            .set_default("app.simulate_latency", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 60)?
            .set_default("telemetry.enabled", true)?
            .set_default("telemetry.endpoint", "jaeger:4318")?
            .set_default("telemetry.service_name", "demo-app")?
            .set_override_option("server.port", non_empty_env(ENV_PORT))?
            .set_override_option("app.environment", non_empty_env(ENV_APP_ENV))?
            .set_override_option("telemetry.endpoint", non_empty_env(ENV_OTLP_ENDPOINT))?
            .set_override_option("telemetry.service_name", non_empty_env(ENV_SERVICE_NAME))?;

        if sdk_disabled {
            builder = builder.set_override("telemetry.enabled", false)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Read an environment variable, treating an empty value as unset
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        app: AppConfig {
            environment: "test".to_string(),
            simulate_latency: false,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            access_log: false,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        },
        performance: PerformanceConfig {
            keep_alive: true,
            request_timeout: 5,
            max_connections: None,
        },
        telemetry: TelemetryConfig {
            enabled: false,
            endpoint: "localhost:4318".to_string(),
            service_name: "demo-app-test".to_string(),
        },
    }
}
