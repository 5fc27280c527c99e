use std::time::Duration;

use code_runner::RunnerConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub runner: RunnerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Set the `Secure` attribute on the session cookie (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.expiry_hours as i64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    #[serde(default = "default_node_bin")]
    pub node_bin: String,
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            node_bin: default_node_bin(),
            python_bin: default_python_bin(),
        }
    }
}

impl From<&RunnerSettings> for RunnerConfig {
    fn from(settings: &RunnerSettings) -> Self {
        RunnerConfig {
            timeout: Duration::from_secs(settings.timeout_secs),
            max_output_bytes: settings.max_output_bytes,
            node_bin: settings.node_bin.clone(),
            python_bin: settings.python_bin.clone(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_expiry_hours() -> u64 {
    24
}

fn default_cookie_name() -> String {
    "auth".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_max_output_bytes() -> usize {
    64 * 1024
}

fn default_node_bin() -> String {
    "node".to_string()
}

fn default_python_bin() -> String {
    "python3".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("database.url", "postgres://localhost/codelearn_platform")?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("session.secret", "development-secret-change-in-production")?
            .build()?;

        let config: Config = config.try_deserialize()?;

        if config.session.secret == "development-secret-change-in-production" {
            tracing::warn!("SESSION__SECRET is not set, using the development secret");
        }

        Ok(config)
    }

    /// Fixed configuration for tests; nothing is read from the environment
    pub fn test_defaults() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: 0,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/codelearn_test".into(),
                max_connections: 2,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1:6379/0".into(),
            },
            session: SessionConfig {
                secret: "test-session-secret".into(),
                expiry_hours: 1,
                cookie_name: default_cookie_name(),
                secure_cookie: false,
            },
            runner: RunnerSettings {
                timeout_secs: 2,
                max_output_bytes: default_max_output_bytes(),
                node_bin: default_node_bin(),
                python_bin: default_python_bin(),
            },
        }
    }
}
