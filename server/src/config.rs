use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_aws_region")]
    pub default_aws_region: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl AppConfig {
    /// Comma-separated origin list from config or environment.
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_allowed_origins() -> String {
    "http://localhost:3000,http://0.0.0.0:3000,*".to_string()
}

pub async fn load_config(config_file: &str) -> anyhow::Result<AppConfig> {
    let app_config: AppConfig = Config::builder()
        .add_source(File::with_name(config_file).required(false))
        .add_source(Environment::default())
        .build()?
        .try_deserialize()?;
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_split_and_trim() {
        let app_config = AppConfig {
            host: default_host(),
            port: default_port(),
            base_path: default_base_path(),
            default_aws_region: default_aws_region(),
            redis_url: default_redis_url(),
            cache_ttl: default_cache_ttl(),
            allowed_origins: "http://localhost:3000 , http://0.0.0.0:3000,".to_string(),
        };
        assert_eq!(
            app_config.origins(),
            vec![
                "http://localhost:3000".to_string(),
                "http://0.0.0.0:3000".to_string()
            ]
        );
    }
}
