use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub redis_uri: String,
    pub mongo_database: String,
    pub listen_addr: String,
    /// Optional path to a JSON file with question-bank seed data; missing
    /// file or unset path skips the bootstrap.
    pub question_seed_file: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            // Fallback to current directory .env for backward compatibility
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        // Extract values with fallbacks to ENV or defaults
        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: MONGO_URI must be set in production!");
                }
                eprintln!("WARNING: MONGO_URI not set, using localhost default (dev mode only!)");
                "mongodb://localhost:27017".to_string()
            });

        let redis_uri = settings
            .get_string("redis.uri")
            .or_else(|_| env::var("REDIS_URI"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: REDIS_URI must be set in production!");
                }
                eprintln!("WARNING: REDIS_URI not set, using localhost default (dev mode only!)");
                "redis://127.0.0.1:6379/0".to_string()
            });

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "lingualevel".to_string());

        let listen_addr = settings
            .get_string("server.listen_addr")
            .or_else(|_| env::var("LISTEN_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8082".to_string());

        let question_seed_file = settings
            .get_string("content.question_seed_file")
            .ok()
            .or_else(|| env::var("QUESTION_SEED_FILE").ok())
            .filter(|path| !path.is_empty());

        Ok(Config {
            mongo_uri,
            redis_uri,
            mongo_database,
            listen_addr,
            question_seed_file,
        })
    }
}
