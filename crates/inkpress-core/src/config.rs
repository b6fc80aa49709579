//! Configuration module
//!
//! Application configuration is read from the environment (with `.env`
//! support via dotenvy at the binary entry point). Only `DATABASE_URL` and
//! `JWT_SECRET` are mandatory; everything else has development defaults.

use std::env;

const DEFAULT_SERVER_PORT: u16 = 3001;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Root directory for gated upload binaries.
    pub upload_dir: String,
    /// Root directory for publicly served featured images.
    pub public_storage_dir: String,
    /// URL prefix under which featured images are served.
    pub public_storage_base_url: String,
    pub max_upload_bytes: usize,
    pub max_image_bytes: usize,
    /// MIME allowlist for gated file uploads.
    pub allowed_mime_types: Vec<String>,
    /// MIME allowlist for featured-image uploads.
    pub image_mime_types: Vec<String>,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.len() < 16 {
            return Err(anyhow::anyhow!("JWT_SECRET must be at least 16 characters"));
        }

        Ok(Config {
            server_port: env_parse("PORT", DEFAULT_SERVER_PORT)?,
            database_url,
            cors_origins: parse_origins(&env_or("CORS_ORIGINS", "*")),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,
            jwt_secret,
            jwt_expiry_hours: env_parse("JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS)?,
            upload_dir: env_or("UPLOAD_DIR", "uploads"),
            public_storage_dir: env_or("PUBLIC_STORAGE_DIR", "public/storage"),
            public_storage_base_url: env_or("PUBLIC_STORAGE_BASE_URL", "/storage"),
            max_upload_bytes: env_parse("MAX_FILE_SIZE", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_image_bytes: env_parse("MAX_IMAGE_SIZE", DEFAULT_MAX_IMAGE_BYTES)?,
            allowed_mime_types: default_allowed_mime_types(),
            image_mime_types: default_image_mime_types(),
            environment: env_or("ENVIRONMENT", "development"),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, value)),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// File types accepted for gated uploads: images, documents, and archives.
fn default_allowed_mime_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "text/plain",
        "text/csv",
        "application/zip",
        "application/x-rar-compressed",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_image_mime_types() -> Vec<String> {
    ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 3001,
            database_url: "postgres://localhost/inkpress_test".to_string(),
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 30,
            jwt_secret: "test-secret-key-min-32-characters-long".to_string(),
            jwt_expiry_hours: 24,
            upload_dir: "uploads".to_string(),
            public_storage_dir: "public/storage".to_string(),
            public_storage_base_url: "/storage".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            max_image_bytes: 5 * 1024 * 1024,
            allowed_mime_types: default_allowed_mime_types(),
            image_mime_types: default_image_mime_types(),
            environment: "test".to_string(),
        }
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://a.example, http://b.example"),
            vec!["http://a.example", "http://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
        config.environment = "prod".to_string();
        assert!(config.is_production());
    }

    #[test]
    fn test_default_mime_allowlists() {
        let allowed = default_allowed_mime_types();
        assert!(allowed.iter().any(|m| m == "application/pdf"));
        assert!(allowed.iter().any(|m| m == "application/zip"));
        // Executables are never accepted
        assert!(!allowed.iter().any(|m| m == "application/x-msdownload"));

        let images = default_image_mime_types();
        assert!(images.iter().all(|m| m.starts_with("image/")));
    }
}
