use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub admin: AdminConfig,
    pub node: NodeConfig,
    pub storage: StorageConfig,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Clone)]
pub struct AdminConfig {
    /// Shared admin password. `None` disables login entirely.
    pub password: Option<String>,
    /// Key used to sign session cookies.
    pub secret_key: Vec<u8>,
}

// Keep secrets out of logs and panic messages.
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the local storage backend
    pub upload_folder: String,
    pub s3: Option<S3Config>,
}

#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Overrides the request endpoint (S3-compatible servers). Public URLs keep the AWS form.
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            upload_folder: "static/uploads".to_string(),
            s3: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let password = std::env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());
        if password.is_none() {
            tracing::warn!("ADMIN_PASSWORD is not set; admin login is disabled");
        }

        let secret_key = match std::env::var("SECRET_KEY").ok().filter(|k| !k.is_empty()) {
            Some(key) => key.into_bytes(),
            None => {
                tracing::warn!(
                    "SECRET_KEY is not set; using a random key, sessions will not survive a restart"
                );
                random_key()?
            }
        };

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            _ => StorageBackend::Local,
        };

        let upload_folder =
            std::env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "static/uploads".to_string());

        let s3 = match backend {
            StorageBackend::S3 => Some(S3Config {
                bucket: required_var("S3_BUCKET")?,
                region: required_var("S3_REGION")?,
                access_key_id: required_var("AWS_ACCESS_KEY_ID")?,
                secret_access_key: required_var("AWS_SECRET_ACCESS_KEY")?,
                endpoint: std::env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
            }),
            StorageBackend::Local => None,
        };

        let config = Config {
            admin: AdminConfig {
                password,
                secret_key,
            },
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                backend,
                upload_folder,
                s3,
            },
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.secret_key.len() < 16 {
            return Err(ConfigError::ValidationError(
                "SECRET_KEY must be at least 16 bytes".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.s3.is_none() {
            return Err(ConfigError::ValidationError(
                "S3 settings are required when STORAGE_BACKEND=s3".to_string(),
            ));
        }

        if self.storage.upload_folder.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "UPLOAD_FOLDER cannot be empty".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ConfigError::ValidationError(format!("{name} is required when STORAGE_BACKEND=s3"))
        })
}

fn random_key() -> Result<Vec<u8>, ConfigError> {
    use ring::rand::SecureRandom;

    let mut key = vec![0u8; 32];
    ring::rand::SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| ConfigError::ValidationError("failed to generate SECRET_KEY".to_string()))?;
    Ok(key)
}
