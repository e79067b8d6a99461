use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVariable(&'static str),

    #[error("Unknown embedding provider: {0}")]
    UnknownEmbeddingProvider(String),
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weaviate: WeaviateConfig,
    pub openai: OpenAiConfig,
    pub embedding: EmbeddingConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaviateConfig {
    pub url: String,
    pub api_key: Option<Secret>,
    pub class_name: String,
    pub vectorizer: String,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            api_key: None,
            class_name: "Document".to_string(),
            vectorizer: "text2vec-openai".to_string(),
        }
    }
}

impl WeaviateConfig {
    pub fn with_overrides<F>(&self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            url: lookup("WEAVIATE_URL").unwrap_or_else(|| self.url.clone()),
            api_key: lookup("WEAVIATE_API_KEY")
                .map(Secret::new)
                .or_else(|| self.api_key.clone()),
            ..self.clone()
        }
    }

    /// Weaviate Cloud clusters (`*.weaviate.network`, `*.weaviate.cloud`) only accept
    /// authenticated requests.
    pub fn is_cloud_domain(&self) -> bool {
        let url = self.url.strip_suffix('/').unwrap_or(&self.url);
        url.ends_with(".weaviate.network") || url.ends_with(".weaviate.cloud")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret>,
    pub base_url: String,
    pub chat_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo-16k-0613".to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn with_overrides<F>(&self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup("OPENAI_API_KEY")
                .map(Secret::new)
                .or_else(|| self.api_key.clone()),
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| self.base_url.clone()),
            chat_model: lookup("OPENAI_CHAT_MODEL").unwrap_or_else(|| self.chat_model.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: Option<String>,
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            dimensions: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn with_overrides<F>(&self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            provider: lookup("EMBEDDING_PROVIDER").unwrap_or_else(|| self.provider.clone()),
            model: lookup("OPENAI_EMBEDDING_MODEL").or_else(|| self.model.clone()),
            dimensions: self.dimensions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub bearer_token: Option<Secret>,
}

impl AuthConfig {
    pub fn with_overrides<F>(&self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            bearer_token: lookup("BEARER_TOKEN")
                .map(Secret::new)
                .or_else(|| self.bearer_token.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub env: String,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            env: "dev".to_string(),
            static_dir: ".well-known".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn with_overrides<F>(&self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| self.bind_addr.clone()),
            env: lookup("ENV").unwrap_or_else(|| self.env.clone()),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| self.static_dir.clone()),
        }
    }

    pub fn is_development(&self) -> bool {
        self.env == "dev"
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Builds the configuration from `CONFIG_PATH` (when present) and the process environment.
    pub fn load_from_env() -> anyhow::Result<Self> {
        Self::load_with(|key| env::var(key).ok())
    }

    pub fn load_with<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables count as unset
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let base = match lookup("CONFIG_PATH") {
            Some(path) => Self::load(Path::new(&path))?,
            None => {
                let default_path = Self::default_config_path();
                let path = Path::new(&default_path);
                if path.exists() {
                    Self::load(path)?
                } else {
                    Self::default()
                }
            }
        };

        let config = base.with_overrides(&lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides<F>(&self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            weaviate: self.weaviate.with_overrides(lookup),
            openai: self.openai.with_overrides(lookup),
            embedding: self.embedding.with_overrides(lookup),
            auth: self.auth.with_overrides(lookup),
            server: self.server.with_overrides(lookup),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.bearer_token.is_none() {
            return Err(ConfigError::MissingVariable("BEARER_TOKEN"));
        }

        if self.weaviate.is_cloud_domain() && self.weaviate.api_key.is_none() {
            return Err(ConfigError::MissingVariable("WEAVIATE_API_KEY"));
        }

        match self.embedding.provider.as_str() {
            "openai" if self.openai.api_key.is_none() => {
                Err(ConfigError::MissingVariable("OPENAI_API_KEY"))
            }
            "openai" | "fallback" => Ok(()),
            other => Err(ConfigError::UnknownEmbeddingProvider(other.to_string())),
        }
    }

    pub fn default_config_path() -> String {
        "./config.toml".to_string()
    }
}
