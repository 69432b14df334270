// canvas-core/src/config.rs
use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::context::ContextBuilder;
use crate::error::TokenError;
use crate::keys::{KeyMaterial, KeyStore};

/// Central configuration for the host service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Bind address for the host server.
    #[serde(default = "default_host_addr")]
    pub host_addr: String,

    /// Pre-shared token guarding the key-rotation endpoint. When unset the
    /// endpoint is disabled entirely.
    #[serde(default)]
    pub admin_token: Option<String>,

    pub signing: SigningConfig,
    pub embed: EmbedConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Id of the key used for new signatures. Must name one of `keys`.
    pub active_key_id: String,
    /// All keys valid for verification, active one included.
    pub keys: Vec<KeyConfig>,
    /// Token lifetime in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Issuer identity stamped into every token.
    pub issuer: String,
    /// Audience identifier of the embedded app.
    pub audience: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyConfig {
    pub id: String,
    pub secret: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Origins the host will accept as an `instance_url` and use for the
    /// postMessage origin check. Exact string comparison, never an echo of
    /// request input.
    pub allowed_origins: Vec<String>,
    /// Path the iframe loads the embedded app from.
    #[serde(default = "default_app_path")]
    pub app_path: String,
}

fn default_host_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_app_path() -> String {
    "/app".to_string()
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Sources are layered the usual way: `config/default.toml`, then the
    /// RUN_MODE file, then `config/local.toml`, then `APP__`-prefixed
    /// environment variables. There is deliberately no fallback path that
    /// fabricates a signing key; a config without key material is fatal.
    pub fn load() -> Result<Self, TokenError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config: Config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()
            .map_err(|e| TokenError::ConfigurationError(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TokenError::ConfigurationError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on unusable key material or a dangling active key id.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.signing.keys.is_empty() {
            return Err(TokenError::ConfigurationError(
                "no signing keys configured".to_string(),
            ));
        }
        for key in &self.signing.keys {
            if key.secret.is_empty() {
                return Err(TokenError::ConfigurationError(format!(
                    "signing key '{}' has an empty secret",
                    key.id
                )));
            }
        }
        if !self
            .signing
            .keys
            .iter()
            .any(|k| k.id == self.signing.active_key_id)
        {
            return Err(TokenError::ConfigurationError(format!(
                "active_key_id '{}' does not name a configured key",
                self.signing.active_key_id
            )));
        }
        if self.signing.audience.is_empty() {
            return Err(TokenError::ConfigurationError(
                "audience is empty".to_string(),
            ));
        }
        if self.embed.allowed_origins.is_empty() {
            return Err(TokenError::ConfigurationError(
                "no allowed embed origins configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the key store from the configured material. The non-active keys
    /// are loaded as retired (verification-only).
    pub fn key_store(&self) -> Result<KeyStore, TokenError> {
        let active = self
            .signing
            .keys
            .iter()
            .find(|k| k.id == self.signing.active_key_id)
            .ok_or_else(|| {
                TokenError::ConfigurationError(format!(
                    "active_key_id '{}' does not name a configured key",
                    self.signing.active_key_id
                ))
            })?;

        let retired = self
            .signing
            .keys
            .iter()
            .filter(|k| k.id != self.signing.active_key_id)
            .map(|k| KeyMaterial::new(k.id.clone(), k.secret.clone().into_bytes()))
            .collect();

        Ok(KeyStore::from_parts(
            KeyMaterial::new(active.id.clone(), active.secret.clone().into_bytes()),
            retired,
        ))
    }

    /// Context builder matching the configured issuer, audience and TTL.
    pub fn context_builder(&self) -> ContextBuilder {
        ContextBuilder::new(
            self.signing.issuer.clone(),
            self.signing.audience.clone(),
            self.signing.ttl_secs,
        )
    }

    /// Whether the supplied instance URL is on the embed allow-list.
    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.embed.allowed_origins.iter().any(|o| o == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host_addr: default_host_addr(),
            admin_token: None,
            signing: SigningConfig {
                active_key_id: "k1".to_string(),
                keys: vec![
                    KeyConfig {
                        id: "k1".to_string(),
                        secret: "a test secret long enough for hmac".to_string(),
                    },
                    KeyConfig {
                        id: "k0".to_string(),
                        secret: "a previously rotated secret".to_string(),
                    },
                ],
                ttl_secs: 300,
                issuer: "host-platform".to_string(),
                audience: "hello-app".to_string(),
            },
            embed: EmbedConfig {
                allowed_origins: vec!["https://org1.example.com".to_string()],
                app_path: default_app_path(),
            },
        }
    }

    #[test]
    fn valid_config_builds_a_store_with_retired_keys() {
        let config = base_config();
        config.validate().unwrap();

        let store = config.key_store().unwrap();
        assert_eq!(store.active_key().unwrap().id(), "k1");
        assert_eq!(store.verification_key("k0").unwrap().id(), "k0");
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let mut config = base_config();
        config.signing.keys[0].secret = String::new();
        assert!(matches!(
            config.validate(),
            Err(TokenError::ConfigurationError(_))
        ));
    }

    #[test]
    fn dangling_active_key_id_is_a_configuration_error() {
        let mut config = base_config();
        config.signing.active_key_id = "missing".to_string();
        assert!(matches!(
            config.validate(),
            Err(TokenError::ConfigurationError(_))
        ));
    }

    #[test]
    fn origin_allow_list_is_exact_match() {
        let config = base_config();
        assert!(config.is_allowed_origin("https://org1.example.com"));
        assert!(!config.is_allowed_origin("https://org1.example.com.evil.test"));
        assert!(!config.is_allowed_origin("https://org2.example.com"));
    }
}
