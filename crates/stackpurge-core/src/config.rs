use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.stackpath.com/";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const ENV_CLIENT_ID: &str = "STACKPATH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "STACKPATH_CLIENT_SECRET";
pub const ENV_STACK_ID: &str = "STACKPATH_STACK_ID";
pub const ENV_GATEWAY_URL: &str = "STACKPATH_GATEWAY_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoreConfig {
    pub stackpath: StackPathConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
}

#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StackPathConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub stack_id: Option<String>,
    pub gateway_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: Option<u64>,
    /// Keep a failed token exchange memoized for the whole TTL. Defaults to true.
    pub cache_token_failures: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

impl CoreConfig {
    /// Reads a JSON config file, then applies environment overrides.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut cfg: CoreConfig = serde_json::from_str(&data)?;
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> CoreResult<Self> {
        let mut cfg = CoreConfig::default();
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let sp = &mut self.stackpath;
        if let Some(v) = lookup(ENV_CLIENT_ID) {
            sp.client_id = Some(v);
        }
        if let Some(v) = lookup(ENV_CLIENT_SECRET) {
            sp.client_secret = Some(v);
        }
        if let Some(v) = lookup(ENV_STACK_ID) {
            sp.stack_id = Some(v);
        }
        if let Some(v) = lookup(ENV_GATEWAY_URL) {
            sp.gateway_url = Some(v);
        }
    }

    /// Only structural problems are errors here. Missing credentials are a
    /// normal state that turns every purge into a no-op.
    pub fn validate(&self) -> CoreResult<()> {
        let base = self.stackpath.gateway_url();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "gateway_url must be an http(s) url, got {base:?}"
            )));
        }
        if self.cache.ttl_secs == Some(0) {
            return Err(CoreError::Config("cache.ttl_secs must be positive".to_string()));
        }
        Ok(())
    }
}

impl StackPathConfig {
    /// Both credentials, if present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let id = non_empty(self.client_id.as_deref())?;
        let secret = non_empty(self.client_secret.as_deref())?;
        Some((id, secret))
    }

    pub fn stack_id(&self) -> Option<&str> {
        non_empty(self.stack_id.as_deref())
    }

    pub fn gateway_url(&self) -> &str {
        non_empty(self.gateway_url.as_deref()).unwrap_or(DEFAULT_GATEWAY_URL)
    }
}

impl fmt::Debug for StackPathConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackPathConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("stack_id", &self.stack_id)
            .field("gateway_url", &self.gateway_url)
            .finish()
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn cache_token_failures(&self) -> bool {
        self.cache_token_failures.unwrap_or(true)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_public_gateway() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.stackpath.gateway_url(), DEFAULT_GATEWAY_URL);
        assert_eq!(cfg.cache.ttl(), Duration::from_secs(3600));
        assert!(cfg.cache.cache_token_failures());
        assert_eq!(cfg.http.timeout(), Duration::from_secs(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn blank_credentials_are_absent() {
        let cfg = StackPathConfig {
            client_id: Some("id".into()),
            client_secret: Some("  ".into()),
            ..Default::default()
        };
        assert!(cfg.credentials().is_none());
        assert!(cfg.stack_id().is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: CoreConfig =
            serde_json::from_str(r#"{"stackpath":{"client_id":"abc","stack_id":"s1"}}"#).unwrap();
        assert_eq!(cfg.stackpath.client_id.as_deref(), Some("abc"));
        assert_eq!(cfg.stackpath.stack_id(), Some("s1"));
        assert!(cfg.stackpath.credentials().is_none());
        assert_eq!(cfg.cache.ttl_secs, None);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = CoreConfig::default();
        cfg.stackpath.client_id = Some("from-file".into());
        let env: HashMap<&str, &str> = [
            (ENV_CLIENT_ID, "from-env"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_GATEWAY_URL, "http://127.0.0.1:9000/"),
        ]
        .into_iter()
        .collect();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.stackpath.credentials(), Some(("from-env", "secret")));
        assert_eq!(cfg.stackpath.gateway_url(), "http://127.0.0.1:9000/");
        assert!(cfg.stackpath.stack_id.is_none());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = StackPathConfig {
            client_secret: Some("hunter2".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn rejects_bad_gateway_and_zero_ttl() {
        let mut cfg = CoreConfig::default();
        cfg.stackpath.gateway_url = Some("ftp://nope".into());
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));

        let mut cfg = CoreConfig::default();
        cfg.cache.ttl_secs = Some(0);
        assert!(cfg.validate().is_err());
    }
}
