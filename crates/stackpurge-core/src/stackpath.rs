use crate::cache::TtlCache;
use crate::config::{CoreConfig, StackPathConfig};
use crate::error::CoreResult;
use crate::gateway::{Auth, Gateway};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

pub const TOKEN_ENDPOINT: &str = "identity/v1/oauth2/token";
pub const STACKS_ENDPOINT: &str = "stack/v1/stacks";
pub const CACHE_SCOPE: &str = "StackPathPurge";

const TOKEN_KEY: &str = "access_token";
const STACKS_KEY: &str = "stacks";

pub fn purge_endpoint(stack_id: &str) -> String {
    format!("cdn/v1/stacks/{stack_id}/purge")
}

/// Stack id to display name.
pub type StackMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeItem {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
}

impl PurgeItem {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            recursive: None,
        }
    }

    pub fn recursive(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            recursive: Some(true),
        }
    }
}

/// What a purge call evicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeTarget {
    Url(String),
    Urls(Vec<String>),
    /// Everything below the site root.
    Site { root_url: String },
}

impl PurgeTarget {
    /// Items are sent exactly as given; duplicates are not collapsed here.
    pub fn into_items(self) -> Vec<PurgeItem> {
        match self {
            PurgeTarget::Url(url) => vec![PurgeItem::url(url)],
            PurgeTarget::Urls(urls) => urls.into_iter().map(PurgeItem::url).collect(),
            PurgeTarget::Site { root_url } => vec![PurgeItem::recursive(root_url)],
        }
    }
}

impl From<&str> for PurgeTarget {
    fn from(url: &str) -> Self {
        PurgeTarget::Url(url.to_string())
    }
}

impl From<String> for PurgeTarget {
    fn from(url: String) -> Self {
        PurgeTarget::Url(url)
    }
}

impl From<Vec<String>> for PurgeTarget {
    fn from(urls: Vec<String>) -> Self {
        PurgeTarget::Urls(urls)
    }
}

/// StackPath API client: token exchange, stack listing and purge.
///
/// Token and stack lookups are memoized for the configured TTL (one hour by
/// default). The two caches expire independently.
pub struct StackPathClient {
    gateway: Gateway,
    config: StackPathConfig,
    ttl: Duration,
    cache_token_failures: bool,
    tokens: TtlCache<Option<String>>,
    stacks: TtlCache<StackMap>,
}

impl StackPathClient {
    pub fn new(cfg: &CoreConfig) -> CoreResult<Self> {
        let gateway = Gateway::from_config(cfg)?;
        Ok(Self::with_gateway(cfg, gateway))
    }

    pub fn with_gateway(cfg: &CoreConfig, gateway: Gateway) -> Self {
        Self {
            gateway,
            config: cfg.stackpath.clone(),
            ttl: cfg.cache.ttl(),
            cache_token_failures: cfg.cache.cache_token_failures(),
            tokens: TtlCache::new(CACHE_SCOPE, 8),
            stacks: TtlCache::new(CACHE_SCOPE, 64),
        }
    }

    pub fn config(&self) -> &StackPathConfig {
        &self.config
    }

    /// Bearer token, or `None` when credentials are missing or the exchange
    /// failed. A failure is memoized like a success unless
    /// `cache.cache_token_failures` is false.
    pub async fn get_token(&self) -> Option<String> {
        let fetch = || self.fetch_token();
        if self.cache_token_failures {
            self.tokens.get_or_compute(TOKEN_KEY, self.ttl, fetch).await
        } else {
            self.tokens
                .get_or_compute_some(TOKEN_KEY, self.ttl, fetch)
                .await
        }
    }

    async fn fetch_token(&self) -> Option<String> {
        let Some((client_id, client_secret)) = self.config.credentials() else {
            debug!("stackpath credentials not configured");
            return None;
        };

        let body = json!({
            "client_id": client_id,
            "client_secret": client_secret,
            "grant_type": "client_credentials",
        });
        let response = self.gateway.post(TOKEN_ENDPOINT, &body, Auth::None).await;

        let token = response
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        if token.is_none() {
            info!("stackpath token exchange returned no access_token");
        }
        token
    }

    /// Stacks visible to `token`. Empty without a token.
    pub async fn get_stacks(&self, token: Option<&str>) -> StackMap {
        let Some(token) = token else {
            return StackMap::new();
        };
        let key = format!("{STACKS_KEY}.{token}");
        self.stacks
            .get_or_compute(&key, self.ttl, || self.fetch_stacks(token))
            .await
    }

    async fn fetch_stacks(&self, token: &str) -> StackMap {
        let response = self.gateway.get(STACKS_ENDPOINT, token).await;
        parse_stacks(&response)
    }

    /// Sends one purge request for `target`.
    ///
    /// Without a token or a configured stack id nothing is sent and `None` is
    /// returned. Otherwise the decoded response body is returned as-is.
    pub async fn purge_cache(&self, target: impl Into<PurgeTarget>) -> Option<Value> {
        let items = target.into().into_items();
        if items.is_empty() {
            return None;
        }

        let Some(token) = self.get_token().await else {
            debug!("purge skipped: no access token");
            return None;
        };
        let Some(stack_id) = self.config.stack_id() else {
            debug!("purge skipped: no stack id configured");
            return None;
        };

        info!(stack_id = stack_id, items = items.len(), "purging cdn cache");
        let body = json!({ "items": items });
        let response = self
            .gateway
            .post(&purge_endpoint(stack_id), &body, Auth::bearer(token))
            .await;
        Some(response)
    }
}

fn parse_stacks(response: &Value) -> StackMap {
    let Some(results) = response.get("results").and_then(Value::as_array) else {
        return StackMap::new();
    };
    results
        .iter()
        .filter_map(|stack| {
            let id = match stack.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let name = stack
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((id, name))
        })
        .collect()
}
