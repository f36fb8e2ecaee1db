use crate::bus::{EventBus, HostEvent, Listener, Priority, Topic};
use crate::collector::EventCollector;
use crate::context::RequestContext;
use crate::host_api::HostApi;
use crate::manifest::PluginManifest;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use stackpurge_core::request_context::StageTimer;
use stackpurge_core::{CoreConfig, PurgeTarget, StackMap, StackPathClient};
use std::sync::Arc;
use tracing::{info, warn};

const HOOKS: [(Topic, Priority); 5] = [
    (Topic::PageCacheCleared, Priority::DEFAULT),
    (Topic::AllCacheCleared, Priority::DEFAULT),
    (Topic::AcceleratorFullClear, Priority::DEFAULT),
    (Topic::AcceleratorClearExecuted, Priority::DEFAULT),
    // Must see every URL other save hooks queue.
    (Topic::Saved, Priority::LATE),
];

/// Whether the configured credentials and stack can be used for purging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfigStatus {
    MissingCredentials,
    /// Credentials are set but no token could be obtained.
    InvalidCredentials,
    MissingStack { available: usize },
    UnknownStack { stack_id: String },
    Ready { stack_id: String, stack_name: String },
}

/// Purges the StackPath edge cache when the host clears its page cache.
///
/// Cache-clear hooks fill the request's purge set; the late save hook sends
/// one purge for everything collected. Accelerator clear actions purge the
/// whole site straight away.
pub struct StackPathPurge {
    client: Arc<StackPathClient>,
    host: Arc<dyn HostApi>,
    collector: EventCollector,
}

impl StackPathPurge {
    pub const NAME: &'static str = "StackPathPurge";

    pub fn new(client: Arc<StackPathClient>, host: Arc<dyn HostApi>) -> Self {
        let collector = EventCollector::new(host.admin_root_id());
        Self {
            client,
            host,
            collector,
        }
    }

    pub fn from_config(cfg: &CoreConfig, host: Arc<dyn HostApi>) -> anyhow::Result<Self> {
        let client = StackPathClient::new(cfg).context("failed to build stackpath client")?;
        Ok(Self::new(Arc::new(client), host))
    }

    pub fn manifest() -> PluginManifest {
        PluginManifest {
            name: Self::NAME.to_string(),
            title: "StackPath Purge".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            summary: Some("Purges the StackPath CDN cache when pages are saved".to_string()),
            autoload: true,
            hooks: HOOKS.iter().map(|(topic, _)| *topic).collect(),
        }
    }

    pub fn register(self: &Arc<Self>, bus: &mut dyn EventBus) {
        for (topic, priority) in HOOKS {
            let listener: Arc<dyn Listener> = Arc::clone(self) as Arc<dyn Listener>;
            bus.subscribe(topic, priority, listener);
        }
        info!(plugin = Self::NAME, hooks = HOOKS.len(), "plugin registered");
    }

    /// Sends everything queued in this request and empties the set.
    pub async fn flush(&self, ctx: &mut RequestContext) -> Option<Value> {
        let pending = ctx.purge_set.take();
        if pending.is_empty() {
            return None;
        }
        let count = pending.len();
        let timer = StageTimer::new("purge_flush");

        let Some(target) = pending.into_target(self.host.root_url()) else {
            timer.fail("site root url unavailable");
            return None;
        };

        let response = self.client.purge_cache(target).await;
        if response.is_none() {
            timer.fail("purge not sent");
            return None;
        }
        ctx.span().record("purged", count as u64);
        info!(request_id = ctx.request_id(), urls = count, "purge flushed");
        response
    }

    pub async fn purge_site(&self) -> Option<Value> {
        let Some(root_url) = self.host.root_url() else {
            warn!("site purge skipped: site root url unavailable");
            return None;
        };
        self.client.purge_cache(PurgeTarget::Site { root_url }).await
    }

    /// Stacks to offer for the `stack_id` setting, or `None` while the
    /// credentials do not yield a token.
    pub async fn stack_choices(&self) -> Option<StackMap> {
        let token = self.client.get_token().await?;
        Some(self.client.get_stacks(Some(&token)).await)
    }

    pub async fn config_status(&self) -> ConfigStatus {
        if self.client.config().credentials().is_none() {
            return ConfigStatus::MissingCredentials;
        }
        let Some(stacks) = self.stack_choices().await else {
            return ConfigStatus::InvalidCredentials;
        };
        match self.client.config().stack_id() {
            None => ConfigStatus::MissingStack {
                available: stacks.len(),
            },
            Some(id) => match stacks.get(id) {
                Some(name) => ConfigStatus::Ready {
                    stack_id: id.to_string(),
                    stack_name: name.clone(),
                },
                None => ConfigStatus::UnknownStack {
                    stack_id: id.to_string(),
                },
            },
        }
    }
}

#[async_trait]
impl Listener for StackPathPurge {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, ctx: &mut RequestContext, event: &HostEvent) {
        match event {
            HostEvent::PageCacheCleared { page, related } => {
                let pages = std::iter::once(page).chain(related.iter());
                self.collector.pages_cleared(&mut ctx.purge_set, pages);
            }
            HostEvent::AllCacheCleared { .. } => {
                self.collector.all_cleared(&mut ctx.purge_set);
            }
            HostEvent::Saved { .. } => {
                self.flush(ctx).await;
            }
            HostEvent::AcceleratorFullClear => {
                self.purge_site().await;
            }
            HostEvent::AcceleratorClearExecuted {
                site,
                family,
                children,
            } => {
                if *site > 0 || *family > 0 || *children > 0 {
                    self.purge_site().await;
                }
            }
        }
    }
}
