use crate::context::RequestContext;
use crate::host_api::Page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    PageCacheCleared,
    AllCacheCleared,
    Saved,
    AcceleratorFullClear,
    AcceleratorClearExecuted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearSource {
    Renderer,
    Accelerator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    Page,
    Field,
}

/// Lifecycle events the host emits during a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum HostEvent {
    /// Rendered cache for `page` (and any `related` pages) was removed.
    PageCacheCleared { page: Page, related: Vec<Page> },
    AllCacheCleared { source: ClearSource },
    /// A page or field save finished.
    Saved { kind: SaveKind },
    /// The accelerator's "clear everything" form was submitted.
    AcceleratorFullClear,
    /// The accelerator ran its clear behaviors with these counts.
    AcceleratorClearExecuted { site: u32, family: u32, children: u32 },
}

impl HostEvent {
    pub fn topic(&self) -> Topic {
        match self {
            HostEvent::PageCacheCleared { .. } => Topic::PageCacheCleared,
            HostEvent::AllCacheCleared { .. } => Topic::AllCacheCleared,
            HostEvent::Saved { .. } => Topic::Saved,
            HostEvent::AcceleratorFullClear => Topic::AcceleratorFullClear,
            HostEvent::AcceleratorClearExecuted { .. } => Topic::AcceleratorClearExecuted,
        }
    }
}

/// Listener ordering. Lower values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub i32);

impl Priority {
    pub const DEFAULT: Priority = Priority(100);
    /// After every listener registered at `DEFAULT`.
    pub const LATE: Priority = Priority(1000);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

#[async_trait]
pub trait Listener: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &mut RequestContext, event: &HostEvent);
}

#[async_trait]
pub trait EventBus: Send + Sync {
    fn subscribe(&mut self, topic: Topic, priority: Priority, listener: Arc<dyn Listener>);

    async fn emit(&self, ctx: &mut RequestContext, event: HostEvent);
}

struct Subscription {
    topic: Topic,
    priority: Priority,
    listener: Arc<dyn Listener>,
}

/// In-process bus. Listeners run sequentially in priority order; equal
/// priorities run in subscription order.
#[derive(Default)]
pub struct HookBus {
    subscriptions: Vec<Subscription>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self, topic: Topic) -> usize {
        self.subscriptions.iter().filter(|s| s.topic == topic).count()
    }
}

#[async_trait]
impl EventBus for HookBus {
    fn subscribe(&mut self, topic: Topic, priority: Priority, listener: Arc<dyn Listener>) {
        let at = self
            .subscriptions
            .iter()
            .position(|s| s.priority > priority)
            .unwrap_or(self.subscriptions.len());
        self.subscriptions.insert(
            at,
            Subscription {
                topic,
                priority,
                listener,
            },
        );
    }

    async fn emit(&self, ctx: &mut RequestContext, event: HostEvent) {
        let topic = event.topic();
        let span = ctx.span().clone();
        for sub in self.subscriptions.iter().filter(|s| s.topic == topic) {
            debug!(
                listener = sub.listener.name(),
                topic = ?topic,
                priority = sub.priority.0,
                "dispatching hook"
            );
            sub.listener
                .handle(ctx, &event)
                .instrument(span.clone())
                .await;
        }
    }
}
