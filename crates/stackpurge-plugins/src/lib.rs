pub mod bus;
pub mod collector;
pub mod context;
pub mod host_api;
pub mod manifest;
pub mod purge;

pub use bus::{ClearSource, EventBus, HookBus, HostEvent, Listener, Priority, SaveKind, Topic};
pub use collector::{EventCollector, PurgeSet};
pub use context::RequestContext;
pub use host_api::{HostApi, Page, PageId, ADMIN_ROOT_ID};
pub use manifest::PluginManifest;
pub use purge::{ConfigStatus, StackPathPurge};
