use crate::bus::Topic;
use serde::{Deserialize, Serialize};

/// Metadata the host shows for an installed plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    pub title: String,
    pub version: String,
    pub summary: Option<String>,
    /// Load on every request rather than on demand.
    pub autoload: bool,
    pub hooks: Vec<Topic>,
}

impl PluginManifest {
    pub fn listens_to(&self, topic: Topic) -> bool {
        self.hooks.contains(&topic)
    }
}
