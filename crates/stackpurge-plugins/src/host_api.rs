use serde::{Deserialize, Serialize};

pub type PageId = u64;

/// Root of the admin/system branch of the page tree.
pub const ADMIN_ROOT_ID: PageId = 2;

/// What the host tells us about a page whose rendered cache was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// Public absolute URL; `None` for pages that are not publicly viewable.
    pub http_url: Option<String>,
    /// Id of the top-level ancestor. A top-level page is its own root parent,
    /// so every page with root parent 2 sits in the admin branch.
    pub root_parent_id: PageId,
}

impl Page {
    pub fn new(id: PageId, http_url: impl Into<String>, root_parent_id: PageId) -> Self {
        Self {
            id,
            http_url: Some(http_url.into()),
            root_parent_id,
        }
    }

    pub fn is_under(&self, ancestor: PageId) -> bool {
        self.root_parent_id == ancestor
    }
}

/// Services the host CMS exposes to the plugin.
pub trait HostApi: Send + Sync {
    /// Public URL of the site root page.
    fn root_url(&self) -> Option<String>;

    fn admin_root_id(&self) -> PageId {
        ADMIN_ROOT_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_branch_is_detected_by_root_parent() {
        let admin = Page::new(10, "https://example.com/processwire/page/", ADMIN_ROOT_ID);
        let public = Page::new(11, "https://example.com/foo/", 11);
        assert!(admin.is_under(ADMIN_ROOT_ID));
        assert!(!public.is_under(ADMIN_ROOT_ID));
    }
}
