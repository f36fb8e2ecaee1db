use crate::host_api::{Page, PageId};
use stackpurge_core::PurgeTarget;
use tracing::debug;

/// URLs waiting to be purged at the end of the current save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PurgeSet {
    #[default]
    Empty,
    /// Unique URLs in the order they were first added.
    Urls(Vec<String>),
    /// Whole site, recursively. Absorbs any individual URL.
    Site,
}

impl PurgeSet {
    pub fn is_empty(&self) -> bool {
        matches!(self, PurgeSet::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            PurgeSet::Empty => 0,
            PurgeSet::Urls(urls) => urls.len(),
            PurgeSet::Site => 1,
        }
    }

    pub fn is_site(&self) -> bool {
        matches!(self, PurgeSet::Site)
    }

    /// Returns true if the URL was not already queued.
    pub fn add_url(&mut self, url: &str) -> bool {
        match self {
            PurgeSet::Site => false,
            PurgeSet::Empty => {
                *self = PurgeSet::Urls(vec![url.to_string()]);
                true
            }
            PurgeSet::Urls(urls) => {
                if urls.iter().any(|u| u == url) {
                    return false;
                }
                urls.push(url.to_string());
                true
            }
        }
    }

    pub fn mark_site(&mut self) {
        *self = PurgeSet::Site;
    }

    /// Moves the contents out, leaving the set empty.
    pub fn take(&mut self) -> PurgeSet {
        std::mem::take(self)
    }

    /// `root_url` is only consulted for the whole-site state.
    pub fn into_target(self, root_url: Option<String>) -> Option<PurgeTarget> {
        match self {
            PurgeSet::Empty => None,
            PurgeSet::Urls(urls) => Some(PurgeTarget::Urls(urls)),
            PurgeSet::Site => root_url.map(|root_url| PurgeTarget::Site { root_url }),
        }
    }
}

/// Turns cache-clear events into purge set entries.
#[derive(Debug, Clone, Copy)]
pub struct EventCollector {
    admin_root_id: PageId,
}

impl EventCollector {
    pub fn new(admin_root_id: PageId) -> Self {
        Self { admin_root_id }
    }

    pub fn all_cleared(&self, set: &mut PurgeSet) {
        if !set.is_site() {
            debug!(dropped = set.len(), "full site purge queued");
        }
        set.mark_site();
    }

    /// Queues the public URL of `page` and every related page. Pages without
    /// a URL or under the admin branch are skipped. Returns how many URLs were
    /// newly queued.
    pub fn pages_cleared<'a>(
        &self,
        set: &mut PurgeSet,
        pages: impl IntoIterator<Item = &'a Page>,
    ) -> usize {
        let mut added = 0;
        for page in pages {
            if page.is_under(self.admin_root_id) {
                continue;
            }
            let Some(url) = page.http_url.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            if set.add_url(url) {
                debug!(page_id = page.id, url = url, "queued for purge");
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_api::ADMIN_ROOT_ID;

    fn collector() -> EventCollector {
        EventCollector::new(ADMIN_ROOT_ID)
    }

    #[test]
    fn same_url_is_queued_once() {
        let mut set = PurgeSet::default();
        let page = Page::new(1001, "https://example.com/foo/", 1001);
        assert_eq!(collector().pages_cleared(&mut set, [&page]), 1);
        assert_eq!(collector().pages_cleared(&mut set, [&page, &page]), 0);
        assert_eq!(set, PurgeSet::Urls(vec!["https://example.com/foo/".into()]));
    }

    #[test]
    fn clear_all_discards_queued_urls() {
        let mut set = PurgeSet::default();
        let a = Page::new(1001, "https://example.com/a/", 1001);
        let b = Page::new(1002, "https://example.com/b/", 1001);
        collector().pages_cleared(&mut set, [&a, &b]);
        collector().all_cleared(&mut set);
        assert_eq!(set, PurgeSet::Site);

        collector().pages_cleared(&mut set, [&a]);
        assert_eq!(set, PurgeSet::Site);
    }

    #[test]
    fn admin_pages_and_pages_without_url_are_skipped() {
        let mut set = PurgeSet::default();
        let admin = Page::new(21, "https://example.com/processwire/", ADMIN_ROOT_ID);
        let hidden = Page {
            id: 1003,
            http_url: None,
            root_parent_id: 1003,
        };
        for _ in 0..3 {
            collector().pages_cleared(&mut set, [&admin, &hidden]);
        }
        assert!(set.is_empty());
    }

    #[test]
    fn related_pages_keep_insertion_order() {
        let mut set = PurgeSet::default();
        let pages = [
            Page::new(1003, "https://example.com/c/", 1003),
            Page::new(1001, "https://example.com/a/", 1001),
            Page::new(1002, "https://example.com/b/", 1002),
        ];
        collector().pages_cleared(&mut set, pages.iter());
        let target = set.into_target(None);
        assert_eq!(
            target,
            Some(PurgeTarget::Urls(vec![
                "https://example.com/c/".into(),
                "https://example.com/a/".into(),
                "https://example.com/b/".into(),
            ]))
        );
    }

    #[test]
    fn take_leaves_set_empty() {
        let mut set = PurgeSet::default();
        set.mark_site();
        let taken = set.take();
        assert!(set.is_empty());
        assert_eq!(
            taken.into_target(Some("https://example.com/".into())),
            Some(PurgeTarget::Site {
                root_url: "https://example.com/".into()
            })
        );
        assert_eq!(PurgeSet::Site.into_target(None), None);
        assert_eq!(PurgeSet::Empty.into_target(None), None);
    }
}
