// Revision lookup: the one piece of revision storage the diff tool needs.

use super::event::ChangeEvent;
use super::site::{Site, Title};

/// A page's latest revision and the revision it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    pub id: u64,
    /// `None` for the first revision of a page.
    pub parent_id: Option<u64>,
}

/// Answers "what is the latest revision of this page" for diff links.
pub trait RevisionLookup: Send + Sync {
    fn latest_revision(&self, title: &Title) -> Option<Revision>;
}

/// Lookup that knows nothing; every diff tool is dropped.
pub struct NoRevisions;

impl RevisionLookup for NoRevisions {
    fn latest_revision(&self, _title: &Title) -> Option<Revision> {
        None
    }
}

/// Revision data carried by the change event itself, valid for its own page.
pub struct EventRevisions {
    title: Title,
    revision: Option<Revision>,
}

impl EventRevisions {
    pub fn new(event: &ChangeEvent, site: &Site) -> Self {
        let revision = event
            .this_revision_id
            .filter(|id| *id > 0)
            .map(|id| Revision {
                id,
                parent_id: event.last_revision_id.filter(|p| *p > 0),
            });
        Self {
            title: event.page(site),
            revision,
        }
    }
}

impl RevisionLookup for EventRevisions {
    fn latest_revision(&self, title: &Title) -> Option<Revision> {
        if title.same_page(&self.title) {
            self.revision
        } else {
            None
        }
    }
}
