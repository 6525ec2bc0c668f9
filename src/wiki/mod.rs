// Host-side model: change events, the site's URL shapes, and the narrow
// collaborator interfaces (localization, revision lookup) the feed uses.

pub mod event;
pub mod i18n;
pub mod revision;
pub mod site;

pub use event::{parse_events, ChangeEvent, ChangeKind, FlowInfo, LogInfo, Performer};
pub use i18n::{Catalog, Localizer};
pub use revision::{EventRevisions, NoRevisions, Revision, RevisionLookup};
pub use site::{Site, Title};
