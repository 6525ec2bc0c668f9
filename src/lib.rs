// rcfeed: wiki recent changes to chat webhooks
//
// This is the library root. Each module corresponds to one stage of the
// feed: the host-side wiki model, per-feed formatting, and delivery.

pub mod config;
pub mod delivery;
pub mod feed;
pub mod output;
pub mod wiki;
