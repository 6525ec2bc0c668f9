// The notification pipeline: filter a change, classify it, render its
// mentions and comment as chat markup, and lay it out as a webhook body.

pub mod classify;
pub mod convert;
pub mod filter;
pub mod flow;
pub mod formatter;
pub mod log_text;
pub mod post;
pub mod settings;
pub mod tools;

pub use classify::{Classified, EventClassifier};
pub use convert::MarkupConverter;
pub use filter::should_notify;
pub use formatter::{FeedFormatter, FormatOutcome};
pub use log_text::{LogActionTextProvider, LogTextRegistry};
pub use post::{deep_merge, PostAssembler};
pub use settings::{ConfigError, DeliveryMethod, FeedConfig, RawFeed, RenderStyle, ToolDescriptor};
pub use tools::{Linker, RenderContext, ToolSubject};
