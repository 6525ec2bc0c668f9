// Feed formatter: filter, classify and assemble one event for one feed.

use serde_json::Value;
use tracing::debug;

use crate::wiki::{ChangeEvent, EventRevisions, Localizer, RevisionLookup, Site};

use super::classify::EventClassifier;
use super::convert::MarkupConverter;
use super::filter::should_notify;
use super::flow::{DiscussionFormatter, FlowFormatter};
use super::log_text::LogTextRegistry;
use super::post::PostAssembler;
use super::settings::FeedConfig;
use super::tools::{Linker, RenderContext};

/// What became of one event for one feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatOutcome {
    /// The feed's filters rejected the event.
    Filtered,
    /// Nothing to post for this kind of event.
    Empty,
    /// The webhook body.
    Payload(Value),
}

/// Holds the host collaborators shared by every feed.
pub struct FeedFormatter<'a> {
    site: &'a Site,
    localizer: &'a dyn Localizer,
    revisions: Option<&'a dyn RevisionLookup>,
    log_texts: LogTextRegistry,
    discussions: Box<dyn DiscussionFormatter + 'a>,
}

impl<'a> FeedFormatter<'a> {
    pub fn new(site: &'a Site, localizer: &'a dyn Localizer) -> Self {
        Self {
            site,
            localizer,
            revisions: None,
            log_texts: LogTextRegistry::default(),
            discussions: Box::new(FlowFormatter),
        }
    }

    /// Use a host revision store instead of the event's own revision ids.
    pub fn with_revisions(mut self, revisions: &'a dyn RevisionLookup) -> Self {
        self.revisions = Some(revisions);
        self
    }

    pub fn with_log_texts(mut self, log_texts: LogTextRegistry) -> Self {
        self.log_texts = log_texts;
        self
    }

    pub fn with_discussions(mut self, discussions: impl DiscussionFormatter + 'a) -> Self {
        self.discussions = Box::new(discussions);
        self
    }

    pub fn site(&self) -> &Site {
        self.site
    }

    /// Filter, then render.
    pub fn format(&self, event: &ChangeEvent, feed: &FeedConfig) -> FormatOutcome {
        if !should_notify(event, feed, self.site) {
            debug!(feed = %feed.name, kind = %event.kind, title = %event.title, "Filtered out");
            return FormatOutcome::Filtered;
        }
        self.render(event, feed)
    }

    /// Render without consulting the feed's filters.
    pub fn render(&self, event: &ChangeEvent, feed: &FeedConfig) -> FormatOutcome {
        let own_revisions = EventRevisions::new(event, self.site);
        let revisions = self.revisions.unwrap_or(&own_revisions);
        let ctx = RenderContext::new(self.site, self.localizer, revisions);

        let converter = MarkupConverter::new(Linker::new(ctx, feed));
        let classifier =
            EventClassifier::new(&converter, &self.log_texts, self.discussions.as_ref());

        match classifier.classify(event, feed.style) {
            Some(classified) => {
                let post = PostAssembler::new(converter.linker()).assemble(&classified, event, feed);
                FormatOutcome::Payload(post)
            }
            None => FormatOutcome::Empty,
        }
    }
}
