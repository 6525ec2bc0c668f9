// Dispatch: one change event to every configured feed.
//
// Phase 1 renders the payload once per feed (synchronous, no I/O).
// Phase 2 posts to every URL of every feed, `concurrency` at a time.
// Failures are logged and counted; one failed URL never stops the rest.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::feed::{DeliveryMethod, FeedConfig, FeedFormatter, FormatOutcome};
use crate::wiki::ChangeEvent;

use super::traits::{redact_url, DeliveryChannel};
use super::webhook::DryRunChannel;

/// Outcome counts for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Webhook posts that succeeded.
    pub delivered: usize,
    /// Webhook posts that failed.
    pub failed: usize,
    /// Feeds whose filters rejected the event.
    pub filtered: usize,
    /// Feeds that had nothing to render.
    pub empty: usize,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.filtered += other.filtered;
        self.empty += other.empty;
    }

    pub fn attempts(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Render `event` for each feed and deliver it.
///
/// `channel` carries HTTP feeds; dry-run feeds always log instead.
pub async fn dispatch(
    event: &ChangeEvent,
    feeds: &[FeedConfig],
    formatter: &FeedFormatter<'_>,
    channel: &dyn DeliveryChannel,
    concurrency: usize,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    // Phase 1: render
    let mut rendered: Vec<(&FeedConfig, Value)> = Vec::new();
    for feed in feeds {
        match formatter.format(event, feed) {
            FormatOutcome::Filtered => report.filtered += 1,
            FormatOutcome::Empty => {
                debug!(feed = %feed.name, kind = %event.kind, "Nothing to post");
                report.empty += 1;
            }
            FormatOutcome::Payload(payload) => rendered.push((feed, payload)),
        }
    }

    // Phase 2: deliver
    let jobs = rendered.iter().flat_map(|(feed, payload)| {
        let channel: &dyn DeliveryChannel = match feed.method {
            DeliveryMethod::Http => channel,
            DeliveryMethod::DryRun => &DryRunChannel,
        };
        feed.webhook_urls
            .iter()
            .map(move |url| (feed.name.as_str(), url.as_str(), channel, payload))
    });

    let results: Vec<bool> = stream::iter(jobs.map(|(feed, url, channel, payload)| async move {
        match channel.send(url, payload).await {
            Ok(()) => {
                debug!(feed = feed, url = %redact_url(url), "Delivered");
                true
            }
            Err(e) => {
                warn!(feed = feed, url = %redact_url(url), error = %e, "Webhook delivery failed");
                false
            }
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await;

    for ok in results {
        if ok {
            report.delivered += 1;
        } else {
            report.failed += 1;
        }
    }
    report
}
