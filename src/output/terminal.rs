// Colored terminal output for feed summaries, rendered payloads and
// dispatch totals. The main.rs command handlers delegate here.

use colored::Colorize;
use serde_json::Value;

use crate::config::FeedSet;
use crate::delivery::{redact_url, DispatchReport};
use crate::feed::{DeliveryMethod, FeedConfig, FormatOutcome};

/// Display the site and every loaded feed (`rcfeed check`).
pub fn display_feed_summary(set: &FeedSet) {
    println!(
        "\n{}",
        format!("=== {} ({}) ===", set.site.name, set.site.server).bold()
    );
    println!(
        "  Article path: {}  Script: {}  Language: {}",
        set.site.article_path, set.site.script, set.site.language
    );
    println!();

    if set.feeds.is_empty() {
        println!("  {}", "No usable feeds configured.".yellow());
    }
    for feed in &set.feeds {
        display_feed(feed);
    }

    if !set.rejected.is_empty() {
        println!(
            "  {} {} feed(s) skipped:",
            "!".bright_red(),
            set.rejected.len()
        );
        for error in &set.rejected {
            println!("    {}", error.to_string().dimmed());
        }
    }
}

fn display_feed(feed: &FeedConfig) {
    let method = match feed.method {
        DeliveryMethod::Http => "http".normal(),
        DeliveryMethod::DryRun => "dry-run".yellow(),
    };
    println!("  {}  style={}  method={}", feed.name.bold(), feed.style, method);
    for url in &feed.webhook_urls {
        println!("    -> {}", redact_url(url).dimmed());
    }

    let mut filters = Vec::new();
    let mut note = |label: &str, values: Vec<String>| {
        if !values.is_empty() {
            filters.push(format!("{label}: {}", values.join(", ")));
        }
    };
    note("omit types", feed.omit_types.iter().map(|k| k.to_string()).collect());
    note("only types", feed.only_types.iter().map(|k| k.to_string()).collect());
    note(
        "omit namespaces",
        feed.omit_namespaces.iter().map(|n| n.to_string()).collect(),
    );
    note(
        "only namespaces",
        feed.only_namespaces.iter().map(|n| n.to_string()).collect(),
    );
    note("omit log types", feed.omit_log_types.iter().cloned().collect());
    note("only log types", feed.only_log_types.iter().cloned().collect());
    note("omit log actions", feed.omit_log_actions.iter().cloned().collect());
    note("only log actions", feed.only_log_actions.iter().cloned().collect());
    note("omit users", feed.omit_usernames.iter().cloned().collect());
    note("only users", feed.only_usernames.iter().cloned().collect());
    note("omit rights", feed.omit_user_rights.iter().cloned().collect());
    note("only rights", feed.only_user_rights.iter().cloned().collect());
    note("omit pages", feed.omit_pages.iter().cloned().collect());
    note("only pages", feed.only_pages.iter().cloned().collect());
    note(
        "omit page patterns",
        feed.omit_page_patterns.iter().map(|r| r.as_str().to_string()).collect(),
    );
    note("omit models", feed.omit_content_models.iter().cloned().collect());
    note("only models", feed.only_content_models.iter().cloned().collect());
    if feed.omit_talk {
        filters.push("omit talk".to_string());
    }
    if feed.only_talk {
        filters.push("only talk".to_string());
    }

    for filter in &filters {
        println!("    {}", filter.dimmed());
    }
    println!(
        "    {} user tools, {} page tools{}",
        feed.user_tools.len(),
        feed.page_tools.len(),
        if feed.request_override.is_some() {
            ", request override"
        } else {
            ""
        }
    );
    println!();
}

/// Display one feed's rendering of one event (`rcfeed render`).
pub fn display_outcome(feed: &FeedConfig, outcome: &FormatOutcome) {
    match outcome {
        FormatOutcome::Filtered => {
            println!("  {} {}", feed.name.bold(), "filtered".dimmed());
        }
        FormatOutcome::Empty => {
            println!("  {} {}", feed.name.bold(), "nothing to post".dimmed());
        }
        FormatOutcome::Payload(payload) => {
            let preview = super::truncate_chars(&payload_line(payload), 100);
            println!("  {} {}", feed.name.bold(), preview);
            match serde_json::to_string_pretty(payload) {
                Ok(pretty) => println!("{pretty}"),
                Err(_) => println!("{payload}"),
            }
        }
    }
}

/// The text a chat client would show first: `content`, or the first
/// embed's description.
fn payload_line(payload: &Value) -> String {
    payload
        .get("content")
        .or_else(|| payload.pointer("/embeds/0/description"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .replace('\n', " ")
}

/// Display totals after `rcfeed send`.
pub fn display_dispatch_report(events: usize, report: &DispatchReport) {
    println!(
        "\n{}",
        format!("=== Dispatched {events} event(s) ===").bold()
    );
    println!("  Delivered: {}", report.delivered.to_string().green());
    if report.failed > 0 {
        println!("  Failed:    {}", report.failed.to_string().red().bold());
    } else {
        println!("  Failed:    0");
    }
    println!("  Filtered:  {}", report.filtered.to_string().dimmed());
    println!("  Empty:     {}", report.empty.to_string().dimmed());
}
