// Feed filter: decides whether a change is worth a notification.
//
// Pure predicate over an event and a feed's normalized sets. Every
// dimension follows the same rule: suppressed if the value is in the omit
// set, or the only set is non-empty and lacks it.

use std::collections::BTreeSet;

use crate::wiki::{ChangeEvent, ChangeKind, Site};

use super::settings::FeedConfig;

/// `true` when `event` should be posted to `feed`.
///
/// Content models resolve through `site`, so namespace remappings count.
pub fn should_notify(event: &ChangeEvent, feed: &FeedConfig, site: &Site) -> bool {
    // Category membership changes are never posted, whatever the feed says.
    if event.kind == ChangeKind::Categorize {
        return false;
    }

    let talk = event.is_talk();
    if (feed.omit_talk && talk) || (feed.only_talk && !talk) {
        return false;
    }

    if excluded(&feed.omit_types, &feed.only_types, &event.kind)
        || excluded(&feed.omit_namespaces, &feed.only_namespaces, &event.namespace)
    {
        return false;
    }

    if let Some(log) = &event.log {
        if excluded(&feed.omit_log_types, &feed.only_log_types, &log.log_type)
            || excluded(&feed.omit_log_actions, &feed.only_log_actions, &log.full_type())
        {
            return false;
        }
    }

    if excluded(
        &feed.omit_usernames,
        &feed.only_usernames,
        &event.username().to_string(),
    ) {
        return false;
    }

    let has_any = |rights: &BTreeSet<String>| {
        event.user.as_ref().is_some_and(|u| u.has_any_right(rights))
    };
    if has_any(&feed.omit_user_rights)
        || (!feed.only_user_rights.is_empty() && !has_any(&feed.only_user_rights))
    {
        return false;
    }

    if excluded(&feed.omit_pages, &feed.only_pages, &event.title)
        || feed.omit_page_patterns.iter().any(|re| re.is_match(&event.title))
    {
        return false;
    }

    !excluded(
        &feed.omit_content_models,
        &feed.only_content_models,
        &event.content_model(site),
    )
}

fn excluded<T: Ord>(omit: &BTreeSet<T>, only: &BTreeSet<T>, value: &T) -> bool {
    omit.contains(value) || (!only.is_empty() && !only.contains(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::{LogInfo, Performer};
    use regex_lite::Regex;

    fn edit(namespace: i32, title: &str) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Edit,
            namespace,
            title: title.to_string(),
            content_model: None,
            user: Some(Performer::new("Alice")),
            comment: String::new(),
            old_len: Some(10),
            new_len: Some(20),
            log: None,
            flow: None,
            this_revision_id: Some(2),
            last_revision_id: Some(1),
            minor: false,
            bot: false,
        }
    }

    fn log_event(log_type: &str, action: &str) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Log,
            log: Some(LogInfo {
                log_type: log_type.to_string(),
                action: action.to_string(),
                params: Default::default(),
                action_html: None,
                action_text: None,
            }),
            ..edit(0, "Foo")
        }
    }

    fn notify(event: &ChangeEvent, feed: &FeedConfig) -> bool {
        should_notify(event, feed, &Site::default())
    }

    fn set<T: Ord + Clone>(items: &[T]) -> BTreeSet<T> {
        items.iter().cloned().collect()
    }

    #[test]
    fn empty_feed_passes_ordinary_edits() {
        assert!(notify(&edit(0, "Foo"), &FeedConfig::default()));
    }

    #[test]
    fn categorize_is_always_suppressed() {
        let event = ChangeEvent {
            kind: ChangeKind::Categorize,
            ..edit(14, "Category:Foo")
        };
        let feed = FeedConfig {
            only_types: set(&[ChangeKind::Categorize]),
            ..Default::default()
        };
        assert!(!notify(&event, &FeedConfig::default()));
        assert!(!notify(&event, &feed));
    }

    #[test]
    fn omitted_namespace_wins_over_everything() {
        let feed = FeedConfig {
            omit_namespaces: set(&[2]),
            only_usernames: set(&["Alice".to_string()]),
            ..Default::default()
        };
        assert!(!notify(&edit(2, "User:Alice"), &feed));
        assert!(notify(&edit(0, "Foo"), &feed));
    }

    #[test]
    fn only_namespaces_excludes_the_rest() {
        let feed = FeedConfig {
            only_namespaces: set(&[0, 4]),
            ..Default::default()
        };
        assert!(notify(&edit(4, "Project:Foo"), &feed));
        assert!(!notify(&edit(1, "Talk:Foo"), &feed));
    }

    #[test]
    fn talk_switches() {
        let omit = FeedConfig {
            omit_talk: true,
            ..Default::default()
        };
        let only = FeedConfig {
            only_talk: true,
            ..Default::default()
        };
        assert!(!notify(&edit(1, "Talk:Foo"), &omit));
        assert!(notify(&edit(0, "Foo"), &omit));
        assert!(notify(&edit(3, "User talk:Foo"), &only));
        assert!(!notify(&edit(0, "Foo"), &only));
    }

    #[test]
    fn log_action_filter_is_independent_of_log_type() {
        let feed = FeedConfig {
            omit_log_actions: set(&["block/unblock".to_string()]),
            ..Default::default()
        };
        assert!(!notify(&log_event("block", "unblock"), &feed));
        assert!(notify(&log_event("block", "block"), &feed));
    }

    #[test]
    fn log_filters_ignore_non_log_events() {
        let feed = FeedConfig {
            only_log_types: set(&["delete".to_string()]),
            ..Default::default()
        };
        assert!(notify(&edit(0, "Foo"), &feed));
        assert!(!notify(&log_event("move", "move"), &feed));
        assert!(notify(&log_event("delete", "delete"), &feed));
    }

    #[test]
    fn user_rights_intersect() {
        let mut event = edit(0, "Foo");
        if let Some(user) = event.user.as_mut() {
            user.rights = set(&["bot".to_string(), "edit".to_string()]);
        }
        let omit = FeedConfig {
            omit_user_rights: set(&["bot".to_string()]),
            ..Default::default()
        };
        let only = FeedConfig {
            only_user_rights: set(&["sysop".to_string()]),
            ..Default::default()
        };
        assert!(!notify(&event, &omit));
        assert!(!notify(&event, &only));
        assert!(notify(&edit(0, "Foo"), &omit));
    }

    #[test]
    fn only_usernames_rejects_anonymous_events() {
        let feed = FeedConfig {
            only_usernames: set(&["Alice".to_string()]),
            ..Default::default()
        };
        let anonymous = ChangeEvent {
            user: None,
            ..edit(0, "Foo")
        };
        assert!(notify(&edit(0, "Foo"), &feed));
        assert!(!notify(&anonymous, &feed));
    }

    #[test]
    fn pages_and_patterns() {
        let feed = FeedConfig {
            omit_pages: set(&["Main Page".to_string()]),
            omit_page_patterns: vec![Regex::new("^Sandbox").unwrap()],
            ..Default::default()
        };
        assert!(!notify(&edit(0, "Main Page"), &feed));
        assert!(!notify(&edit(0, "Sandbox/2"), &feed));
        assert!(notify(&edit(0, "My Sandbox"), &feed));
    }

    #[test]
    fn content_model_uses_namespace_default() {
        let feed = FeedConfig {
            omit_content_models: set(&["flow-board".to_string()]),
            ..Default::default()
        };
        assert!(!notify(&edit(2600, "Topic:Abc"), &feed));
        let explicit = ChangeEvent {
            content_model: Some("flow-board".to_string()),
            ..edit(1, "Talk:Foo")
        };
        assert!(!notify(&explicit, &feed));
        assert!(notify(&edit(0, "Foo"), &feed));
    }

    #[test]
    fn content_model_follows_site_remapping() {
        let mut site = Site::default();
        site.namespace_content_models
            .insert(1000, "flow-board".to_string());
        let feed = FeedConfig {
            omit_content_models: set(&["flow-board".to_string()]),
            ..Default::default()
        };
        assert!(!should_notify(&edit(1000, "Board:Foo"), &feed, &site));
        assert!(should_notify(&edit(1000, "Board:Foo"), &feed, &Site::default()));
        assert!(should_notify(&edit(0, "Foo"), &feed, &site));
    }
}
