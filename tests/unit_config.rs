// Configuration loading tests: the feed file, site overrides from the
// environment, and message catalogs. Temporary files go under the system
// temp directory.

use std::collections::HashMap;
use std::path::PathBuf;

use rcfeed::config::{Config, FeedSet};
use rcfeed::feed::{ConfigError, DeliveryMethod, RenderStyle};
use rcfeed::wiki::{ChangeKind, Localizer};

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("rcfeed-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn config_with(pairs: &[(&str, String)]) -> Config {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Config::from_vars(|key| map.get(key).cloned()).unwrap()
}

const FEEDS: &str = r#"{
    "site": {
        "name": "FemiWiki",
        "server": "https://femiwiki.com/",
        "article_path": "/w/$1",
        "namespaces": {"4": "FemiWiki"}
    },
    "feeds": {
        "main": {
            "url": ["https://discord.com/api/webhooks/1/a", "https://discord.com/api/webhooks/2/b"],
            "style": "structure",
            "omit_types": ["categorize", 3],
            "omit_talk": true
        },
        "audit": {
            "uri": "https://discord.com/api/webhooks/3/c",
            "method": "dry-run",
            "only_log_types": "block",
            "only_user_rights": ["sysop"]
        },
        "broken": {"url": "https://x", "style": "fancy"}
    }
}"#;

#[test]
fn feed_file_loads_site_and_feeds() {
    let set = FeedSet::parse(FEEDS).unwrap();
    assert_eq!(set.site.name, "FemiWiki");
    assert_eq!(set.site.server, "https://femiwiki.com");
    assert_eq!(set.site.article_path, "/w/$1");
    assert_eq!(set.site.script, "/index.php");
    assert_eq!(set.site.namespace_name(4), Some("FemiWiki"));

    let main = set.feed("main").unwrap();
    assert_eq!(main.webhook_urls.len(), 2);
    assert_eq!(main.style, RenderStyle::Structured);
    assert!(main.omit_types.contains(&ChangeKind::Categorize));
    assert!(main.omit_types.contains(&ChangeKind::Log));
    assert!(main.omit_talk);

    let audit = set.feed("audit").unwrap();
    assert_eq!(audit.method, DeliveryMethod::DryRun);
    assert_eq!(audit.style, RenderStyle::Embed);
    assert!(audit.only_log_types.contains("block"));
    assert!(audit.only_user_rights.contains("sysop"));
}

#[test]
fn broken_feed_is_reported_and_skipped() {
    let set = FeedSet::parse(FEEDS).unwrap();
    assert!(set.feed("broken").is_none());
    assert_eq!(set.feeds.len(), 2);
    assert_eq!(
        set.rejected,
        vec![ConfigError::UnknownStyle {
            feed: "broken".to_string(),
            style: "fancy".to_string(),
        }]
    );
}

#[test]
fn badly_typed_feeds_do_not_sink_the_file() {
    let set = FeedSet::parse(
        r#"{"feeds": {
            "good": {"url": "https://hook"},
            "bad": {"url": "https://h2", "omit_namespaces": "two"},
            "twice": {"url": "https://h3", "request_override": {}, "request_replace": {}}
        }}"#,
    )
    .unwrap();
    assert_eq!(set.feeds.len(), 1);
    assert!(set.feed("good").is_some());

    let mut rejected: Vec<&str> = set
        .rejected
        .iter()
        .map(|e| match e {
            ConfigError::Malformed { feed, .. } => feed.as_str(),
            other => panic!("unexpected rejection {other:?}"),
        })
        .collect();
    rejected.sort();
    assert_eq!(rejected, vec!["bad", "twice"]);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(FeedSet::parse("{\"feeds\": [").is_err());
}

#[test]
fn empty_file_object_has_no_feeds() {
    let set = FeedSet::parse("{}").unwrap();
    assert!(set.feeds.is_empty());
    assert_eq!(set.site.name, "Wiki");
}

#[test]
fn environment_overrides_site_block() {
    let path = temp_file("feeds.json", FEEDS);
    let config = config_with(&[
        ("RCFEED_CONFIG", path.display().to_string()),
        ("RCFEED_SITENAME", "Staging".to_string()),
        ("RCFEED_SERVER", "https://staging.femiwiki.com/".to_string()),
    ]);
    let set = config.load_feeds().unwrap();
    assert_eq!(set.site.name, "Staging");
    assert_eq!(set.site.server, "https://staging.femiwiki.com");
    assert_eq!(set.site.article_path, "/w/$1");
    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_feed_file_names_the_path() {
    let config = config_with(&[("RCFEED_CONFIG", "/nonexistent/rcfeed.json".to_string())]);
    let err = config.load_feeds().unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/rcfeed.json"));
}

#[test]
fn message_overrides_layer_on_english() {
    let path = temp_file(
        "messages.json",
        r#"{"discordrcfeed-line-edit": "$1 a modifié $3", "view": "voir"}"#,
    );
    let config = config_with(&[("RCFEED_MESSAGES", path.display().to_string())]);
    let catalog = config.load_catalog().unwrap();
    assert_eq!(
        catalog.resolve("discordrcfeed-line-edit", &["Alice", "Alice", "Foo"]).as_deref(),
        Some("Alice a modifié Foo")
    );
    assert_eq!(catalog.text("view", &[]), "voir");
    assert_eq!(catalog.text("hist", &[]), "hist");
    let _ = std::fs::remove_file(path);
}

#[test]
fn numeric_settings_are_clamped() {
    let config = config_with(&[
        ("RCFEED_CONCURRENCY", "0".to_string()),
        ("RCFEED_TIMEOUT_SECS", "0".to_string()),
    ]);
    assert_eq!(config.concurrency, 1);
    assert_eq!(config.timeout.as_secs(), 1);
}
