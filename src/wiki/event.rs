// Change events: one wiki mutation as the host reports it.
//
// The host's hook dispatcher builds one ChangeEvent per recent change and
// hands it to the feed pipeline. Nothing downstream mutates it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::site::{is_talk_namespace, Site, Title};

/// The kind of recent change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Edit,
    New,
    Log,
    Flow,
    Categorize,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Edit => "edit",
            ChangeKind::New => "new",
            ChangeKind::Log => "log",
            ChangeKind::Flow => "flow",
            ChangeKind::Categorize => "categorize",
        }
    }

    /// Map the host's numeric recent-change type codes.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ChangeKind::Edit),
            1 => Some(ChangeKind::New),
            3 => Some(ChangeKind::Log),
            6 => Some(ChangeKind::Categorize),
            142 => Some(ChangeKind::Flow),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "edit" => Ok(ChangeKind::Edit),
            "new" => Ok(ChangeKind::New),
            "log" => Ok(ChangeKind::Log),
            "flow" => Ok(ChangeKind::Flow),
            "categorize" => Ok(ChangeKind::Categorize),
            other => Err(format!("unknown change type '{other}'")),
        }
    }
}

/// The user who made the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performer {
    pub name: String,
    /// Capability flags held by the user (`bot`, `sysop`, ...).
    #[serde(default)]
    pub rights: BTreeSet<String>,
}

impl Performer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rights: BTreeSet::new(),
        }
    }

    /// `true` when any of `rights` is held.
    pub fn has_any_right(&self, rights: &BTreeSet<String>) -> bool {
        !self.rights.is_disjoint(rights)
    }
}

/// Log entry details, present on log actions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInfo {
    #[serde(rename = "type")]
    pub log_type: String,
    pub action: String,
    /// Extra entry parameters (`target` for moves, `duration` for blocks).
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Action text the host already rendered as HTML, if any.
    #[serde(default)]
    pub action_html: Option<String>,
    /// Plain action text the host already rendered, if any.
    #[serde(default)]
    pub action_text: Option<String>,
}

impl LogInfo {
    /// `type/action`, the key used by log action filters.
    pub fn full_type(&self) -> String {
        format!("{}/{}", self.log_type, self.action)
    }

    pub fn param(&self, key: &str) -> Option<String> {
        match self.params.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Discussion (Flow) activity details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowInfo {
    pub action: String,
    /// Description the host's discussion formatter already rendered.
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub topic_title: Option<String>,
    #[serde(default)]
    pub topic_url: Option<String>,
}

/// One recent change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub namespace: i32,
    /// Prefixed page text, e.g. `Talk:Foo`.
    pub title: String,
    #[serde(default)]
    pub content_model: Option<String>,
    #[serde(default)]
    pub user: Option<Performer>,
    /// Edit summary or log reason, possibly containing HTML.
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub old_len: Option<i64>,
    #[serde(default)]
    pub new_len: Option<i64>,
    #[serde(default)]
    pub log: Option<LogInfo>,
    #[serde(default)]
    pub flow: Option<FlowInfo>,
    #[serde(default)]
    pub this_revision_id: Option<u64>,
    #[serde(default)]
    pub last_revision_id: Option<u64>,
    #[serde(default)]
    pub minor: bool,
    #[serde(default)]
    pub bot: bool,
}

impl ChangeEvent {
    pub fn is_talk(&self) -> bool {
        is_talk_namespace(self.namespace)
    }

    /// The event's own model, else the site's model for the namespace.
    pub fn content_model(&self, site: &Site) -> String {
        self.page(site).content_model(site)
    }

    pub fn username(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or_default()
    }

    /// The affected page as a Title.
    pub fn page(&self, site: &Site) -> Title {
        let title = Title::from_prefixed(site, self.namespace, &self.title);
        match &self.content_model {
            Some(model) => title.with_content_model(model),
            None => title,
        }
    }
}

/// Parse a batch of events: a JSON array, a single object, or one object
/// per line. Blank lines are skipped.
pub fn parse_events(input: &str) -> Result<Vec<ChangeEvent>> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse event array");
    }
    if let Ok(event) = serde_json::from_str::<ChangeEvent>(trimmed) {
        return Ok(vec![event]);
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Failed to parse event on line {}", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_edit() {
        let json = r#"{"type": "edit", "namespace": 1, "title": "Talk:Foo",
            "user": {"name": "Alice"}, "old_len": 10, "new_len": 20}"#;
        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, ChangeKind::Edit);
        assert!(event.is_talk());
        assert_eq!(event.username(), "Alice");
        assert_eq!(event.content_model(&Site::default()), "wikitext");
        assert!(!event.minor);
    }

    #[test]
    fn log_param_stringifies_scalars() {
        let json = r#"{"type": "block", "action": "block",
            "params": {"duration": "1 week", "flags": 3, "none": null}}"#;
        let log: LogInfo = serde_json::from_str(json).unwrap();
        assert_eq!(log.param("duration").as_deref(), Some("1 week"));
        assert_eq!(log.param("flags").as_deref(), Some("3"));
        assert_eq!(log.param("none"), None);
        assert_eq!(log.full_type(), "block/block");
    }

    #[test]
    fn kind_codes_and_names() {
        assert_eq!(ChangeKind::from_code(142), Some(ChangeKind::Flow));
        assert_eq!(ChangeKind::from_code(2), None);
        assert_eq!("Categorize".parse::<ChangeKind>(), Ok(ChangeKind::Categorize));
        assert!("patrol".parse::<ChangeKind>().is_err());
    }

    #[test]
    fn page_strips_matching_prefix() {
        let site = Site::default();
        let event = ChangeEvent {
            kind: ChangeKind::Edit,
            namespace: 2,
            title: "User:Alice/Sandbox".to_string(),
            content_model: None,
            user: None,
            comment: String::new(),
            old_len: None,
            new_len: None,
            log: None,
            flow: None,
            this_revision_id: None,
            last_revision_id: None,
            minor: false,
            bot: false,
        };
        let page = event.page(&site);
        assert_eq!(page.text(), "Alice/Sandbox");
        assert_eq!(page.full_text(&site), "User:Alice/Sandbox");
    }

    #[test]
    fn parses_every_batch_shape() {
        let one = r#"{"type": "edit", "title": "Foo"}"#;
        assert_eq!(parse_events(one).unwrap().len(), 1);

        let array = r#"[{"type": "edit", "title": "Foo"}, {"type": "new", "title": "Bar"}]"#;
        assert_eq!(parse_events(array).unwrap()[1].kind, ChangeKind::New);

        let lines = "{\"type\": \"edit\", \"title\": \"Foo\"}\n\n{\"type\": \"log\", \"title\": \"Bar\"}\n";
        let events = parse_events(lines).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, ChangeKind::Log);

        assert!(parse_events("  \n").unwrap().is_empty());
    }

    #[test]
    fn reports_the_bad_line() {
        let lines = "{\"type\": \"edit\", \"title\": \"Foo\"}\n{\"type\": 7\n";
        let err = parse_events(lines).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
