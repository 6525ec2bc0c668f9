// Feed configuration: one destination's filters, style and tools.
//
// Raw feed parameters are loose (a scalar where a list is expected, numeric
// change-type codes, `uri` instead of `url`). They are normalized exactly
// once here; everything downstream sees sets and typed descriptors.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use regex_lite::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::wiki::ChangeKind;

/// A feed that can't be used as configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("feed '{0}' has no webhook url")]
    MissingUrl(String),
    #[error("feed '{feed}': unknown style '{style}'")]
    UnknownStyle { feed: String, style: String },
    #[error("feed '{feed}': unknown delivery method '{method}'")]
    UnknownMethod { feed: String, method: String },
    #[error("invalid tool: {0}")]
    InvalidTool(String),
    #[error("invalid page pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("unknown change type '{0}'")]
    UnknownType(String),
    #[error("feed '{feed}' is malformed: {reason}")]
    Malformed { feed: String, reason: String },
}

/// How a change is laid out in the chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStyle {
    /// Plain `content` text.
    Inline,
    /// One embed with a colored description.
    #[default]
    Embed,
    /// An embed with a bare description plus named fields.
    Structured,
}

impl RenderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStyle::Inline => "inline",
            RenderStyle::Embed => "embed",
            RenderStyle::Structured => "structure",
        }
    }
}

impl fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(RenderStyle::Inline),
            "embed" => Ok(RenderStyle::Embed),
            "structure" | "structured" => Ok(RenderStyle::Structured),
            other => Err(other.to_string()),
        }
    }
}

/// How payloads leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMethod {
    /// POST to the webhook.
    #[default]
    Http,
    /// Log the payload, send nothing.
    DryRun,
}

impl FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(DeliveryMethod::Http),
            "dry-run" | "dryrun" | "dry_run" => Ok(DeliveryMethod::DryRun),
            other => Err(other.to_string()),
        }
    }
}

/// What a tool link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolTarget {
    /// The entity's talk page.
    Talk,
    /// The user's own page; only rendered where the entity isn't linked already.
    UserPage,
    /// The page itself; same rule as `UserPage`.
    View,
    /// Diff of the latest revision against its parent.
    Diff,
    /// `Special:{name}/{entity}`.
    Special(String),
    /// The entity's page with a literal query string.
    Query(String),
}

/// Where a tool's label text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolLabel {
    /// A message key resolved through the localizer.
    Message(String),
    /// Literal text.
    Text(String),
}

/// One secondary action link attached to a user or page mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub target: ToolTarget,
    pub label: ToolLabel,
}

impl ToolDescriptor {
    pub fn new(target: ToolTarget, msg: &str) -> Self {
        Self {
            target,
            label: ToolLabel::Message(msg.to_string()),
        }
    }
}

/// Tool entry as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTool {
    pub target: Option<String>,
    pub special: Option<String>,
    pub query: Option<String>,
    pub msg: Option<String>,
    pub text: Option<String>,
}

impl TryFrom<RawTool> for ToolDescriptor {
    type Error = ConfigError;

    fn try_from(raw: RawTool) -> Result<Self, Self::Error> {
        let label = match (raw.msg, raw.text) {
            (Some(msg), _) => ToolLabel::Message(msg),
            (None, Some(text)) => ToolLabel::Text(text),
            (None, None) => {
                return Err(ConfigError::InvalidTool(
                    "tool needs either 'msg' or 'text'".to_string(),
                ))
            }
        };

        let target = match raw.target.as_deref() {
            Some("talk") => ToolTarget::Talk,
            Some("user_page") => ToolTarget::UserPage,
            Some("view") => ToolTarget::View,
            Some("diff") => ToolTarget::Diff,
            Some("special") => match raw.special {
                Some(special) if !special.is_empty() => ToolTarget::Special(special),
                _ => {
                    return Err(ConfigError::InvalidTool(
                        "'special' target needs a 'special' page name".to_string(),
                    ))
                }
            },
            Some(other) => return Err(ConfigError::InvalidTool(format!("unknown target '{other}'"))),
            None => match raw.query {
                Some(query) => ToolTarget::Query(query),
                None => {
                    return Err(ConfigError::InvalidTool(
                        "tool needs a 'target' or a 'query'".to_string(),
                    ))
                }
            },
        };

        Ok(Self { target, label })
    }
}

/// Tools shown next to user mentions when the feed configures none.
pub fn default_user_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(ToolTarget::Talk, "talkpagelinktext"),
        ToolDescriptor::new(ToolTarget::Special("Block".to_string()), "blocklink"),
        ToolDescriptor::new(ToolTarget::Special("Contributions".to_string()), "contribslink"),
    ]
}

/// Tools shown next to page mentions when the feed configures none.
pub fn default_page_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(ToolTarget::View, "view"),
        ToolDescriptor::new(ToolTarget::Query("action=edit".to_string()), "edit"),
        ToolDescriptor::new(ToolTarget::Diff, "diff"),
        ToolDescriptor::new(ToolTarget::Query("action=history".to_string()), "hist"),
    ]
}

/// A config value that may be a single item or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

fn into_set<T: Ord>(value: Option<OneOrMany<T>>) -> BTreeSet<T> {
    value.map(OneOrMany::into_vec).unwrap_or_default().into_iter().collect()
}

/// A change type in config: a name (`"edit"`) or the host's numeric code.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KindName {
    Code(i64),
    Name(String),
}

impl TryFrom<KindName> for ChangeKind {
    type Error = ConfigError;

    fn try_from(value: KindName) -> Result<Self, Self::Error> {
        match value {
            KindName::Code(code) => ChangeKind::from_code(code)
                .ok_or_else(|| ConfigError::UnknownType(code.to_string())),
            KindName::Name(name) => name
                .parse()
                .map_err(|_| ConfigError::UnknownType(name.clone())),
        }
    }
}

/// Feed parameters exactly as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeed {
    pub url: Option<OneOrMany<String>>,
    pub uri: Option<OneOrMany<String>>,
    pub style: Option<String>,
    pub method: Option<String>,

    pub omit_types: Option<OneOrMany<KindName>>,
    pub only_types: Option<OneOrMany<KindName>>,
    pub omit_namespaces: Option<OneOrMany<i32>>,
    pub only_namespaces: Option<OneOrMany<i32>>,
    pub omit_log_types: Option<OneOrMany<String>>,
    pub only_log_types: Option<OneOrMany<String>>,
    pub omit_log_actions: Option<OneOrMany<String>>,
    pub only_log_actions: Option<OneOrMany<String>>,
    pub omit_usernames: Option<OneOrMany<String>>,
    pub only_usernames: Option<OneOrMany<String>>,
    pub omit_pages: Option<OneOrMany<String>>,
    pub only_pages: Option<OneOrMany<String>>,
    pub omit_content_models: Option<OneOrMany<String>>,
    pub only_content_models: Option<OneOrMany<String>>,
    pub omit_user_rights: Option<OneOrMany<String>>,
    pub only_user_rights: Option<OneOrMany<String>>,
    pub omit_page_patterns: Option<OneOrMany<String>>,
    #[serde(default)]
    pub omit_talk: bool,
    #[serde(default)]
    pub only_talk: bool,

    pub user_tools: Option<Vec<RawTool>>,
    pub page_tools: Option<Vec<RawTool>>,

    #[serde(alias = "request_replace")]
    pub request_override: Option<Value>,
}

/// Normalized, read-only configuration of one feed.
#[derive(Debug, Clone, Default)]
pub struct FeedConfig {
    pub name: String,
    pub webhook_urls: Vec<String>,
    pub style: RenderStyle,
    pub method: DeliveryMethod,

    pub omit_types: BTreeSet<ChangeKind>,
    pub only_types: BTreeSet<ChangeKind>,
    pub omit_namespaces: BTreeSet<i32>,
    pub only_namespaces: BTreeSet<i32>,
    pub omit_log_types: BTreeSet<String>,
    pub only_log_types: BTreeSet<String>,
    pub omit_log_actions: BTreeSet<String>,
    pub only_log_actions: BTreeSet<String>,
    pub omit_usernames: BTreeSet<String>,
    pub only_usernames: BTreeSet<String>,
    pub omit_pages: BTreeSet<String>,
    pub only_pages: BTreeSet<String>,
    pub omit_content_models: BTreeSet<String>,
    pub only_content_models: BTreeSet<String>,
    pub omit_user_rights: BTreeSet<String>,
    pub only_user_rights: BTreeSet<String>,
    pub omit_page_patterns: Vec<Regex>,
    pub omit_talk: bool,
    pub only_talk: bool,

    pub user_tools: Vec<ToolDescriptor>,
    pub page_tools: Vec<ToolDescriptor>,

    /// Tree merged over every generated payload as the last step.
    pub request_override: Option<Value>,
}

impl FeedConfig {
    /// Normalize raw feed parameters.
    ///
    /// Fails only for problems that make the whole feed unusable (no URL,
    /// unknown style or method). Bad individual entries (a malformed tool,
    /// an invalid pattern, an unknown change type) are logged and skipped.
    pub fn from_raw(name: &str, raw: RawFeed) -> Result<Self, ConfigError> {
        let webhook_urls: Vec<String> = raw
            .url
            .or(raw.uri)
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if webhook_urls.is_empty() {
            return Err(ConfigError::MissingUrl(name.to_string()));
        }

        let style = match raw.style.as_deref() {
            None | Some("") => RenderStyle::default(),
            Some(s) => s.parse().map_err(|style| ConfigError::UnknownStyle {
                feed: name.to_string(),
                style,
            })?,
        };

        let method = match raw.method.as_deref() {
            None | Some("") => DeliveryMethod::default(),
            Some(m) => m.parse().map_err(|method| ConfigError::UnknownMethod {
                feed: name.to_string(),
                method,
            })?,
        };

        Ok(Self {
            name: name.to_string(),
            webhook_urls,
            style,
            method,
            omit_types: kinds(name, raw.omit_types),
            only_types: kinds(name, raw.only_types),
            omit_namespaces: into_set(raw.omit_namespaces),
            only_namespaces: into_set(raw.only_namespaces),
            omit_log_types: into_set(raw.omit_log_types),
            only_log_types: into_set(raw.only_log_types),
            omit_log_actions: into_set(raw.omit_log_actions),
            only_log_actions: into_set(raw.only_log_actions),
            omit_usernames: into_set(raw.omit_usernames),
            only_usernames: into_set(raw.only_usernames),
            omit_pages: into_set(raw.omit_pages),
            only_pages: into_set(raw.only_pages),
            omit_content_models: into_set(raw.omit_content_models),
            only_content_models: into_set(raw.only_content_models),
            omit_user_rights: into_set(raw.omit_user_rights),
            only_user_rights: into_set(raw.only_user_rights),
            omit_page_patterns: patterns(name, raw.omit_page_patterns),
            omit_talk: raw.omit_talk,
            only_talk: raw.only_talk,
            user_tools: tools(name, raw.user_tools).unwrap_or_else(default_user_tools),
            page_tools: tools(name, raw.page_tools).unwrap_or_else(default_page_tools),
            request_override: raw.request_override.filter(|v| !v.is_null()),
        })
    }
}

fn kinds(feed: &str, value: Option<OneOrMany<KindName>>) -> BTreeSet<ChangeKind> {
    value
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|k| match ChangeKind::try_from(k) {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!(feed = feed, error = %e, "Ignoring change type filter entry");
                None
            }
        })
        .collect()
}

fn patterns(feed: &str, value: Option<OneOrMany<String>>) -> Vec<Regex> {
    value
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|pattern| match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                let err = ConfigError::InvalidPattern {
                    pattern,
                    reason: e.to_string(),
                };
                warn!(feed = feed, error = %err, "Ignoring page pattern");
                None
            }
        })
        .collect()
}

/// `None` when the feed gives no usable tools, so the caller falls back to
/// the defaults wholesale (a partial list is never mixed with them).
fn tools(feed: &str, value: Option<Vec<RawTool>>) -> Option<Vec<ToolDescriptor>> {
    let parsed: Vec<ToolDescriptor> = value?
        .into_iter()
        .filter_map(|raw| match ToolDescriptor::try_from(raw) {
            Ok(tool) => Some(tool),
            Err(e) => {
                warn!(feed = feed, error = %e, "Ignoring tool");
                None
            }
        })
        .collect();
    if parsed.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawFeed {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn scalars_become_singleton_sets() {
        let feed = FeedConfig::from_raw(
            "discord",
            raw(r#"{"url": "https://hook", "omit_namespaces": 2, "omit_log_types": "patrol"}"#),
        )
        .unwrap();
        assert_eq!(feed.omit_namespaces, BTreeSet::from([2]));
        assert_eq!(feed.omit_log_types, BTreeSet::from(["patrol".to_string()]));
        assert!(feed.only_namespaces.is_empty());
        assert_eq!(feed.webhook_urls, vec!["https://hook".to_string()]);
    }

    #[test]
    fn uri_is_accepted_for_url() {
        let feed = FeedConfig::from_raw("discord", raw(r#"{"uri": ["a", "b"]}"#)).unwrap();
        assert_eq!(feed.webhook_urls.len(), 2);
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = FeedConfig::from_raw("discord", raw(r#"{"style": "embed"}"#)).unwrap_err();
        assert_eq!(err, ConfigError::MissingUrl("discord".to_string()));
    }

    #[test]
    fn unknown_style_is_an_error() {
        let err =
            FeedConfig::from_raw("discord", raw(r#"{"url": "x", "style": "fancy"}"#)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStyle { .. }));
    }

    #[test]
    fn unknown_method_is_an_error() {
        let err =
            FeedConfig::from_raw("discord", raw(r#"{"url": "x", "method": "curl"}"#)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMethod { .. }));
    }

    #[test]
    fn change_types_accept_names_and_codes() {
        let feed = FeedConfig::from_raw(
            "discord",
            raw(r#"{"url": "x", "omit_types": [1, "log", "bogus", 99]}"#),
        )
        .unwrap();
        assert_eq!(
            feed.omit_types,
            BTreeSet::from([ChangeKind::New, ChangeKind::Log])
        );
    }

    #[test]
    fn given_tools_replace_defaults_entirely() {
        let feed = FeedConfig::from_raw(
            "discord",
            raw(r#"{"url": "x", "page_tools": [{"query": "action=delete", "msg": "delete"}]}"#),
        )
        .unwrap();
        assert_eq!(
            feed.page_tools,
            vec![ToolDescriptor::new(
                ToolTarget::Query("action=delete".to_string()),
                "delete"
            )]
        );
        assert_eq!(feed.user_tools, default_user_tools());
    }

    #[test]
    fn empty_tool_list_falls_back_to_defaults() {
        let feed =
            FeedConfig::from_raw("discord", raw(r#"{"url": "x", "user_tools": []}"#)).unwrap();
        assert_eq!(feed.user_tools, default_user_tools());
    }

    #[test]
    fn invalid_tools_and_patterns_are_skipped() {
        let feed = FeedConfig::from_raw(
            "discord",
            raw(r#"{"url": "x",
                "user_tools": [{"target": "special", "msg": "x"}, {"target": "talk", "text": "Talk"}],
                "omit_page_patterns": ["^Sandbox", "(unclosed"]}"#),
        )
        .unwrap();
        assert_eq!(feed.user_tools.len(), 1);
        assert_eq!(feed.user_tools[0].target, ToolTarget::Talk);
        assert_eq!(feed.omit_page_patterns.len(), 1);
    }

    #[test]
    fn request_replace_is_an_alias() {
        let feed = FeedConfig::from_raw(
            "discord",
            raw(r#"{"url": "x", "request_replace": {"username": "DummyBot"}}"#),
        )
        .unwrap();
        assert_eq!(
            feed.request_override,
            Some(serde_json::json!({"username": "DummyBot"}))
        );
    }

    #[test]
    fn structured_style_spellings() {
        assert_eq!("structure".parse(), Ok(RenderStyle::Structured));
        assert_eq!("Structured".parse(), Ok(RenderStyle::Structured));
        assert_eq!("inline".parse(), Ok(RenderStyle::Inline));
    }
}
