// Message localization.
//
// The Localizer trait is the seam to the host's message catalog. Catalog is
// the in-process implementation: a built-in English table, optionally
// overlaid with a JSON file of `{"key": "text"}` pairs. Messages are always
// rendered in the site's content language, never the editor's.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex_lite::{Captures, Regex};

static PLURAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"\{\{PLURAL:\$(\d)\|([^|}]*)(?:\|([^}]*))?\}\}") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});

static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"\$(\d)") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

/// Resolves a message key plus positional parameters to localized text.
pub trait Localizer: Send + Sync {
    /// The rendered message, or `None` if the key doesn't exist.
    fn resolve(&self, key: &str, params: &[&str]) -> Option<String>;

    fn exists(&self, key: &str) -> bool {
        self.resolve(key, &[]).is_some()
    }

    /// Like `resolve`, but a missing key renders as `⧼key⧽`.
    fn text(&self, key: &str, params: &[&str]) -> String {
        self.resolve(key, params)
            .unwrap_or_else(|| format!("⧼{key}⧽"))
    }
}

/// In-memory message table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    /// An empty catalog (every lookup misses).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in English messages.
    pub fn english() -> Self {
        Self::from_pairs(DEFAULT_MESSAGES.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            messages: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Overlay messages from a JSON object file. Later keys win.
    pub fn load_overrides(&mut self, path: &Path) -> Result<usize> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message file {}", path.display()))?;
        let overrides: HashMap<String, serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse message file {}", path.display()))?;
        // "@metadata"-style keys carry no text
        let messages: Vec<(String, String)> = overrides
            .into_iter()
            .filter(|(k, _)| !k.starts_with('@'))
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(text) => Some((k, text)),
                _ => None,
            })
            .collect();
        let count = messages.len();
        self.messages.extend(messages);
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Localizer for Catalog {
    fn resolve(&self, key: &str, params: &[&str]) -> Option<String> {
        let template = self.messages.get(key)?;
        Some(substitute(template, params))
    }
}

/// Fill `$1..$9` and `{{PLURAL:$n|one|other}}` in a message template.
pub fn substitute(template: &str, params: &[&str]) -> String {
    let text = PLURAL_RE.replace_all(template, |caps: &Captures| {
        let one = caps.get(2).map_or("", |m| m.as_str());
        let other = caps.get(3).map_or(one, |m| m.as_str());
        let count = param_at(params, caps, 1)
            .map(|p| p.replace(',', ""))
            .and_then(|p| p.trim().parse::<i64>().ok());
        if count == Some(1) {
            one.to_string()
        } else {
            other.to_string()
        }
    });

    PARAM_RE
        .replace_all(&text, |caps: &Captures| {
            param_at(params, caps, 1).map_or_else(|| caps[0].to_string(), str::to_string)
        })
        .into_owned()
}

fn param_at<'p>(params: &[&'p str], caps: &Captures, group: usize) -> Option<&'p str> {
    let index: usize = caps.get(group)?.as_str().parse().ok()?;
    params.get(index.checked_sub(1)?).copied()
}

/// Group digits with commas: `-1234567` becomes `-1,234,567`.
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    // Generic interface messages
    ("parentheses", "($1)"),
    ("pipe-separator", " | "),
    ("nbytes", "$1 {{PLURAL:$1|byte|bytes}}"),
    ("summary", "Summary"),
    ("listfiles_size", "Size"),
    // Tool labels
    ("talkpagelinktext", "talk"),
    ("blocklink", "block"),
    ("contribslink", "contribs"),
    ("userrights-link", "groups"),
    ("edit", "edit"),
    ("delete", "delete"),
    ("hist", "hist"),
    ("diff", "diff"),
    ("view", "view"),
    // Edit lines: $1 user, $2 user name, $3 page
    ("discordrcfeed-line-edit", "$1 edited $3"),
    ("discordrcfeed-line-edit-minor", "$1 made a minor edit to $3"),
    ("discordrcfeed-line-edit-bot", "$1 edited $3 (bot)"),
    ("discordrcfeed-line-edit-minor-bot", "$1 made a minor edit to $3 (bot)"),
    ("discordrcfeed-line-create", "$1 created page $3"),
    // Emoji
    ("discordrcfeed-emoji-edit", "📝"),
    ("discordrcfeed-emoji-edit-minor", "✏️"),
    ("discordrcfeed-emoji-edit-bot", "🤖"),
    ("discordrcfeed-emoji-edit-minor-bot", "🤖"),
    ("discordrcfeed-emoji-create", "🆕"),
    ("discordrcfeed-emoji-log", "📋"),
    ("discordrcfeed-emoji-log-block", "🚫"),
    ("discordrcfeed-emoji-log-block-unblock", "🔓"),
    ("discordrcfeed-emoji-log-delete", "🗑️"),
    ("discordrcfeed-emoji-log-delete-restore", "♻️"),
    ("discordrcfeed-emoji-log-import", "📥"),
    ("discordrcfeed-emoji-log-merge", "🔀"),
    ("discordrcfeed-emoji-log-move", "➡️"),
    ("discordrcfeed-emoji-log-newusers", "👋"),
    ("discordrcfeed-emoji-log-protect", "🔒"),
    ("discordrcfeed-emoji-log-protect-unprotect", "🔓"),
    ("discordrcfeed-emoji-log-rights", "🎖️"),
    ("discordrcfeed-emoji-log-upload", "🖼️"),
    ("discordrcfeed-emoji-flow", "💬"),
    ("discordrcfeed-emoji-flow-lock-topic", "✅"),
    ("discordrcfeed-emoji-flow-edit-title", "✏️"),
    // Log entries: $1 user, $2 user name, $3 page, $4 target, $5 duration
    ("discordrcfeed-line-log", "$1 performed \"$4\" on $3"),
    ("logentry-block-block", "$1 blocked $3 with an expiration time of $5"),
    (
        "logentry-block-reblock",
        "$1 changed block settings for $3 with an expiration time of $5",
    ),
    ("logentry-block-unblock", "$1 unblocked $3"),
    ("logentry-create-create", "$1 created page $3"),
    ("logentry-delete-delete", "$1 deleted page $3"),
    ("logentry-delete-restore", "$1 restored page $3"),
    ("logentry-import-upload", "$1 imported $3 by file upload"),
    ("logentry-import-interwiki", "$1 imported $3 from another wiki"),
    ("logentry-merge-merge", "$1 merged $3 into $4"),
    ("logentry-move-move", "$1 moved page $3 to $4"),
    ("logentry-move-move_redir", "$1 moved page $3 to $4 over redirect"),
    ("logentry-newusers-create", "User account $1 was created"),
    ("logentry-newusers-autocreate", "User account $1 was created automatically"),
    ("logentry-protect-protect", "$1 protected $3"),
    ("logentry-protect-modify", "$1 changed protection level for $3"),
    ("logentry-protect-unprotect", "$1 removed protection from $3"),
    ("logentry-rights-rights", "$1 changed group membership for $3"),
    ("logentry-upload-upload", "$1 uploaded $3"),
    ("logentry-upload-overwrite", "$1 uploaded a new version of $3"),
    // Discussion lines: $1 user, $2 user name, $3 topic, $4 action
    ("discordrcfeed-flow-action", "$1 performed \"$4\" on $3"),
    ("discordrcfeed-flow-new-post", "$1 started a new topic $3"),
    ("discordrcfeed-flow-reply", "$1 replied on $3"),
    ("discordrcfeed-flow-edit-post", "$1 edited a post on $3"),
    ("discordrcfeed-flow-edit-title", "$1 changed the title of $3"),
    ("discordrcfeed-flow-edit-header", "$1 edited the header of $3"),
    ("discordrcfeed-flow-lock-topic", "$1 resolved $3"),
    ("discordrcfeed-flow-restore-topic", "$1 reopened $3"),
    ("discordrcfeed-flow-hide-post", "$1 hid a post on $3"),
    ("discordrcfeed-flow-delete-post", "$1 deleted a post on $3"),
];
