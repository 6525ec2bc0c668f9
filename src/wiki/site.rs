// Site model: where the wiki lives and how its page URLs are shaped.
//
// Three host settings decide every link we emit: the server origin, the
// article path and the script path. A Title carries a namespace id and the
// unprefixed page text; the Site turns it into display text and URLs.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use url::Url;

pub const NS_SPECIAL: i32 = -1;
pub const NS_MAIN: i32 = 0;
pub const NS_USER: i32 = 2;
pub const NS_USER_TALK: i32 = 3;
pub const NS_TOPIC: i32 = 2600;

pub const CONTENT_MODEL_WIKITEXT: &str = "wikitext";
pub const CONTENT_MODEL_FLOW_BOARD: &str = "flow-board";

/// Bytes left literal in title URLs, matching the host's own encoder.
const TITLE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b';')
    .remove(b'@')
    .remove(b'$')
    .remove(b'!')
    .remove(b'*')
    .remove(b'(')
    .remove(b')')
    .remove(b',')
    .remove(b'/')
    .remove(b':');

/// Canonical namespace names of a stock install (English content language).
fn default_namespace_name(ns: i32) -> Option<&'static str> {
    let name = match ns {
        -2 => "Media",
        -1 => "Special",
        0 => "",
        1 => "Talk",
        2 => "User",
        3 => "User talk",
        4 => "Project",
        5 => "Project talk",
        6 => "File",
        7 => "File talk",
        8 => "MediaWiki",
        9 => "MediaWiki talk",
        10 => "Template",
        11 => "Template talk",
        12 => "Help",
        13 => "Help talk",
        14 => "Category",
        15 => "Category talk",
        2600 => "Topic",
        _ => return None,
    };
    Some(name)
}

/// Built-in content model of a namespace when nothing more specific is known.
pub fn default_content_model(ns: i32) -> &'static str {
    if ns == NS_TOPIC {
        CONTENT_MODEL_FLOW_BOARD
    } else {
        CONTENT_MODEL_WIKITEXT
    }
}

/// Talk namespaces are the non-negative odd ids.
pub fn is_talk_namespace(ns: i32) -> bool {
    ns >= 0 && ns % 2 == 1
}

/// Where the wiki is served from and how it names its namespaces.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Site {
    /// Display name, used as the webhook `username`.
    pub name: String,
    /// Origin of every absolute link, e.g. `https://wiki.example.org`.
    pub server: String,
    /// Pretty-URL shape with `$1` standing for the page key.
    pub article_path: String,
    /// Entry point used for links that carry a query string.
    pub script: String,
    /// Content language. Messages are always rendered in this language.
    pub language: String,
    /// Overrides on top of the stock namespace names.
    pub namespaces: BTreeMap<i32, String>,
    /// Overrides on top of the stock per-namespace content models.
    pub namespace_content_models: BTreeMap<i32, String>,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            name: "Wiki".to_string(),
            server: "http://localhost".to_string(),
            article_path: "/index.php/$1".to_string(),
            script: "/index.php".to_string(),
            language: "en".to_string(),
            namespaces: BTreeMap::new(),
            namespace_content_models: BTreeMap::new(),
        }
    }
}

impl Site {
    pub fn new(server: &str) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Display name of a namespace, or `None` for an id this site doesn't know.
    pub fn namespace_name(&self, ns: i32) -> Option<&str> {
        self.namespaces
            .get(&ns)
            .map(String::as_str)
            .or_else(|| default_namespace_name(ns))
    }

    /// Look up a namespace id by its (case-insensitive) prefix.
    pub fn namespace_id(&self, prefix: &str) -> Option<i32> {
        let wanted = normalize_text(prefix).to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        for (id, name) in &self.namespaces {
            if name.to_lowercase() == wanted {
                return Some(*id);
            }
        }
        (-2..=15)
            .chain(std::iter::once(NS_TOPIC))
            .filter(|id| !self.namespaces.contains_key(id))
            .find(|id| default_namespace_name(*id).is_some_and(|n| n.to_lowercase() == wanted))
    }

    pub fn content_model_for(&self, ns: i32) -> &str {
        self.namespace_content_models
            .get(&ns)
            .map(String::as_str)
            .unwrap_or_else(|| default_content_model(ns))
    }

    /// Make a possibly-relative URL absolute against the server.
    ///
    /// Anything that can't be parsed comes back unchanged.
    pub fn resolve_url(&self, href: &str) -> String {
        match Url::parse(&self.server).and_then(|base| base.join(href)) {
            Ok(url) => url.to_string(),
            Err(_) => href.to_string(),
        }
    }

    /// Whether a URL points at this wiki's origin (scheme, host and port all
    /// match). Relative URLs are local.
    pub fn is_local_url(&self, href: &str) -> bool {
        let Ok(server) = Url::parse(&self.server) else {
            return false;
        };
        let Ok(url) = server.join(href) else {
            return false;
        };
        url.scheme() == server.scheme()
            && url.host_str() == server.host_str()
            && url.port_or_known_default() == server.port_or_known_default()
    }

    /// The page key inside an article-path URL path, if the path has one of
    /// the article shapes this site serves (`/wiki/`, `/w/`, `/index.php/` or
    /// the configured article path).
    pub fn article_key<'p>(&self, path: &'p str) -> Option<&'p str> {
        let configured = self.article_path.trim_end_matches("$1");
        let prefixes = [configured, "/wiki/", "/w/", "/index.php/"];
        prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .find_map(|p| path.strip_prefix(p))
            .filter(|key| !key.is_empty())
    }
}

/// A page on the wiki: namespace, unprefixed text and an optional section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    namespace: i32,
    text: String,
    fragment: Option<String>,
    content_model: Option<String>,
}

impl Title {
    pub fn new(namespace: i32, text: &str) -> Self {
        Self {
            namespace,
            text: normalize_text(text),
            fragment: None,
            content_model: None,
        }
    }

    pub fn user_page(name: &str) -> Self {
        Self::new(NS_USER, name)
    }

    /// `Special:{page}` or `Special:{page}/{sub}`.
    pub fn special(page: &str, sub: Option<&str>) -> Self {
        match sub {
            Some(sub) if !sub.is_empty() => Self::new(NS_SPECIAL, &format!("{page}/{sub}")),
            _ => Self::new(NS_SPECIAL, page),
        }
    }

    /// Parse prefixed text such as `Talk:Foo#Bar`.
    ///
    /// Returns `None` when nothing but a prefix or fragment is left.
    pub fn parse(site: &Site, full_text: &str) -> Option<Self> {
        let full_text = full_text.trim().trim_start_matches(':');
        let (page, fragment) = match full_text.split_once('#') {
            Some((page, fragment)) => (page, Some(fragment)),
            None => (full_text, None),
        };

        let (namespace, text) = match page.split_once(':') {
            Some((prefix, rest)) => match site.namespace_id(prefix) {
                Some(ns) => (ns, rest),
                None => (NS_MAIN, page),
            },
            None => (NS_MAIN, page),
        };

        let mut title = Self::new(namespace, text);
        if title.text.is_empty() {
            return None;
        }
        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            title.fragment = Some(normalize_text(fragment));
        }
        Some(title)
    }

    /// Build a title from the host's namespace id and prefixed page text.
    pub fn from_prefixed(site: &Site, namespace: i32, full_text: &str) -> Self {
        match Self::parse(site, full_text) {
            Some(parsed) if parsed.namespace == namespace => parsed.without_fragment(),
            _ => Self::new(namespace, full_text),
        }
    }

    /// Parse the page key of an article URL (`Main_Page#Section`,
    /// `Talk:%EB%8C%80%EB%AC%B8`).
    pub fn from_url_key(site: &Site, key: &str) -> Option<Self> {
        let key = key.split(['?', '&']).next().unwrap_or_default();
        let decoded = percent_decode_str(key).decode_utf8_lossy();
        Self::parse(site, &decoded)
    }

    pub fn with_fragment(mut self, fragment: &str) -> Self {
        self.fragment = Some(normalize_text(fragment)).filter(|f| !f.is_empty());
        self
    }

    pub fn with_content_model(mut self, model: &str) -> Self {
        self.content_model = Some(model.to_string());
        self
    }

    pub fn without_fragment(mut self) -> Self {
        self.fragment = None;
        self
    }

    pub fn namespace(&self) -> i32 {
        self.namespace
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn has_fragment(&self) -> bool {
        self.fragment.is_some()
    }

    pub fn is_special(&self) -> bool {
        self.namespace == NS_SPECIAL
    }

    pub fn is_talk(&self) -> bool {
        is_talk_namespace(self.namespace)
    }

    /// Same page, ignoring fragment and content model.
    pub fn same_page(&self, other: &Title) -> bool {
        self.namespace == other.namespace && self.text == other.text
    }

    /// The associated talk page. Special pages have none; a talk page is its
    /// own talk page.
    pub fn talk_page(&self) -> Option<Title> {
        if self.namespace < 0 {
            return None;
        }
        if self.is_talk() {
            return Some(self.clone().without_fragment());
        }
        Some(Self::new(self.namespace + 1, &self.text))
    }

    pub fn content_model(&self, site: &Site) -> String {
        self.content_model
            .clone()
            .unwrap_or_else(|| site.content_model_for(self.namespace).to_string())
    }

    /// Prefixed display text, `Talk:Foo`.
    pub fn full_text(&self, site: &Site) -> String {
        match site.namespace_name(self.namespace) {
            Some(name) if !name.is_empty() => format!("{name}:{}", self.text),
            _ => self.text.clone(),
        }
    }

    /// Prefixed text in URL form, `Talk:Foo_bar`.
    pub fn db_key(&self, site: &Site) -> String {
        self.full_text(site).replace(' ', "_")
    }

    /// Absolute URL of the page; `query` switches to the script entry point.
    pub fn full_url(&self, site: &Site, query: &str) -> String {
        let key = encode_title(&self.db_key(site));
        let mut url = if query.is_empty() {
            format!("{}{}", site.server, site.article_path.replace("$1", &key))
        } else {
            format!("{}{}?title={}&{}", site.server, site.script, key, query)
        };
        if let Some(fragment) = &self.fragment {
            url.push('#');
            url.push_str(&encode_title(&fragment.replace(' ', "_")));
        }
        url
    }
}

/// Percent-encode a page key the way the host does.
pub fn encode_title(key: &str) -> String {
    utf8_percent_encode(key, TITLE_ENCODE_SET).to_string()
}

fn normalize_text(text: &str) -> String {
    text.replace('_', " ").trim().to_string()
}
