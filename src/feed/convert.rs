// HTML to chat markup.
//
// The host renders comments, log lines and discussion descriptions as HTML.
// Chat webhooks take a small markdown dialect, so the HTML is rewritten in
// four ordered passes and whatever is left is stripped to text:
//
//   1. drop the host's own user tool widgets,
//   2. user anchors become user text with our tools,
//   3. article anchors become page text with our tools,
//   4. remaining same-origin anchors become bare links, foreign ones text.
//
// Pass 1 runs before 2 because the widget sits right next to the user
// anchor; pass 3 before 4 because title anchors also match the generic one.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex_lite::{Captures, Regex};
use tracing::debug;
use url::Url;

use crate::wiki::site::CONTENT_MODEL_FLOW_BOARD;
use crate::wiki::Title;

use super::tools::{make_link, Linker};

static USER_TOOLS_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(
        r#"(?s)\s?<span[^>]+class=['"][^'"]*mw-usertoollinks[^'"]*['"][^>]*>(?:<span[^>]*>.*?</span>|.)*?</span>"#,
    ) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});

static USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(
        r#"<a[^>]+class=['"][^'"]*mw-userlink[^'"]*['"][^>]*><bdi>([^<]+)</bdi></a>"#,
    ) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r#"<a[^>]+href=['"]([^'"]+)['"][^>]*title=[^>]*>([^<]+)</a>"#) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r#"<a[^>]+href=['"]([^'"]+)['"][^>]*>([^<]*)</a>"#) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"<[^>]*>") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

/// Rewrites host HTML into chat markup using a feed's linker.
pub struct MarkupConverter<'a> {
    linker: Linker<'a>,
}

impl<'a> MarkupConverter<'a> {
    pub fn new(linker: Linker<'a>) -> Self {
        Self { linker }
    }

    pub fn linker(&self) -> &Linker<'a> {
        &self.linker
    }

    /// Convert an HTML fragment. The result never contains HTML tags.
    ///
    /// With `omit_tools`, user and page mentions become plain links.
    pub fn convert(&self, html: &str, omit_tools: bool) -> String {
        let text = USER_TOOLS_RE.replace_all(html, "");
        let text = self.replace_user_links(&text, omit_tools);
        let text = self.replace_title_links(&text, omit_tools);
        let text = self.replace_links(&text);
        strip_tags(&text)
    }

    fn replace_user_links(&self, text: &str, omit_tools: bool) -> String {
        USER_RE
            .replace_all(text, |caps: &Captures| {
                let name = decode_entities(caps[1].trim());
                if omit_tools {
                    self.linker.user_link(&name)
                } else {
                    self.linker.user_text_with_tools(&name)
                }
            })
            .into_owned()
    }

    fn replace_title_links(&self, text: &str, omit_tools: bool) -> String {
        let site = self.linker.context().site;
        TITLE_RE
            .replace_all(text, |caps: &Captures| {
                let Some(title) = self.title_from_href(&caps[1]) else {
                    return caps[0].to_string();
                };
                let label = decode_entities(&caps[2]);
                // Sections and discussion boards never get page tools
                let bare = omit_tools
                    || title.has_fragment()
                    || title.content_model(site) == CONTENT_MODEL_FLOW_BOARD;
                if bare {
                    make_link(&title.full_url(site, ""), &label)
                } else {
                    self.linker.page_text_with_tools(&title)
                }
            })
            .into_owned()
    }

    fn replace_links(&self, text: &str) -> String {
        let site = self.linker.context().site;
        LINK_RE
            .replace_all(text, |caps: &Captures| {
                let href = decode_entities(&caps[1]);
                let label = decode_entities(&caps[2]);
                if site.is_local_url(&href) {
                    make_link(&site.resolve_url(&href), &label)
                } else {
                    debug!(href = %href, "Dropping off-site link");
                    label
                }
            })
            .into_owned()
    }

    /// A local article-path href (`/wiki/Foo#Bar`) as a Title.
    fn title_from_href(&self, href: &str) -> Option<Title> {
        let site = self.linker.context().site;
        let href = decode_entities(href);
        if !site.is_local_url(&href) {
            return None;
        }
        let url = Url::parse(&site.resolve_url(&href)).ok()?;
        if url.query().is_some() {
            return None;
        }
        let key = site.article_key(url.path())?;
        let title = Title::from_url_key(site, key)?;
        Some(match url.fragment() {
            Some(fragment) => {
                let fragment = percent_decode_str(fragment).decode_utf8_lossy();
                title.with_fragment(&fragment)
            }
            None => title,
        })
    }
}

/// Remove every tag and decode entities.
pub fn strip_tags(html: &str) -> String {
    decode_entities(&TAG_RE.replace_all(html, ""))
}

/// Decode the HTML entities the host emits (`&amp;`, `&#039;`, `&#x2192;`...).
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
