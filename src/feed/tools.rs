// Tool links: the small action links (talk, block, diff, history...) shown
// next to a user or page mention, and the chat-markup link helpers they
// are built from.

use tracing::debug;

use crate::wiki::{Localizer, RevisionLookup, Site, Title};

use super::settings::{FeedConfig, ToolDescriptor, ToolLabel, ToolTarget};

/// The host collaborators every renderer needs. Cheap to copy.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub site: &'a Site,
    pub localizer: &'a dyn Localizer,
    pub revisions: &'a dyn RevisionLookup,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        site: &'a Site,
        localizer: &'a dyn Localizer,
        revisions: &'a dyn RevisionLookup,
    ) -> Self {
        Self {
            site,
            localizer,
            revisions,
        }
    }

    /// Localized text, `⧼key⧽` when missing.
    pub fn msg(&self, key: &str, params: &[&str]) -> String {
        self.localizer.text(key, params)
    }
}

/// What a set of tools is attached to.
#[derive(Debug, Clone, Copy)]
pub enum ToolSubject<'t> {
    User(&'t str),
    Page(&'t Title),
}

/// Escape the characters chat markdown can't carry inside a link target.
///
/// Only space and parentheses are touched, so escaping twice is a no-op.
pub fn escape_url(url: &str) -> String {
    url.replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}

/// `[text](target)`, or the bare text when there is no target.
pub fn make_link(target: &str, text: &str) -> String {
    if target.is_empty() {
        return text.to_string();
    }
    format!("[{text}]({})", escape_url(target))
}

/// Renders user and page mentions with a feed's tool lists.
pub struct Linker<'a> {
    ctx: RenderContext<'a>,
    user_tools: &'a [ToolDescriptor],
    page_tools: &'a [ToolDescriptor],
}

impl<'a> Linker<'a> {
    pub fn new(ctx: RenderContext<'a>, feed: &'a FeedConfig) -> Self {
        Self::with_tools(ctx, &feed.user_tools, &feed.page_tools)
    }

    pub fn with_tools(
        ctx: RenderContext<'a>,
        user_tools: &'a [ToolDescriptor],
        page_tools: &'a [ToolDescriptor],
    ) -> Self {
        Self {
            ctx,
            user_tools,
            page_tools,
        }
    }

    pub fn context(&self) -> RenderContext<'a> {
        self.ctx
    }

    /// Each applicable tool as a `[label](url)` link, in configured order.
    ///
    /// Tools that resolve to no URL are dropped, never rendered as bare labels.
    pub fn tool_links(&self, subject: ToolSubject<'_>, include_self: bool) -> Vec<String> {
        let tools = match subject {
            ToolSubject::User(_) => self.user_tools,
            ToolSubject::Page(_) => self.page_tools,
        };
        tools
            .iter()
            .filter_map(|tool| {
                let url = self.tool_url(subject, &tool.target, include_self)?;
                Some(make_link(&url, &self.label(&tool.label)))
            })
            .collect()
    }

    /// Tool links joined by `separator` (the localized pipe by default).
    pub fn render_tools(
        &self,
        subject: ToolSubject<'_>,
        separator: Option<&str>,
        include_self: bool,
    ) -> String {
        let links = self.tool_links(subject, include_self);
        match separator {
            Some(sep) => links.join(sep),
            None => links.join(&self.ctx.msg("pipe-separator", &[])),
        }
    }

    pub fn user_tools(&self, name: &str, separator: Option<&str>, include_self: bool) -> String {
        self.render_tools(ToolSubject::User(name), separator, include_self)
    }

    pub fn page_tools(&self, title: &Title, separator: Option<&str>, include_self: bool) -> String {
        self.render_tools(ToolSubject::Page(title), separator, include_self)
    }

    /// `[Name](user page)`.
    pub fn user_link(&self, name: &str) -> String {
        make_link(&Title::user_page(name).full_url(self.ctx.site, ""), name)
    }

    /// `[Full text](page url)`.
    pub fn page_link(&self, title: &Title) -> String {
        make_link(
            &title.full_url(self.ctx.site, ""),
            &title.full_text(self.ctx.site),
        )
    }

    /// User link followed by its parenthesized tools, when there are any.
    pub fn user_text_with_tools(&self, name: &str) -> String {
        let tools = self.user_tools(name, None, false);
        self.with_tools_suffix(self.user_link(name), &tools)
    }

    /// Page link followed by its parenthesized tools, when there are any.
    pub fn page_text_with_tools(&self, title: &Title) -> String {
        let tools = self.page_tools(title, None, false);
        self.with_tools_suffix(self.page_link(title), &tools)
    }

    fn with_tools_suffix(&self, link: String, tools: &str) -> String {
        if tools.is_empty() {
            link
        } else {
            format!("{link} {}", self.ctx.msg("parentheses", &[tools]))
        }
    }

    fn label(&self, label: &ToolLabel) -> String {
        match label {
            ToolLabel::Message(key) => self.ctx.msg(key, &[]),
            ToolLabel::Text(text) => text.clone(),
        }
    }

    fn tool_url(
        &self,
        subject: ToolSubject<'_>,
        target: &ToolTarget,
        include_self: bool,
    ) -> Option<String> {
        let site = self.ctx.site;
        let own_page = match subject {
            ToolSubject::User(name) => Title::user_page(name),
            ToolSubject::Page(title) => title.clone().without_fragment(),
        };

        match target {
            ToolTarget::UserPage | ToolTarget::View => {
                include_self.then(|| own_page.full_url(site, ""))
            }
            ToolTarget::Talk => own_page.talk_page().map(|t| t.full_url(site, "")),
            ToolTarget::Special(special) => {
                let entity = match subject {
                    ToolSubject::User(name) => name.to_string(),
                    ToolSubject::Page(title) => title.full_text(site),
                };
                Some(Title::special(special, Some(&entity)).full_url(site, ""))
            }
            ToolTarget::Query(query) => Some(own_page.full_url(site, query)),
            ToolTarget::Diff => {
                let ToolSubject::Page(title) = subject else {
                    return None;
                };
                if title.is_special() {
                    return None;
                }
                let Some(revision) = self.ctx.revisions.latest_revision(title) else {
                    debug!(page = %title.full_text(site), "No revision known, skipping diff tool");
                    return None;
                };
                // First revision of a page has nothing to diff against
                if revision.parent_id.is_none() {
                    return None;
                }
                Some(own_page.full_url(site, &format!("oldid={}&diff=prev", revision.id)))
            }
        }
    }
}
