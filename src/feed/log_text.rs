// Log action text.
//
// Each log type may phrase its line differently (a move names its target,
// a block names the blocked user and an expiry). Providers are registered
// per log type; anything unregistered goes through the generic provider.
// Rich output is host-shaped HTML for the markup converter, plain output is
// text.

use std::collections::HashMap;

use tracing::debug;

use crate::wiki::{ChangeEvent, LogInfo, Title};

use super::tools::RenderContext;

/// Renders the action line of one log type.
pub trait LogActionTextProvider: Send + Sync {
    /// HTML with user anchors and title links the converter understands.
    fn rich_html(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String;

    /// Text with page names wrapped in `[[...]]`.
    fn plain_text(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String;
}

/// Message parameters shared by every provider.
///
/// `$1` user, `$2` user name, `$3` page, `$4` extra target, `$5` duration.
struct LineParams {
    user: String,
    user_name: String,
    page: String,
    target: String,
    duration: String,
}

impl LineParams {
    fn as_slice(&self) -> [&str; 5] {
        [
            &self.user,
            &self.user_name,
            &self.page,
            &self.target,
            &self.duration,
        ]
    }
}

/// `logentry-{type}-{action}`, or the generic line naming the action.
fn render_line(log: &LogInfo, params: &LineParams, ctx: RenderContext<'_>) -> String {
    let key = format!("logentry-{}-{}", log.log_type, log.action);
    let values = params.as_slice();
    if let Some(line) = ctx.localizer.resolve(&key, &values) {
        return line;
    }
    debug!(key = %key, "No log entry message, using the generic line");
    // The generic line shows the action in $4 when nothing else claims it
    let action = log.full_type();
    let mut values = values;
    if params.target.is_empty() {
        values[3] = &action;
    }
    ctx.msg("discordrcfeed-line-log", &values)
}

fn performer_name(event: &ChangeEvent) -> &str {
    let name = event.username();
    if name.is_empty() {
        debug!(title = %event.title, "Log entry has no performer");
    }
    name
}

/// Generic provider: performer, page and the log entry message.
pub struct GenericLogText;

impl LogActionTextProvider for GenericLogText {
    fn rich_html(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        let name = performer_name(event);
        let params = LineParams {
            user: user_anchor(ctx, name),
            user_name: escape_html(name),
            page: page_anchor(ctx, &event.page(ctx.site)),
            target: String::new(),
            duration: String::new(),
        };
        render_line(log, &params, ctx)
    }

    fn plain_text(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        let name = performer_name(event);
        let params = LineParams {
            user: name.to_string(),
            user_name: name.to_string(),
            page: plain_page(ctx, &event.page(ctx.site)),
            target: String::new(),
            duration: String::new(),
        };
        render_line(log, &params, ctx)
    }
}

/// Page moves: `$4` is the destination from `params.target`.
pub struct MoveLogText;

impl MoveLogText {
    fn target(log: &LogInfo, ctx: RenderContext<'_>) -> Option<Title> {
        let target = log.param("target");
        if target.is_none() {
            debug!(log = %log.full_type(), "Move entry has no target parameter");
        }
        Title::parse(ctx.site, &target?)
    }
}

impl LogActionTextProvider for MoveLogText {
    fn rich_html(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        let name = performer_name(event);
        let params = LineParams {
            user: user_anchor(ctx, name),
            user_name: escape_html(name),
            page: page_anchor(ctx, &event.page(ctx.site)),
            target: Self::target(log, ctx)
                .map(|t| page_anchor(ctx, &t))
                .unwrap_or_default(),
            duration: String::new(),
        };
        render_line(log, &params, ctx)
    }

    fn plain_text(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        let name = performer_name(event);
        let params = LineParams {
            user: name.to_string(),
            user_name: name.to_string(),
            page: plain_page(ctx, &event.page(ctx.site)),
            target: Self::target(log, ctx)
                .map(|t| plain_page(ctx, &t))
                .unwrap_or_default(),
            duration: String::new(),
        };
        render_line(log, &params, ctx)
    }
}

/// Blocks: the page is `User:Target`, rendered as a user mention so the
/// blocked account gets user tools. `$5` is `params.duration`.
pub struct BlockLogText;

impl BlockLogText {
    fn blocked_user(event: &ChangeEvent, ctx: RenderContext<'_>) -> String {
        event.page(ctx.site).text().to_string()
    }

    fn duration(log: &LogInfo) -> String {
        log.param("duration").unwrap_or_default()
    }
}

impl LogActionTextProvider for BlockLogText {
    fn rich_html(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        let name = performer_name(event);
        let blocked = Self::blocked_user(event, ctx);
        let params = LineParams {
            user: user_anchor(ctx, name),
            user_name: escape_html(name),
            page: user_anchor(ctx, &blocked),
            target: escape_html(&blocked),
            duration: escape_html(&Self::duration(log)),
        };
        render_line(log, &params, ctx)
    }

    fn plain_text(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        let name = performer_name(event);
        let blocked = Self::blocked_user(event, ctx);
        let params = LineParams {
            user: name.to_string(),
            user_name: name.to_string(),
            page: blocked.clone(),
            target: blocked,
            duration: Self::duration(log),
        };
        render_line(log, &params, ctx)
    }
}

/// Log text providers keyed by log type.
pub struct LogTextRegistry {
    providers: HashMap<String, Box<dyn LogActionTextProvider>>,
    fallback: Box<dyn LogActionTextProvider>,
}

impl Default for LogTextRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("move", MoveLogText);
        registry.register("block", BlockLogText);
        registry
    }
}

impl LogTextRegistry {
    /// Only the generic provider.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
            fallback: Box::new(GenericLogText),
        }
    }

    pub fn register(&mut self, log_type: &str, provider: impl LogActionTextProvider + 'static) {
        self.providers
            .insert(log_type.to_string(), Box::new(provider));
    }

    pub fn provider(&self, log_type: &str) -> &dyn LogActionTextProvider {
        self.providers
            .get(log_type)
            .map_or(self.fallback.as_ref(), |p| p.as_ref())
    }

    /// HTML action line. Text the host already rendered wins.
    pub fn rich_html(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        match &log.action_html {
            Some(html) if !html.is_empty() => html.clone(),
            _ => self.provider(&log.log_type).rich_html(event, log, ctx),
        }
    }

    /// Plain action line with `[[`/`]]` markers turned into quotes.
    pub fn plain_text(&self, event: &ChangeEvent, log: &LogInfo, ctx: RenderContext<'_>) -> String {
        let text = match &log.action_text {
            Some(text) if !text.is_empty() => text.clone(),
            _ => self.provider(&log.log_type).plain_text(event, log, ctx),
        };
        text.replace("[[", "\"").replace("]]", "\"")
    }
}

/// A user anchor shaped like the host's own (`mw-userlink` + `<bdi>`).
pub fn user_anchor(ctx: RenderContext<'_>, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let page = Title::user_page(name);
    format!(
        r#"<a href="{}" class="mw-userlink" title="{}"><bdi>{}</bdi></a>"#,
        escape_html(&page.full_url(ctx.site, "")),
        escape_html(&page.full_text(ctx.site)),
        escape_html(name),
    )
}

/// An article anchor with a title attribute.
pub fn page_anchor(ctx: RenderContext<'_>, title: &Title) -> String {
    let text = escape_html(&title.full_text(ctx.site));
    format!(
        r#"<a href="{}" title="{text}">{text}</a>"#,
        escape_html(&title.full_url(ctx.site, "")),
    )
}

fn plain_page(ctx: RenderContext<'_>, title: &Title) -> String {
    format!("[[{}]]", title.full_text(ctx.site))
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
