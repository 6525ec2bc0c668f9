// Discussion (Flow) activity: description line and the structured page field.

use tracing::debug;

use crate::wiki::{ChangeEvent, FlowInfo};

use super::convert::{strip_tags, MarkupConverter};
use super::log_text::{escape_html, page_anchor, user_anchor};
use super::tools::{make_link, Linker, RenderContext, ToolSubject};

/// Produces the HTML description of a discussion event.
pub trait DiscussionFormatter: Send + Sync {
    fn description_html(&self, event: &ChangeEvent, flow: &FlowInfo, ctx: RenderContext<'_>)
        -> String;
}

/// Uses the host's rendered description when present, otherwise
/// `discordrcfeed-flow-{action}` with user, topic and action parameters.
pub struct FlowFormatter;

impl DiscussionFormatter for FlowFormatter {
    fn description_html(
        &self,
        event: &ChangeEvent,
        flow: &FlowInfo,
        ctx: RenderContext<'_>,
    ) -> String {
        if let Some(html) = flow.description_html.as_deref().filter(|h| !h.is_empty()) {
            return html.to_string();
        }

        let name = event.username();
        if name.is_empty() {
            debug!(action = %flow.action, "Discussion event has no performer");
        }
        let topic = match &flow.topic_url {
            Some(url) => format!(
                r#"<a href="{}">{}</a>"#,
                escape_html(url),
                escape_html(&topic_label(event, flow, ctx)),
            ),
            None => page_anchor(ctx, &event.page(ctx.site)),
        };
        let params = [
            user_anchor(ctx, name),
            escape_html(name),
            topic,
            escape_html(&flow.action),
        ];
        let params: Vec<&str> = params.iter().map(String::as_str).collect();

        let key = format!("discordrcfeed-flow-{}", flow.action);
        ctx.localizer
            .resolve(&key, &params)
            .unwrap_or_else(|| ctx.msg("discordrcfeed-flow-action", &params))
    }
}

/// Description of a discussion event as chat markup (`rich`) or plain text.
pub fn describe(
    formatter: &dyn DiscussionFormatter,
    converter: &MarkupConverter<'_>,
    event: &ChangeEvent,
    flow: &FlowInfo,
    rich: bool,
) -> String {
    let html = formatter.description_html(event, flow, converter.linker().context());
    let text = if rich {
        converter.convert(&html, false)
    } else {
        strip_tags(&html)
    };
    // Parentheses that wrapped a summary we left out
    text.replace("()", "").trim().to_string()
}

/// Topic title, falling back to the page's full text.
pub fn topic_label(event: &ChangeEvent, flow: &FlowInfo, ctx: RenderContext<'_>) -> String {
    match flow.topic_title.as_deref().filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => event.page(ctx.site).full_text(ctx.site),
    }
}

/// Name and value of the structured page field for a discussion event:
/// the page tools, plus a `view` link to the topic when its URL is known.
pub fn flow_page_tool_fields(
    linker: &Linker<'_>,
    event: &ChangeEvent,
    flow: &FlowInfo,
) -> (String, String) {
    let ctx = linker.context();
    let page = event.page(ctx.site);
    let mut links = linker.tool_links(ToolSubject::Page(&page), true);
    if let Some(url) = flow.topic_url.as_deref().filter(|u| !u.is_empty()) {
        links.push(make_link(url, &ctx.msg("view", &[])));
    }
    (topic_label(event, flow, ctx), links.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::{Catalog, ChangeKind, NoRevisions, Performer, Site};

    fn reply() -> (ChangeEvent, FlowInfo) {
        let flow = FlowInfo {
            action: "reply".to_string(),
            description_html: None,
            topic_title: Some("Lorem".to_string()),
            topic_url: Some("https://foo.bar/index.php/Topic:Wh925tqnitcssmp8".to_string()),
        };
        let event = ChangeEvent {
            kind: ChangeKind::Flow,
            namespace: 2600,
            title: "Topic:Wh925tqnitcssmp8".to_string(),
            content_model: None,
            user: Some(Performer::new("Admin")),
            comment: String::new(),
            old_len: None,
            new_len: None,
            log: None,
            flow: Some(flow.clone()),
            this_revision_id: None,
            last_revision_id: None,
            minor: false,
            bot: false,
        };
        (event, flow)
    }

    #[test]
    fn plain_description_uses_action_message() {
        let site = Site::new("https://foo.bar");
        let catalog = Catalog::english();
        let ctx = RenderContext::new(&site, &catalog, &NoRevisions);
        let converter = MarkupConverter::new(Linker::with_tools(ctx, &[], &[]));
        let (event, flow) = reply();
        assert_eq!(
            describe(&FlowFormatter, &converter, &event, &flow, false),
            "Admin replied on Lorem"
        );
    }

    #[test]
    fn unknown_action_falls_back_to_generic_line() {
        let site = Site::new("https://foo.bar");
        let catalog = Catalog::english();
        let ctx = RenderContext::new(&site, &catalog, &NoRevisions);
        let converter = MarkupConverter::new(Linker::with_tools(ctx, &[], &[]));
        let (event, mut flow) = reply();
        flow.action = "summarize".to_string();
        assert_eq!(
            describe(&FlowFormatter, &converter, &event, &flow, false),
            "Admin performed \"summarize\" on Lorem"
        );
    }

    #[test]
    fn empty_parentheses_are_removed() {
        let site = Site::new("https://foo.bar");
        let catalog = Catalog::english();
        let ctx = RenderContext::new(&site, &catalog, &NoRevisions);
        let converter = MarkupConverter::new(Linker::with_tools(ctx, &[], &[]));
        let (event, mut flow) = reply();
        flow.description_html = Some("Admin commented on \"Lorem\" (<em></em>)".to_string());
        assert_eq!(
            describe(&FlowFormatter, &converter, &event, &flow, false),
            "Admin commented on \"Lorem\""
        );
    }

    #[test]
    fn page_field_adds_topic_view_link() {
        let site = Site::new("https://foo.bar");
        let catalog = Catalog::english();
        let ctx = RenderContext::new(&site, &catalog, &NoRevisions);
        let linker = Linker::with_tools(ctx, &[], &[]);
        let (event, flow) = reply();
        let (name, value) = flow_page_tool_fields(&linker, &event, &flow);
        assert_eq!(name, "Lorem");
        assert_eq!(
            value,
            "[view](https://foo.bar/index.php/Topic:Wh925tqnitcssmp8)"
        );
    }
}
