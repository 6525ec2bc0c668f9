// Webhook payload assembly.
//
// Lays a classified event out in the feed's style, then merges the feed's
// request override on top. The payload follows the chat platform's
// execute-webhook body: `username`, `content` or `embeds`.

use serde_json::{json, Map, Value};

use crate::wiki::{ChangeEvent, ChangeKind};

use super::classify::Classified;
use super::flow::flow_page_tool_fields;
use super::settings::{FeedConfig, RenderStyle};
use super::tools::Linker;

/// Builds payloads for one feed.
pub struct PostAssembler<'a> {
    linker: &'a Linker<'a>,
}

impl<'a> PostAssembler<'a> {
    pub fn new(linker: &'a Linker<'a>) -> Self {
        Self { linker }
    }

    pub fn assemble(&self, classified: &Classified, event: &ChangeEvent, feed: &FeedConfig) -> Value {
        let ctx = self.linker.context();
        let mut post = Map::new();
        post.insert("username".to_string(), json!(ctx.site.name));

        match feed.style {
            RenderStyle::Inline => {
                post.insert("content".to_string(), json!(self.full_line(classified)));
            }
            RenderStyle::Embed => {
                post.insert(
                    "embeds".to_string(),
                    json!([{
                        "color": classified.color,
                        "description": self.full_line(classified),
                    }]),
                );
            }
            RenderStyle::Structured => {
                post.insert(
                    "embeds".to_string(),
                    json!([{
                        "color": classified.color,
                        "description": classified.description,
                        "fields": self.fields(classified, event),
                    }]),
                );
            }
        }

        let mut post = Value::Object(post);
        if let Some(patch) = &feed.request_override {
            deep_merge(&mut post, patch);
        }
        post
    }

    /// Description, parenthesized comment and size change on one line.
    fn full_line(&self, classified: &Classified) -> String {
        let ctx = self.linker.context();
        let wrap = |text: &str| {
            if text.is_empty() {
                String::new()
            } else {
                ctx.msg("parentheses", &[text])
            }
        };
        [
            classified.description.clone(),
            wrap(&classified.comment),
            wrap(&classified.size_diff),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    fn fields(&self, classified: &Classified, event: &ChangeEvent) -> Vec<Value> {
        let ctx = self.linker.context();
        let mut fields = Vec::new();
        let mut push = |name: String, value: String| {
            if !name.is_empty() && !value.is_empty() {
                fields.push(json!({"name": name, "value": value, "inline": true}));
            }
        };

        let name = event.username();
        if !name.is_empty() {
            push(name.to_string(), self.linker.user_tools(name, Some("\n"), true));
        }

        match (&event.kind, &event.flow) {
            (ChangeKind::Flow, Some(flow)) => {
                let (name, value) = flow_page_tool_fields(self.linker, event, flow);
                push(name, value);
            }
            _ => {
                let page = event.page(ctx.site);
                push(
                    page.full_text(ctx.site),
                    self.linker.page_tools(&page, Some("\n"), true),
                );
            }
        }

        push(ctx.msg("listfiles_size", &[]), classified.size_diff.clone());
        push(ctx.msg("summary", &[]), classified.comment.clone());
        fields
    }
}

/// Merge `patch` into `target`.
///
/// Objects merge key by key, recursively. Anything else in the patch,
/// arrays included, replaces the target value wholesale.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}
