// Event classification: color, emoji, description, comment and size change
// for one event, before any layout decisions are made.

use tracing::debug;

use crate::wiki::i18n::format_number;
use crate::wiki::{ChangeEvent, ChangeKind, Localizer};

use super::convert::MarkupConverter;
use super::flow::{self, DiscussionFormatter};
use super::log_text::LogTextRegistry;
use super::settings::RenderStyle;
use super::tools::RenderContext;

pub const COLOR_DEFAULT: u32 = 11777212;
pub const COLOR_NEW: u32 = 3580392;
pub const COLOR_EDIT: u32 = 2993970;
pub const COLOR_LOG: u32 = 9807270;
pub const COLOR_FLOW: u32 = 2993970;

/// Embed color of a log type.
pub fn log_color(log_type: &str) -> u32 {
    match log_type {
        "delete" | "block" => 15217973,
        "move" => 14038504,
        "protect" => 3493864,
        "upload" | "newusers" => 3580392,
        "rights" | "import" => 2993970,
        _ => COLOR_LOG,
    }
}

/// First existing message of `{prefix}-{main}-{sub}`, `{prefix}-{main}`,
/// `fallback` (or `{prefix}` when there is none). Empty when none exist.
pub fn emoji_for_keys(
    localizer: &dyn Localizer,
    prefix: &str,
    main: &str,
    sub: &str,
    fallback: Option<&str>,
) -> String {
    let mut keys = Vec::with_capacity(3);
    if !sub.is_empty() {
        keys.push(format!("{prefix}-{main}-{sub}"));
    }
    if !main.is_empty() {
        keys.push(format!("{prefix}-{main}"));
    }
    keys.push(fallback.filter(|f| !f.is_empty()).unwrap_or(prefix).to_string());

    keys.iter()
        .find_map(|key| localizer.resolve(key, &[]))
        .unwrap_or_default()
}

/// Size change text.
///
/// Inline and embed styles get the signed change (`+10 bytes`), or the new
/// size alone for a new page. Structured style gets the new size with the
/// signed change in parentheses (`30 bytes (+10)`).
pub fn size_diff(event: &ChangeEvent, style: RenderStyle, ctx: RenderContext<'_>) -> String {
    let Some(new_len) = event.new_len else {
        return String::new();
    };
    let new_size = ctx.msg("nbytes", &[format_number(new_len).as_str()]);
    let Some(old_len) = event.old_len else {
        return new_size;
    };

    let diff = new_len.saturating_sub(old_len);
    let sign = if diff > 0 { "+" } else { "" };
    match style {
        RenderStyle::Structured => {
            let signed = format!("{sign}{diff}");
            format!("{new_size} {}", ctx.msg("parentheses", &[signed.as_str()]))
        }
        RenderStyle::Inline | RenderStyle::Embed => {
            format!("{sign}{}", ctx.msg("nbytes", &[format_number(diff).as_str()]))
        }
    }
}

/// Everything the assembler needs to know about one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: ChangeKind,
    pub color: u32,
    pub emoji: String,
    /// Emoji and action line.
    pub description: String,
    /// Converted edit summary or log reason.
    pub comment: String,
    pub size_diff: String,
}

/// Classifies events for one feed.
pub struct EventClassifier<'a> {
    converter: &'a MarkupConverter<'a>,
    log_texts: &'a LogTextRegistry,
    discussions: &'a dyn DiscussionFormatter,
}

impl<'a> EventClassifier<'a> {
    pub fn new(
        converter: &'a MarkupConverter<'a>,
        log_texts: &'a LogTextRegistry,
        discussions: &'a dyn DiscussionFormatter,
    ) -> Self {
        Self {
            converter,
            log_texts,
            discussions,
        }
    }

    /// `None` for kinds that are never posted (categorization).
    pub fn classify(&self, event: &ChangeEvent, style: RenderStyle) -> Option<Classified> {
        let ctx = self.converter.linker().context();
        let rich = style != RenderStyle::Structured;

        let (color, emoji, line, comment) = match event.kind {
            ChangeKind::New | ChangeKind::Edit => {
                let (emoji, line) = self.edit_line(event, rich);
                let color = match event.kind {
                    ChangeKind::New => COLOR_NEW,
                    ChangeKind::Edit => COLOR_EDIT,
                    _ => COLOR_DEFAULT,
                };
                (color, emoji, line, self.comment(event))
            }
            ChangeKind::Log => {
                let Some(log) = &event.log else {
                    debug!(title = %event.title, "Log event without log details");
                    return Some(self.finish(
                        event,
                        style,
                        COLOR_LOG,
                        String::new(),
                        String::new(),
                        String::new(),
                    ));
                };
                let emoji = emoji_for_keys(
                    ctx.localizer,
                    "discordrcfeed-emoji-log",
                    &log.log_type,
                    &log.action,
                    None,
                );
                let line = if rich {
                    let html = self.log_texts.rich_html(event, log, ctx);
                    self.converter.convert(&html, false)
                } else {
                    self.log_texts.plain_text(event, log, ctx)
                };
                (log_color(&log.log_type), emoji, line, self.comment(event))
            }
            ChangeKind::Flow => {
                let Some(info) = &event.flow else {
                    debug!(title = %event.title, "Discussion event without details");
                    return Some(self.finish(
                        event,
                        style,
                        COLOR_FLOW,
                        String::new(),
                        String::new(),
                        String::new(),
                    ));
                };
                let emoji = emoji_for_keys(
                    ctx.localizer,
                    "discordrcfeed-emoji-flow",
                    &info.action,
                    "",
                    None,
                );
                let line = flow::describe(self.discussions, self.converter, event, info, rich);
                (COLOR_FLOW, emoji, line, String::new())
            }
            ChangeKind::Categorize => return None,
        };

        Some(self.finish(event, style, color, emoji, line, comment))
    }

    fn finish(
        &self,
        event: &ChangeEvent,
        style: RenderStyle,
        color: u32,
        emoji: String,
        line: String,
        comment: String,
    ) -> Classified {
        let description = [emoji.as_str(), line.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        Classified {
            kind: event.kind,
            color,
            emoji,
            description,
            comment,
            size_diff: size_diff(event, style, self.converter.linker().context()),
        }
    }

    fn edit_line(&self, event: &ChangeEvent, rich: bool) -> (String, String) {
        let linker = self.converter.linker();
        let ctx = linker.context();

        let (emoji_key, line_key) = if event.kind == ChangeKind::New {
            (
                "discordrcfeed-emoji-create".to_string(),
                "discordrcfeed-line-create".to_string(),
            )
        } else {
            let mut flag = String::new();
            if event.minor {
                flag.push_str("-minor");
            }
            if event.bot {
                flag.push_str("-bot");
            }
            (
                format!("discordrcfeed-emoji-edit{flag}"),
                format!("discordrcfeed-line-edit{flag}"),
            )
        };

        let name = event.username();
        if name.is_empty() {
            debug!(title = %event.title, "Edit without a performer");
        }
        let page = event.page(ctx.site);
        let (user, title) = match (rich, name.is_empty()) {
            (true, false) => (
                linker.user_text_with_tools(name),
                linker.page_text_with_tools(&page),
            ),
            (true, true) => (String::new(), linker.page_text_with_tools(&page)),
            (false, _) => (name.to_string(), page.full_text(ctx.site)),
        };

        let emoji = ctx.localizer.resolve(&emoji_key, &[]).unwrap_or_default();
        let line = ctx.msg(&line_key, &[user.as_str(), name, title.as_str()]);
        (emoji, line)
    }

    fn comment(&self, event: &ChangeEvent) -> String {
        if event.comment.trim().is_empty() {
            return String::new();
        }
        self.converter.convert(&event.comment, true).trim().to_string()
    }
}
