//! Heading anchor extension.
//!
//! Registers its core rule through [`CoreRuler::push`] like any parser
//! plugin. The rule gives every selected `heading_open` an `id`.

use doco_core::{Token, TokenKind};

use crate::pipeline::State;

/// A core rule as registered by an extension.
pub type CoreRule = Box<dyn Fn(&mut State<'_>)>;

/// Registration interface extensions push their core rules into.
pub trait CoreRuler {
    /// Registers `rule` under `name`.
    fn push(&mut self, name: &'static str, rule: CoreRule);
}

/// Anchor extension settings.
#[derive(Debug, Clone, Copy)]
pub struct AnchorOptions {
    /// Minimum heading level that gets an id.
    pub level: u8,
    /// Add `tabindex="-1"` next to the id.
    pub tab_index: bool,
    /// Heading text to slug.
    pub slugify: fn(&str) -> String,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            level: 1,
            tab_index: true,
            slugify: default_slugify,
        }
    }
}

/// Lowercased, trimmed text with whitespace runs turned into `-`.
pub fn default_slugify(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Installs the anchor rule into `ruler`.
pub fn anchor<R: CoreRuler + ?Sized>(ruler: &mut R, options: AnchorOptions) {
    ruler.push(
        "anchor",
        Box::new(move |state: &mut State<'_>| apply(state, &options)),
    );
}

fn apply(state: &mut State<'_>, options: &AnchorOptions) {
    for idx in 0..state.tokens.len() {
        let token = &state.tokens[idx];
        if token.kind != TokenKind::HeadingOpen || heading_level(token) < options.level {
            continue;
        }

        if let Some(id) = token.attr_get("id") {
            let id = id.to_string();
            state.slugs.reserve(&id);
            continue;
        }

        let title = state
            .tokens
            .get(idx + 1)
            .map(|inline| heading_title(inline.children()))
            .unwrap_or_default();
        let slug = state.slugs.unique(&(options.slugify)(&title));

        let heading = &mut state.tokens[idx];
        heading.attr_set("id", slug);
        if options.tab_index {
            heading.attr_set("tabindex", "-1");
        }
    }
}

fn heading_level(token: &Token) -> u8 {
    token
        .tag
        .strip_prefix('h')
        .and_then(|level| level.parse().ok())
        .unwrap_or(0)
}

fn heading_title(children: &[Token]) -> String {
    children
        .iter()
        .filter(|child| matches!(child.kind, TokenKind::Text | TokenKind::CodeInline))
        .map(|child| child.content.as_str())
        .collect()
}
