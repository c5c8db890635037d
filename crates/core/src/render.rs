//! HTML serialisation of the token stream.
//!
//! Output matches markdown-it's default renderer: block tags are followed by
//! a newline, hidden paragraphs disappear, and each token kind can be given
//! its own render rule.

use std::collections::HashMap;

use crate::escape::escape_html;
use crate::token::{Nesting, Token, TokenKind};

/// Renderer flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Close void tags XHTML style (`<br />`).
    pub xhtml_out: bool,
    /// Render soft line breaks as `<br>`.
    pub breaks: bool,
}

/// Render rule for one token kind: `(tokens, index, options, renderer)`.
pub type RenderRule =
    Box<dyn Fn(&[Token], usize, &RenderOptions, &HtmlRenderer) -> String + Send + Sync>;

/// Token stream to HTML renderer with an overridable rule table.
pub struct HtmlRenderer {
    options: RenderOptions,
    rules: HashMap<TokenKind, RenderRule>,
}

impl HtmlRenderer {
    /// Creates a renderer with the default rule table.
    pub fn new(options: RenderOptions) -> Self {
        let mut renderer = Self {
            options,
            rules: HashMap::new(),
        };
        renderer.set_rule(TokenKind::CodeInline, Box::new(code_inline));
        renderer.set_rule(TokenKind::CodeBlock, Box::new(code_block));
        renderer.set_rule(TokenKind::Fence, Box::new(fence));
        renderer.set_rule(TokenKind::Image, Box::new(image));
        renderer.set_rule(TokenKind::Hardbreak, Box::new(hardbreak));
        renderer.set_rule(TokenKind::Softbreak, Box::new(softbreak));
        renderer.set_rule(TokenKind::Text, Box::new(text));
        renderer.set_rule(TokenKind::HtmlBlock, Box::new(raw_content));
        renderer.set_rule(TokenKind::HtmlInline, Box::new(raw_content));
        renderer
    }

    /// Options this renderer was built with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Installs or replaces the rule for `kind`.
    pub fn set_rule(&mut self, kind: TokenKind, rule: RenderRule) {
        self.rules.insert(kind, rule);
    }

    /// Renders block-level tokens.
    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for (idx, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::Inline {
                out.push_str(&self.render_inline(token.children()));
            } else {
                out.push_str(&self.render_one(tokens, idx));
            }
        }
        out
    }

    /// Renders the children of an `inline` token.
    pub fn render_inline(&self, tokens: &[Token]) -> String {
        (0..tokens.len())
            .map(|idx| self.render_one(tokens, idx))
            .collect()
    }

    fn render_one(&self, tokens: &[Token], idx: usize) -> String {
        match self.rules.get(&tokens[idx].kind) {
            Some(rule) => rule(tokens, idx, &self.options, self),
            None => self.render_token(tokens, idx),
        }
    }

    /// Generic tag rendering used for kinds without a rule.
    pub fn render_token(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        if token.hidden {
            return String::new();
        }

        let mut out = String::new();
        if token.block && token.nesting != Nesting::Closing && idx > 0 && tokens[idx - 1].hidden {
            out.push('\n');
        }

        out.push_str(if token.nesting == Nesting::Closing { "</" } else { "<" });
        out.push_str(token.tag);
        out.push_str(&render_attrs(&token.attrs));
        if token.nesting == Nesting::SelfClosing && self.options.xhtml_out {
            out.push_str(" /");
        }

        let mut need_lf = token.block;
        if token.block && token.nesting == Nesting::Opening {
            if let Some(next) = tokens.get(idx + 1) {
                if next.kind == TokenKind::Inline || next.hidden {
                    need_lf = false;
                } else if next.nesting == Nesting::Closing && next.tag == token.tag {
                    need_lf = false;
                }
            }
        }

        out.push_str(if need_lf { ">\n" } else { ">" });
        out
    }
}

/// ` name="value"` pairs with escaped names and values.
pub fn render_attrs(attrs: &[(String, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", escape_html(name), escape_html(value)))
        .collect()
}

/// Plain text of inline tokens, used for image alt text.
pub fn render_inline_as_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token.kind {
            TokenKind::Text | TokenKind::HtmlInline | TokenKind::HtmlBlock => {
                out.push_str(&token.content)
            }
            TokenKind::Image => out.push_str(&render_inline_as_text(token.children())),
            TokenKind::Softbreak | TokenKind::Hardbreak => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn code_inline(tokens: &[Token], idx: usize, _: &RenderOptions, _: &HtmlRenderer) -> String {
    let token = &tokens[idx];
    format!(
        "<code{}>{}</code>",
        render_attrs(&token.attrs),
        escape_html(&token.content)
    )
}

fn code_block(tokens: &[Token], idx: usize, _: &RenderOptions, _: &HtmlRenderer) -> String {
    let token = &tokens[idx];
    format!(
        "<pre{}><code>{}</code></pre>\n",
        render_attrs(&token.attrs),
        escape_html(&token.content)
    )
}

fn fence(tokens: &[Token], idx: usize, _: &RenderOptions, _: &HtmlRenderer) -> String {
    let token = &tokens[idx];
    let info = token.info.trim();
    let body = escape_html(&token.content);
    let lang = info.split_whitespace().next().unwrap_or("");

    let mut attrs = token.attrs.clone();
    if !info.is_empty() {
        match attrs.iter_mut().find(|(name, _)| name == "class") {
            Some((_, class)) => {
                class.push_str(" language-");
                class.push_str(lang);
            }
            None => attrs.push(("class".into(), format!("language-{lang}"))),
        }
    }
    format!("<pre><code{}>{body}</code></pre>\n", render_attrs(&attrs))
}

fn image(tokens: &[Token], idx: usize, _: &RenderOptions, renderer: &HtmlRenderer) -> String {
    let mut token = tokens[idx].clone();
    let alt = render_inline_as_text(token.children());
    token.attr_set("alt", alt);
    renderer.render_token(std::slice::from_ref(&token), 0)
}

fn hardbreak(_: &[Token], _: usize, options: &RenderOptions, _: &HtmlRenderer) -> String {
    let tag = if options.xhtml_out { "<br />\n" } else { "<br>\n" };
    tag.to_string()
}

fn softbreak(_: &[Token], _: usize, options: &RenderOptions, _: &HtmlRenderer) -> String {
    let out = match (options.breaks, options.xhtml_out) {
        (true, true) => "<br />\n",
        (true, false) => "<br>\n",
        (false, _) => "\n",
    };
    out.to_string()
}

fn text(tokens: &[Token], idx: usize, _: &RenderOptions, _: &HtmlRenderer) -> String {
    escape_html(&tokens[idx].content)
}

fn raw_content(tokens: &[Token], idx: usize, _: &RenderOptions, _: &HtmlRenderer) -> String {
    tokens[idx].content.clone()
}
