//! Lowering of mdast nodes into markdown-it tokens.

use std::collections::HashMap;

use markdown::mdast::{self, AlignKind, Node};
use markdown::unist::Position;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{LinkPolicy, ParseOptions, superscript};
use crate::token::{Nesting, Token, TokenKind};

static ALLOWED_DESTINATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?://|#)").expect("destination pattern"));
static HAS_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.-]*:").expect("scheme pattern"));
static ANCHOR_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<a[>\s]").expect("anchor open pattern"));
static ANCHOR_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^</a\s*>").expect("anchor close pattern"));

/// Resolved link reference definition.
struct Definition {
    url: String,
    title: Option<String>,
}

/// How a `Link` node was written in the source.
enum LinkSyntax {
    /// `<https://...>`
    Angle,
    /// `[text](url)`
    Bracket,
    /// Bare URL picked up by the autolink literal extension.
    Literal,
}

pub(crate) struct Lowerer<'a> {
    source: &'a str,
    options: ParseOptions,
    definitions: HashMap<String, Definition>,
    tokens: Vec<Token>,
    quote_depth: usize,
    html_link_level: usize,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(source: &'a str, options: ParseOptions, root: &Node) -> Self {
        let mut definitions = HashMap::new();
        collect_definitions(root, &mut definitions);
        Self {
            source,
            options,
            definitions,
            tokens: Vec::new(),
            quote_depth: 0,
            html_link_level: 0,
        }
    }

    pub(crate) fn lower(mut self, root: &Node) -> Vec<Token> {
        self.block(root);
        self.tokens
    }

    fn strict(&self) -> bool {
        self.options.links == LinkPolicy::Strict
    }

    fn slice(&self, position: Option<&Position>) -> &'a str {
        position
            .and_then(|p| self.source.get(p.start.offset..p.end.offset))
            .unwrap_or("")
    }

    fn push(&mut self, kind: TokenKind, tag: &'static str, nesting: Nesting) -> &mut Token {
        self.tokens.push(Token::block(kind, tag, nesting));
        let last = self.tokens.len() - 1;
        &mut self.tokens[last]
    }

    fn block(&mut self, node: &Node) {
        match node {
            Node::Root(root) => {
                for child in &root.children {
                    self.block(child);
                }
            }
            Node::Paragraph(paragraph) => self.paragraph(&paragraph.children, false),
            Node::Heading(heading) => {
                let tag = heading_tag(heading.depth);
                let markup = "#".repeat(usize::from(heading.depth));
                self.push(TokenKind::HeadingOpen, tag, Nesting::Opening).markup = markup.clone();
                let inline = self.inline_token(&heading.children);
                self.tokens.push(inline);
                self.push(TokenKind::HeadingClose, tag, Nesting::Closing).markup = markup;
            }
            Node::Blockquote(quote) => {
                self.quote_depth += 1;
                self.push(TokenKind::BlockquoteOpen, "blockquote", Nesting::Opening)
                    .markup = ">".into();
                for child in &quote.children {
                    self.block(child);
                }
                self.push(TokenKind::BlockquoteClose, "blockquote", Nesting::Closing)
                    .markup = ">".into();
                self.quote_depth -= 1;
            }
            Node::List(list) => self.list(list),
            Node::Code(code) => self.code(code),
            Node::Html(html) => {
                let mut content = html.value.clone();
                if !content.ends_with('\n') {
                    content.push('\n');
                }
                let token = self.push(TokenKind::HtmlBlock, "", Nesting::SelfClosing);
                token.content = content;
            }
            Node::ThematicBreak(rule) => {
                let markup = self.slice(rule.position.as_ref()).trim().to_string();
                self.push(TokenKind::Hr, "hr", Nesting::SelfClosing).markup = markup;
            }
            Node::Table(table) => self.table(table),
            Node::Definition(definition) => {
                if self.strict() && !ALLOWED_DESTINATION.is_match(&definition.url) {
                    // Not a valid definition for the vendor tool, so it reads as text.
                    let literal = self.slice(definition.position.as_ref());
                    let mut children = Vec::new();
                    push_text(&mut children, literal);
                    self.push(TokenKind::ParagraphOpen, "p", Nesting::Opening);
                    self.tokens.push(Token::inline(literal, children));
                    self.push(TokenKind::ParagraphClose, "p", Nesting::Closing);
                }
            }
            _ => {
                log::warn!("Unhandled markdown node type: {:?}", node);
            }
        }
    }

    fn paragraph(&mut self, children: &[Node], hidden: bool) {
        self.push(TokenKind::ParagraphOpen, "p", Nesting::Opening).hidden = hidden;
        let inline = self.inline_token(children);
        self.tokens.push(inline);
        self.push(TokenKind::ParagraphClose, "p", Nesting::Closing).hidden = hidden;
    }

    fn list(&mut self, list: &mdast::List) {
        let tight = !list.spread
            && list
                .children
                .iter()
                .all(|item| !matches!(item, Node::ListItem(i) if i.spread));
        let (open, close, tag) = if list.ordered {
            (TokenKind::OrderedListOpen, TokenKind::OrderedListClose, "ol")
        } else {
            (TokenKind::BulletListOpen, TokenKind::BulletListClose, "ul")
        };

        let token = self.push(open, tag, Nesting::Opening);
        if let Some(start) = list.start.filter(|start| *start != 1) {
            token.attr_push("start", start.to_string());
        }

        for child in &list.children {
            let Node::ListItem(item) = child else {
                self.block(child);
                continue;
            };
            self.push(TokenKind::ListItemOpen, "li", Nesting::Opening);
            for item_child in &item.children {
                match item_child {
                    Node::Paragraph(paragraph) => self.paragraph(&paragraph.children, tight),
                    other => self.block(other),
                }
            }
            self.push(TokenKind::ListItemClose, "li", Nesting::Closing);
        }

        self.push(close, tag, Nesting::Closing);
    }

    fn code(&mut self, code: &mdast::Code) {
        let raw = self.slice(code.position.as_ref()).trim_start();
        let fence = raw
            .chars()
            .next()
            .filter(|ch| *ch == '`' || *ch == '~')
            .filter(|ch| raw.starts_with(&ch.to_string().repeat(3)));

        let mut content = code.value.clone();
        if !content.is_empty() {
            content.push('\n');
        }

        match fence {
            Some(fence_char) => {
                let markup: String = raw.chars().take_while(|ch| *ch == fence_char).collect();
                let info = match (&code.lang, &code.meta) {
                    (Some(lang), Some(meta)) => format!("{lang} {meta}"),
                    (Some(lang), None) => lang.clone(),
                    (None, _) => String::new(),
                };
                let token = self.push(TokenKind::Fence, "code", Nesting::SelfClosing);
                token.content = content;
                token.info = info;
                token.markup = markup;
            }
            None => {
                let token = self.push(TokenKind::CodeBlock, "code", Nesting::SelfClosing);
                token.content = content;
            }
        }
    }

    fn table(&mut self, table: &mdast::Table) {
        self.push(TokenKind::TableOpen, "table", Nesting::Opening);
        let rows = table.children.len();
        for (row_index, row) in table.children.iter().enumerate() {
            let Node::TableRow(row) = row else {
                continue;
            };
            if row_index == 0 {
                self.push(TokenKind::TheadOpen, "thead", Nesting::Opening);
            } else if row_index == 1 {
                self.push(TokenKind::TbodyOpen, "tbody", Nesting::Opening);
            }

            self.push(TokenKind::TrOpen, "tr", Nesting::Opening);
            let (open, close, tag) = if row_index == 0 {
                (TokenKind::ThOpen, TokenKind::ThClose, "th")
            } else {
                (TokenKind::TdOpen, TokenKind::TdClose, "td")
            };
            for (cell_index, cell) in row.children.iter().enumerate() {
                let Node::TableCell(cell) = cell else {
                    continue;
                };
                let token = self.push(open, tag, Nesting::Opening);
                if let Some(style) = table.align.get(cell_index).and_then(|a| align_style(*a)) {
                    token.attr_push("style", style);
                }
                let inline = self.inline_token(&cell.children);
                self.tokens.push(inline);
                self.push(close, tag, Nesting::Closing);
            }
            self.push(TokenKind::TrClose, "tr", Nesting::Closing);

            if row_index == 0 {
                self.push(TokenKind::TheadClose, "thead", Nesting::Closing);
            }
        }
        if rows > 1 {
            self.push(TokenKind::TbodyClose, "tbody", Nesting::Closing);
        }
        self.push(TokenKind::TableClose, "table", Nesting::Closing);
    }

    fn inline_token(&mut self, children: &[Node]) -> Token {
        let content = self.inline_content(children);
        self.html_link_level = 0;
        let mut out = Vec::new();
        for child in children {
            self.inline(child, &mut out);
        }
        if self.options.superscript {
            out = superscript::split_superscript(out);
        }
        Token::inline(content, out)
    }

    /// Source text spanned by `children`, without container prefixes on
    /// continuation lines.
    fn inline_content(&self, children: &[Node]) -> String {
        let start = children.first().and_then(Node::position).map(|p| p.start.offset);
        let end = children.last().and_then(Node::position).map(|p| p.end.offset);
        let Some(raw) = start.zip(end).and_then(|(s, e)| self.source.get(s..e)) else {
            return String::new();
        };

        let mut content = String::with_capacity(raw.len());
        for (index, line) in raw.split('\n').enumerate() {
            if index > 0 {
                content.push('\n');
                content.push_str(strip_line_prefix(line, self.quote_depth));
            } else {
                content.push_str(line);
            }
        }
        content
    }

    fn inline(&mut self, node: &Node, out: &mut Vec<Token>) {
        match node {
            Node::Text(text) => push_text(out, &text.value),
            Node::Break(_) => {
                trim_trailing_spaces(out);
                let mut token = Token::new(TokenKind::Hardbreak, "br", Nesting::SelfClosing);
                token.markup = "\n".into();
                out.push(token);
            }
            Node::InlineCode(code) => {
                let mut token = Token::new(TokenKind::CodeInline, "code", Nesting::SelfClosing);
                token.content = code.value.clone();
                token.markup = "`".into();
                out.push(token);
            }
            Node::Emphasis(emphasis) => {
                let markup = self.marker(emphasis.position.as_ref(), 1);
                self.wrap(
                    TokenKind::EmOpen,
                    TokenKind::EmClose,
                    "em",
                    markup,
                    &emphasis.children,
                    out,
                );
            }
            Node::Strong(strong) => {
                let markup = self.marker(strong.position.as_ref(), 2);
                self.wrap(
                    TokenKind::StrongOpen,
                    TokenKind::StrongClose,
                    "strong",
                    markup,
                    &strong.children,
                    out,
                );
            }
            Node::Delete(delete) => {
                self.wrap(
                    TokenKind::StrikethroughOpen,
                    TokenKind::StrikethroughClose,
                    "s",
                    "~~".into(),
                    &delete.children,
                    out,
                );
            }
            Node::Html(html) => {
                if ANCHOR_OPEN.is_match(&html.value) {
                    self.html_link_level += 1;
                } else if ANCHOR_CLOSE.is_match(&html.value) {
                    self.html_link_level = self.html_link_level.saturating_sub(1);
                }
                let mut token = Token::new(TokenKind::HtmlInline, "", Nesting::SelfClosing);
                token.content = html.value.clone();
                out.push(token);
            }
            Node::Link(link) => self.link(link, out),
            Node::LinkReference(reference) => {
                let resolved = self
                    .definitions
                    .get(&reference.identifier)
                    .map(|d| (d.url.clone(), d.title.clone()));
                match resolved {
                    Some((url, title)) if !self.strict() || ALLOWED_DESTINATION.is_match(&url) => {
                        self.link_tokens(&url, title.as_deref(), "", &reference.children, out)
                    }
                    _ => self.literal_link(&reference.children, reference.position.as_ref(), out),
                }
            }
            Node::Image(image) => {
                if self.strict() && !ALLOWED_DESTINATION.is_match(&image.url) {
                    push_text(out, self.slice(image.position.as_ref()));
                } else {
                    out.push(image_token(&image.url, &image.alt, image.title.as_deref()));
                }
            }
            Node::ImageReference(reference) => {
                let resolved = self
                    .definitions
                    .get(&reference.identifier)
                    .filter(|d| !self.strict() || ALLOWED_DESTINATION.is_match(&d.url));
                match resolved {
                    Some(definition) => out.push(image_token(
                        &definition.url,
                        &reference.alt,
                        definition.title.as_deref(),
                    )),
                    None => push_text(out, self.slice(reference.position.as_ref())),
                }
            }
            _ => {
                log::warn!("Unhandled markdown node type: {:?}", node);
            }
        }
    }

    fn marker(&self, position: Option<&Position>, width: usize) -> String {
        self.slice(position).chars().take(width).collect()
    }

    fn wrap(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        tag: &'static str,
        markup: String,
        children: &[Node],
        out: &mut Vec<Token>,
    ) {
        let mut token = Token::new(open, tag, Nesting::Opening);
        token.markup = markup.clone();
        out.push(token);
        for child in children {
            self.inline(child, out);
        }
        let mut token = Token::new(close, tag, Nesting::Closing);
        token.markup = markup;
        out.push(token);
    }

    fn link(&mut self, link: &mdast::Link, out: &mut Vec<Token>) {
        let raw = self.slice(link.position.as_ref());
        let syntax = match raw.chars().next() {
            Some('<') => LinkSyntax::Angle,
            Some('[') => LinkSyntax::Bracket,
            _ => LinkSyntax::Literal,
        };

        match syntax {
            LinkSyntax::Angle => {
                self.link_tokens(&link.url, None, "autolink", &link.children, out);
            }
            LinkSyntax::Bracket => {
                if self.strict() && !ALLOWED_DESTINATION.is_match(&link.url) {
                    log::trace!("rejected link destination {:?}", link.url);
                    self.literal_link(&link.children, link.position.as_ref(), out);
                } else {
                    self.link_tokens(&link.url, link.title.as_deref(), "", &link.children, out);
                }
            }
            LinkSyntax::Literal => {
                if self.strict() && !self.accepts_literal_autolink(raw, &link.url, out) {
                    push_text(out, raw);
                } else {
                    self.link_tokens(&link.url, None, "linkify", &link.children, out);
                }
            }
        }
    }

    fn accepts_literal_autolink(&self, raw: &str, url: &str, out: &[Token]) -> bool {
        let explicit =
            HAS_SCHEME.is_match(raw) || raw.starts_with("www.") || url.starts_with("mailto:");
        let inside_anchor = self.html_link_level > 0
            || out
                .last()
                .filter(|t| t.kind == TokenKind::Text)
                .is_some_and(|t| ANCHOR_OPEN.is_match(&t.content));
        explicit && !inside_anchor
    }

    fn link_tokens(
        &mut self,
        url: &str,
        title: Option<&str>,
        markup: &str,
        children: &[Node],
        out: &mut Vec<Token>,
    ) {
        let mut open = Token::new(TokenKind::LinkOpen, "a", Nesting::Opening);
        open.attr_push("href", url);
        if let Some(title) = title {
            open.attr_push("title", title);
        }
        open.markup = markup.into();
        if !markup.is_empty() {
            open.info = "auto".into();
        }
        out.push(open);
        for child in children {
            self.inline(child, out);
        }
        let mut close = Token::new(TokenKind::LinkClose, "a", Nesting::Closing);
        close.markup = markup.into();
        out.push(close);
    }

    /// Emits a rejected bracket link as `[` + label + the remaining source.
    fn literal_link(
        &mut self,
        children: &[Node],
        position: Option<&Position>,
        out: &mut Vec<Token>,
    ) {
        let Some(position) = position else {
            return;
        };
        push_text(out, "[");
        for child in children {
            self.inline(child, out);
        }
        let tail_start = children
            .last()
            .and_then(Node::position)
            .map_or(position.start.offset + 1, |p| p.end.offset);
        if let Some(tail) = self.source.get(tail_start..position.end.offset) {
            push_text(out, tail);
        }
    }
}

fn collect_definitions(node: &Node, definitions: &mut HashMap<String, Definition>) {
    if let Node::Definition(definition) = node {
        definitions
            .entry(definition.identifier.clone())
            .or_insert_with(|| Definition {
                url: definition.url.clone(),
                title: definition.title.clone(),
            });
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, definitions);
        }
    }
}

fn image_token(url: &str, alt: &str, title: Option<&str>) -> Token {
    let mut token = Token::new(TokenKind::Image, "img", Nesting::SelfClosing);
    token.attr_push("src", url);
    token.attr_push("alt", "");
    if let Some(title) = title {
        token.attr_push("title", title);
    }
    token.content = alt.to_string();
    token.children = Some(if alt.is_empty() {
        Vec::new()
    } else {
        vec![Token::text(alt)]
    });
    token
}

fn heading_tag(depth: u8) -> &'static str {
    match depth {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        4 => "h4",
        5 => "h5",
        _ => "h6",
    }
}

fn align_style(align: AlignKind) -> Option<&'static str> {
    match align {
        AlignKind::Left => Some("text-align:left"),
        AlignKind::Right => Some("text-align:right"),
        AlignKind::Center => Some("text-align:center"),
        AlignKind::None => None,
    }
}

/// Skips up to `quote_depth` blockquote markers and the indentation around them.
fn strip_line_prefix(line: &str, quote_depth: usize) -> &str {
    let mut rest = line;
    for _ in 0..quote_depth {
        let trimmed = rest.trim_start_matches([' ', '\t']);
        match trimmed.strip_prefix('>') {
            Some(after) => rest = after,
            None => break,
        }
    }
    rest.trim_start_matches([' ', '\t'])
}

fn ends_with_break(out: &[Token]) -> bool {
    out.last()
        .is_some_and(|t| matches!(t.kind, TokenKind::Softbreak | TokenKind::Hardbreak))
}

fn trim_trailing_spaces(out: &mut Vec<Token>) {
    if let Some(last) = out.last_mut().filter(|t| t.kind == TokenKind::Text) {
        let trimmed = last.content.trim_end_matches(' ').len();
        last.content.truncate(trimmed);
        if last.content.is_empty() {
            out.pop();
        }
    }
}

/// Appends text, turning line endings into `softbreak` tokens and merging
/// with a preceding text token.
fn push_text(out: &mut Vec<Token>, text: &str) {
    for (index, segment) in text.split('\n').enumerate() {
        if index > 0 {
            trim_trailing_spaces(out);
            let mut token = Token::new(TokenKind::Softbreak, "br", Nesting::SelfClosing);
            token.markup = "\n".into();
            out.push(token);
        }
        let segment = if ends_with_break(out) {
            segment.trim_start_matches(' ')
        } else {
            segment
        };
        if segment.is_empty() {
            continue;
        }
        match out.last_mut().filter(|t| t.kind == TokenKind::Text) {
            Some(last) => last.content.push_str(segment),
            None => out.push(Token::text(segment)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{LinkPolicy, ParseOptions, parse_tokens};
    use super::*;

    fn parse(input: &str) -> Vec<Token> {
        parse_tokens(input, &ParseOptions::default()).unwrap()
    }

    fn strict(html: bool, linkify: bool) -> ParseOptions {
        ParseOptions {
            html,
            linkify,
            links: LinkPolicy::Strict,
            ..Default::default()
        }
    }

    fn kinds(tokens: &[Token]) -> Vec<&'static str> {
        tokens.iter().map(|t| t.kind.as_str()).collect()
    }

    #[test]
    fn paragraph_becomes_open_inline_close() {
        let tokens = parse("Hello *world*");
        assert_eq!(kinds(&tokens), ["paragraph_open", "inline", "paragraph_close"]);
        assert_eq!(tokens[1].content, "Hello *world*");
        assert_eq!(
            kinds(tokens[1].children()),
            ["text", "em_open", "text", "em_close"]
        );
        assert_eq!(tokens[1].children()[1].markup, "*");
    }

    #[test]
    fn tight_list_hides_paragraphs() {
        let tokens = parse("- a\n- b");
        let hidden: Vec<bool> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::ParagraphOpen)
            .map(|t| t.hidden)
            .collect();
        assert_eq!(hidden, [true, true]);

        let loose = parse("- a\n\n- b");
        assert!(loose
            .iter()
            .filter(|t| t.kind == TokenKind::ParagraphOpen)
            .all(|t| !t.hidden));
    }

    #[test]
    fn ordered_list_records_start() {
        let tokens = parse("3. three\n4. four");
        assert_eq!(tokens[0].kind, TokenKind::OrderedListOpen);
        assert_eq!(tokens[0].attr_get("start"), Some("3"));
    }

    #[test]
    fn fence_and_indented_code_are_distinct() {
        let tokens = parse("```js title\nlet a = 1;\n```\n\n    indented");
        assert_eq!(tokens[0].kind, TokenKind::Fence);
        assert_eq!(tokens[0].info, "js title");
        assert_eq!(tokens[0].content, "let a = 1;\n");
        assert_eq!(tokens[0].markup, "```");
        assert_eq!(tokens[1].kind, TokenKind::CodeBlock);
        assert_eq!(tokens[1].content, "indented\n");
    }

    #[test]
    fn blockquote_continuation_markers_are_removed_from_content() {
        let tokens = parse("> one\n> two");
        assert_eq!(tokens[2].content, "one\ntwo");
    }

    #[test]
    fn table_cells_carry_alignment() {
        let tokens = parse("| a | b |\n|:--|--:|\n| 1 | 2 |");
        let th: Vec<Option<&str>> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::ThOpen)
            .map(|t| t.attr_get("style"))
            .collect();
        assert_eq!(th, [Some("text-align:left"), Some("text-align:right")]);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::TbodyOpen));
    }

    #[test]
    fn hard_break_trims_trailing_spaces() {
        let tokens = parse("foo  \nbar");
        let children = tokens[1].children();
        assert_eq!(kinds(children), ["text", "hardbreak", "text"]);
        assert_eq!(children[0].content, "foo");
    }

    #[test]
    fn strict_policy_rejects_relative_destinations() {
        let tokens =
            parse_tokens("[docs](docs.html) and [top](#top)", &strict(false, false)).unwrap();
        let children = tokens[1].children();
        assert_eq!(children[0].content, "[docs](docs.html) and ");
        assert_eq!(children[1].kind, TokenKind::LinkOpen);
        assert_eq!(children[1].attr_get("href"), Some("#top"));
    }

    #[test]
    fn strict_policy_keeps_angle_autolinks() {
        let tokens = parse_tokens("<ftp://example.com>", &strict(false, false)).unwrap();
        let open = &tokens[1].children()[0];
        assert_eq!(open.kind, TokenKind::LinkOpen);
        assert_eq!(open.markup, "autolink");
    }

    #[test]
    fn linkify_is_suppressed_inside_raw_anchor() {
        let tokens = parse_tokens(
            "<a href=\"https://example.com\">https://example.com</a>",
            &strict(true, true),
        )
        .unwrap();
        assert!(tokens[1]
            .children()
            .iter()
            .all(|t| t.kind != TokenKind::LinkOpen));
    }

    #[test]
    fn rejected_definition_reads_as_paragraph() {
        let tokens = parse_tokens("[a]: ./local\n\n[a]", &strict(false, false)).unwrap();
        assert_eq!(
            &kinds(&tokens)[..3],
            &["paragraph_open", "inline", "paragraph_close"]
        );
        assert_eq!(tokens[1].content, "[a]: ./local");
        assert_eq!(tokens[4].children()[0].content, "[a]");
    }

    #[test]
    fn line_prefix_strip_stops_at_depth() {
        assert_eq!(strip_line_prefix(">  > b", 1), "> b");
        assert_eq!(strip_line_prefix("   b", 0), "b");
    }
}
