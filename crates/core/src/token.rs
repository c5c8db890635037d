//! Token stream shared by the parser adapter, the rewriting rules and the renderer.
//!
//! The shape follows markdown-it: block tokens form a flat list with
//! open/close pairs, and inline content lives in the `children` of `inline`
//! tokens.

use std::fmt;

/// Token discriminator, mirroring markdown-it token type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    /// `paragraph_open`
    ParagraphOpen,
    /// `paragraph_close`
    ParagraphClose,
    /// `heading_open`
    HeadingOpen,
    /// `heading_close`
    HeadingClose,
    /// `blockquote_open`
    BlockquoteOpen,
    /// `blockquote_close`
    BlockquoteClose,
    /// `bullet_list_open`
    BulletListOpen,
    /// `bullet_list_close`
    BulletListClose,
    /// `ordered_list_open`
    OrderedListOpen,
    /// `ordered_list_close`
    OrderedListClose,
    /// `list_item_open`
    ListItemOpen,
    /// `list_item_close`
    ListItemClose,
    /// `table_open`
    TableOpen,
    /// `table_close`
    TableClose,
    /// `thead_open`
    TheadOpen,
    /// `thead_close`
    TheadClose,
    /// `tbody_open`
    TbodyOpen,
    /// `tbody_close`
    TbodyClose,
    /// `tr_open`
    TrOpen,
    /// `tr_close`
    TrClose,
    /// `th_open`
    ThOpen,
    /// `th_close`
    ThClose,
    /// `td_open`
    TdOpen,
    /// `td_close`
    TdClose,
    /// `hr`
    Hr,
    /// `fence`
    Fence,
    /// `code_block`
    CodeBlock,
    /// `html_block`
    HtmlBlock,
    /// `inline`
    Inline,
    /// `text`
    #[default]
    Text,
    /// `softbreak`
    Softbreak,
    /// `hardbreak`
    Hardbreak,
    /// `code_inline`
    CodeInline,
    /// `html_inline`
    HtmlInline,
    /// `link_open`
    LinkOpen,
    /// `link_close`
    LinkClose,
    /// `image`
    Image,
    /// `em_open`
    EmOpen,
    /// `em_close`
    EmClose,
    /// `strong_open`
    StrongOpen,
    /// `strong_close`
    StrongClose,
    /// `s_open`
    StrikethroughOpen,
    /// `s_close`
    StrikethroughClose,
    /// `sup_open`
    SupOpen,
    /// `sup_close`
    SupClose,
}

impl TokenKind {
    /// markdown-it type name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::ParagraphOpen => "paragraph_open",
            TokenKind::ParagraphClose => "paragraph_close",
            TokenKind::HeadingOpen => "heading_open",
            TokenKind::HeadingClose => "heading_close",
            TokenKind::BlockquoteOpen => "blockquote_open",
            TokenKind::BlockquoteClose => "blockquote_close",
            TokenKind::BulletListOpen => "bullet_list_open",
            TokenKind::BulletListClose => "bullet_list_close",
            TokenKind::OrderedListOpen => "ordered_list_open",
            TokenKind::OrderedListClose => "ordered_list_close",
            TokenKind::ListItemOpen => "list_item_open",
            TokenKind::ListItemClose => "list_item_close",
            TokenKind::TableOpen => "table_open",
            TokenKind::TableClose => "table_close",
            TokenKind::TheadOpen => "thead_open",
            TokenKind::TheadClose => "thead_close",
            TokenKind::TbodyOpen => "tbody_open",
            TokenKind::TbodyClose => "tbody_close",
            TokenKind::TrOpen => "tr_open",
            TokenKind::TrClose => "tr_close",
            TokenKind::ThOpen => "th_open",
            TokenKind::ThClose => "th_close",
            TokenKind::TdOpen => "td_open",
            TokenKind::TdClose => "td_close",
            TokenKind::Hr => "hr",
            TokenKind::Fence => "fence",
            TokenKind::CodeBlock => "code_block",
            TokenKind::HtmlBlock => "html_block",
            TokenKind::Inline => "inline",
            TokenKind::Text => "text",
            TokenKind::Softbreak => "softbreak",
            TokenKind::Hardbreak => "hardbreak",
            TokenKind::CodeInline => "code_inline",
            TokenKind::HtmlInline => "html_inline",
            TokenKind::LinkOpen => "link_open",
            TokenKind::LinkClose => "link_close",
            TokenKind::Image => "image",
            TokenKind::EmOpen => "em_open",
            TokenKind::EmClose => "em_close",
            TokenKind::StrongOpen => "strong_open",
            TokenKind::StrongClose => "strong_close",
            TokenKind::StrikethroughOpen => "s_open",
            TokenKind::StrikethroughClose => "s_close",
            TokenKind::SupOpen => "sup_open",
            TokenKind::SupClose => "sup_close",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open/close marker used to pair start and end tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nesting {
    /// Opening tag (`1` in markdown-it).
    Opening,
    /// Self-contained token (`0`).
    #[default]
    SelfClosing,
    /// Closing tag (`-1`).
    Closing,
}

impl Nesting {
    /// Numeric nesting delta as used by markdown-it.
    pub fn delta(self) -> i8 {
        match self {
            Nesting::Opening => 1,
            Nesting::SelfClosing => 0,
            Nesting::Closing => -1,
        }
    }
}

/// A node in the parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Token {
    /// Token type.
    pub kind: TokenKind,
    /// HTML tag name (`p`, `h2`, `code`, ...); empty for tag-less tokens.
    pub tag: &'static str,
    /// Open/close marker.
    pub nesting: Nesting,
    /// Ordered HTML attributes.
    pub attrs: Vec<(String, String)>,
    /// Raw or partially processed text.
    pub content: String,
    /// Fence info string.
    pub info: String,
    /// Source markup that produced the token (`**`, `` ``` ``, `linkify`, ...).
    pub markup: String,
    /// Child tokens, present on `inline` (and `image` for alt text).
    pub children: Option<Vec<Token>>,
    /// Whether this is a block-level token.
    pub block: bool,
    /// Whether the renderer should skip the tag (tight-list paragraphs).
    pub hidden: bool,
}

impl Token {
    /// Creates a token of the given kind, tag, and nesting.
    pub fn new(kind: TokenKind, tag: &'static str, nesting: Nesting) -> Self {
        Self {
            kind,
            tag,
            nesting,
            ..Default::default()
        }
    }

    /// Creates a block-level token.
    pub fn block(kind: TokenKind, tag: &'static str, nesting: Nesting) -> Self {
        Self {
            block: true,
            ..Self::new(kind, tag, nesting)
        }
    }

    /// Creates a `text` token.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(TokenKind::Text, "", Nesting::SelfClosing)
        }
    }

    /// Creates an `html_block` token whose content is emitted verbatim.
    pub fn html_block(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(TokenKind::HtmlBlock, "", Nesting::SelfClosing)
        }
    }

    /// Creates a `text` token holding a single line break.
    pub fn newline() -> Self {
        Self::text("\n")
    }

    /// Creates an `inline` container with its raw content and children.
    pub fn inline(content: impl Into<String>, children: Vec<Token>) -> Self {
        Self {
            content: content.into(),
            children: Some(children),
            block: true,
            ..Self::new(TokenKind::Inline, "", Nesting::SelfClosing)
        }
    }

    /// Returns true for a token of the given kind.
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Looks up an attribute value.
    pub fn attr_get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn attr_set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Appends an attribute without checking for duplicates.
    pub fn attr_push(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.push((name.to_string(), value.into()));
    }

    /// Children slice, empty when the token has none.
    pub fn children(&self) -> &[Token] {
        self.children.as_deref().unwrap_or(&[])
    }
}
