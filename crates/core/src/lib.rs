#![deny(missing_docs)]
//! doco core: the markdown-it shaped token stream, the markdown-rs adapter
//! that produces it, the token walker, escaping profiles and HTML rendering.

/// Core error and diagnostic types.
pub mod error;
/// Vendor escaping profiles and the replacement engine behind them.
pub mod escape;
/// Markdown parsing into tokens.
pub mod parse;
/// Token stream rendering.
pub mod render;
/// Heading slug generation.
pub mod slug;
/// Token model.
pub mod token;
/// Depth-first token walker.
pub mod walk;

pub use error::{CoreError, SourceLocation};
pub use escape::{
    Replace, Replacement, code_escape, escape_html, prose_escape, run_replacers, strip_comments,
    unescape_brackets,
};
pub use parse::{LinkPolicy, ParseOptions, parse_mdast, parse_tokens, split_superscript};
pub use render::{HtmlRenderer, RenderOptions, RenderRule};
pub use slug::{Slugger, slugify};
pub use token::{Nesting, Token, TokenKind};
pub use walk::{Cursor, Direction, walk_tokens};
