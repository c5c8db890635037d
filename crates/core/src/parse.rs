//! Markdown parsing into a markdown-it shaped token stream.
//!
//! markdown-rs produces an mdast tree; [`parse_tokens`] lowers it into the
//! flat block list with `inline` containers that the rewriting rules expect.

mod lower;
mod superscript;

use crate::error::{CoreError, SourceLocation};
use crate::token::Token;
use markdown::mdast::Node;
use markdown::message::{Message, Place};

pub use superscript::split_superscript;

/// How link destinations are validated while lowering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Every destination the parser accepts becomes a link.
    #[default]
    Permissive,
    /// Bracket links, images and definitions need an `http(s)://` or `#`
    /// destination; literal autolinks need a scheme or a `www.` prefix and
    /// are never created inside a hand-written `<a>` element.
    Strict,
}

/// Parser options for the markdown-rs adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    /// Parse raw HTML blocks and inline tags. When off they stay literal text.
    pub html: bool,
    /// Recognise bare URLs (`https://...`, `www.`, emails) as links.
    pub linkify: bool,
    /// Split `^text^` runs into `sup_open`/`text`/`sup_close` children.
    pub superscript: bool,
    /// Destination validation.
    pub links: LinkPolicy,
}

impl ParseOptions {
    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let constructs = markdown::Constructs {
            code_indented: true,
            html_flow: self.html,
            html_text: self.html,
            gfm_autolink_literal: self.linkify,
            gfm_strikethrough: true,
            gfm_table: true,
            ..Default::default()
        };

        markdown::ParseOptions {
            constructs,
            gfm_strikethrough_single_tilde: false,
            ..markdown::ParseOptions::default()
        }
    }
}

/// Parse markdown into an MDAST tree.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, CoreError> {
    markdown::to_mdast(input, &options.to_markdown()).map_err(|err| {
        CoreError::MarkdownAdapter {
            message: err.to_string(),
            location: message_location(&err),
        }
    })
}

/// Parse markdown into block tokens with `inline` children.
///
/// Line endings are normalised to `\n` first, so token content never holds
/// a carriage return.
pub fn parse_tokens(input: &str, options: &ParseOptions) -> Result<Vec<Token>, CoreError> {
    let source = normalize_newlines(input);
    let root = parse_mdast(&source, options)?;
    let tokens = lower::Lowerer::new(&source, *options, &root).lower(&root);
    log::debug!("lowered markdown into {} block tokens", tokens.len());
    Ok(tokens)
}

fn normalize_newlines(input: &str) -> String {
    if input.contains('\r') {
        input.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        input.to_string()
    }
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
