//! `^superscript^` runs inside text children.

use crate::token::{Nesting, Token, TokenKind};

/// Splits `^inner^` runs in text children into `sup_open`, `text` and
/// `sup_close` tokens.
///
/// The inner run must be non-empty and free of whitespace; otherwise the
/// caret stays literal.
pub fn split_superscript(children: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(children.len());
    for token in children {
        if token.kind == TokenKind::Text && token.content.contains('^') {
            split_text(&token.content, &mut out);
        } else {
            out.push(token);
        }
    }
    out
}

fn split_text(text: &str, out: &mut Vec<Token>) {
    let mut plain = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('^') {
        let after = &rest[open + 1..];
        match after.find('^') {
            Some(close) if is_sup_body(&after[..close]) => {
                plain.push_str(&rest[..open]);
                flush(&mut plain, out);
                push_sup(&after[..close], out);
                rest = &after[close + 1..];
            }
            _ => {
                plain.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }

    plain.push_str(rest);
    flush(&mut plain, out);
}

fn is_sup_body(inner: &str) -> bool {
    !inner.is_empty() && !inner.chars().any(char::is_whitespace)
}

fn flush(plain: &mut String, out: &mut Vec<Token>) {
    if !plain.is_empty() {
        out.push(Token::text(std::mem::take(plain)));
    }
}

fn push_sup(inner: &str, out: &mut Vec<Token>) {
    let mut open = Token::new(TokenKind::SupOpen, "sup", Nesting::Opening);
    open.markup = "^".into();
    out.push(open);
    out.push(Token::text(inner));
    let mut close = Token::new(TokenKind::SupClose, "sup", Nesting::Closing);
    close.markup = "^".into();
    out.push(close);
}
