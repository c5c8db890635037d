//! Blank lines between blocks, as the vendor preview emits them.

use doco_core::{Direction, Token, TokenKind, walk_tokens};

use crate::pipeline::State;

/// Kinds followed by a blank line.
const ADD_AFTER: &[TokenKind] = &[
    TokenKind::ParagraphClose,
    TokenKind::Softbreak,
    TokenKind::BulletListClose,
    TokenKind::HeadingClose,
    TokenKind::BlockquoteClose,
];

/// Kinds that suppress the blank line when they come next.
const SKIP_BEFORE: &[TokenKind] = &[
    TokenKind::ListItemClose,
    TokenKind::HtmlBlock,
    TokenKind::Fence,
    TokenKind::BlockquoteClose,
];

pub(crate) fn run(state: &mut State<'_>) {
    walk_tokens(&mut state.tokens, Direction::Forward, |cursor| {
        let Some(token) = cursor.current() else {
            return;
        };
        if !ADD_AFTER.contains(&token.kind) {
            return;
        }
        if cursor.peek(1).is_some_and(|next| SKIP_BEFORE.contains(&next.kind)) {
            return;
        }
        cursor.insert_after(Token::newline());
    });
}
