//! Depth-first token walker with an index-tracking cursor.
//!
//! Rules mutate the token list they are visiting. The [`Cursor`] owns the
//! bookkeeping so a visitor can splice tokens anywhere in the current level
//! and the walk still continues at the right spot.

use crate::token::Token;

/// Order in which sibling tokens are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// First to last.
    #[default]
    Forward,
    /// Last to first.
    Backward,
}

/// Cursor over one level of the token tree during a walk.
pub struct Cursor<'a> {
    tokens: &'a mut Vec<Token>,
    index: usize,
    removed: bool,
    resume: Option<usize>,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a mut Vec<Token>, index: usize) -> Self {
        Self {
            tokens,
            index,
            removed: false,
            resume: None,
        }
    }

    /// Token being visited, `None` once a splice removed it.
    pub fn current(&self) -> Option<&Token> {
        if self.removed {
            return None;
        }
        self.tokens.get(self.index)
    }

    /// Mutable access to the token being visited.
    pub fn current_mut(&mut self) -> Option<&mut Token> {
        if self.removed {
            return None;
        }
        self.tokens.get_mut(self.index)
    }

    /// Sibling at a signed offset from the current position.
    pub fn peek(&self, offset: isize) -> Option<&Token> {
        let index = self.index.checked_add_signed(offset)?;
        self.tokens.get(index)
    }

    /// Position of the current token in its level.
    pub fn index(&self) -> usize {
        self.index
    }

    /// All tokens of the current level.
    pub fn tokens(&self) -> &[Token] {
        self.tokens
    }

    /// Mutable access to any sibling. Length changes must go through
    /// [`Cursor::splice_at`].
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Token> {
        self.tokens.get_mut(index)
    }

    /// Swaps the current token for `token`, returning the previous one.
    ///
    /// The replacement is not revisited, but its children are walked.
    pub fn replace_current(&mut self, token: Token) -> Option<Token> {
        if self.removed {
            return None;
        }
        let slot = self.tokens.get_mut(self.index)?;
        Some(std::mem::replace(slot, token))
    }

    /// Removes `remove` tokens starting at `start` and inserts `insert` in
    /// their place, keeping the cursor on the same logical token.
    ///
    /// When the removed range covers the current token the cursor moves to
    /// `start` and the walk continues from there.
    pub fn splice_at<I>(&mut self, start: usize, remove: usize, insert: I) -> Vec<Token>
    where
        I: IntoIterator<Item = Token>,
    {
        let start = start.min(self.tokens.len());
        let end = start.saturating_add(remove).min(self.tokens.len());
        let insert: Vec<Token> = insert.into_iter().collect();
        let inserted = insert.len();
        let removed: Vec<Token> = self.tokens.splice(start..end, insert).collect();

        let covers_current = !self.removed && start <= self.index && self.index < end;
        if covers_current {
            self.removed = true;
            self.index = start;
        } else if end <= self.index {
            self.index = self.index + inserted - removed.len();
        }

        log::trace!(
            "spliced {} token(s) at {start}, inserted {inserted}",
            removed.len()
        );
        removed
    }

    /// Inserts `token` directly after the current position.
    pub fn insert_after(&mut self, token: Token) {
        let at = self.index + 1;
        self.splice_at(at, 0, [token]);
    }

    /// Removes the current token.
    pub fn remove_current(&mut self) -> Option<Token> {
        if self.removed {
            return None;
        }
        let index = self.index;
        self.splice_at(index, 1, []).pop()
    }

    /// Continues the walk at `index` instead of the next position.
    pub fn resume_from(&mut self, index: usize) {
        self.resume = Some(index);
    }
}

/// Walks `tokens` pre-order, visiting each token before its children.
///
/// The visitor may mutate the current level through the cursor. Children of
/// the current token are walked after the visitor returns, unless the visitor
/// removed it.
pub fn walk_tokens<F>(tokens: &mut Vec<Token>, direction: Direction, mut visitor: F)
where
    F: FnMut(&mut Cursor<'_>),
{
    walk_level(tokens, direction, &mut visitor);
}

fn walk_level<F>(tokens: &mut Vec<Token>, direction: Direction, visitor: &mut F)
where
    F: FnMut(&mut Cursor<'_>),
{
    let mut next = match direction {
        Direction::Forward => Some(0),
        Direction::Backward => tokens.len().checked_sub(1),
    };

    while let Some(index) = next {
        if index >= tokens.len() {
            match direction {
                Direction::Forward => break,
                Direction::Backward => {
                    next = tokens.len().checked_sub(1);
                    continue;
                }
            }
        }

        let (current, removed, resume) = {
            let mut cursor = Cursor::new(tokens, index);
            visitor(&mut cursor);
            (cursor.index, cursor.removed, cursor.resume)
        };

        if !removed {
            if let Some(children) = tokens.get_mut(current).and_then(|t| t.children.as_mut()) {
                walk_level(children, direction, visitor);
            }
        }

        next = match (resume, direction) {
            (Some(resume), _) => Some(resume),
            (None, Direction::Forward) if removed => Some(current),
            (None, Direction::Forward) => Some(current + 1),
            (None, Direction::Backward) => current.checked_sub(1),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Nesting, TokenKind};

    fn paragraph(text: &str) -> Vec<Token> {
        vec![
            Token::block(TokenKind::ParagraphOpen, "p", Nesting::Opening),
            Token::inline(text, vec![Token::text(text)]),
            Token::block(TokenKind::ParagraphClose, "p", Nesting::Closing),
        ]
    }

    fn kinds(tokens: &[Token]) -> Vec<&'static str> {
        tokens.iter().map(|t| t.kind.as_str()).collect()
    }

    #[test]
    fn visits_parents_before_children() {
        let mut tokens = paragraph("hi");
        let mut seen = Vec::new();
        walk_tokens(&mut tokens, Direction::Forward, |cursor| {
            if let Some(token) = cursor.current() {
                seen.push(token.kind.as_str());
            }
        });
        assert_eq!(
            seen,
            ["paragraph_open", "inline", "text", "paragraph_close"]
        );
    }

    #[test]
    fn backward_walk_visits_last_sibling_first() {
        let mut tokens = paragraph("hi");
        let mut seen = Vec::new();
        walk_tokens(&mut tokens, Direction::Backward, |cursor| {
            if let Some(token) = cursor.current() {
                seen.push(token.kind.as_str());
            }
        });
        assert_eq!(
            seen,
            ["paragraph_close", "inline", "text", "paragraph_open"]
        );
    }

    #[test]
    fn splice_before_cursor_shifts_position() {
        let mut tokens = paragraph("a");
        let mut cursor = Cursor::new(&mut tokens, 2);
        cursor.splice_at(0, 0, [Token::newline(), Token::newline()]);
        assert_eq!(cursor.index(), 4);
        assert_eq!(
            cursor.current().map(|t| t.kind),
            Some(TokenKind::ParagraphClose)
        );

        cursor.splice_at(0, 3, []);
        assert_eq!(cursor.index(), 1);
        assert_eq!(
            cursor.current().map(|t| t.kind),
            Some(TokenKind::ParagraphClose)
        );
    }

    #[test]
    fn splice_after_cursor_keeps_position() {
        let mut tokens = paragraph("a");
        let mut cursor = Cursor::new(&mut tokens, 0);
        cursor.splice_at(2, 1, []);
        assert_eq!(cursor.index(), 0);
        assert!(cursor.current().is_some());
    }

    #[test]
    fn splice_covering_cursor_marks_removed() {
        let mut tokens = paragraph("a");
        let mut cursor = Cursor::new(&mut tokens, 1);
        let removed = cursor.splice_at(0, 3, [Token::html_block("<hr>")]);
        assert_eq!(removed.len(), 3);
        assert!(cursor.current().is_none());
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn removed_token_is_not_descended_and_replacement_is_visited() {
        let mut tokens = paragraph("a");
        let mut texts = 0;
        walk_tokens(&mut tokens, Direction::Forward, |cursor| {
            match cursor.current().map(|t| t.kind) {
                Some(TokenKind::Inline) => {
                    cursor.remove_current();
                }
                Some(TokenKind::Text) => texts += 1,
                _ => {}
            }
        });
        assert_eq!(texts, 0);
        assert_eq!(kinds(&tokens), ["paragraph_open", "paragraph_close"]);
    }

    #[test]
    fn inserted_sibling_is_visited_next() {
        let mut tokens = paragraph("a");
        let mut seen = Vec::new();
        walk_tokens(&mut tokens, Direction::Forward, |cursor| {
            let Some(kind) = cursor.current().map(|t| t.kind) else {
                return;
            };
            seen.push(kind.as_str());
            if kind == TokenKind::ParagraphClose {
                cursor.insert_after(Token::newline());
            }
        });
        assert_eq!(seen.last(), Some(&"text"));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn resume_from_overrides_next_position() {
        let mut tokens = paragraph("a");
        tokens.extend(paragraph("b"));
        let mut visited = 0;
        walk_tokens(&mut tokens, Direction::Forward, |cursor| {
            visited += 1;
            if cursor.index() == 0 {
                cursor.resume_from(3);
            }
        });
        // p_open, then the second paragraph (open, inline, text, close)
        assert_eq!(visited, 5);
    }

    #[test]
    fn replace_current_walks_new_children() {
        let mut tokens = paragraph("a");
        let mut texts = Vec::new();
        walk_tokens(&mut tokens, Direction::Forward, |cursor| {
            match cursor.current().map(|t| t.kind) {
                Some(TokenKind::Inline) => {
                    cursor.replace_current(Token::inline("b", vec![Token::text("b")]));
                }
                Some(TokenKind::Text) => {
                    if let Some(token) = cursor.current() {
                        texts.push(token.content.clone());
                    }
                }
                _ => {}
            }
        });
        assert_eq!(texts, ["b"]);
    }
}
