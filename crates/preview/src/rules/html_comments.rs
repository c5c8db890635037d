//! `<!-- … -->` removal when raw HTML is not parsed.
//!
//! With HTML off the parser leaves comments as text, so a comment may start
//! in one paragraph and end several blocks later. Removal keeps the text
//! before `<!--` and after `-->`, and never breaks an open/close pair whose
//! partner lies outside the removed range.

use std::ops::Range;

use doco_core::{Cursor, Direction, Nesting, Token, TokenKind, unescape_brackets, walk_tokens};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::State;

const OPEN: &str = "<!--";
const CLOSE: &str = "-->";

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern must compile"));

pub(crate) fn run(state: &mut State<'_>) {
    if state.options.html {
        return;
    }

    walk_tokens(&mut state.tokens, Direction::Forward, |cursor| {
        let Some(token) = cursor.current_mut() else {
            return;
        };
        if token.kind != TokenKind::Inline || !unescape_brackets(&token.content).contains(OPEN) {
            return;
        }

        if let Some(children) = token.children.as_mut()
            && strip_child_spans(children)
        {
            token.content = COMMENT
                .replace_all(&unescape_brackets(&token.content), "")
                .into_owned();
        }

        let content = unescape_brackets(&token.content);
        if COMMENT.replace_all(&content, "").trim().is_empty() {
            remove_comment_block(cursor);
        } else if has_unclosed(&content) {
            remove_block_span(cursor, &content);
        }
    });
}

fn has_unclosed(text: &str) -> bool {
    before_unclosed(text).is_some()
}

/// Text before the first `<!--` that is never closed, with complete
/// comments removed.
fn before_unclosed(text: &str) -> Option<String> {
    let open = COMMENT.replace_all(text, "");
    open.find(OPEN).map(|at| open[..at].to_string())
}

/// Drops an `inline` token that holds nothing but comments, with its
/// paragraph when the paragraph wraps only this token.
fn remove_comment_block(cursor: &mut Cursor<'_>) {
    let idx = cursor.index();
    let tokens = cursor.tokens();
    let wrapped = idx > 0
        && tokens[idx - 1].kind == TokenKind::ParagraphOpen
        && tokens
            .get(idx + 1)
            .is_some_and(|t| t.kind == TokenKind::ParagraphClose);
    let (start, count) = if wrapped { (idx - 1, 3) } else { (idx, 1) };

    if count >= tokens.len() {
        return;
    }
    log::debug!("removing comment-only block at {idx}");
    cursor.splice_at(start, count, []);
}

/// Removes a comment opened in the current `inline` and closed in a later one.
/// The whole document may go.
fn remove_block_span(cursor: &mut Cursor<'_>, content: &str) {
    let idx = cursor.index();
    let tokens = cursor.tokens();

    let Some(end_idx) = (idx + 1..tokens.len()).find(|&at| {
        tokens[at].kind == TokenKind::Inline && unescape_brackets(&tokens[at].content).contains(CLOSE)
    }) else {
        log::trace!("unterminated comment at {idx} left in place");
        return;
    };

    let head = before_unclosed(content)
        .map(|head| head.trim_end().to_string())
        .unwrap_or_default();
    let end_content = unescape_brackets(&tokens[end_idx].content);
    let tail = end_content
        .find(CLOSE)
        .map(|at| end_content[at + CLOSE.len()..].trim_start().to_string())
        .unwrap_or_default();

    let start = match (head.is_empty(), idx) {
        (false, _) => idx + 1,
        (true, 0) => 0,
        (true, _) if tokens[idx - 1].kind == TokenKind::ParagraphOpen => idx - 1,
        (true, _) => idx,
    };
    let end = match tail.is_empty() {
        false => end_idx,
        true if tokens
            .get(end_idx + 1)
            .is_some_and(|t| t.kind == TokenKind::ParagraphClose) =>
        {
            end_idx + 2
        }
        true => end_idx + 1,
    };

    let doomed = removable(tokens, start..end);

    if !tail.is_empty()
        && let Some(closing) = cursor.get_mut(end_idx)
    {
        closing.content = tail;
        if let Some(children) = closing.children.as_mut() {
            keep_after_close(children);
        }
    }
    if !head.is_empty()
        && let Some(opening) = cursor.current_mut()
    {
        opening.content = head;
        if let Some(children) = opening.children.as_mut() {
            keep_before_open(children);
        }
    }

    log::debug!(
        "removing comment span {start}..{end} ({} tokens)",
        doomed.len()
    );
    for at in doomed.into_iter().rev() {
        cursor.splice_at(at, 1, []);
    }
}

/// Comments that open in one child and close in a later child of the same
/// `inline` token. Returns whether anything was removed.
fn strip_child_spans(children: &mut Vec<Token>) -> bool {
    let mut changed = false;
    loop {
        let Some(open_at) = children
            .iter()
            .position(|c| c.kind == TokenKind::Text && has_unclosed(&unescape_brackets(&c.content)))
        else {
            break;
        };
        let Some(close_at) = (open_at + 1..children.len()).find(|&at| {
            children[at].kind == TokenKind::Text
                && unescape_brackets(&children[at].content).contains(CLOSE)
        }) else {
            break;
        };

        let opening = unescape_brackets(&children[open_at].content);
        let closing = unescape_brackets(&children[close_at].content);
        if let (Some(head), Some(close)) = (before_unclosed(&opening), closing.find(CLOSE)) {
            children[open_at].content = head;
            children[close_at].content = closing[close + CLOSE.len()..].to_string();
        }

        for at in removable(children, open_at + 1..close_at).into_iter().rev() {
            children.remove(at);
        }
        changed = true;
    }
    changed
}

fn keep_before_open(children: &mut Vec<Token>) {
    let Some(at) = children
        .iter()
        .position(|c| c.kind == TokenKind::Text && has_unclosed(&unescape_brackets(&c.content)))
    else {
        return;
    };
    if let Some(head) = before_unclosed(&unescape_brackets(&children[at].content)) {
        children[at].content = head.trim_end().to_string();
    }
    children.truncate(at + 1);
    while children.last().is_some_and(is_blank) {
        children.pop();
    }
    drop_unpaired(children);
}

fn keep_after_close(children: &mut Vec<Token>) {
    let Some(at) = children
        .iter()
        .position(|c| c.kind == TokenKind::Text && unescape_brackets(&c.content).contains(CLOSE))
    else {
        return;
    };
    let text = unescape_brackets(&children[at].content);
    if let Some(close) = text.find(CLOSE) {
        children[at].content = text[close + CLOSE.len()..].trim_start().to_string();
    }
    children.drain(..at);
    while children.first().is_some_and(is_blank) {
        children.remove(0);
    }
    drop_unpaired(children);
}

fn is_blank(token: &Token) -> bool {
    match token.kind {
        TokenKind::Softbreak | TokenKind::Hardbreak => true,
        TokenKind::Text => token.content.is_empty(),
        _ => false,
    }
}

/// Index of each token's open/close partner within one level.
fn partners(tokens: &[Token]) -> Vec<Option<usize>> {
    let mut partner = vec![None; tokens.len()];
    let mut open = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        match token.nesting {
            Nesting::Opening => open.push(idx),
            Nesting::Closing => {
                if let Some(start) = open.pop() {
                    partner[start] = Some(idx);
                    partner[idx] = Some(start);
                }
            }
            Nesting::SelfClosing => {}
        }
    }
    partner
}

/// Indices in `range` that can go without leaving a tag unpaired.
fn removable(tokens: &[Token], range: Range<usize>) -> Vec<usize> {
    let partner = partners(tokens);
    let range = range.start..range.end.min(tokens.len());
    range
        .clone()
        .filter(|&at| match (tokens[at].nesting, partner[at]) {
            (Nesting::SelfClosing, _) | (_, None) => true,
            (_, Some(other)) => range.contains(&other),
        })
        .collect()
}

fn drop_unpaired(tokens: &mut Vec<Token>) {
    let partner = partners(tokens);
    let mut at = 0;
    tokens.retain(|token| {
        let keep = token.nesting == Nesting::SelfClosing || partner[at].is_some();
        at += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use doco_core::{ParseOptions, parse_tokens};

    use super::*;
    use crate::options::PreviewOptions;

    fn stripped(markdown: &str, html: bool) -> Vec<String> {
        let tokens = parse_tokens(markdown, &ParseOptions::default()).unwrap();
        let options = PreviewOptions {
            html,
            ..PreviewOptions::default()
        };
        let enabled = BTreeSet::new();
        let mut state = State::new(tokens, &options, &enabled);
        run(&mut state);
        state
            .tokens
            .iter()
            .map(|t| match t.kind {
                TokenKind::Inline => t
                    .children()
                    .iter()
                    .map(|c| c.content.as_str())
                    .collect::<Vec<_>>()
                    .join("|"),
                kind => kind.as_str().to_string(),
            })
            .collect()
    }

    #[test]
    fn comment_only_paragraph_is_removed() {
        assert_eq!(
            stripped("before\n\n<!-- note to self -->\n\nafter", false),
            [
                "paragraph_open",
                "before",
                "paragraph_close",
                "paragraph_open",
                "after",
                "paragraph_close",
            ]
        );
    }

    #[test]
    fn lone_comment_document_is_kept() {
        assert_eq!(
            stripped("<!-- only -->", false),
            ["paragraph_open", "<!-- only -->", "paragraph_close"]
        );
    }

    #[test]
    fn span_across_blocks_keeps_outer_text() {
        assert_eq!(
            stripped(
                "Intro <!-- hidden\n\n```\ncode\n```\n\n# Gone\n\nstill hidden --> Outro",
                false
            ),
            [
                "paragraph_open",
                "Intro",
                "paragraph_close",
                "paragraph_open",
                "Outro",
                "paragraph_close",
            ]
        );
    }

    #[test]
    fn span_of_whole_paragraphs_is_removed() {
        assert_eq!(
            stripped("<!--\n\n=== hello ===\n\n...this\n-->\n\nkept", false),
            ["paragraph_open", "kept", "paragraph_close"]
        );
    }

    #[test]
    fn span_covering_the_whole_document_leaves_nothing() {
        assert!(stripped("<!--\n\nsecret draft\n\n-->", false).is_empty());
        assert!(stripped("<!-- a\n\nb -->", false).is_empty());
    }

    #[test]
    fn span_starts_at_first_unclosed_opener() {
        assert_eq!(
            stripped("x <!-- a <!-- b\n\nc --> d", false),
            [
                "paragraph_open",
                "x",
                "paragraph_close",
                "paragraph_open",
                "d",
                "paragraph_close",
            ]
        );
    }

    #[test]
    fn closed_comment_before_the_opener_is_dropped() {
        assert_eq!(
            stripped("x <!-- y --> z <!-- a\n\nb --> w", false),
            [
                "paragraph_open",
                "x  z",
                "paragraph_close",
                "paragraph_open",
                "w",
                "paragraph_close",
            ]
        );
    }

    #[test]
    fn child_span_starts_at_first_unclosed_opener() {
        assert_eq!(
            stripped("a <!-- x <!-- y\n*z* --> b", false),
            ["paragraph_open", "a | b", "paragraph_close"]
        );
    }

    #[test]
    fn unterminated_comment_is_untouched() {
        assert_eq!(
            stripped("a <!-- never closed\n\nb", false),
            [
                "paragraph_open",
                "a <!-- never closed",
                "paragraph_close",
                "paragraph_open",
                "b",
                "paragraph_close",
            ]
        );
    }

    #[test]
    fn span_inside_one_paragraph() {
        assert_eq!(
            stripped("a <!-- one\n*two* --> b", false),
            ["paragraph_open", "a | b", "paragraph_close"]
        );
    }

    #[test]
    fn html_mode_is_left_alone() {
        assert_eq!(
            stripped("x <!-- a\n\nb --> y", true),
            [
                "paragraph_open",
                "x <!-- a",
                "paragraph_close",
                "paragraph_open",
                "b --> y",
                "paragraph_close",
            ]
        );
    }
}
