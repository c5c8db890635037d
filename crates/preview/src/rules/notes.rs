//! `<$>[kind] … <$>` callouts.
//!
//! ```md
//! <$>[warning]
//! **Warning:** Use this to warn users.
//! <$>
//! ```

use doco_core::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::State;

static NOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A<\$>\[(note|warning|info|draft)\].+<\$>\z").expect("note pattern must compile")
});

const CLOSER: &str = "<$>";

pub(crate) fn run(state: &mut State<'_>) {
    for token in state.tokens.iter_mut() {
        let Some(kind) = note_kind(&token.content) else {
            continue;
        };
        if let Some(children) = token.children.as_mut()
            && !children.is_empty()
        {
            log::debug!("wrapping {kind} note");
            wrap_note(children, &kind);
        }
    }
}

fn note_kind(content: &str) -> Option<String> {
    NOTE.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|kind| kind.as_str().to_string())
}

fn wrap_note(children: &mut Vec<Token>, kind: &str) {
    let open = Token::html_block(format!("<span class='{kind}'>"));
    let close = Token::html_block("</span>");
    let opener = format!("<$>[{kind}]");

    // Closing side first so a single-child note still starts with the opener.
    let last = children.len() - 1;
    match text_without(&children[last], |text| text.strip_suffix(CLOSER)) {
        Some(rest) if !rest.is_empty() => {
            children[last] = Token::text(rest);
            children.push(close);
        }
        _ => children[last] = close,
    }

    match text_without(&children[0], |text| text.strip_prefix(opener.as_str())) {
        Some(rest) if !rest.is_empty() => {
            children[0] = Token::text(rest);
            children.insert(0, open);
        }
        _ => children[0] = open,
    }

    if children.get(1).is_some_and(|t| t.kind == TokenKind::Softbreak) {
        children.remove(1);
    }
}

fn text_without<'t, F>(token: &'t Token, strip: F) -> Option<String>
where
    F: FnOnce(&'t str) -> Option<&'t str>,
{
    if token.kind != TokenKind::Text {
        return None;
    }
    strip(token.content.as_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use doco_core::{ParseOptions, parse_tokens};

    use super::*;
    use crate::options::PreviewOptions;

    fn note_children(markdown: &str) -> Vec<(TokenKind, String)> {
        let tokens = parse_tokens(markdown, &ParseOptions::default()).unwrap();
        let options = PreviewOptions::default();
        let enabled = BTreeSet::new();
        let mut state = State::new(tokens, &options, &enabled);
        run(&mut state);
        state.tokens[1]
            .children()
            .iter()
            .map(|c| (c.kind, c.content.clone()))
            .collect()
    }

    #[test]
    fn delimiters_become_spans_and_first_break_goes() {
        let children = note_children("<$>[note]\nRemember **this**.\n<$>");
        assert_eq!(children[0], (TokenKind::HtmlBlock, "<span class='note'>".to_string()));
        assert_eq!(children[1], (TokenKind::Text, "Remember ".to_string()));
        assert_eq!(children[children.len() - 2].0, TokenKind::Softbreak);
        assert_eq!(
            children[children.len() - 1],
            (TokenKind::HtmlBlock, "</span>".to_string())
        );
    }

    #[test]
    fn text_sharing_a_delimiter_is_kept() {
        assert_eq!(
            note_children("<$>[info] Same line <$>"),
            [
                (TokenKind::HtmlBlock, "<span class='info'>".to_string()),
                (TokenKind::Text, " Same line ".to_string()),
                (TokenKind::HtmlBlock, "</span>".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_kinds_and_case_are_untouched() {
        assert_eq!(
            note_children("<$>[tip]\nx\n<$>")[0],
            (TokenKind::Text, "<$>[tip]".to_string())
        );
        assert_eq!(
            note_children("<$>[Note]\nx\n<$>")[0],
            (TokenKind::Text, "<$>[Note]".to_string())
        );
    }

    #[test]
    fn unterminated_note_is_untouched() {
        assert_eq!(
            note_children("<$>[warning]\nno closer"),
            [
                (TokenKind::Text, "<$>[warning]".to_string()),
                (TokenKind::Softbreak, String::new()),
                (TokenKind::Text, "no closer".to_string()),
            ]
        );
    }
}
