//! `rel="nofollow"` on every link.
//!
//! The destination policy half of this rule lives in the parser adapter
//! (`LinkPolicy::Strict`), switched on by the previewer when this rule is
//! enabled.

use doco_core::{Direction, TokenKind, walk_tokens};

use crate::pipeline::State;

pub(crate) fn run(state: &mut State<'_>) {
    walk_tokens(&mut state.tokens, Direction::Forward, |cursor| {
        if let Some(token) = cursor.current_mut()
            && token.kind == TokenKind::LinkOpen
        {
            token.attr_set("rel", "nofollow");
        }
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use doco_core::{ParseOptions, Token, parse_tokens};

    use super::*;
    use crate::options::PreviewOptions;

    fn link_attrs(markdown: &str) -> Vec<Vec<(String, String)>> {
        let tokens = parse_tokens(markdown, &ParseOptions::default()).unwrap();
        let options = PreviewOptions::default();
        let enabled = BTreeSet::new();
        let mut state = State::new(tokens, &options, &enabled);
        run(&mut state);

        fn collect(tokens: &[Token], out: &mut Vec<Vec<(String, String)>>) {
            for token in tokens {
                if token.kind == TokenKind::LinkOpen {
                    out.push(token.attrs.clone());
                }
                collect(token.children(), out);
            }
        }
        let mut out = Vec::new();
        collect(&state.tokens, &mut out);
        out
    }

    #[test]
    fn nofollow_is_appended() {
        assert_eq!(
            link_attrs("[Docs](https://example.com)"),
            [vec![
                ("href".to_string(), "https://example.com".to_string()),
                ("rel".to_string(), "nofollow".to_string()),
            ]]
        );
    }

    #[test]
    fn nested_links_are_found() {
        let attrs = link_attrs("- item with <https://a.example>\n  > and [b](#b)");
        assert_eq!(attrs.len(), 2);
        assert!(
            attrs
                .iter()
                .all(|a| a.contains(&("rel".to_string(), "nofollow".to_string())))
        );
    }
}
