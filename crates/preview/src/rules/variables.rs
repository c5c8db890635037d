//! `<^>name<^>` variable highlights.

use doco_core::{Direction, Token, TokenKind, escape_html, prose_escape, walk_tokens};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::State;

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\^>(.+?)<\^>").expect("variable pattern must compile"));

// Middle text left behind when the superscript extension claimed the carets.
static SPLIT_INNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^>(.*)<$").expect("split variable pattern must compile"));

/// Wraps every `<^>name<^>` in `<span class="highlight">`.
///
/// Text between variables goes through `plain`, variable names through
/// `variable`. Markers do not span lines.
///
/// ```
/// use doco_core::code_escape;
/// use doco_preview::rules::variables::process_text_for_vars;
///
/// let html = process_text_for_vars("cd <^>dir<^> && ls", code_escape, code_escape);
/// assert_eq!(html, "cd <span class=\"highlight\">dir</span> &amp;&amp; ls");
/// ```
pub fn process_text_for_vars<P, V>(text: &str, plain: P, variable: V) -> String
where
    P: Fn(&str) -> String,
    V: Fn(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut pointer = 0;
    for caps in VARIABLE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&plain(&text[pointer..whole.start()]));
        out.push_str("<span class=\"highlight\">");
        out.push_str(&variable(name.as_str()));
        out.push_str("</span>");
        pointer = whole.end();
    }
    out.push_str(&plain(&text[pointer..]));
    out
}

/// Whether `text` holds a variable marker pair.
pub fn has_variable(text: &str) -> bool {
    VARIABLE.is_match(text)
}

fn highlight_prose(text: &str) -> Token {
    Token::html_block(process_text_for_vars(text, prose_escape, prose_escape))
}

pub(crate) fn run(state: &mut State<'_>) {
    walk_tokens(&mut state.tokens, Direction::Forward, |cursor| {
        let Some(token) = cursor.current() else {
            return;
        };

        let kind = token.kind;
        match kind {
            TokenKind::Inline => {
                if let Some(children) = cursor.current_mut().and_then(|t| t.children.as_mut()) {
                    highlight_children(children);
                }
            }
            TokenKind::Text if has_variable(&token.content) => {
                let replacement = highlight_prose(&token.content);
                cursor.replace_current(replacement);
            }
            // Emitted as finished HTML so the span survives the renderer.
            TokenKind::CodeInline => {
                let html = format!(
                    "<code>{}</code>",
                    process_text_for_vars(&token.content, escape_html, escape_html)
                );
                cursor.replace_current(Token::html_block(html));
            }
            _ => {}
        }
    });
}

fn highlight_children(children: &mut Vec<Token>) {
    if let [only] = children.as_mut_slice() {
        if only.kind == TokenKind::Text && has_variable(&only.content) {
            *only = highlight_prose(&only.content);
        }
        return;
    }
    stitch_split_variables(children);
}

/// Rejoins `text("…<") sup_open text(">name<") sup_close text(">…")` into the
/// surrounding text plus one highlight span.
fn stitch_split_variables(children: &mut Vec<Token>) {
    let mut ci = 1;
    while ci + 3 < children.len() {
        let Some(name) = split_variable_at(children, ci) else {
            ci += 1;
            continue;
        };

        if let Some(stripped) = children[ci - 1].content.strip_suffix('<') {
            children[ci - 1].content = stripped.to_string();
        }
        children[ci + 1] = Token::html_block(format!(
            "<span class=\"highlight\">{}</span>",
            prose_escape(&name)
        ));
        if let Some(stripped) = children[ci + 3].content.strip_prefix('>') {
            children[ci + 3].content = stripped.to_string();
        }
        children.remove(ci + 2);
        children.remove(ci);
        log::trace!("stitched superscript-split variable `{name}`");

        // The trailing text may open the next split variable.
        ci += 2;
    }
}

fn split_variable_at(children: &[Token], ci: usize) -> Option<String> {
    let shape = children[ci].kind == TokenKind::SupOpen
        && children[ci - 1].kind == TokenKind::Text
        && children[ci + 1].kind == TokenKind::Text
        && children[ci + 2].kind == TokenKind::SupClose
        && children[ci + 3].kind == TokenKind::Text;
    if !shape {
        return None;
    }
    SPLIT_INNER
        .captures(&children[ci + 1].content)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use doco_core::{ParseOptions, code_escape, parse_tokens};

    use super::*;
    use crate::options::PreviewOptions;

    fn rewritten(markdown: &str, superscript: bool) -> Vec<Token> {
        let parse = ParseOptions {
            superscript,
            ..ParseOptions::default()
        };
        let tokens = parse_tokens(markdown, &parse).unwrap();
        let options = PreviewOptions::default();
        let enabled = BTreeSet::new();
        let mut state = State::new(tokens, &options, &enabled);
        run(&mut state);
        state.tokens
    }

    fn children_of_first_inline(tokens: &[Token]) -> Vec<(TokenKind, String)> {
        tokens
            .iter()
            .find(|t| t.kind == TokenKind::Inline)
            .map(|t| {
                t.children()
                    .iter()
                    .map(|c| (c.kind, c.content.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn text_outside_and_inside_is_processed_separately() {
        let html = process_text_for_vars(
            "<^>a<^> & <^>b<^>",
            |t| format!("[{t}]"),
            |t| t.to_uppercase(),
        );
        assert_eq!(
            html,
            "[]<span class=\"highlight\">A</span>[ & ]<span class=\"highlight\">B</span>[]"
        );
    }

    #[test]
    fn markers_do_not_cross_lines() {
        assert!(!has_variable("<^>a\nb<^>"));
        assert_eq!(process_text_for_vars("no vars", code_escape, code_escape), "no vars");
    }

    #[test]
    fn single_text_child_becomes_html() {
        let tokens = rewritten("Hello <^>Joshua<^>!", false);
        assert_eq!(
            children_of_first_inline(&tokens),
            [(
                TokenKind::HtmlBlock,
                "Hello <span class=\"highlight\">Joshua</span>!".to_string()
            )]
        );
    }

    #[test]
    fn text_inside_emphasis_is_highlighted() {
        let tokens = rewritten("Set **<^>port<^>** now", false);
        let children = children_of_first_inline(&tokens);
        assert_eq!(
            children[2],
            (
                TokenKind::HtmlBlock,
                "<span class=\"highlight\">port</span>".to_string()
            )
        );
    }

    #[test]
    fn superscript_split_is_stitched() {
        let tokens = rewritten("Hello <^>Joshua<^>!", true);
        assert_eq!(
            children_of_first_inline(&tokens),
            [
                (TokenKind::Text, "Hello ".to_string()),
                (
                    TokenKind::HtmlBlock,
                    "<span class=\"highlight\">Joshua</span>".to_string()
                ),
                (TokenKind::Text, "!".to_string()),
            ]
        );
    }

    #[test]
    fn every_split_variable_is_stitched() {
        let tokens = rewritten("<^>a<^> and <^>b<^>", true);
        let kinds: Vec<_> = children_of_first_inline(&tokens)
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Text,
                TokenKind::HtmlBlock,
                TokenKind::Text,
                TokenKind::HtmlBlock,
                TokenKind::Text,
            ]
        );
    }

    #[test]
    fn inline_code_is_rebuilt_as_html() {
        let tokens = rewritten("`a \"<^>b<^>\"`", false);
        assert_eq!(
            children_of_first_inline(&tokens),
            [(
                TokenKind::HtmlBlock,
                "<code>a &quot;<span class=\"highlight\">b</span>&quot;</code>".to_string()
            )]
        );
    }
}
