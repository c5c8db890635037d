//! Heading ids with vendor slugs.
//!
//! The anchor extension expects to register a rule that runs later. Here it
//! is handed an [`Interceptor`] whose `push` runs the rule at once, against
//! the tokens as they are at this point of the pipeline.

use doco_core::slugify;

use crate::anchor::{AnchorOptions, CoreRule, CoreRuler, anchor};
use crate::pipeline::State;

/// Registration shim that executes pushed rules immediately.
pub struct Interceptor<'s, 'a> {
    state: &'s mut State<'a>,
}

impl<'s, 'a> Interceptor<'s, 'a> {
    /// Wraps the state the pushed rules run against.
    pub fn new(state: &'s mut State<'a>) -> Self {
        Self { state }
    }
}

impl CoreRuler for Interceptor<'_, '_> {
    fn push(&mut self, name: &'static str, rule: CoreRule) {
        log::debug!("running intercepted core rule {name}");
        rule(&mut *self.state);
    }
}

/// Anchor settings of the vendor tool.
pub fn anchor_options() -> AnchorOptions {
    AnchorOptions {
        level: 1,
        tab_index: false,
        slugify,
    }
}

pub(crate) fn run(state: &mut State<'_>) {
    anchor(&mut Interceptor::new(state), anchor_options());
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use doco_core::{ParseOptions, TokenKind, parse_tokens};

    use super::*;
    use crate::options::PreviewOptions;

    fn heading_ids(markdown: &str) -> Vec<String> {
        let tokens = parse_tokens(markdown, &ParseOptions::default()).unwrap();
        let options = PreviewOptions::default();
        let enabled = BTreeSet::new();
        let mut state = State::new(tokens, &options, &enabled);
        run(&mut state);
        state
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::HeadingOpen)
            .filter_map(|t| t.attr_get("id").map(str::to_string))
            .collect()
    }

    #[test]
    fn vendor_slugs_without_tabindex() {
        let tokens = parse_tokens("# Title (H1)", &ParseOptions::default()).unwrap();
        let options = PreviewOptions::default();
        let enabled = BTreeSet::new();
        let mut state = State::new(tokens, &options, &enabled);
        run(&mut state);
        assert_eq!(
            state.tokens[0].attrs,
            [("id".to_string(), "title-h1".to_string())]
        );
    }

    #[test]
    fn punctuation_heavy_heading() {
        assert_eq!(
            heading_ids("### Special - chars — 🚨 !@#$%^*()-+=_—~`\"'"),
            ["special-chars-—-🚨-_—-quot-39"]
        );
    }

    #[test]
    fn duplicates_are_numbered() {
        assert_eq!(
            heading_ids("## FAQ\n\n## FAQ\n\n## FAQ"),
            ["faq", "faq-1", "faq-2"]
        );
    }

    #[test]
    fn interceptor_runs_rules_on_push() {
        let tokens = parse_tokens("# A", &ParseOptions::default()).unwrap();
        let options = PreviewOptions::default();
        let enabled = BTreeSet::new();
        let mut state = State::new(tokens, &options, &enabled);

        Interceptor::new(&mut state).push(
            "mark",
            Box::new(|state: &mut State<'_>| state.tokens[0].attr_set("data-seen", "yes")),
        );
        assert_eq!(state.tokens[0].attr_get("data-seen"), Some("yes"));
    }
}
