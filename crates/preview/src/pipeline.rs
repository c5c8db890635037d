//! Previewer: parses, runs the enabled rules in order and renders.

use std::collections::BTreeSet;

use doco_core::{
    HtmlRenderer, LinkPolicy, ParseOptions, RenderOptions, Slugger, Token, TokenKind,
    parse_tokens, prose_escape,
};

use crate::error::PreviewError;
use crate::options::PreviewOptions;
use crate::rules::RuleName;

/// Per-render state handed to every rule.
pub struct State<'a> {
    /// Block tokens of the document being rendered.
    pub tokens: Vec<Token>,
    /// Options of the owning previewer.
    pub options: &'a PreviewOptions,
    /// Heading ids handed out so far.
    pub slugs: Slugger,
    enabled: &'a BTreeSet<RuleName>,
}

impl<'a> State<'a> {
    /// Fresh state for one render.
    pub fn new(
        tokens: Vec<Token>,
        options: &'a PreviewOptions,
        enabled: &'a BTreeSet<RuleName>,
    ) -> Self {
        Self {
            tokens,
            options,
            slugs: Slugger::new(),
            enabled,
        }
    }

    /// Whether `rule` takes part in this render.
    pub fn is_enabled(&self, rule: RuleName) -> bool {
        self.enabled.contains(&rule)
    }
}

/// Configured preview renderer, reusable across renders.
///
/// ```
/// use doco_preview::{PreviewOptions, Previewer};
///
/// let previewer = Previewer::new(PreviewOptions::default());
/// let html = previewer.render("Hello <^>name<^>!").unwrap();
/// assert_eq!(html, "<p>Hello <span class=\"highlight\">name</span>!</p>\n");
/// ```
pub struct Previewer {
    options: PreviewOptions,
    enabled: BTreeSet<RuleName>,
    renderer: HtmlRenderer,
}

impl Previewer {
    /// Builds a previewer with the rules selected in `options`.
    pub fn new(options: PreviewOptions) -> Self {
        let enabled = options.resolve_rules();
        let renderer = build_renderer(&options);
        log::debug!(
            "previewer rules: {}",
            enabled
                .iter()
                .map(|rule| rule.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            options,
            enabled,
            renderer,
        }
    }

    /// Builds a previewer from camelCase JSON options.
    pub fn from_json(json: &str) -> Result<Self, PreviewError> {
        let options: PreviewOptions = serde_json::from_str(json)?;
        Ok(Self::new(options))
    }

    /// Options this previewer was built with.
    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    /// Turns a rule on by name.
    pub fn enable(&mut self, name: &str) -> Result<(), PreviewError> {
        let rule: RuleName = name.parse()?;
        self.enabled.insert(rule);
        Ok(())
    }

    /// Turns a rule off by name.
    pub fn disable(&mut self, name: &str) -> Result<(), PreviewError> {
        let rule: RuleName = name.parse()?;
        self.enabled.remove(&rule);
        Ok(())
    }

    /// Whether `rule` runs on render.
    pub fn is_enabled(&self, rule: RuleName) -> bool {
        self.enabled.contains(&rule)
    }

    /// Parses `source` and returns the token stream after every enabled rule.
    pub fn parse(&self, source: &str) -> Result<Vec<Token>, PreviewError> {
        let tokens = parse_tokens(source, &self.parse_options())?;
        let mut state = State::new(tokens, &self.options, &self.enabled);
        for rule in RuleName::ALL {
            if state.is_enabled(rule) {
                rule.run(&mut state);
            }
        }
        Ok(state.tokens)
    }

    /// Renders `source` to HTML.
    pub fn render(&self, source: &str) -> Result<String, PreviewError> {
        let tokens = self.parse(source)?;
        Ok(self.renderer.render(&tokens))
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            html: self.options.html,
            linkify: self.options.linkify,
            superscript: self.options.superscript,
            links: if self.is_enabled(RuleName::Links) {
                LinkPolicy::Strict
            } else {
                LinkPolicy::Permissive
            },
        }
    }
}

fn build_renderer(options: &PreviewOptions) -> HtmlRenderer {
    let mut renderer = HtmlRenderer::new(RenderOptions {
        xhtml_out: options.xhtml_out,
        breaks: options.breaks,
    });

    // Bare `<br>`, without the trailing newline of the stock rule.
    renderer.set_rule(
        TokenKind::Softbreak,
        Box::new(|_: &[Token], _: usize, options: &RenderOptions, _: &HtmlRenderer| {
            let out = match (options.breaks, options.xhtml_out) {
                (true, true) => "<br />",
                (true, false) => "<br>",
                (false, _) => "\n",
            };
            out.to_string()
        }),
    );
    renderer.set_rule(
        TokenKind::Text,
        Box::new(|tokens: &[Token], idx: usize, _: &RenderOptions, _: &HtmlRenderer| {
            prose_escape(&tokens[idx].content)
        }),
    );
    renderer
}
