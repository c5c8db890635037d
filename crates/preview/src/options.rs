//! Previewer configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::rules::RuleName;

/// Options for [`crate::Previewer`], deserializable from camelCase JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOptions {
    /// Parse raw HTML. When off, HTML stays literal text and the comment
    /// rule strips `<!-- -->` comments instead.
    #[serde(default)]
    pub html: bool,
    /// Render soft line breaks as `<br>`.
    #[serde(default)]
    pub breaks: bool,
    /// Turn bare URLs into links.
    #[serde(default)]
    pub linkify: bool,
    /// Close void tags XHTML style.
    #[serde(default)]
    pub xhtml_out: bool,
    /// Enable the `^superscript^` extension.
    #[serde(default)]
    pub superscript: bool,
    /// Which rewriting rules run.
    #[serde(default)]
    pub rules: RuleSelection,
}

impl PreviewOptions {
    /// Rules enabled by [`PreviewOptions::rules`].
    pub fn resolve_rules(&self) -> BTreeSet<RuleName> {
        self.rules.resolve()
    }
}

/// Named rule presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Every rule except spacing.
    #[default]
    Default,
    /// Every rule.
    All,
}

/// Rule selection: a preset or an explicit list of rule names.
///
/// Order and duplicates in an explicit list are ignored; rules always run in
/// [`RuleName::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSelection {
    /// `"default"` or `"all"`.
    Preset(Preset),
    /// `["do_notes", "do_links", ...]`.
    Named(Vec<RuleName>),
}

impl Default for RuleSelection {
    fn default() -> Self {
        RuleSelection::Preset(Preset::Default)
    }
}

impl RuleSelection {
    /// Set of rules this selection enables.
    pub fn resolve(&self) -> BTreeSet<RuleName> {
        match self {
            RuleSelection::Preset(Preset::All) => RuleName::ALL.into_iter().collect(),
            RuleSelection::Preset(Preset::Default) => RuleName::ALL
                .into_iter()
                .filter(|rule| *rule != RuleName::Spacing)
                .collect(),
            RuleSelection::Named(names) => names.iter().copied().collect(),
        }
    }
}
