//! The rewriting rules and their fixed execution order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PreviewError;
use crate::pipeline::State;

pub mod code_fence;
pub mod headings;
pub mod html_comments;
pub mod links;
pub mod notes;
pub mod spacing;
pub mod variables;

/// Name of a rewriting rule.
///
/// Declaration order is execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum RuleName {
    /// Heading ids through the anchor extension.
    #[serde(rename = "do_headings")]
    Headings,
    /// `rel="nofollow"` on links, strict link destinations.
    #[serde(rename = "do_links")]
    Links,
    /// HTML comment removal when raw HTML is off.
    #[serde(rename = "do_html_comments")]
    HtmlComments,
    /// `<$>[kind] ... <$>` callouts.
    #[serde(rename = "do_notes")]
    Notes,
    /// `<^>name<^>` highlights.
    #[serde(rename = "do_variable_highlights")]
    VariableHighlights,
    /// Fenced code labels and command prefixes.
    #[serde(rename = "do_code_blocks")]
    CodeBlocks,
    /// Blank lines between blocks.
    #[serde(rename = "do_spacing")]
    Spacing,
}

impl RuleName {
    /// Every rule in execution order.
    pub const ALL: [RuleName; 7] = [
        RuleName::Headings,
        RuleName::Links,
        RuleName::HtmlComments,
        RuleName::Notes,
        RuleName::VariableHighlights,
        RuleName::CodeBlocks,
        RuleName::Spacing,
    ];

    /// Registered name, as used in options.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleName::Headings => "do_headings",
            RuleName::Links => "do_links",
            RuleName::HtmlComments => "do_html_comments",
            RuleName::Notes => "do_notes",
            RuleName::VariableHighlights => "do_variable_highlights",
            RuleName::CodeBlocks => "do_code_blocks",
            RuleName::Spacing => "do_spacing",
        }
    }

    pub(crate) fn run(self, state: &mut State<'_>) {
        log::debug!("running {self}");
        match self {
            RuleName::Headings => headings::run(state),
            RuleName::Links => links::run(state),
            RuleName::HtmlComments => html_comments::run(state),
            RuleName::Notes => notes::run(state),
            RuleName::VariableHighlights => variables::run(state),
            RuleName::CodeBlocks => code_fence::run(state),
            RuleName::Spacing => spacing::run(state),
        }
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleName {
    type Err = PreviewError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        RuleName::ALL
            .into_iter()
            .find(|rule| rule.as_str() == name)
            .ok_or_else(|| PreviewError::UnknownRule {
                name: name.to_string(),
            })
    }
}
