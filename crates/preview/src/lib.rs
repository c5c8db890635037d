#![deny(missing_docs)]
//! doco preview: the vendor rewriting rules over the doco token stream, the
//! rule orchestrator and the configured [`Previewer`].

/// Heading anchor extension and its registration interface.
pub mod anchor;
/// Previewer errors.
pub mod error;
/// JSON-deserializable options and rule selection.
pub mod options;
/// Previewer and per-render state.
pub mod pipeline;
/// The rewriting rules.
pub mod rules;

pub use anchor::{AnchorOptions, CoreRule, CoreRuler};
pub use error::PreviewError;
pub use options::{Preset, PreviewOptions, RuleSelection};
pub use pipeline::{Previewer, State};
pub use rules::RuleName;
pub use rules::headings::Interceptor;
pub use rules::variables::process_text_for_vars;
