//! Ordered find/replace passes used for vendor-flavoured escaping.
//!
//! Every profile is a list of [`Replacement`]s applied in sequence. The order
//! is significant: later stages see the entities produced by earlier ones, so
//! the smart-quote stages never reintroduce a bare `&`.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, NoExpand, Regex};

/// Replacement computed from a match. Receives the whole haystack so it can
/// inspect where the match sits.
pub type ComputeFn = fn(&Captures<'_>, &str) -> String;

/// What a [`Replacement`] substitutes for each match.
#[derive(Clone, Copy)]
pub enum Replace {
    /// Fixed text, inserted without `$` expansion.
    Literal(&'static str),
    /// Text derived from the match.
    Computed(ComputeFn),
}

/// A single find/replace stage. All matches are replaced.
pub struct Replacement {
    find: Regex,
    replace: Replace,
}

impl Replacement {
    /// Stage matching a regular expression.
    pub fn new(find: Regex, replace: Replace) -> Self {
        Self { find, replace }
    }

    /// Stage matching `find` literally.
    pub fn literal(find: &str, replace: &'static str) -> Result<Self, regex::Error> {
        Ok(Self::new(
            Regex::new(&regex::escape(find))?,
            Replace::Literal(replace),
        ))
    }

    /// Runs this stage over `input`.
    pub fn apply<'h>(&self, input: &'h str) -> Cow<'h, str> {
        match self.replace {
            Replace::Literal(text) => self.find.replace_all(input, NoExpand(text)),
            Replace::Computed(compute) => self
                .find
                .replace_all(input, |caps: &Captures<'_>| compute(caps, input)),
        }
    }
}

/// Applies each stage in order, feeding the output of one into the next.
pub fn run_replacers(input: &str, replacers: &[Replacement]) -> String {
    let mut output = input.to_string();
    for stage in replacers {
        let changed = match stage.apply(&output) {
            Cow::Borrowed(_) => None,
            Cow::Owned(out) => Some(out),
        };
        if let Some(out) = changed {
            output = out;
        }
    }
    output
}

// Only called while initialising the static profiles below.
fn stage(pattern: &str, replace: Replace) -> Replacement {
    Replacement::new(
        Regex::new(pattern).expect("escape profile pattern must compile"),
        replace,
    )
}

static COMMENTS: Lazy<Replacement> = Lazy::new(|| stage(r"<!--.*?-->", Replace::Literal("")));

static ENTITIES: Lazy<Vec<Replacement>> = Lazy::new(|| {
    vec![
        stage(r"&", Replace::Literal("&amp;")),
        stage(r">", Replace::Literal("&gt;")),
        stage(r"<", Replace::Literal("&lt;")),
    ]
});

static TABS: Lazy<Replacement> = Lazy::new(|| stage(r"\t", Replace::Literal("    ")));

static SMART_QUOTES: Lazy<Vec<Replacement>> = Lazy::new(|| {
    vec![
        // Pairs bounded by single spaces, or the whole string.
        stage(
            r#"( )"([^"]*?)"( )|^"([^"]*?)"$"#,
            Replace::Computed(spaced_pair),
        ),
        // Pairs touching `=`.
        stage(
            r#"(=)"([^"]*?)"|"([^"]*?)"(=)"#,
            Replace::Computed(equals_pair),
        ),
        stage(
            r#"“|^"|[\r\n ]"[^\r\n ]|"'$"#,
            Replace::Computed(|caps, _| caps[0].replace(['“', '"'], "&ldquo;")),
        ),
        stage(
            r#"”|[^\r\n ]"[\r\n ]|"$"#,
            Replace::Computed(|caps, _| caps[0].replace(['”', '"'], "&rdquo;")),
        ),
        stage(
            r"[\r\n ]''[^\r\n ]",
            Replace::Computed(|caps, _| caps[0].replace("''", "&rsquo;&lsquo;")),
        ),
        stage(r"[^\r\n ]''", Replace::Computed(inner_single_pair)),
        stage(r"''$", Replace::Literal("&rdquo;")),
        stage(r"[^']+' |[^']+'$|^'$", Replace::Computed(right_single)),
        stage(r"\('", Replace::Literal("(&lsquo;")),
        stage(r"'\)", Replace::Literal("&rsquo;)")),
        stage(r"[&$]'|&amp;'|'ll|'s", Replace::Computed(right_single)),
        stage(r#"""#, Replace::Literal("&quot;")),
    ]
});

static SYMBOLS: Lazy<Vec<Replacement>> = Lazy::new(|| {
    vec![
        stage(r"(?i)\(R\)", Replace::Literal("&reg;")),
        stage(r"(?i)\(C\)", Replace::Literal("&copy;")),
        stage(r"(?i)\(TM\)", Replace::Literal("&trade;")),
    ]
});

fn spaced_pair(caps: &Captures<'_>, _: &str) -> String {
    let inner = caps[0].replace('"', "");
    let left = caps.get(1).map_or("", |m| m.as_str());
    let right = caps.get(3).map_or("", |m| m.as_str());
    format!("{left}&ldquo;{}&rdquo;{right}", inner.trim())
}

fn equals_pair(caps: &Captures<'_>, _: &str) -> String {
    if caps.get(1).is_some() {
        let inner = caps.get(2).map_or("", |m| m.as_str());
        format!("=&ldquo;{inner}&rdquo;")
    } else {
        let inner = caps.get(3).map_or("", |m| m.as_str());
        format!("&ldquo;{inner}&rdquo;=")
    }
}

// `x''` becomes a left double quote unless it ends the string; `)''` always does.
fn inner_single_pair(caps: &Captures<'_>, haystack: &str) -> String {
    let Some(m) = caps.get(0) else {
        return String::new();
    };
    if m.end() == haystack.len() && !m.as_str().starts_with(')') {
        return m.as_str().to_string();
    }
    m.as_str().replace("''", "&ldquo;")
}

fn right_single(caps: &Captures<'_>, _: &str) -> String {
    caps[0].replace('\'', "&rsquo;")
}

/// Prose escaping: drops single-line comments, encodes `&`, `>` and `<`,
/// curls quotes and expands `(R)`, `(C)` and `(TM)`.
///
/// The output already contains entities and must not be escaped again.
pub fn prose_escape(input: &str) -> String {
    let stripped = strip_comments(input);
    let escaped = run_replacers(&stripped, &ENTITIES);
    let curled = run_replacers(&escaped, &SMART_QUOTES);
    run_replacers(&curled, &SYMBOLS)
}

/// Code escaping: only `&`, `>` and `<`, with tabs expanded to four spaces.
pub fn code_escape(input: &str) -> String {
    let escaped = run_replacers(input, &ENTITIES);
    TABS.apply(&escaped).into_owned()
}

/// Plain HTML escaping of `&`, `<`, `>` and `"`.
pub fn escape_html(input: &str) -> String {
    html_escape::encode_double_quoted_attribute(input).into_owned()
}

/// Removes complete `<!-- ... -->` comments that sit on one line.
pub fn strip_comments(input: &str) -> String {
    COMMENTS.apply(input).into_owned()
}

/// Turns `&lt;` and `&gt;` back into angle brackets.
pub fn unescape_brackets(input: &str) -> String {
    input.replace("&lt;", "<").replace("&gt;", ">")
}
