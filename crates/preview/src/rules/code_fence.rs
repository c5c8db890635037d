//! Fenced code blocks: labels, command prefixes and vendor markup.
//!
//! Each `fence` is replaced by one `html_block` holding the finished
//! `<pre>`, so nothing downstream escapes the markup again.

use doco_core::{Direction, Token, TokenKind, code_escape, escape_html, prose_escape, walk_tokens};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::State;
use crate::rules::RuleName;
use crate::rules::variables::process_text_for_vars;

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|\n|\r").expect("line break pattern must compile"));

static LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[(label|secondary_label) (.+)\]$").expect("label pattern must compile")
});

static CUSTOM_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^custom_prefix\((.+)\)$").expect("custom prefix pattern must compile")
});

/// Labels captured from directive lines, first of each kind wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    /// `[label …]`, rendered above the block.
    pub primary: Option<String>,
    /// `[secondary_label …]`, rendered inside `<code>`.
    pub secondary: Option<String>,
}

impl Labels {
    fn full(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }
}

/// Command style selected by the fence language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `command`, prefixed with `$`.
    User,
    /// `super_user`, prefixed with `#`.
    SuperUser,
    /// `custom_prefix(<prefix>)`.
    Custom(String),
}

impl Command {
    /// Detects a command language tag.
    pub fn from_lang(lang: &str) -> Option<Self> {
        match lang {
            "command" => Some(Command::User),
            "super_user" => Some(Command::SuperUser),
            _ => CUSTOM_PREFIX
                .captures(lang)
                .and_then(|caps| caps.get(1))
                .map(|prefix| Command::Custom(prefix.as_str().to_string())),
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Command::User => "command",
            Command::SuperUser => "super_user",
            Command::Custom(_) => "custom_prefix",
        }
    }

    fn prefix(&self) -> String {
        match self {
            Command::User => "$".to_string(),
            Command::SuperUser => "#".to_string(),
            Command::Custom(prefix) if prefix == ">" => prefix.clone(),
            Command::Custom(prefix) => prose_escape(prefix),
        }
    }
}

/// Splits directive lines out of the code body.
///
/// Once both labels are set, later directives stay in the code as written.
/// Values are kept raw here. [`render_fence`] HTML-escapes them, where the
/// vendor markup interpolates them unescaped.
pub fn extract_labels(lines: Vec<&str>) -> (Labels, Vec<&str>) {
    let mut labels = Labels::default();
    let mut kept = Vec::with_capacity(lines.len());

    for line in lines {
        if !labels.full()
            && let Some(caps) = LABEL.captures(line)
        {
            let slot = if caps[1].eq_ignore_ascii_case("label") {
                &mut labels.primary
            } else {
                &mut labels.secondary
            };
            if slot.is_none() {
                *slot = Some(caps[2].to_string());
            }
            continue;
        }
        kept.push(line);
    }
    (labels, kept)
}

/// Renders one fence. `final_break` is false when the next token is another
/// fence and the spacing rule is on.
pub fn render_fence(content: &str, info: &str, final_break: bool) -> String {
    let lines: Vec<&str> = LINE_BREAK.split(content).collect();
    let (labels, lines) = extract_labels(lines);

    let lang = info.split_whitespace().next().unwrap_or("");
    let command = Command::from_lang(lang);
    let (lang, mut body) = match &command {
        Some(command) => ("bash", prefixed_lines(&lines, &command.prefix())),
        None => (
            lang,
            process_text_for_vars(&lines.join("\n"), code_escape, code_escape),
        ),
    };

    body.truncate(body.trim_end().len());

    if let Some(secondary) = &labels.secondary {
        let label = escape_html(secondary);
        body.insert_str(
            0,
            &format!("<div class=\"secondary-code-label \" title=\"{label}\">{label}</div>"),
        );
    }

    let mut html = String::new();
    if let Some(primary) = &labels.primary {
        let label = escape_html(primary);
        html.push_str(&format!(
            "<div class=\"code-label \" title=\"{label}\">{label}</div>"
        ));
    }

    html.push_str("<pre class=\"code-pre ");
    if let Some(command) = &command {
        html.push_str(command.class());
        html.push_str(" prefixed");
    }
    html.push_str("\">");
    if lang.is_empty() {
        html.push_str("<code>");
    } else {
        html.push_str(&format!(
            "<code class=\"code-highlight language-{}\">",
            escape_html(lang)
        ));
    }
    html.push_str(&body);
    html.push('\n');
    if command.is_some() {
        html.push_str("</li></ul>");
    }
    html.push_str("</code></pre>");
    if final_break {
        html.push('\n');
    }
    html
}

// `<ul class="prefixed"><li …>line` for the first line, `</li><li …>line` for
// the rest. The empty line left by the trailing newline gets no item.
fn prefixed_lines(lines: &[&str], prefix: &str) -> String {
    let item = format!("<li class=\"line\" data-prefix=\"{prefix}\">");
    let last = lines.len().saturating_sub(1);
    let escape_line = |line: &str| process_text_for_vars(line, code_escape, code_escape);

    let rendered: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                format!("<ul class=\"prefixed\">{item}{}", escape_line(line))
            } else if index != last || !line.is_empty() {
                format!("</li>{item}{}", escape_line(line))
            } else {
                String::new()
            }
        })
        .collect();

    rendered.join("\n")
}

pub(crate) fn run(state: &mut State<'_>) {
    let spacing = state.is_enabled(RuleName::Spacing);

    walk_tokens(&mut state.tokens, Direction::Forward, |cursor| {
        let Some(token) = cursor.current() else {
            return;
        };
        if token.kind != TokenKind::Fence || token.tag != "code" {
            return;
        }

        let next_is_fence = cursor.peek(1).is_some_and(|next| next.kind == TokenKind::Fence);
        let html = render_fence(&token.content, &token.info, !(spacing && next_is_fence));
        log::trace!("rendered fence `{}`", token.info);
        cursor.replace_current(Token::html_block(html));
    });
}
