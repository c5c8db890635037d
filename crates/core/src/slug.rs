use std::collections::HashSet;

/// Characters dropped from slugs without replacement.
const STRIPPED: &[char] = &[
    '!', '@', '#', '$', '%', '^', '*', '(', ')', '+', '=', '~', '`',
];

/// Vendor slug for heading text.
///
/// The steps run in a fixed order: `&`, `"` and `'` become `-amp`, `-quot`
/// and `-39`; `! @ # $ % ^ * ( ) + = ~` and backticks are removed; ` - `
/// collapses to `-`;
/// the result is lowercased; space runs become `-`; dash runs collapse.
///
/// # Examples
///
/// ```
/// use doco_core::slug::slugify;
///
/// assert_eq!(slugify("Title (H1)"), "title-h1");
/// assert_eq!(slugify("Sub-Section & More"), "sub-section-amp-more");
/// ```
pub fn slugify(text: &str) -> String {
    let replaced = text
        .replace('&', "-amp")
        .replace('"', "-quot")
        .replace('\'', "-39");

    let stripped: String = replaced.chars().filter(|ch| !STRIPPED.contains(ch)).collect();
    let lowered = stripped.replace(" - ", "-").to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let ch = if ch == ' ' { '-' } else { ch };
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    slug
}

/// Hands out unique slugs within one render.
///
/// The first use of a slug is returned as is, later ones get `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashSet<String>,
}

impl Slugger {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `slug`, or the first free numbered variant of it.
    pub fn unique(&mut self, slug: &str) -> String {
        let mut candidate = slug.to_string();
        let mut suffix = 1;
        while self.seen.contains(&candidate) {
            candidate = format!("{slug}-{suffix}");
            suffix += 1;
        }
        self.seen.insert(candidate.clone());
        candidate
    }

    /// Marks an id that is already present in the document as taken.
    pub fn reserve(&mut self, slug: &str) {
        self.seen.insert(slug.to_string());
    }
}
