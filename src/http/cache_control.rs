//! Cache-Control header codec.
//!
//! Converts between the single `Cache-Control` header value and an ordered
//! map of directives. Parsing is lenient: anything that looks like
//! `token` or `token=value` is kept, including directives this module knows
//! nothing about, so that vendor extensions added by intermediaries survive a
//! round trip.
//!
//! Serialization emits the well-known directives in a fixed order
//! (visibility, revalidation, storage, freshness, `immutable`) followed by
//! every other directive in the order it was first seen.

use indexmap::IndexMap;

/// Well-known directives, in the order they are serialized.
const CANONICAL_ORDER: [&str; 12] = [
    "public",
    "private",
    "no-cache",
    "must-revalidate",
    "proxy-revalidate",
    "no-store",
    "no-transform",
    "max-age",
    "s-maxage",
    "stale-while-revalidate",
    "stale-if-error",
    "immutable",
];

/// One Cache-Control clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Bare token, e.g. `no-store`.
    Flag,
    /// `key=value`. `quoted` records a value that was written in quotes
    /// although it would not have needed them (`max-age="0"`).
    Value { text: String, quoted: bool },
}

impl Directive {
    pub fn value(text: impl Into<String>) -> Directive {
        Directive::Value {
            text: text.into(),
            quoted: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Directive {
        let text = text.into();
        let quoted = !needs_quotes(&text);
        Directive::Value { text, quoted }
    }

    /// The value, or `None` for a flag.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Directive::Flag => None,
            Directive::Value { text, .. } => Some(text),
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Directive::Flag)
    }
}

impl From<&str> for Directive {
    fn from(text: &str) -> Self {
        Directive::value(text)
    }
}

impl From<String> for Directive {
    fn from(text: String) -> Self {
        Directive::value(text)
    }
}

macro_rules! directive_from_int {
    ($($t:ty),+) => {
        $(impl From<$t> for Directive {
            fn from(n: $t) -> Self {
                Directive::value(n.to_string())
            }
        })+
    };
}

directive_from_int!(i32, i64, u32, u64);

pub type Directives = IndexMap<String, Directive>;

/// Parse a header value into its directives.
///
/// Keys are lowercased. A repeated key keeps its first position and its last
/// value.
pub fn parse(header: &str) -> Directives {
    let mut directives = Directives::new();

    for clause in split_outside_quotes(header, ',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }

        let (key, directive) = match clause.find('=') {
            None => (clause, Directive::Flag),
            Some(pos) => {
                let raw = clause[pos + 1..].trim();
                let directive = match unquote(raw) {
                    Some(text) => Directive::quoted(text),
                    None => Directive::value(raw),
                };
                (clause[..pos].trim(), directive)
            }
        };

        if key.is_empty() {
            continue;
        }
        directives.insert(key.to_ascii_lowercase(), directive);
    }

    directives
}

/// Render directives as a header value.
pub fn serialize(directives: &Directives) -> String {
    let known = CANONICAL_ORDER
        .iter()
        .filter_map(|key| directives.get_key_value(*key));
    let unknown = directives
        .iter()
        .filter(|(key, _)| !CANONICAL_ORDER.contains(&key.as_str()));

    known
        .chain(unknown)
        .map(|(key, directive)| render(key, directive))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render(key: &str, directive: &Directive) -> String {
    match directive {
        Directive::Flag => key.to_string(),
        Directive::Value { text, quoted } => {
            if *quoted || needs_quotes(text) {
                format!("{}=\"{}\"", key, text.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                format!("{}={}", key, text)
            }
        }
    }
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| matches!(c, ',' | '=' | '"' | ';' | '\\') || c.is_whitespace())
}

/// Strip surrounding double quotes and unescape `\x` pairs.
fn unquote(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            c => out.push(c),
        }
    }
    Some(out)
}

fn split_outside_quotes(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}
