use std::sync::OnceLock;

use regex::Regex;

/// Text shape recognised by [`parse_names`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameFormat {
    /// `1, 2 Alice; 3, 4 Bob;`
    Numbered,
    /// `Alice, Bob` or one name per line.
    List,
}

/// Names extracted from imported text, with the shape that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNames {
    pub format: NameFormat,
    pub names: Vec<String>,
}

/// Parses player names from freeform text.
///
/// The numbered shape wins whenever at least one `digits, digits <name>;`
/// entry is present; otherwise the text is split on commas and newlines.
/// An empty `names` vector means nothing usable was found and callers should
/// keep their current roster.
///
/// # Example
/// ```
/// use engine::import::{NameFormat, parse_names};
///
/// let parsed = parse_names("1, 2 Alice; 3, 4 Bob;");
/// assert_eq!(parsed.format, NameFormat::Numbered);
/// assert_eq!(parsed.names, vec!["Alice", "Bob"]);
///
/// let parsed = parse_names("Lisa,\nRebecca , ,Michael");
/// assert_eq!(parsed.names, vec!["Lisa", "Rebecca", "Michael"]);
/// ```
pub fn parse_names(text: &str) -> ParsedNames {
    let numbered = parse_numbered(text);
    if !numbered.is_empty() {
        return ParsedNames {
            format: NameFormat::Numbered,
            names: numbered,
        };
    }

    ParsedNames {
        format: NameFormat::List,
        names: split_list(text, &[',', '\n']),
    }
}

/// Splits manually typed names on commas only.
pub fn split_comma_names(text: &str) -> Vec<String> {
    split_list(text, &[','])
}

fn parse_numbered(text: &str) -> Vec<String> {
    numbered_entry_regex()
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().trim().to_owned())
        .filter(|name| !name.is_empty())
        .collect()
}

fn split_list(text: &str, separators: &[char]) -> Vec<String> {
    text.split(separators)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn numbered_entry_regex() -> &'static Regex {
    static NUMBERED_ENTRY: OnceLock<Regex> = OnceLock::new();
    NUMBERED_ENTRY.get_or_init(|| {
        Regex::new(r"\d+,\s*\d+\s+([^;\n]+);").expect("numbered entry pattern is valid")
    })
}
