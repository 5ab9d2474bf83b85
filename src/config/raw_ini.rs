//! Raw INI format for the `config` crate
//!
//! Values are kept exactly as written: no escape sequences, no quote
//! stripping. Indented lines continue the previous value and are joined to it
//! with a newline. Sections are nested under a single [`SECTIONS_KEY`] table
//! so that dotted section names are not split into paths when layers merge.

use ::config::{FileStoredFormat, Format, Map, Value, ValueKind};
use ::ini::{Ini, ParseOption};
use std::collections::BTreeMap;
use thiserror::Error;

/// Top-level key holding every section
pub const SECTIONS_KEY: &str = "sections";

/// INI format with values taken verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIni;

/// INI text the parser rejects
#[derive(Error, Debug)]
pub enum RawIniError {
    #[error(transparent)]
    Parse(#[from] ::ini::ParseError),

    #[error("option '{0}' appears before the first section header")]
    OptionOutsideSection(String),
}

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Continuation lines, keyed by (section, option)
type Continuations = BTreeMap<(String, String), Vec<String>>;

impl Format for RawIni {
    fn parse(
        &self,
        uri: Option<&String>,
        text: &str,
    ) -> Result<Map<String, Value>, Box<dyn std::error::Error + Send + Sync>> {
        let sections = parse_sections(text)?;

        let table: Map<String, Value> = sections
            .into_iter()
            .map(|(name, options)| {
                let options: Map<String, Value> = options
                    .into_iter()
                    .map(|(key, value)| (key, Value::new(uri, ValueKind::String(value))))
                    .collect();
                (name, Value::new(uri, ValueKind::Table(options)))
            })
            .collect();

        let mut root = Map::new();
        root.insert(SECTIONS_KEY.to_string(), Value::new(uri, ValueKind::Table(table)));
        Ok(root)
    }
}

impl FileStoredFormat for RawIni {
    fn file_extensions(&self) -> &'static [&'static str] {
        &["cfg", "ini"]
    }
}

/// Parse INI text into lowercased section -> option -> value
pub fn parse_sections(text: &str) -> Result<Sections, RawIniError> {
    let (single_line, continuations) = fold_continuations(text);

    let ini = Ini::load_from_str_opt(
        &single_line,
        ParseOption {
            enabled_quote: false,
            enabled_escape: false,
        },
    )?;

    let mut sections = Sections::new();
    for (name, properties) in ini.iter() {
        let Some(name) = name else {
            if let Some((key, _)) = properties.iter().next() {
                return Err(RawIniError::OptionOutsideSection(key.to_string()));
            }
            continue;
        };

        // Repeated headers merge into one section, the last value of an option wins
        let options = sections.entry(name.to_lowercase()).or_default();
        for (key, value) in properties.iter() {
            options.insert(key.to_lowercase(), value.to_string());
        }
    }

    for ((section, key), lines) in continuations {
        if let Some(value) = sections.get_mut(&section).and_then(|s| s.get_mut(&key)) {
            for line in lines {
                value.push('\n');
                value.push_str(&line);
            }
        }
    }

    Ok(sections)
}

/// Split continuation lines out of `text`
///
/// Returns text with one line per option and the continuation lines of each
/// option. Comment and continuation lines become blank lines so parse errors
/// keep their line numbers. A blank line ends a value.
fn fold_continuations(text: &str) -> (String, Continuations) {
    let mut single_line = String::with_capacity(text.len());
    let mut continuations = Continuations::new();
    let mut section: Option<String> = None;
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with(|c: char| c == '#' || c == ';') {
            single_line.push('\n');
            continue;
        }
        if trimmed.is_empty() {
            current = None;
            single_line.push('\n');
            continue;
        }

        let indented = line.starts_with(|c: char| c == ' ' || c == '\t');
        if let (true, Some(option)) = (indented, &current) {
            continuations
                .entry(option.clone())
                .or_default()
                .push(trimmed.to_string());
            single_line.push('\n');
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header.split(']').next().unwrap_or_default();
            section = Some(name.trim().to_lowercase());
            current = None;
        } else if let Some(name) = &section {
            let key = trimmed
                .split(|c: char| c == '=' || c == ':')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase();
            // A repeated option starts over
            continuations.remove(&(name.clone(), key.clone()));
            current = Some((name.clone(), key));
        }

        single_line.push_str(line);
        single_line.push('\n');
    }

    (single_line, continuations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(sections: &Sections, section: &str, key: &str) -> Option<String> {
        sections.get(section).and_then(|s| s.get(key)).cloned()
    }

    #[test]
    fn test_values_are_verbatim() {
        let sections = parse_sections(
            "[ldap]\nuserbase = cn=Smith\\, John,dc=x\nquoted = \"hi\"\nsingle = 'there'\n",
        )
        .unwrap();

        assert_eq!(option(&sections, "ldap", "userbase").unwrap(), "cn=Smith\\, John,dc=x");
        assert_eq!(option(&sections, "ldap", "quoted").unwrap(), "\"hi\"");
        assert_eq!(option(&sections, "ldap", "single").unwrap(), "'there'");
    }

    #[test]
    fn test_continuation_lines() {
        let sections = parse_sections(
            "[email]\nrecipients = a@x.com\n  b@y.com\n\tc@z.com\nhost = localhost\n",
        )
        .unwrap();

        assert_eq!(
            option(&sections, "email", "recipients").unwrap(),
            "a@x.com\nb@y.com\nc@z.com"
        );
        assert_eq!(option(&sections, "email", "host").unwrap(), "localhost");
    }

    #[test]
    fn test_blank_line_ends_value() {
        let sections = parse_sections("[s]\na = 1\n\n  b = 2\n").unwrap();
        assert_eq!(option(&sections, "s", "a").unwrap(), "1");
        assert_eq!(option(&sections, "s", "b").unwrap(), "2");
    }

    #[test]
    fn test_comments_skipped() {
        let sections = parse_sections("# top\n[s]\n  ; indented\na = x;y#z\n").unwrap();
        assert_eq!(option(&sections, "s", "a").unwrap(), "x;y#z");
    }

    #[test]
    fn test_repeated_option_drops_old_continuation() {
        let sections = parse_sections("[s]\na = 1\n  more\na = 2\n").unwrap();
        assert_eq!(option(&sections, "s", "a").unwrap(), "2");
    }

    #[test]
    fn test_dotted_section_name() {
        let sections = parse_sections("[goauth2.x]\nclient_id = abc\n").unwrap();
        assert_eq!(option(&sections, "goauth2.x", "client_id").unwrap(), "abc");
    }

    #[test]
    fn test_option_outside_section() {
        let err = parse_sections("orphan = 1\n[s]\n").unwrap_err();
        assert!(matches!(err, RawIniError::OptionOutsideSection(ref key) if key == "orphan"));
    }
}
