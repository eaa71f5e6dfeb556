//! Java-style `.properties` files.
//!
//! Supports `=`, `:` and whitespace separators, `#`/`!` comments, backslash
//! line continuations and the usual escapes including `\uXXXX`. Later keys
//! override earlier ones.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::utils::io;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for logical in logical_lines(content) {
            let (key, value) = split_entry(&logical);
            entries.insert(unescape(&key), unescape(&value));
        }
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = io::read_file(path, &format!("read {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// `Ok(None)` when the file does not exist.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        let content = io::read_file_if_exists(path, &format!("read {}", path.display()))?;
        Ok(content.map(|c| Self::parse(&c)))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value with surrounding whitespace removed; blank values count as absent.
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render with each `comments` line prefixed by `# `, then `key=value` lines sorted by key.
    pub fn render(&self, comments: &[String]) -> String {
        let mut out = String::new();
        for comment in comments {
            out.push_str("# ");
            out.push_str(comment);
            out.push('\n');
        }
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }

    pub fn store(&self, path: &Path, comments: &[String]) -> Result<()> {
        io::write_file_atomic(path, &self.render(comments), &format!("write {}", path.display()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Joins continuation lines and drops blanks and comments.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw in content.lines() {
        let line = raw.trim_start();
        let continuing = current.is_some();

        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        let (body, continues) = strip_continuation(line);
        let mut buf = current.take().unwrap_or_default();
        buf.push_str(body);

        if continues {
            current = Some(buf);
        } else {
            lines.push(buf);
        }
    }

    if let Some(rest) = current {
        lines.push(rest);
    }
    lines
}

/// An odd number of trailing backslashes continues the line.
fn strip_continuation(line: &str) -> (&str, bool) {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        (&line[..line.len() - 1], true)
    } else {
        (line, false)
    }
}

fn split_entry(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();
    let mut key = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            key.push(c);
            key.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == '=' || c == ':' || c.is_whitespace() {
            break;
        }
        key.push(c);
        i += 1;
    }

    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if i < chars.len() && (chars[i] == '=' || chars[i] == ':') {
        i += 1;
    }
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }

    (key, chars[i..].iter().collect())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_separators_and_comments() {
        let props = Properties::parse(
            "# channel config\n! legacy comment\nchannelName = alpha\nmarker:De\nextension dart\n",
        );
        assert_eq!(props.get("channelName"), Some("alpha"));
        assert_eq!(props.get("marker"), Some("De"));
        assert_eq!(props.get("extension"), Some("dart"));
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn continuation_lines_are_joined() {
        let props = Properties::parse("include = lib/**,\\\n    test/**\n");
        assert_eq!(props.get("include"), Some("lib/**,test/**"));
    }

    #[test]
    fn escapes_are_decoded() {
        let props = Properties::parse("a\\ b=x\\ty\nc=\\u0041\\\\\n");
        assert_eq!(props.get("a b"), Some("x\ty"));
        assert_eq!(props.get("c"), Some("A\\"));
    }

    #[test]
    fn blank_values_are_not_trimmed_values() {
        let props = Properties::parse("channelName=   \n");
        assert_eq!(props.get("channelName"), Some(""));
        assert_eq!(props.get_trimmed("channelName"), None);
    }

    #[test]
    fn later_keys_override() {
        let props = Properties::parse("k=1\nk=2\n");
        assert_eq!(props.get("k"), Some("2"));
    }

    #[test]
    fn render_sorts_and_escapes() {
        let props: Properties = vec![("zeta", "1"), ("a:b", " lead")].into_iter().collect();
        let rendered = props.render(&["title".to_string()]);
        assert_eq!(rendered, "# title\na\\:b=\\ lead\nzeta=1\n");
        assert_eq!(Properties::parse(&rendered), props);
    }

    #[test]
    fn store_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.properties");
        let mut props = Properties::new();
        props.set("apiKey", "amberBoltCrest");
        props.store(&path, &[]).unwrap();
        assert_eq!(Properties::load(&path).unwrap(), props);
        assert!(Properties::load_optional(&dir.path().join("none")).unwrap().is_none());
    }
}
