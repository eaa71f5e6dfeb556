//! Name fragments replacement identifiers are composed from.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::utils::io;

/// Built-in fragments. Order is part of the naming contract: reordering or
/// editing this list changes every generated name.
pub const WORDS: &[&str] = &[
    "amber", "anchor", "apex", "arbor", "arrow", "aspen", "atlas", "aurora", "axis", "badge",
    "basin", "beacon", "birch", "blaze", "bloom", "bolt", "breeze", "brook", "cable", "cairn",
    "canyon", "cargo", "cedar", "chalk", "cinder", "cliff", "clover", "comet", "coral", "crane",
    "crest", "cubit", "dawn", "delta", "drift", "dune", "eagle", "echo", "ember", "falcon",
    "fern", "field", "flint", "fjord", "flare", "forge", "frost", "galaxy", "garnet", "glade",
    "glint", "grain", "granite", "grove", "harbor", "hazel", "heron", "hollow", "horizon",
    "indigo", "iris", "island", "ivory", "jade", "jasper", "juniper", "kernel", "kestrel",
    "lagoon", "lantern", "larch", "lava", "ledger", "lilac", "linden", "lotus", "lumen",
    "magnet", "maple", "marble", "meadow", "mesa", "meteor", "mist", "moss", "nebula", "nectar",
    "nimbus", "north", "nova", "oasis", "obsidian", "ocean", "olive", "onyx", "orbit", "orchid",
    "otter", "oxide", "pebble", "pepper", "pine", "pixel", "plume", "polar", "prairie", "prism",
    "pulse", "quartz", "quill", "radar", "raven", "reef", "ridge", "ripple", "river", "rowan",
    "saffron", "sage", "sequoia", "shadow", "shale", "signal", "silver", "slate", "solar",
    "sparrow", "spruce", "summit", "talon", "tango", "thistle", "thunder", "tide", "timber",
    "topaz", "tundra", "umber", "valley", "vapor", "velvet", "vertex", "violet", "walnut",
    "willow", "winter", "yarrow", "zenith", "zephyr",
];

fn fragment_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").ok())
        .as_ref()
}

/// Ordered fragment pools for the prefix, middle and suffix of a name.
///
/// A uniform corpus uses the same pool for all three positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    prefix: Vec<String>,
    middle: Vec<String>,
    suffix: Vec<String>,
}

impl Corpus {
    pub fn builtin() -> Self {
        let words: Vec<String> = WORDS.iter().map(|w| w.to_string()).collect();
        Self {
            prefix: words.clone(),
            middle: words.clone(),
            suffix: words,
        }
    }

    pub fn uniform<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pool = validate_pool("corpus", words)?;
        Ok(Self {
            prefix: pool.clone(),
            middle: pool.clone(),
            suffix: pool,
        })
    }

    pub fn pools<I, S>(prefix: I, middle: I, suffix: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            prefix: validate_pool("prefix", prefix)?,
            middle: validate_pool("middle", middle)?,
            suffix: validate_pool("suffix", suffix)?,
        })
    }

    /// One fragment per line; blank lines and `#` comments are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = io::read_file(path, &format!("read corpus {}", path.display()))?;
        let words = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string);
        Self::uniform(words)
    }

    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    pub fn middle(&self) -> &[String] {
        &self.middle
    }

    pub fn suffix(&self) -> &[String] {
        &self.suffix
    }

    /// Upper bound on the number of distinct names this corpus can compose.
    pub fn capacity(&self) -> u128 {
        self.prefix.len() as u128 * self.middle.len() as u128 * self.suffix.len() as u128
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Dedupes (first occurrence wins) and checks every fragment is identifier-safe.
fn validate_pool<I, S>(label: &str, words: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut pool: Vec<String> = Vec::new();
    for word in words {
        let word = word.into();
        if !fragment_pattern().is_some_and(|re| re.is_match(&word)) {
            return Err(Error::config_invalid_value(
                label,
                Some(word),
                "Corpus fragments must start with a letter and contain only letters and digits",
            ));
        }
        if !pool.contains(&word) {
            pool.push(word);
        }
    }

    if pool.is_empty() {
        return Err(Error::config_invalid_value(
            label,
            None,
            "Corpus pool is empty",
        ));
    }
    Ok(pool)
}
