//! Project configuration read from `projectEncrypt.properties`.
//!
//! Only `channelName` is needed to run; every other key has a default.
//! A missing file or blank channel is not an error: the run simply has no seed.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use crate::naming::{GeneratorOptions, DEFAULT_MAX_ATTEMPTS};
use crate::properties::Properties;
use crate::source::is_valid_identifier;
use crate::walk::FileFilter;

pub const CONFIG_FILE: &str = "projectEncrypt.properties";
pub const CHANNEL_KEY: &str = "channelName";
pub const DEFAULT_MARKER: &str = "De";
pub const DEFAULT_EXTENSION: &str = "dart";
pub const DEFAULT_MAPPING_FILE: &str = "nameMapping.properties";
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

const KEY_MARKER: &str = "marker";
const KEY_EXTENSION: &str = "extension";
const KEY_MAPPING_FILE: &str = "mappingFile";
const KEY_HASH: &str = "hashAlgorithm";
const KEY_MAX_ATTEMPTS: &str = "maxAttempts";
const KEY_TIMEOUT: &str = "engineTimeoutSecs";
const KEY_CORPUS_FILE: &str = "corpusFile";
const KEY_INCLUDE: &str = "include";
const KEY_EXCLUDE: &str = "exclude";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub root: PathBuf,
    /// Whether `projectEncrypt.properties` existed.
    pub config_found: bool,
    #[serde(skip_serializing)]
    pub seed: Option<String>,
    pub marker: String,
    pub extension: String,
    pub mapping_file: String,
    pub hash: HashAlgorithm,
    pub max_attempts: u32,
    pub engine_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl ProjectConfig {
    /// Defaults for `root` with no seed.
    pub fn defaults(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            config_found: false,
            seed: None,
            marker: DEFAULT_MARKER.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            mapping_file: DEFAULT_MAPPING_FILE.to_string(),
            hash: HashAlgorithm::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            engine_timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            corpus_file: None,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let mut config = Self::defaults(root);
        let Some(props) = Properties::load_optional(&root.join(CONFIG_FILE))? else {
            return Ok(config);
        };
        config.config_found = true;
        config.seed = props.get_trimmed(CHANNEL_KEY).map(str::to_string);

        if let Some(marker) = props.get_trimmed(KEY_MARKER) {
            config.set_marker(marker)?;
        }
        if let Some(extension) = props.get_trimmed(KEY_EXTENSION) {
            config.set_extension(extension)?;
        }
        if let Some(file) = props.get_trimmed(KEY_MAPPING_FILE) {
            config.mapping_file = file.to_string();
        }
        if let Some(hash) = props.get_trimmed(KEY_HASH) {
            config.hash = HashAlgorithm::from_str(hash)?;
        }
        if let Some(raw) = props.get_trimmed(KEY_MAX_ATTEMPTS) {
            config.max_attempts = parse_positive(KEY_MAX_ATTEMPTS, raw)?;
        }
        if let Some(raw) = props.get_trimmed(KEY_TIMEOUT) {
            config.engine_timeout_secs = parse_positive(KEY_TIMEOUT, raw)?;
        }
        if let Some(file) = props.get_trimmed(KEY_CORPUS_FILE) {
            config.corpus_file = Some(PathBuf::from(file));
        }
        if let Some(list) = props.get_trimmed(KEY_INCLUDE) {
            config.include = split_list(list);
        }
        if let Some(list) = props.get_trimmed(KEY_EXCLUDE) {
            config.exclude = split_list(list);
        }

        Ok(config)
    }

    /// Accepts `De` or a qualified `prefix.De`; a leading `@` is dropped.
    pub fn set_marker(&mut self, marker: &str) -> Result<()> {
        let marker = marker.trim().trim_start_matches('@');
        if marker.is_empty() || !marker.split('.').all(is_valid_identifier) {
            return Err(Error::config_invalid_value(
                KEY_MARKER,
                Some(marker.to_string()),
                "Marker must be an annotation name such as De or meta.De",
            ));
        }
        self.marker = marker.to_string();
        Ok(())
    }

    /// Accepts `dart` or `.dart`.
    pub fn set_extension(&mut self, extension: &str) -> Result<()> {
        let extension = extension.trim().trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\', '*']) {
            return Err(Error::config_invalid_value(
                KEY_EXTENSION,
                Some(extension.to_string()),
                "Extension must be a plain file extension such as dart",
            ));
        }
        self.extension = extension.to_string();
        Ok(())
    }

    /// Seed with surrounding whitespace removed; `None` when absent or blank.
    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.root.join(&self.mapping_file)
    }

    /// The configured corpus file (relative to the root) or the built-in words.
    pub fn corpus(&self) -> Result<Corpus> {
        match &self.corpus_file {
            Some(file) => Corpus::from_file(&self.root.join(file)),
            None => Ok(Corpus::builtin()),
        }
    }

    pub fn file_filter(&self) -> FileFilter {
        FileFilter {
            extension: self.extension.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            hash: self.hash,
            max_attempts: self.max_attempts,
        }
    }
}

/// The channel name in `root`, or `None` when the file or key is missing or blank.
pub fn read_seed(root: &Path) -> Result<Option<String>> {
    Ok(Properties::load_optional(&root.join(CONFIG_FILE))?
        .and_then(|props| props.get_trimmed(CHANNEL_KEY).map(str::to_string)))
}

/// Write `channelName` into the project's config file, keeping any other keys.
///
/// Refuses to replace an existing channel unless `force` is set.
pub fn init(root: &Path, channel: &str, force: bool) -> Result<PathBuf> {
    let channel = channel.trim();
    if channel.is_empty() {
        return Err(Error::validation_missing_argument(vec![
            "channel".to_string(),
        ]));
    }
    if !root.is_dir() {
        return Err(Error::validation_invalid_argument(
            "path",
            format!("Not a directory: {}", root.display()),
            None,
            None,
        ));
    }

    let path = root.join(CONFIG_FILE);
    let mut props = Properties::load_optional(&path)?.unwrap_or_default();

    if !force {
        if let Some(existing) = props.get_trimmed(CHANNEL_KEY) {
            return Err(Error::validation_invalid_argument(
                "channel",
                format!("{} already sets {}", CONFIG_FILE, CHANNEL_KEY),
                Some(existing.to_string()),
                None,
            )
            .with_hint("Pass --force to replace the channel. Existing mappings will no longer be reproducible"));
        }
    }

    props.set(CHANNEL_KEY, channel);
    props.store(&path, &["masquerade project channel".to_string()])?;
    log_status!("init", "Wrote {}", path.display());
    Ok(path)
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(Error::config_invalid_value(
            key,
            Some(raw.to_string()),
            "Must be a positive integer",
        )),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults_without_seed() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert!(!config.config_found);
        assert_eq!(config.seed(), None);
        assert_eq!(config.marker, "De");
        assert_eq!(config.mapping_path(), dir.path().join("nameMapping.properties"));
    }

    #[test]
    fn blank_channel_is_no_seed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "channelName=   \n").unwrap();
        assert_eq!(read_seed(dir.path()).unwrap(), None);
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert!(config.config_found);
        assert_eq!(config.seed(), None);
    }

    #[test]
    fn reads_optional_keys() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "channelName=store-cn\nmarker=@meta.De\nextension=.dart\nhashAlgorithm=java31\n\
             maxAttempts=5\nengineTimeoutSecs=7\nexclude=lib/generated/**, test/**\n",
        )
        .unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.seed(), Some("store-cn"));
        assert_eq!(config.marker, "meta.De");
        assert_eq!(config.extension, "dart");
        assert_eq!(config.hash, HashAlgorithm::Java31);
        assert_eq!(config.generator_options().max_attempts, 5);
        assert_eq!(config.engine_timeout_secs, 7);
        assert_eq!(config.exclude, vec!["lib/generated/**", "test/**"]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "maxAttempts=0\n").unwrap();
        let err = ProjectConfig::load(dir.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
        assert_eq!(err.details["key"], "maxAttempts");

        fs::write(dir.path().join(CONFIG_FILE), "marker=not a marker\n").unwrap();
        assert!(ProjectConfig::load(dir.path()).is_err());
    }

    #[test]
    fn init_writes_and_guards_channel() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "marker=Hide\n").unwrap();

        init(dir.path(), "first", false).unwrap();
        assert_eq!(read_seed(dir.path()).unwrap().as_deref(), Some("first"));

        let err = init(dir.path(), "second", false).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");

        init(dir.path(), "second", true).unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.seed(), Some("second"));
        assert_eq!(config.marker, "Hide");
    }

    #[test]
    fn corpus_file_is_relative_to_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("words.txt"), "one\ntwo\n").unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "corpusFile=words.txt\n").unwrap();
        let corpus = ProjectConfig::load(dir.path()).unwrap().corpus().unwrap();
        assert_eq!(corpus.capacity(), 8);
    }
}
