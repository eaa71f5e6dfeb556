//! Deterministic, collision-free replacement names.
//!
//! Each old name is hashed together with the project seed and a batch-wide
//! attempt counter to pick a prefix, middle and suffix fragment. When any two
//! names in a batch collide, the whole batch is regenerated with the next
//! attempt, so one counter covers every name.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub hash: HashAlgorithm,
    pub max_attempts: u32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Old name to new name. Values are pairwise distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameMapping(BTreeMap<String, String>);

impl NameMapping {
    /// Rejects pairs that would make the mapping non-injective.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let map: BTreeMap<String, String> = pairs.into_iter().collect();
        let distinct: HashSet<&String> = map.values().collect();
        if distinct.len() != map.len() {
            return Err(Error::config_invalid_value(
                "mapping",
                None,
                "Two names map to the same replacement",
            ));
        }
        Ok(Self(map))
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.0.get(old).map(String::as_str)
    }

    pub fn contains(&self, old: &str) -> bool {
        self.0.contains_key(old)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Generation {
    pub mapping: NameMapping,
    /// Attempt that produced the mapping; 0 when nothing was generated.
    pub attempts: u32,
}

/// Derive the mapping for `names`.
///
/// A blank seed yields an empty mapping rather than an error. Fails with
/// `naming.corpus_exhausted` when no collision-free batch appears within
/// `options.max_attempts`, or when the corpus cannot possibly hold that many
/// distinct names.
pub fn generate(
    names: &BTreeSet<String>,
    seed: &str,
    corpus: &Corpus,
    options: &GeneratorOptions,
) -> Result<Generation> {
    if seed.trim().is_empty() || names.is_empty() {
        return Ok(Generation::default());
    }
    if options.max_attempts == 0 {
        return Err(Error::config_invalid_value(
            "maxAttempts",
            Some("0".to_string()),
            "Must be at least 1",
        ));
    }
    if (names.len() as u128) > corpus.capacity() {
        return Err(Error::corpus_exhausted(names.len(), 0, corpus.capacity()));
    }

    for attempt in 1..=options.max_attempts {
        let batch = candidate_batch(names, seed, attempt, corpus, options.hash);
        let distinct: HashSet<&String> = batch.values().collect();
        if distinct.len() == batch.len() {
            return Ok(Generation {
                mapping: NameMapping(batch),
                attempts: attempt,
            });
        }
    }

    Err(Error::corpus_exhausted(
        names.len(),
        options.max_attempts,
        corpus.capacity(),
    ))
}

fn candidate_batch(
    names: &BTreeSet<String>,
    seed: &str,
    attempt: u32,
    corpus: &Corpus,
    hash: HashAlgorithm,
) -> BTreeMap<String, String> {
    names
        .iter()
        .map(|old| (old.clone(), derive_name(seed, attempt, old, corpus, hash)))
        .collect()
}

/// The replacement for one name at one attempt.
pub fn derive_name(
    seed: &str,
    attempt: u32,
    old_name: &str,
    corpus: &Corpus,
    hash: HashAlgorithm,
) -> String {
    let seed_string = format!("{}{}{}", seed, attempt, old_name);
    let pick = |pool: &[String], part: &str| -> String {
        let key = format!("{}{}", seed_string, part);
        pool[hash.index(&key, pool.len())].clone()
    };

    let prefix = pick(corpus.prefix(), "prefix");
    let middle = pick(corpus.middle(), "middle");
    let suffix = pick(corpus.suffix(), "suffix");

    format!("{}{}{}", prefix, capitalize(&middle), capitalize(&suffix))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}
