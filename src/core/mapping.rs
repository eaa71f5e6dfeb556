//! Persisted `oldName=newName` mapping file.

use chrono::{SecondsFormat, Utc};
use std::path::Path;

use crate::error::Result;
use crate::naming::NameMapping;
use crate::properties::Properties;

const TITLE: &str = "masquerade name mapping (old=new)";

/// Overwrite `destination` with the mapping, sorted by old name.
pub fn persist(mapping: &NameMapping, destination: &Path) -> Result<()> {
    let props: Properties = mapping.iter().collect();
    let comments = vec![
        TITLE.to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    ];
    props.store(destination, &comments)?;
    log_status!(
        "mapping",
        "Wrote {} entries to {}",
        mapping.len(),
        destination.display()
    );
    Ok(())
}

/// Read a mapping written by [`persist`]. A missing file is `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<NameMapping>> {
    let Some(props) = Properties::load_optional(path)? else {
        return Ok(None);
    };
    let pairs = props.iter().map(|(k, v)| (k.to_string(), v.to_string()));
    NameMapping::from_pairs(pairs).map(Some)
}
