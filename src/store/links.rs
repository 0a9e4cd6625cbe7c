use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::policies::PersonPolicyLink;

const LINK_FILE_VERSION: u32 = 1;

/// Generated person-policy links as persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkFile {
    pub version: u32,
    pub links: Vec<PersonPolicyLink>,
}

impl LinkFile {
    pub fn new(links: Vec<PersonPolicyLink>) -> Self {
        Self {
            version: LINK_FILE_VERSION,
            links,
        }
    }
}

impl Default for LinkFile {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Load links from a JSON file.
///
/// A missing file is an empty set of links. An unknown version is an error.
pub fn load_links(path: &Path) -> Result<LinkFile> {
    if !path.exists() {
        return Ok(LinkFile::default());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open links file at {}", path.display()))?;

    let link_file: LinkFile =
        serde_json::from_reader(BufReader::new(file)).context("Failed to load links")?;

    if link_file.version != LINK_FILE_VERSION {
        anyhow::bail!("Unsupported links file version: {}", link_file.version);
    }

    Ok(link_file)
}

/// Save links atomically, so a crash never leaves a half-written file.
pub fn save_links(path: &Path, link_file: &LinkFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory at {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, link_file).context("Failed to serialize links")?;

    file.commit().context("Failed to save links")?;

    Ok(())
}

/// Merge freshly generated links into existing ones.
///
/// New rows replace old rows with the same person, policy and party. Output
/// is sorted by that key.
pub fn merge_links(
    existing: Vec<PersonPolicyLink>,
    fresh: Vec<PersonPolicyLink>,
) -> Vec<PersonPolicyLink> {
    let mut merged: BTreeMap<(u32, u32, String), PersonPolicyLink> = existing
        .into_iter()
        .map(|link| (link.merge_key(), link))
        .collect();
    for link in fresh {
        merged.insert(link.merge_key(), link);
    }
    merged.into_values().collect()
}
