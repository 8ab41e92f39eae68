//! Inventory of previously written artifacts.
//!
//! Runs are not transactional, so the output directories can hold artifacts
//! for names the manifest no longer requests. The inventory lists what is on
//! disk and marks those leftovers as stale.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::artifact::ArtifactFormat;
use crate::catalog::{ActionCategory, SelectionManifest};
use crate::extract::Target;
use crate::layout::OutputLayout;

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactEntry {
    pub relative_path: String,
    pub name: String,
    pub target: Target,
    pub bytes: u64,
    pub content_hash: String,
    pub stale: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InventoryReport {
    pub entries: Vec<ArtifactEntry>,
    pub missing_dirs: Vec<PathBuf>,
}

impl InventoryReport {
    pub fn stale(&self) -> impl Iterator<Item = &ArtifactEntry> {
        self.entries.iter().filter(|entry| entry.stale)
    }
}

pub fn inventory(
    layout: &OutputLayout,
    manifest: &SelectionManifest,
    format: ArtifactFormat,
) -> Result<InventoryReport> {
    let groups: BTreeSet<&str> = manifest.command_groups.iter().map(String::as_str).collect();
    let profiles: BTreeSet<&str> = manifest.profiles.iter().map(String::as_str).collect();

    let mut report = InventoryReport::default();
    let mut scan = |dir: PathBuf, target: Target, wanted: &BTreeSet<&str>| -> Result<()> {
        if !dir.is_dir() {
            report.missing_dirs.push(dir);
            return Ok(());
        }
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = artifact_name(path, format) else {
                continue;
            };
            let content = fs::read(path)
                .with_context(|| format!("failed to read artifact {}", path.display()))?;
            report.entries.push(ArtifactEntry {
                relative_path: relative_to(&layout.root, path),
                stale: !wanted.contains(name.as_str()),
                name,
                target,
                bytes: content.len() as u64,
                content_hash: compute_hash(&content),
            });
        }
        Ok(())
    };

    scan(layout.command_groups_dir.clone(), Target::CommandGroup, &groups)?;
    for action in ActionCategory::ALL {
        scan(
            layout.action_dir(action),
            Target::ProfileAction(action),
            &profiles,
        )?;
    }

    report
        .entries
        .sort_by(|left, right| left.relative_path.cmp(&right.relative_path));
    Ok(report)
}

fn artifact_name(path: &Path, format: ArtifactFormat) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name
        .strip_suffix(format.extension())
        .and_then(|stem| stem.strip_suffix('.'))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

fn compute_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut output = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
