use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::catalog::ActionCategory;

pub const COMMAND_GROUPS_DIR: &str = "commandGroups";
pub const PROFILES_DIR: &str = "profiles";

/// Fixed output tree: `commandGroups/` plus `profiles/<action>/` for every
/// action category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub command_groups_dir: PathBuf,
    pub profiles_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            command_groups_dir: root.join(COMMAND_GROUPS_DIR),
            profiles_dir: root.join(PROFILES_DIR),
        }
    }

    pub fn action_dir(&self, action: ActionCategory) -> PathBuf {
        self.profiles_dir.join(action.as_str())
    }

    /// Directories in creation order, parents first.
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.command_groups_dir.clone(), self.profiles_dir.clone()];
        dirs.extend(ActionCategory::ALL.map(|action| self.action_dir(action)));
        dirs
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayoutReport {
    pub created_dirs: Vec<PathBuf>,
}

/// Create whatever part of the layout is missing. Existing directories are
/// left alone.
pub fn prepare_layout(layout: &OutputLayout) -> Result<LayoutReport> {
    let mut created_dirs = Vec::new();
    for dir in layout.required_dirs() {
        if !dir.is_dir() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            log::debug!("created {}", dir.display());
            created_dirs.push(dir);
        }
    }
    Ok(LayoutReport { created_dirs })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{OutputLayout, prepare_layout};
    use crate::catalog::ActionCategory;

    #[test]
    fn prepare_layout_creates_all_dirs_then_is_a_no_op() {
        let temp = tempdir().expect("tempdir");
        let layout = OutputLayout::new(&temp.path().join("out"));

        let first = prepare_layout(&layout).expect("first run");
        assert_eq!(first.created_dirs.len(), 7);
        assert!(layout.command_groups_dir.is_dir());
        for action in ActionCategory::ALL {
            assert!(layout.action_dir(action).is_dir(), "missing {action}");
        }
        assert!(temp.path().join("out/profiles/set-default").is_dir());

        let second = prepare_layout(&layout).expect("second run");
        assert!(second.created_dirs.is_empty());
    }

    #[test]
    fn prepare_layout_fills_partial_layout() {
        let temp = tempdir().expect("tempdir");
        let layout = OutputLayout::new(temp.path());
        fs::create_dir_all(layout.action_dir(ActionCategory::List)).expect("seed list dir");

        let report = prepare_layout(&layout).expect("prepare");
        assert_eq!(report.created_dirs.len(), 5);
        assert!(!report.created_dirs.contains(&layout.profiles_dir));
    }

    #[test]
    fn prepare_layout_fails_when_path_is_a_file() {
        let temp = tempdir().expect("tempdir");
        let layout = OutputLayout::new(temp.path());
        fs::write(&layout.command_groups_dir, "not a dir").expect("seed file");

        let error = prepare_layout(&layout).expect_err("must fail");
        assert!(error.to_string().contains("failed to create"));
    }
}
