use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched,
    PlaceholderMissing,
}

/// Replace the first occurrence of `placeholder`, or `None` if it is absent.
pub fn patch_release_text(content: &str, placeholder: &str, label: &str) -> Option<String> {
    if placeholder.is_empty() || !content.contains(placeholder) {
        return None;
    }
    Some(content.replacen(placeholder, label, 1))
}

/// Stamp the release label into a generated help asset in place.
pub fn patch_release_asset(path: &Path, placeholder: &str, label: &str) -> Result<PatchOutcome> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let Some(patched) = patch_release_text(&content, placeholder, label) else {
        log::warn!("placeholder '{placeholder}' not found in {}", path.display());
        return Ok(PatchOutcome::PlaceholderMissing);
    };
    fs::write(path, patched).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(PatchOutcome::Patched)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{PatchOutcome, patch_release_asset, patch_release_text};

    #[test]
    fn only_first_placeholder_is_replaced() {
        let patched = patch_release_text(
            "const treeNodes = [{text: \"zowe 0.0.1\"}, {text: \"zowe 0.0.1\"}];",
            "zowe 0.0.1",
            "Zowe v1.25.0",
        )
        .expect("patched");
        assert_eq!(
            patched,
            "const treeNodes = [{text: \"Zowe v1.25.0\"}, {text: \"zowe 0.0.1\"}];"
        );
        assert!(patch_release_text("no marker", "zowe 0.0.1", "x").is_none());
        assert!(patch_release_text("anything", "", "x").is_none());
    }

    #[test]
    fn patch_release_asset_rewrites_file() {
        let temp = tempdir().expect("tempdir");
        let asset = temp.path().join("tree-data.js");
        fs::write(&asset, "var header = \"zowe 0.0.1\";").expect("write asset");

        let outcome = patch_release_asset(&asset, "zowe 0.0.1", "Zowe v2.0.0").expect("patch");
        assert_eq!(outcome, PatchOutcome::Patched);
        assert_eq!(
            fs::read_to_string(&asset).expect("read"),
            "var header = \"Zowe v2.0.0\";"
        );

        let outcome = patch_release_asset(&asset, "zowe 0.0.1", "Zowe v2.0.0").expect("patch");
        assert_eq!(outcome, PatchOutcome::PlaceholderMissing);
    }

    #[test]
    fn patch_release_asset_requires_existing_asset() {
        let temp = tempdir().expect("tempdir");
        let error = patch_release_asset(&temp.path().join("missing.js"), "a", "b")
            .expect_err("must fail");
        assert!(error.to_string().contains("failed to read"));
    }
}
