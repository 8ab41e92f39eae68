use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactFormat;

pub const CONFIG_FILENAME: &str = "cmdtrim.toml";
pub const DEFAULT_TREE_PATH: &str = "commandTree.json";
pub const DEFAULT_MANIFEST_PATH: &str = "manifest.json";
pub const DEFAULT_HEADER_PATH: &str = "header.txt";
pub const DEFAULT_OUTPUT_DIR: &str = ".";
pub const DEFAULT_RELEASE_ASSET: &str = "generatedWebHelp/tree-data.js";
pub const DEFAULT_RELEASE_PLACEHOLDER: &str = "zowe 0.0.1";
pub const DEFAULT_RELEASE_LABEL: &str = "Zowe v{version}";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct TrimConfig {
    #[serde(default)]
    pub inputs: InputsSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub release: ReleaseSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct InputsSection {
    pub tree: Option<String>,
    pub manifest: Option<String>,
    pub header: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct OutputSection {
    pub dir: Option<String>,
    pub format: Option<ArtifactFormat>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ReleaseSection {
    pub asset: Option<String>,
    pub placeholder: Option<String>,
    pub label: Option<String>,
}

impl TrimConfig {
    pub fn release_placeholder(&self) -> &str {
        self.release
            .placeholder
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE_PLACEHOLDER)
    }

    /// Release label with `{version}` substituted.
    pub fn release_label(&self, version: &str) -> String {
        self.release
            .label
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE_LABEL)
            .replace("{version}", version)
    }
}

/// Load and parse a TrimConfig from a TOML file. Returns default if the file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<TrimConfig> {
    if !config_path.exists() {
        return Ok(TrimConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: TrimConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

pub fn render_default_config() -> String {
    let lines = [
        "# cmdtrim configuration (materialized by `cmdtrim init`)".to_string(),
        "# relative paths resolve against the project root".to_string(),
        String::new(),
        "[inputs]".to_string(),
        format!("tree = \"{DEFAULT_TREE_PATH}\""),
        format!("manifest = \"{DEFAULT_MANIFEST_PATH}\""),
        "# optional; the built-in license header is used when this file is absent".to_string(),
        format!("header = \"{DEFAULT_HEADER_PATH}\""),
        String::new(),
        "[output]".to_string(),
        format!("dir = \"{DEFAULT_OUTPUT_DIR}\""),
        "# \"jsonc\" keeps the header inline, \"json\" writes it to a .license sidecar"
            .to_string(),
        "format = \"jsonc\"".to_string(),
        String::new(),
        "[release]".to_string(),
        format!("asset = \"{DEFAULT_RELEASE_ASSET}\""),
        format!("placeholder = \"{DEFAULT_RELEASE_PLACEHOLDER}\""),
        format!("label = \"{DEFAULT_RELEASE_LABEL}\""),
    ];
    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}
