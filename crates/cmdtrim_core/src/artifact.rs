//! Rendering of extracted nodes into artifact files.
//!
//! Every artifact goes through the same steps: the node is converted to a
//! JSON value, every `handler` key anywhere in it is emptied, the value is
//! pretty-printed with a two-space indent and the license header is attached.
//! The format only decides where the header lives: inline as `//` comments
//! for `jsonc`, or in a `.license` sidecar for strict `json`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::catalog::TreeNode;

pub const REDACTED_KEY: &str = "handler";
const INDENT: &[u8] = b"  ";
const SIDECAR_SUFFIX: &str = ".license";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Jsonc,
    Json,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jsonc => "jsonc",
            Self::Json => "json",
        }
    }

    pub fn as_str(self) -> &'static str {
        self.extension()
    }

    pub fn file_name(self, name: &str) -> String {
        format!("{name}.{}", self.extension())
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jsonc" => Ok(Self::Jsonc),
            "json" => Ok(Self::Json),
            other => bail!("unsupported artifact format '{other}' (expected jsonc or json)"),
        }
    }
}

/// Walk `value` and empty every object entry whose key matches `redact`.
/// The key stays in place; its value becomes an empty string.
pub fn redact_value(value: &mut Value, redact: &dyn Fn(&str) -> bool) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if redact(key) {
                    *entry = Value::String(String::new());
                } else {
                    redact_value(entry, redact);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_value(item, redact);
            }
        }
        _ => {}
    }
}

pub fn is_handler_key(key: &str) -> bool {
    key == REDACTED_KEY
}

/// Pretty-printed, handler-free JSON for `node`.
pub fn render_body(node: &TreeNode) -> Result<String> {
    let mut value = serde_json::to_value(node)
        .with_context(|| format!("failed to convert node '{}'", node.name()))?;
    redact_value(&mut value, &is_handler_key);

    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
    value
        .serialize(&mut serializer)
        .with_context(|| format!("failed to serialize node '{}'", node.name()))?;
    String::from_utf8(buffer).context("serialized node is not valid UTF-8")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub content: String,
    /// Header text for formats that cannot carry comments.
    pub sidecar: Option<String>,
}

impl RenderedArtifact {
    pub fn sidecar_name(&self) -> String {
        format!("{}{SIDECAR_SUFFIX}", self.file_name)
    }
}

/// Render `node` as the artifact filed under `name`.
pub fn render_artifact(
    node: &TreeNode,
    name: &str,
    header: &str,
    format: ArtifactFormat,
) -> Result<RenderedArtifact> {
    let body = render_body(node)?;
    let file_name = format.file_name(name);
    Ok(match format {
        ArtifactFormat::Jsonc => RenderedArtifact {
            file_name,
            content: format!("{header}\n{body}"),
            sidecar: None,
        },
        ArtifactFormat::Json => RenderedArtifact {
            file_name,
            content: body,
            sidecar: Some(format!("{header}\n")),
        },
    })
}

/// Write the artifact (and its sidecar, if any) into `dir`, overwriting.
pub fn write_artifact(dir: &Path, artifact: &RenderedArtifact) -> Result<PathBuf> {
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    if let Some(sidecar) = &artifact.sidecar {
        let sidecar_path = dir.join(artifact.sidecar_name());
        fs::write(&sidecar_path, sidecar)
            .with_context(|| format!("failed to write {}", sidecar_path.display()))?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{Value, json};
    use tempfile::tempdir;

    use super::{
        ArtifactFormat, is_handler_key, redact_value, render_artifact, render_body, write_artifact,
    };
    use crate::catalog::TreeNode;

    fn node(value: Value) -> TreeNode {
        serde_json::from_value(value).expect("node")
    }

    #[test]
    fn redaction_empties_handler_at_every_depth() {
        let mut value = json!({
            "name": "zosmf",
            "handler": "/secret/a.js",
            "options": [{"name": "x", "handler": {"path": "/secret/b.js"}}],
            "children": [{"name": "check", "handler": "/secret/c.js"}]
        });
        redact_value(&mut value, &is_handler_key);

        assert_eq!(value["handler"], json!(""));
        assert_eq!(value["options"][0]["handler"], json!(""));
        assert_eq!(value["children"][0]["handler"], json!(""));
        assert!(!value.to_string().contains("/secret/"));
    }

    #[test]
    fn body_is_two_space_indented_in_document_order() {
        let node = node(json!({
            "type": "group",
            "name": "zosmf",
            "children": [{"handler": "/c.js", "name": "check", "children": null}],
            "handler": "/h.js",
            "description": "z/OSMF"
        }));

        let body = render_body(&node).expect("render");
        let expected = [
            "{",
            "  \"type\": \"group\",",
            "  \"name\": \"zosmf\",",
            "  \"children\": [",
            "    {",
            "      \"handler\": \"\",",
            "      \"name\": \"check\",",
            "      \"children\": null",
            "    }",
            "  ],",
            "  \"handler\": \"\",",
            "  \"description\": \"z/OSMF\"",
            "}",
        ]
        .join("\n");
        assert_eq!(body, expected);
    }

    #[test]
    fn jsonc_artifact_prepends_header_inline() {
        let node = node(json!({"name": "base", "handler": "/h.js"}));
        let artifact =
            render_artifact(&node, "base", "// header", ArtifactFormat::Jsonc).expect("render");

        assert_eq!(artifact.file_name, "base.jsonc");
        assert!(artifact.content.starts_with("// header\n{\n"));
        assert!(artifact.sidecar.is_none());
    }

    #[test]
    fn json_artifact_moves_header_to_sidecar() {
        let temp = tempdir().expect("tempdir");
        let node = node(json!({"name": "bases", "handler": "/h.js"}));
        let artifact =
            render_artifact(&node, "base", "// header", ArtifactFormat::Json).expect("render");
        let path = write_artifact(temp.path(), &artifact).expect("write");

        assert_eq!(path, temp.path().join("base.json"));
        let written = fs::read_to_string(&path).expect("read artifact");
        let parsed: Value = serde_json::from_str(&written).expect("strict json");
        assert_eq!(parsed["name"], json!("bases"));
        assert_eq!(parsed["handler"], json!(""));
        let sidecar = fs::read_to_string(temp.path().join("base.json.license")).expect("sidecar");
        assert_eq!(sidecar, "// header\n");
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSONC".parse::<ArtifactFormat>().expect("jsonc"), ArtifactFormat::Jsonc);
        assert_eq!(" json ".parse::<ArtifactFormat>().expect("json"), ArtifactFormat::Json);
        let error = "yaml".parse::<ArtifactFormat>().expect_err("must fail");
        assert!(error.to_string().contains("unsupported artifact format"));
    }
}
