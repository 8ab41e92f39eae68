use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Text columns per header line, not counting the comment marker.
pub const HEADER_WIDTH: usize = 77;
pub const COMMENT_MARKER: &str = "//";

pub const DEFAULT_HEADER_TEXT: &str = "This program and the accompanying materials are made available under the terms of the Eclipse Public License v2.0 which accompanies this distribution, and is available at https://www.eclipse.org/legal/epl-v20.html

SPDX-License-Identifier: EPL-2.0

Copyright Contributors to the Zowe Project.";

/// Read the header source at `path` and render it, falling back to the
/// default text when the file is absent or blank.
pub fn load_header(path: &Path) -> Result<String> {
    if !path.exists() {
        log::debug!("no header source at {}, using default", path.display());
        return Ok(render_header(None));
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(render_header(Some(&raw)))
}

pub fn render_header(raw: Option<&str>) -> String {
    let text = raw
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(DEFAULT_HEADER_TEXT);
    wrap_commented(text, HEADER_WIDTH, COMMENT_MARKER)
}

/// Reflow each blank-line separated paragraph to `width` columns and prefix
/// every line with `marker`. Paragraph breaks become a bare marker line.
pub fn wrap_commented(text: &str, width: usize, marker: &str) -> String {
    let mut out = Vec::new();
    for (index, paragraph) in paragraphs(text).iter().enumerate() {
        if index > 0 {
            out.push(marker.to_string());
        }
        for line in wrap_paragraph(paragraph, width) {
            out.push(format!("{marker} {line}").trim_end().to_string());
        }
    }
    out.join("\n")
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

// Greedy fill; a word wider than `width` gets a line of its own.
fn wrap_paragraph(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for word in paragraph.split_whitespace() {
        let word_width = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{COMMENT_MARKER, HEADER_WIDTH, load_header, render_header, wrap_commented};

    #[test]
    fn default_header_is_wrapped_and_commented() {
        let header = render_header(None);
        let lines: Vec<&str> = header.lines().collect();
        assert!(lines.len() > 3);
        for line in &lines {
            assert!(line.starts_with(COMMENT_MARKER), "unmarked line: {line:?}");
            assert_eq!(line.trim_end(), *line);
            let text = line.trim_start_matches(COMMENT_MARKER).trim_start();
            assert!(text.chars().count() <= HEADER_WIDTH, "too wide: {line:?}");
        }
        assert!(lines.contains(&"// SPDX-License-Identifier: EPL-2.0"));
        assert!(lines.contains(&"//"));
    }

    #[test]
    fn wrap_breaks_at_width_and_keeps_long_words() {
        let wrapped = wrap_commented("aaa bbb ccc dddddddddddd e", 7, "#");
        assert_eq!(wrapped, "# aaa bbb\n# ccc\n# dddddddddddd\n# e");
    }

    #[test]
    fn wrap_reflows_lines_and_separates_paragraphs() {
        let wrapped = wrap_commented("first line\ncontinues here   \n\n\n  second\n", 77, "//");
        assert_eq!(wrapped, "// first line continues here\n//\n// second");
    }

    #[test]
    fn blank_source_falls_back_to_default() {
        assert_eq!(render_header(Some("  \n\n ")), render_header(None));
    }

    #[test]
    fn load_header_uses_external_text_when_present() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("header.txt");

        assert_eq!(load_header(&path).expect("default"), render_header(None));

        fs::write(&path, "Copyright Example Corp.\r\n").expect("write header");
        assert_eq!(
            load_header(&path).expect("external"),
            "// Copyright Example Corp."
        );
    }
}
