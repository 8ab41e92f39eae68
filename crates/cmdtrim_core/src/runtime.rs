use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::artifact::ArtifactFormat;
use crate::config::{
    CONFIG_FILENAME, DEFAULT_HEADER_PATH, DEFAULT_MANIFEST_PATH, DEFAULT_OUTPUT_DIR,
    DEFAULT_RELEASE_ASSET, DEFAULT_TREE_PATH, TrimConfig, load_config, render_default_config,
};
use crate::layout::{OutputLayout, prepare_layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Heuristic,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Heuristic => "heuristic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub project_root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub tree: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub header: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<ArtifactFormat>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
    pub executable_dir: Option<PathBuf>,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        let executable_dir = env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));
        Ok(Self {
            cwd,
            executable_dir,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub tree_path: PathBuf,
    pub manifest_path: PathBuf,
    pub header_path: PathBuf,
    pub output_dir: PathBuf,
    pub release_asset_path: PathBuf,
    pub format: ArtifactFormat,
    pub config: TrimConfig,
    pub root_source: ValueSource,
    pub config_source: ValueSource,
    pub tree_source: ValueSource,
    pub manifest_source: ValueSource,
    pub header_source: ValueSource,
    pub output_source: ValueSource,
    pub format_source: ValueSource,
}

impl ResolvedPaths {
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir)
    }

    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={} ({})\nconfig_path={} ({})\ntree_path={} ({})\nmanifest_path={} ({})\nheader_path={} ({})\noutput_dir={} ({})\nformat={} ({})\nrelease_asset_path={}",
            normalize_for_display(&self.project_root),
            self.root_source.as_str(),
            normalize_for_display(&self.config_path),
            self.config_source.as_str(),
            normalize_for_display(&self.tree_path),
            self.tree_source.as_str(),
            normalize_for_display(&self.manifest_path),
            self.manifest_source.as_str(),
            normalize_for_display(&self.header_path),
            self.header_source.as_str(),
            normalize_for_display(&self.output_dir),
            self.output_source.as_str(),
            self.format.as_str(),
            self.format_source.as_str(),
            normalize_for_display(&self.release_asset_path),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub created_dirs: Vec<PathBuf>,
    pub wrote_config: bool,
}

pub fn resolve_paths(
    context: &ResolutionContext,
    overrides: &PathOverrides,
) -> Result<ResolvedPaths> {
    resolve_paths_with_lookup(context, overrides, |key| env::var(key).ok())
}

fn resolve_paths_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> Result<ResolvedPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| {
        lookup_env(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let (project_root, root_source) = resolve_project_root(context, overrides, &lookup);

    let (config_path, config_source) = if let Some(path) = overrides.config.as_deref() {
        (absolutize(path, &project_root), ValueSource::Flag)
    } else if let Some(value) = lookup("CMDTRIM_CONFIG") {
        (absolutize(Path::new(&value), &project_root), ValueSource::Env)
    } else {
        (project_root.join(CONFIG_FILENAME), ValueSource::Default)
    };
    let config = load_config(&config_path)?;

    let pick = |flag: Option<&Path>, env_key: &str, configured: Option<&str>, default: &str| {
        if let Some(path) = flag {
            (absolutize(path, &project_root), ValueSource::Flag)
        } else if let Some(value) = lookup(env_key) {
            (absolutize(Path::new(&value), &project_root), ValueSource::Env)
        } else if let Some(value) = configured {
            (absolutize(Path::new(value), &project_root), ValueSource::Config)
        } else {
            (absolutize(Path::new(default), &project_root), ValueSource::Default)
        }
    };

    let (tree_path, tree_source) = pick(
        overrides.tree.as_deref(),
        "CMDTRIM_TREE",
        config.inputs.tree.as_deref(),
        DEFAULT_TREE_PATH,
    );
    let (manifest_path, manifest_source) = pick(
        overrides.manifest.as_deref(),
        "CMDTRIM_MANIFEST",
        config.inputs.manifest.as_deref(),
        DEFAULT_MANIFEST_PATH,
    );
    let (header_path, header_source) = pick(
        overrides.header.as_deref(),
        "CMDTRIM_HEADER",
        config.inputs.header.as_deref(),
        DEFAULT_HEADER_PATH,
    );
    let (output_dir, output_source) = pick(
        overrides.output_dir.as_deref(),
        "CMDTRIM_OUTPUT_DIR",
        config.output.dir.as_deref(),
        DEFAULT_OUTPUT_DIR,
    );
    let (release_asset_path, _) = pick(
        None,
        "CMDTRIM_RELEASE_ASSET",
        config.release.asset.as_deref(),
        DEFAULT_RELEASE_ASSET,
    );

    let (format, format_source) = if let Some(format) = overrides.format {
        (format, ValueSource::Flag)
    } else if let Some(value) = lookup("CMDTRIM_FORMAT") {
        (
            value
                .parse::<ArtifactFormat>()
                .context("invalid CMDTRIM_FORMAT")?,
            ValueSource::Env,
        )
    } else if let Some(format) = config.output.format {
        (format, ValueSource::Config)
    } else {
        (ArtifactFormat::default(), ValueSource::Default)
    };

    Ok(ResolvedPaths {
        project_root,
        config_path,
        tree_path,
        manifest_path,
        header_path,
        output_dir: normalize_dot(output_dir),
        release_asset_path,
        format,
        config,
        root_source,
        config_source,
        tree_source,
        manifest_source,
        header_source,
        output_source,
        format_source,
    })
}

/// Write the default config (unless present) and prepare the output layout.
pub fn init_project(paths: &ResolvedPaths, options: &InitOptions) -> Result<InitReport> {
    let wrote_config =
        write_text_file(&paths.config_path, &render_default_config(), options.force)?;
    let layout = prepare_layout(&paths.layout())?;
    Ok(InitReport {
        created_dirs: layout.created_dirs,
        wrote_config,
    })
}

fn resolve_project_root<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: &F,
) -> (PathBuf, ValueSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.project_root.as_deref() {
        return (absolutize(path, &context.cwd), ValueSource::Flag);
    }

    if let Some(value) = lookup_env("CMDTRIM_PROJECT_ROOT") {
        return (absolutize(Path::new(&value), &context.cwd), ValueSource::Env);
    }

    match detect_project_root_heuristic(&context.cwd, context.executable_dir.as_deref()) {
        Some(root) => (root, ValueSource::Heuristic),
        None => (context.cwd.clone(), ValueSource::Default),
    }
}

fn detect_project_root_heuristic(cwd: &Path, executable_dir: Option<&Path>) -> Option<PathBuf> {
    let mut seen = HashSet::new();
    for candidate in candidate_roots(cwd, executable_dir) {
        let key = normalize_for_display(&candidate);
        if !seen.insert(key) {
            continue;
        }
        if candidate.join(CONFIG_FILENAME).is_file() {
            return Some(candidate);
        }
    }
    None
}

fn candidate_roots(cwd: &Path, executable_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut out = ancestors(cwd);
    if let Some(exe_dir) = executable_dir {
        out.extend(ancestors(exe_dir));
    }
    out
}

fn ancestors(path: &Path) -> Vec<PathBuf> {
    path.ancestors().map(Path::to_path_buf).collect()
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// `<root>/.` prints badly in the found lines; drop trailing `.` components.
fn normalize_dot(path: PathBuf) -> PathBuf {
    path.components().collect()
}

fn write_text_file(path: &Path, content: &str, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create parent directory {}", parent.display()))?;
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

pub fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
