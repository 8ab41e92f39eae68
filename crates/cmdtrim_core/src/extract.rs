//! Selective extraction of command groups and profile actions.
//!
//! Lookups are pure: each requested name resolves to a node (or not) without
//! touching shared state. The run loop renders and writes every hit before
//! moving on to the next name, and the found tallies are derived from the
//! collected results afterwards.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, Serializer};

use crate::artifact::{ArtifactFormat, render_artifact, write_artifact};
use crate::catalog::{ActionCategory, Catalog, TreeNode, find_by_name};
use crate::layout::OutputLayout;

pub const PROFILES_GROUP: &str = "profiles";

/// What a requested name was looked up as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    CommandGroup,
    ProfileAction(ActionCategory),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandGroup => f.write_str("command group"),
            Self::ProfileAction(action) => write!(f, "profiles {action}"),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// The node was found; `written` is false on dry runs.
    Found {
        name: String,
        target: Target,
        path: PathBuf,
        content: String,
        written: bool,
    },
    NotFound {
        name: String,
        target: Target,
    },
}

impl ExtractionResult {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Found { name, .. } | Self::NotFound { name, .. } => name,
        }
    }

    pub fn target(&self) -> Target {
        match self {
            Self::Found { target, .. } | Self::NotFound { target, .. } => *target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOutcome {
    pub name: String,
    /// One entry per action category, in `ActionCategory::ALL` order.
    pub actions: Vec<ExtractionResult>,
}

impl ProfileOutcome {
    pub fn found_count(&self) -> usize {
        self.actions.iter().filter(|result| result.is_found()).count()
    }

    /// Only a profile present under all five actions counts as found.
    pub fn is_complete(&self) -> bool {
        self.found_count() == ActionCategory::ALL.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub command_groups: Vec<ExtractionResult>,
    pub profiles: Vec<ProfileOutcome>,
    pub profiles_group_missing: bool,
    pub dry_run: bool,
}

impl ExtractionReport {
    pub fn command_groups_found(&self) -> usize {
        self.command_groups
            .iter()
            .filter(|result| result.is_found())
            .count()
    }

    pub fn profiles_found(&self) -> usize {
        self.profiles
            .iter()
            .filter(|outcome| outcome.is_complete())
            .count()
    }

    pub fn all_command_groups_found(&self) -> bool {
        self.command_groups_found() == self.command_groups.len()
    }

    pub fn all_profiles_found(&self) -> bool {
        self.profiles_found() == self.profiles.len()
    }

    pub fn is_complete(&self) -> bool {
        self.all_command_groups_found() && self.all_profiles_found()
    }

    /// Every result in processing order.
    pub fn results(&self) -> impl Iterator<Item = &ExtractionResult> {
        self.command_groups
            .iter()
            .chain(self.profiles.iter().flat_map(|outcome| outcome.actions.iter()))
    }

    pub fn misses(&self) -> impl Iterator<Item = &ExtractionResult> {
        self.results().filter(|result| !result.is_found())
    }

    /// Human-readable mismatch warnings; empty when everything was found.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.profiles_group_missing && !self.profiles.is_empty() {
            warnings.push(format!(
                "tree has no top-level '{PROFILES_GROUP}' group; no profile could be found"
            ));
        }
        if !self.all_command_groups_found() {
            warnings.push(format!(
                "Not all requested command groups were found ({} of {}). Please review the output above.",
                self.command_groups_found(),
                self.command_groups.len()
            ));
        }
        if !self.all_profiles_found() {
            warnings.push(format!(
                "Not all requested profile commands were found ({} of {} profiles complete). Please review the output above.",
                self.profiles_found(),
                self.profiles.len()
            ));
        }
        warnings
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub layout: OutputLayout,
    pub format: ArtifactFormat,
    pub header: String,
    pub dry_run: bool,
}

pub fn locate_command_group<'a>(tree: &'a TreeNode, name: &str) -> Option<&'a TreeNode> {
    find_by_name(tree.children(), name)
}

pub fn locate_profiles_group(tree: &TreeNode) -> Option<&TreeNode> {
    find_by_name(tree.children(), PROFILES_GROUP)
}

/// Resolve `profile` under one action of the `profiles` group.
pub fn locate_profile_action<'a>(
    profiles_group: &'a TreeNode,
    profile: &str,
    action: ActionCategory,
) -> Option<&'a TreeNode> {
    profiles_group
        .child(action.as_str())
        .and_then(|action_node| action_node.child(&action.node_name(profile)))
}

/// Run the extraction for every name in the manifest.
///
/// Command groups are processed first, then profiles. A miss is recorded and
/// the run continues; any render or write failure aborts it.
pub fn extract(catalog: &Catalog, options: &ExtractOptions) -> Result<ExtractionReport> {
    let mut report = ExtractionReport {
        dry_run: options.dry_run,
        ..ExtractionReport::default()
    };

    for name in &catalog.manifest.command_groups {
        let node = locate_command_group(&catalog.tree, name);
        let result = emit(
            node,
            name,
            Target::CommandGroup,
            options.layout.command_groups_dir.clone(),
            options,
        )?;
        report.command_groups.push(result);
    }

    let profiles_group = locate_profiles_group(&catalog.tree);
    if profiles_group.is_none() && !catalog.manifest.profiles.is_empty() {
        log::warn!("no top-level '{PROFILES_GROUP}' group in tree; every profile will miss");
        report.profiles_group_missing = true;
    }

    for name in &catalog.manifest.profiles {
        let mut actions = Vec::with_capacity(ActionCategory::ALL.len());
        for action in ActionCategory::ALL {
            let node = profiles_group.and_then(|group| locate_profile_action(group, name, action));
            let result = emit(
                node,
                name,
                Target::ProfileAction(action),
                options.layout.action_dir(action),
                options,
            )?;
            actions.push(result);
        }
        let outcome = ProfileOutcome {
            name: name.clone(),
            actions,
        };
        log::debug!(
            "profile {} matched {} of {} actions",
            outcome.name,
            outcome.found_count(),
            ActionCategory::ALL.len()
        );
        report.profiles.push(outcome);
    }

    Ok(report)
}

fn emit(
    node: Option<&TreeNode>,
    name: &str,
    target: Target,
    dir: PathBuf,
    options: &ExtractOptions,
) -> Result<ExtractionResult> {
    let Some(node) = node else {
        log::info!("{target} {name} was not found");
        return Ok(ExtractionResult::NotFound {
            name: name.to_string(),
            target,
        });
    };

    let artifact = render_artifact(node, name, &options.header, options.format)?;
    let path = if options.dry_run {
        dir.join(&artifact.file_name)
    } else {
        write_artifact(&dir, &artifact)?
    };
    log::info!("{target} {name} -> {}", path.display());

    Ok(ExtractionResult::Found {
        name: name.to_string(),
        target,
        path,
        content: artifact.content,
        written: !options.dry_run,
    })
}
