use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use cmdtrim_core::artifact::ArtifactFormat;
use cmdtrim_core::catalog::{load_catalog, load_manifest};
use cmdtrim_core::extract::{ExtractOptions, ExtractionReport, ExtractionResult, Target, extract};
use cmdtrim_core::header::load_header;
use cmdtrim_core::inventory::inventory;
use cmdtrim_core::layout::prepare_layout;
use cmdtrim_core::release::{PatchOutcome, patch_release_asset};
use cmdtrim_core::runtime::{
    InitOptions, PathOverrides, ResolutionContext, ResolvedPaths, init_project, resolve_paths,
};

#[derive(Debug, Parser)]
#[command(
    name = "cmdtrim",
    version,
    about = "Extract selected command groups and profile commands from a CLI command tree"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "Command tree document")]
    tree: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "Selection manifest")]
    manifest: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "License header text")]
    header: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    output_dir: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Jsonc,
    Json,
}

impl From<FormatArg> for ArtifactFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Jsonc => Self::Jsonc,
            FormatArg::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    overrides: PathOverrides,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            overrides: PathOverrides {
                project_root: cli.project_root.clone(),
                config: cli.config.clone(),
                tree: cli.tree.clone(),
                manifest: cli.manifest.clone(),
                header: cli.header.clone(),
                output_dir: cli.output_dir.clone(),
                format: cli.format.map(ArtifactFormat::from),
            },
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Write a default cmdtrim.toml and create the output directories")]
    Init(InitArgs),
    #[command(about = "Create the output directories only")]
    Layout,
    #[command(about = "Extract every group and profile named in the manifest")]
    Extract(ExtractArgs),
    #[command(about = "List artifacts on disk and flag the ones the manifest no longer requests")]
    Status(StatusArgs),
    #[command(
        name = "patch-release",
        about = "Stamp a release label into a generated web-help asset"
    )]
    PatchRelease(PatchReleaseArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long, help = "Overwrite an existing cmdtrim.toml")]
    force: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    #[arg(long, help = "Locate and report without writing any file")]
    dry_run: bool,
    #[arg(long, help = "Exit non-zero when any requested name was not found")]
    strict: bool,
}

#[derive(Debug, Args)]
struct StatusArgs {
    #[arg(long, help = "Print the inventory as JSON")]
    json: bool,
}

#[derive(Debug, Args)]
struct PatchReleaseArgs {
    #[arg(value_name = "ASSET", help = "Defaults to [release] asset from the config")]
    asset: Option<PathBuf>,
    #[arg(long = "release", value_name = "VERSION")]
    release: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "warn"))
        .init();

    let cli = Cli::parse();
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Init(args)) => run_init(&runtime, args),
        Some(Commands::Layout) => run_layout(&runtime),
        Some(Commands::Extract(args)) => run_extract(&runtime, args),
        Some(Commands::Status(args)) => run_status(&runtime, args),
        Some(Commands::PatchRelease(args)) => run_patch_release(&runtime, args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_init(runtime: &RuntimeOptions, args: InitArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = init_project(&paths, &InitOptions { force: args.force })?;

    println!("Initialized cmdtrim project");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!("config_path: {}", normalize_path(&paths.config_path));
    println!("output_dir: {}", normalize_path(&paths.output_dir));
    println!("created_dirs: {}", report.created_dirs.len());
    println!("wrote_config: {}", report.wrote_config);
    print_diagnostics(runtime, &paths);
    Ok(())
}

fn run_layout(runtime: &RuntimeOptions) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let layout = paths.layout();
    let report = prepare_layout(&layout)?;

    println!("output layout");
    println!("command_groups: {}", normalize_path(&layout.command_groups_dir));
    println!("profiles: {}", normalize_path(&layout.profiles_dir));
    println!("created_dirs: {}", report.created_dirs.len());
    print_diagnostics(runtime, &paths);
    Ok(())
}

fn run_extract(runtime: &RuntimeOptions, args: ExtractArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    print_diagnostics(runtime, &paths);

    let catalog = load_catalog(&paths.tree_path, &paths.manifest_path)?;
    let header = load_header(&paths.header_path)?;
    let layout = paths.layout();
    if !args.dry_run {
        prepare_layout(&layout)?;
    }

    let report = extract(
        &catalog,
        &ExtractOptions {
            layout,
            format: paths.format,
            header,
            dry_run: args.dry_run,
        },
    )?;
    print_extraction_report(&report);

    if args.strict && !report.is_complete() {
        bail!(
            "{} requested name(s) were not found (--strict)",
            report.misses().count()
        );
    }
    Ok(())
}

fn print_extraction_report(report: &ExtractionReport) {
    for result in report.results() {
        if let ExtractionResult::Found {
            name, target, path, ..
        } = result
        {
            let verb = if report.dry_run {
                "would be saved to"
            } else {
                "was found and saved to"
            };
            println!("{} {name} {verb}: {}", found_label(*target), normalize_path(path));
        }
    }

    println!("Extraction completed.");
    println!(
        "command_groups_found: {} of {}",
        report.command_groups_found(),
        report.command_groups.len()
    );
    println!(
        "profiles_found: {} of {}",
        report.profiles_found(),
        report.profiles.len()
    );

    let warnings = report.warnings();
    if warnings.is_empty() {
        return;
    }
    println!("warnings:");
    for warning in &warnings {
        println!("  - {warning}");
    }
    println!("missing:");
    for miss in report.misses() {
        println!("  - {} {}", miss.target(), miss.name());
    }
}

fn found_label(target: Target) -> &'static str {
    match target {
        Target::CommandGroup => "Command Group",
        Target::ProfileAction(_) => "Profile",
    }
}

fn run_status(runtime: &RuntimeOptions, args: StatusArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let manifest = load_manifest(&paths.manifest_path)?;
    let report = inventory(&paths.layout(), &manifest, paths.format)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("artifact status");
    println!("output_dir: {}", normalize_path(&paths.output_dir));
    println!("format: {}", paths.format);
    println!("artifacts: {}", report.entries.len());
    for entry in &report.entries {
        println!(
            "  {} {} {}{}",
            entry.content_hash,
            entry.bytes,
            entry.relative_path,
            if entry.stale { " (stale)" } else { "" }
        );
    }
    let stale = report.stale().count();
    println!("stale: {stale}");
    if !report.missing_dirs.is_empty() {
        println!("warnings:");
        for dir in &report.missing_dirs {
            println!(
                "  - {} is missing; run `cmdtrim layout` or `cmdtrim extract`",
                normalize_path(dir)
            );
        }
    }
    print_diagnostics(runtime, &paths);
    Ok(())
}

fn run_patch_release(runtime: &RuntimeOptions, args: PatchReleaseArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let asset = match args.asset {
        Some(asset) if asset.is_absolute() => asset,
        Some(asset) => paths.project_root.join(asset),
        None => paths.release_asset_path.clone(),
    };
    let placeholder = paths.config.release_placeholder();
    let label = paths.config.release_label(&args.release);

    match patch_release_asset(&asset, placeholder, &label)? {
        PatchOutcome::Patched => {
            println!("Patched release label in {}", normalize_path(&asset));
            println!("label: {label}");
        }
        PatchOutcome::PlaceholderMissing => {
            println!("warnings:");
            println!(
                "  - placeholder '{placeholder}' not found in {}; asset left unchanged",
                normalize_path(&asset)
            );
        }
    }
    print_diagnostics(runtime, &paths);
    Ok(())
}

fn resolve_runtime_paths(runtime: &RuntimeOptions) -> Result<ResolvedPaths> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let initial = resolve_paths(&context, &runtime.overrides)?;
    let project_env = initial.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
        return resolve_paths(&context, &runtime.overrides);
    }
    Ok(initial)
}

fn print_diagnostics(runtime: &RuntimeOptions, paths: &ResolvedPaths) {
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
