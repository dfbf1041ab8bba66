//! PKL Pipeline CLI
//!
//! Command-line interface for tagging, organizing, exporting and validating
//! animation scenes stored as scene documents.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pkl_pipeline_core::decision::validation_passed_message;
use pkl_pipeline_core::export::UnitOutcome;
use pkl_pipeline_core::naming::export_root;
use pkl_pipeline_core::path_utils::{file_name, split_extension};
use pkl_pipeline_core::types::CONFIG_FILE_NAME;
use pkl_pipeline_core::{
    auto_fix_all, auto_fix_prompt, check_references, classify_scene, create_master_group,
    export_camera, export_scene, export_selected, mark_skeleton, organize_animation,
    parse_asset_identity, parse_shot_identity, set_camera, AutoFixSummary, Decision,
    ExportSummary, LocalFileSystem, ManifestExporter, MemoryScene, PipelineConfig, SceneContext,
    SceneDocument, SceneGraph, UnitReport,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "pkl")]
#[command(about = "Animation pipeline tools for tagging, organizing and exporting scenes")]
#[command(version)]
struct Cli {
    /// Pipeline config file (default: ./pipeline.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SceneArgs {
    /// Scene document (.json, .yaml or .yml)
    #[arg(short, long)]
    scene: PathBuf,

    /// Where to write the updated document (default: overwrite --scene)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace the document's selection with these node names
    #[arg(long = "select")]
    select: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what the naming conventions derive from a file name
    Identify {
        /// Scene or asset file name
        file: String,
    },

    /// Write a default pipeline.toml
    Init {
        /// Directory to write into (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Wrap the asset in its master group
    Group(SceneArgs),

    /// Mark the selected camera as the shot camera
    Camera(SceneArgs),

    /// Mark the selected joint as the exportable skeleton root
    MarkSkeleton(SceneArgs),

    /// Build and organize the ANIMATION hierarchy of a shot scene
    Organize(SceneArgs),

    /// Export selected groups (or all of them) through the manifest exporter
    Export {
        #[command(flatten)]
        scene: SceneArgs,

        /// Export every exportable group instead of the selection
        #[arg(long)]
        all: bool,
    },

    /// Export the shot camera
    ExportCamera(SceneArgs),

    /// Check that CH/PRP references point at _MASTER files
    CheckRefs {
        #[command(flatten)]
        scene: SceneArgs,

        /// Swap invalid references to their master files
        #[arg(long)]
        fix: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "pkl=debug" } else { "pkl=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse().unwrap()),
        )
        .init();

    let json = cli.json;
    let verbose = cli.verbose;
    let config_path = cli.config;
    let load_config = || {
        PipelineConfig::discover(config_path.as_deref()).context("Failed to load pipeline config")
    };

    match cli.command {
        Commands::Identify { file } => cmd_identify(&file, &load_config()?, json),
        Commands::Init { path, force } => cmd_init(path, force),
        Commands::Group(args) => {
            let (mut scene, ctx) = load_scene(&args)?;
            let report = create_master_group(&mut scene, &ctx)?;
            print_report(json, &report, || println!("{} ready", report.group))?;
            save_scene(&scene, &ctx, &args)
        }
        Commands::Camera(args) => {
            let (mut scene, ctx) = load_scene(&args)?;
            let report = set_camera(&mut scene, &ctx)?;
            print_report(json, &report, || {
                println!("Shot camera: {}", report.camera);
                println!("  CamTools logic: {}", report.camtools_logic);
                println!("  In group: {}", report.is_in_group);
            })?;
            save_scene(&scene, &ctx, &args)
        }
        Commands::MarkSkeleton(args) => {
            let (mut scene, ctx) = load_scene(&args)?;
            let joint = mark_skeleton(&mut scene, &ctx)?;
            print_report(json, &joint, || println!("Skeleton marked as exportable: {}", joint))?;
            save_scene(&scene, &ctx, &args)
        }
        Commands::Organize(args) => {
            let config = load_config()?;
            let (mut scene, ctx) = load_scene(&args)?;
            let report = organize_animation(&mut scene, &ctx, &config)?;
            print_report(json, &report, || {
                println!("Shot {} {} -> {}", report.shot.sequence, report.shot.shot, report.export_root);
                for group in &report.created {
                    println!("  created {}", group);
                }
                for reparent in &report.organized.moves {
                    println!("  {} -> {}", reparent.node, reparent.parent);
                }
                for skipped in &report.organized.skipped {
                    println!("  skipped {} ({})", skipped.node, skipped.reason);
                }
            })?;
            save_scene(&scene, &ctx, &args)
        }
        Commands::Export { scene: args, all } => {
            let config = load_config()?;
            let (scene, ctx) = load_scene(&args)?;
            let mut engine = ManifestExporter;
            let summary = if all {
                export_scene(&scene, &ctx, &config, &LocalFileSystem, &mut engine)?
            } else {
                export_selected(&scene, &ctx, &config, &LocalFileSystem, &mut engine)?
            };
            print_report(json, &summary, || print_summary(&summary))?;
            if !summary.failed.is_empty() {
                bail!("{} of {} export(s) failed", summary.failed.len(), summary.total());
            }
            Ok(())
        }
        Commands::ExportCamera(args) => {
            let config = load_config()?;
            let (scene, ctx) = load_scene(&args)?;
            let report = export_camera(&scene, &ctx, &config, &LocalFileSystem, &mut ManifestExporter)?;
            print_report(json, &report, || print_unit(&report))?;
            if let UnitOutcome::Failed { reason } = &report.outcome {
                bail!("Camera export failed: {}", reason);
            }
            Ok(())
        }
        Commands::CheckRefs { scene: args, fix } => {
            cmd_check_refs(&args, &load_config()?, fix, json, verbose)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Identity {
    scene_type: String,
    asset: pkl_pipeline_core::AssetIdentity,
    master_group: String,
    shot: pkl_pipeline_core::ShotIdentity,
    export_root: String,
}

/// Naming-derived identity for a file name under `config`
fn identify(file: &str, config: &PipelineConfig) -> Identity {
    let name = file_name(file);
    let (stem, _) = split_extension(name);
    let asset = parse_asset_identity(stem);
    let shot = parse_shot_identity(name);
    let marked_animation = name
        .to_lowercase()
        .contains(&config.animation_marker.to_lowercase());
    Identity {
        scene_type: classify_scene(Some(name), marked_animation).to_string(),
        master_group: asset.master_group_name(),
        export_root: export_root(&shot, config),
        asset,
        shot,
    }
}

/// Print naming-derived identity for a file name
fn cmd_identify(file: &str, config: &PipelineConfig, json: bool) -> Result<()> {
    let identity = identify(file, config);
    print_report(json, &identity, || {
        println!("{}: {}", file_name(file), identity.scene_type);
        println!("  Category: {}", identity.asset.category);
        println!("  Name: {}", identity.asset.asset_name);
        println!("  ID: {}", identity.asset.discipline_id);
        println!("  Master group: {}", identity.master_group);
        println!("  Sequence: {}", identity.shot.sequence);
        println!("  Shot: {}", identity.shot.shot);
        println!("  Export root: {}", identity.export_root);
    })
}

/// Write a default config file
fn cmd_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let dir = match path {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", config_path.display());
    }

    std::fs::create_dir_all(&dir).context("Failed to create config directory")?;
    PipelineConfig::default()
        .write_to(&config_path)
        .context("Failed to write pipeline config")?;
    println!("Wrote {}", config_path.display());
    Ok(())
}

fn cmd_check_refs(
    args: &SceneArgs,
    config: &PipelineConfig,
    fix: bool,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let (mut scene, ctx) = load_scene(args)?;
    let report = check_references(&scene, config)?;

    let Some(prompt) = auto_fix_prompt(&report, config) else {
        print_report(json, &report, || println!("{}", validation_passed_message(&report, config)))?;
        return Ok(());
    };

    let decision = if fix { Decision::Proceed } else { Decision::Cancel };
    if decision == Decision::Cancel {
        print_report(json, &report, || {
            println!("{}\n", prompt.title);
            println!("{}", prompt.message);
            println!("\nRe-run with --fix to auto-fix.");
        })?;
        bail!("{} invalid reference(s)", report.invalid.len());
    }

    let result = auto_fix_all(&mut scene, &LocalFileSystem, &report.invalid, config);
    let summary = AutoFixSummary::classify(&result);
    print_report(json, &result, || {
        println!("{}\n", summary.title());
        println!("{}", summary.message(&result));
        if summary != AutoFixSummary::AllFixed && !verbose {
            println!("\nRun with -v for details.");
        }
    })?;
    if !result.fixed.is_empty() {
        save_scene(&scene, &ctx, args)?;
    }
    if summary != AutoFixSummary::AllFixed {
        bail!("{} reference(s) could not be fixed", result.failed.len());
    }
    Ok(())
}

fn load_scene(args: &SceneArgs) -> Result<(MemoryScene, SceneContext)> {
    let document = SceneDocument::from_file(&args.scene)
        .with_context(|| format!("Failed to read scene document {}", args.scene.display()))?;
    let (scene, mut ctx) = document
        .into_scene()
        .with_context(|| format!("Invalid scene document {}", args.scene.display()))?;

    if !args.select.is_empty() {
        ctx.selection = args
            .select
            .iter()
            .map(|name| scene.find(name).with_context(|| format!("No node named '{}'", name)))
            .collect::<Result<_>>()?;
    }
    if ctx.workspace_root.is_empty() {
        ctx.workspace_root = workspace_fallback(&args.scene);
    }
    tracing::debug!("Loaded {} nodes from {}", scene.node_count(), args.scene.display());
    Ok((scene, ctx))
}

/// Directory holding the document, used when it names no workspace
fn workspace_fallback(document: &Path) -> String {
    document
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string())
}

fn save_scene(scene: &MemoryScene, ctx: &SceneContext, args: &SceneArgs) -> Result<()> {
    let output = args.output.as_ref().unwrap_or(&args.scene);
    scene
        .to_document(ctx)
        .write_to(output)
        .with_context(|| format!("Failed to write scene document {}", output.display()))?;
    tracing::info!("Scene written to {}", output.display());
    Ok(())
}

fn print_report<T: Serialize>(json: bool, report: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        human();
    }
    Ok(())
}

fn print_unit(report: &UnitReport) {
    match &report.outcome {
        UnitOutcome::Exported { path } => println!("  [OK] {} -> {}", report.node, path),
        UnitOutcome::SkippedNoSkeleton { reason } => {
            println!("  [SKIP] {} - {}", report.node, reason)
        }
        UnitOutcome::Failed { reason } => println!("  [FAIL] {} - {}", report.node, reason),
    }
}

fn print_summary(summary: &ExportSummary) {
    println!("Export results:");
    for report in summary
        .succeeded
        .iter()
        .chain(&summary.skipped_no_skeleton)
        .chain(&summary.failed)
    {
        print_unit(report);
    }
    println!(
        "\nExported: {}  Skipped: {}  Failed: {}",
        summary.succeeded.len(),
        summary.skipped_no_skeleton.len(),
        summary.failed.len()
    );
}
