//! Schema Lineage CLI
//!
//! Drives the generation pipeline and exposes the flattening transform
//! and revision diffing for standalone use.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_lineage::{
    dedup_revisions, diff_schemas, ensure_repository, flatten_root_ref, select_versions,
    CommandGenerator, GenerationRun, GitSource, LineageConfig, SchemaStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-lineage")]
#[command(about = "Extract per-revision JSON Schemas for a tracked type definition")]
struct Cli {
    /// Path to config file (defaults to lineage.toml discovery)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: dedup, generate, flatten, store
    Generate {
        /// Skip the compile check on flattened documents
        #[arg(long)]
        no_validate: bool,
    },

    /// List unique content revisions without generating anything
    Versions,

    /// Flatten a root-level $ref in a single schema document
    Flatten {
        /// Schema file to transform
        input: PathBuf,

        /// Write here instead of rewriting the input in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what changed between two stored revisions
    Diff {
        /// Base revision tag
        from: String,
        /// Target revision tag
        to: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = LineageConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { no_validate } => generate(&config, !no_validate),
        Commands::Versions => versions(&config),
        Commands::Flatten { input, output } => flatten_file(&input, output.as_deref()),
        Commands::Diff { from, to } => diff(&config, &from, &to),
    }
}

fn open_source(config: &LineageConfig) -> anyhow::Result<GitSource> {
    let repository = &config.repository;
    let tracked_path = repository
        .tracked_path
        .clone()
        .context("repository.tracked_path is not configured")?;

    let repo = match &repository.url {
        Some(url) => ensure_repository(url, &repository.clone_dir)?,
        None => git2::Repository::open(&repository.clone_dir).with_context(|| {
            format!(
                "no repository.url configured and no clone at {}",
                repository.clone_dir.display()
            )
        })?,
    };

    Ok(GitSource::new(repo, tracked_path))
}

fn generate(config: &LineageConfig, validate: bool) -> anyhow::Result<()> {
    let source = open_source(config)?;
    let program = config
        .generator
        .program
        .clone()
        .context("generator.program is not configured")?;
    let generator = CommandGenerator::new(program, config.generator.args.clone());
    let store = SchemaStore::open(&config.output.dir, &config.output.name)?;

    let tags = source.tag_names()?;
    println!("📦 Processing {} tags (v{}.x.x)", tags.len(), config.repository.major);

    let run = GenerationRun::new(&source, &generator, &store, config.repository.major)
        .validate(validate && config.output.validate);
    let report = run.execute(tags);

    println!();
    println!("Unique content revisions: {}", report.unique);
    println!("  duplicate tags dropped: {}", report.duplicates);
    println!("  tags predating the tracked file: {}", report.missing);
    println!("Schemas stored: {}/{}", report.generated, report.unique);

    if !report.failed.is_empty() {
        println!();
        for (version, error) in &report.failed {
            println!("  ❌ {version}: {error}");
        }
        bail!("{} version(s) failed", report.failed.len());
    }

    Ok(())
}

fn versions(config: &LineageConfig) -> anyhow::Result<()> {
    let source = open_source(config)?;

    let candidates = select_versions(source.tag_names()?, config.repository.major);
    println!("🔍 {} candidate tags", candidates.len());

    let report = dedup_revisions(candidates, &source);
    for version in &report.unique {
        let digest = version
            .digest
            .as_ref()
            .map(|d| d.short().to_string())
            .unwrap_or_default();
        println!("  {version}  {digest}");
    }

    println!();
    println!(
        "{} unique ({} duplicates, {} predating the tracked file)",
        report.unique.len(),
        report.duplicates,
        report.missing
    );

    if !report.failures.is_empty() {
        for (version, error) in &report.failures {
            println!("  ❌ {version}: {error}");
        }
        bail!("{} version(s) failed", report.failures.len());
    }

    Ok(())
}

fn flatten_file(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let document: serde_json::Value = serde_json::from_str(&content)?;

    let flattened = flatten_root_ref(document.clone())?;
    let changed = flattened != document;

    let target = output.unwrap_or(input);
    let mut rendered = serde_json::to_string_pretty(&flattened)?;
    rendered.push('\n');
    fs::write(target, rendered)?;

    if changed {
        println!("✅ {} flattened", target.display());
    } else {
        println!("No root $ref in {}, copied unchanged", input.display());
    }

    Ok(())
}

fn diff(config: &LineageConfig, from: &str, to: &str) -> anyhow::Result<()> {
    let store = SchemaStore::open(&config.output.dir, &config.output.name)?;

    let old = store.load_schema(from)?;
    let new = store.load_schema(to)?;

    let diff = diff_schemas(from, &old, to, &new)?;
    if diff.is_empty() {
        println!("No differences between {from} and {to}");
        return Ok(());
    }

    println!("{}", diff.unified);
    println!("+{} -{} lines", diff.added, diff.removed);

    Ok(())
}
