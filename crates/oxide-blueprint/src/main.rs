//! oxide-blueprint CLI
//!
//! Command-line tool that turns change-set documents into migration scripts.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use oxide_blueprint::prelude::*;

/// Compile schema change-sets into reversible migration scripts.
#[derive(Parser)]
#[command(name = "oxide-blueprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Entity registry document (model -> table / primary key).
    #[arg(short, long, env = "BLUEPRINT_MODELS")]
    models: Option<PathBuf>,

    /// Emit both defaults when a column sets `default` and `rawDefault`.
    #[arg(long, env = "BLUEPRINT_ALLOW_AMBIGUOUS_DEFAULTS")]
    allow_ambiguous_defaults: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a migration script to stdout.
    Generate {
        /// Script (class) name.
        #[arg(short, long)]
        name: String,

        /// Change-set applied by `up()`.
        #[arg(long)]
        up: PathBuf,

        /// Change-set applied by `down()` (empty if not given).
        #[arg(long)]
        down: Option<PathBuf>,
    },

    /// Print the compiled statements of one change-set as JSON.
    Plan {
        /// Change-set to compile.
        #[arg(long)]
        up: PathBuf,
    },

    /// Compile change-sets and report what they would emit.
    Check {
        /// Change-set applied by `up()`.
        #[arg(long)]
        up: PathBuf,

        /// Change-set applied by `down()`.
        #[arg(long)]
        down: Option<PathBuf>,
    },
}

fn load_change_set(path: &Path) -> anyhow::Result<ChangeSet> {
    ChangeSet::from_path(path).with_context(|| format!("reading change set {}", path.display()))
}

fn load_optional(path: Option<&Path>) -> anyhow::Result<ChangeSet> {
    path.map_or_else(|| Ok(ChangeSet::new()), load_change_set)
}

fn load_registry(path: Option<&Path>) -> anyhow::Result<StaticRegistry> {
    let Some(path) = path else {
        return Ok(StaticRegistry::new());
    };
    let registry = StaticRegistry::from_path(path)
        .with_context(|| format!("reading entity registry {}", path.display()))?;
    debug!(entities = registry.len(), "loaded entity registry");
    Ok(registry)
}

fn report(direction: &str, compiled: &CompiledChangeSet) {
    if compiled.is_empty() {
        info!("{direction}: nothing to do");
        return;
    }
    for pass in &compiled.passes {
        for group in &pass.groups {
            if let Some(table) = group.table() {
                info!(
                    "{direction}: {:?} '{table}' ({} statements)",
                    pass.kind,
                    group.statement_count()
                );
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries the script.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let registry = load_registry(cli.models.as_deref())?;
    let mut options = CompilerOptions::new();
    if cli.allow_ambiguous_defaults {
        options = options.with_ambiguous_defaults();
    }
    let compiler = StatementCompiler::with_options(&registry, options);

    match cli.command {
        Commands::Generate { name, up, down } => {
            let up = load_change_set(&up)?;
            let down = load_optional(down.as_deref())?;

            let script = ScriptAssembler::new(&compiler).assemble(&name, &up, &down)?;
            print!("{}", script.render(&BlueprintDialect::new()));
            info!("Generated migration {name}");
        }

        Commands::Plan { up } => {
            let compiled = compiler.compile(&load_change_set(&up)?)?;
            println!("{}", serde_json::to_string_pretty(&compiled)?);
        }

        Commands::Check { up, down } => {
            let up = compiler.compile(&load_change_set(&up)?)?;
            let down = compiler.compile(&load_optional(down.as_deref())?)?;

            report("up", &up);
            report("down", &down);
            info!(
                "OK: {} statements up, {} statements down",
                up.statement_count(),
                down.statement_count()
            );
        }
    }

    Ok(())
}
