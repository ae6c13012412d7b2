//! bom-recon: reconcile physical assembly observations against versioned BOMs
//!
//! Imports line-item BOMs, compares observed part counts against the version
//! in force and turns reviewed findings into tracked action items.

#![allow(clippy::too_many_lines, clippy::struct_excessive_bools)]

use anyhow::{Context, Result};
use bom_recon::{
    cli::{self, BomListOptions, EditOptions, FinalizeOptions, ReconcileOptions},
    config::{AppConfig, ConfigPreset, Validatable},
    model::ActionItemStatus,
    pipeline::exit_codes,
    reports::ReportFormat,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bom-recon")]
#[command(version)]
#[command(about = "BOM reconciliation and action item tracking", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  No findings (or fail flags not set)
    1  Shortages found (--fail-on-shortage)
    2  Unlisted parts found (--fail-on-unlisted)
    3  Error occurred

EXAMPLES:
    # Load a catalog export into the workspace
    bom-recon import boms.json

    # Compare an observation record against the active version
    bom-recon reconcile observation.json

    # Compare raw detector output for one BOM code
    bom-recon reconcile detections.json --bom-code BC-01 -o table

    # Turn the default proposal into action items, skipping one material
    bom-recon finalize observation.json --exclude RES-220")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Apply a named configuration preset before the config file
    #[arg(long, global = true)]
    preset: Option<String>,

    /// Workspace snapshot file
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Output format (auto: summary on a terminal, json otherwise)
    #[arg(short, long, global = true, default_value = "auto")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long, global = true)]
    output_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Arguments shared by `reconcile` and `finalize`
#[derive(Parser, Clone)]
struct ObservationArgs {
    /// Observation record (JSON object) or detector output (JSON array)
    observation: PathBuf,

    /// BOM code; required for detector output, overrides the record's code
    #[arg(short, long)]
    bom_code: Option<String>,

    /// Compare against this version instead of the active one
    #[arg(long = "version-tag")]
    version_tag: Option<String>,

    /// Keep material names as written instead of upper-casing them
    #[arg(long)]
    keep_case: bool,
}

impl ObservationArgs {
    fn to_options(&self, proposal_file: Option<PathBuf>) -> ReconcileOptions {
        ReconcileOptions {
            observation: self.observation.clone(),
            bom_code: self.bom_code.clone(),
            version_tag: self.version_tag.clone(),
            proposal_file,
        }
    }
}

/// Arguments for the `reconcile` subcommand
#[derive(Parser)]
struct ReconcileArgs {
    #[command(flatten)]
    observation: ObservationArgs,

    /// Write the default finalize proposal (JSON) to this file
    #[arg(long)]
    proposal: Option<PathBuf>,

    /// Exit with code 1 when shortages are found
    #[arg(long)]
    fail_on_shortage: bool,

    /// Exit with code 2 when unlisted parts are found
    #[arg(long)]
    fail_on_unlisted: bool,
}

/// Arguments for the `finalize` subcommand
#[derive(Parser)]
struct FinalizeArgs {
    #[command(flatten)]
    observation: ObservationArgs,

    /// Reviewed selection (JSON `{shortages, unlisted}`); default proposal if omitted
    #[arg(long)]
    selection: Option<PathBuf>,

    /// Material to leave out of the selection (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Propose only shortages
    #[arg(long, conflicts_with = "selection")]
    shortages_only: bool,
}

/// Arguments for the `boms` subcommand
#[derive(Parser)]
struct BomsArgs {
    /// Only show this BOM code
    bom_code: Option<String>,

    /// Flat material rows aggregated across versions
    #[arg(long)]
    flat: bool,

    /// Expand a group (repeatable)
    #[arg(long)]
    expand: Vec<String>,

    /// Expand every group
    #[arg(long)]
    expand_all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare an observation against the version in force
    Reconcile(ReconcileArgs),

    /// Reconcile and commit the reviewed findings as action items
    Finalize(FinalizeArgs),

    /// Replace catalog entries with the BOM codes of a line item file
    Import {
        /// JSON array of line items
        items: PathBuf,
    },

    /// List the catalog grouped by BOM code
    Boms(BomsArgs),

    /// Make a version the one in force for a BOM code
    Activate {
        bom_code: String,
        version_tag: String,
    },

    /// Replace the rows of a version with an edited material list
    Edit {
        bom_code: String,

        /// JSON array of `{id?, material, qty, partReference?, description?}`
        drafts: PathBuf,

        /// Version to edit (default version if omitted)
        #[arg(long = "version-tag")]
        version_tag: Option<String>,
    },

    /// Copy or delete BOM versions
    Version {
        #[command(subcommand)]
        action: VersionAction,
    },

    /// List and update action items
    Actions {
        #[command(subcommand)]
        action: ActionsAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// Copy a version (the active one by default) to a new tag
    Copy {
        bom_code: String,
        new_tag: String,

        /// Version to copy from
        #[arg(long)]
        from: Option<String>,
    },
    /// Delete every line item of a version
    Delete { bom_code: String, version_tag: String },
}

#[derive(Subcommand)]
enum ActionsAction {
    /// List action items grouped by BOM code
    List {
        bom_code: Option<String>,

        /// Expand every group
        #[arg(long)]
        expand_all: bool,
    },
    /// Move an action item to BARU_MASUK, DITINDAKLANJUTI or SELESAI
    SetStatus { id: u64, status: ActionItemStatus },
    /// Delete every action item of a BOM code
    Reset {
        bom_code: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .bom-recon.yaml in the current directory
    Init,
    /// Generate JSON Schema for the config file format
    Schema {
        /// Write schema to this file instead of stdout
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli) {
        Ok(code) if code != exit_codes::SUCCESS => std::process::exit(code),
        Ok(_) => {}
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}

/// Merge presets, the config file and global flags into the effective config.
fn effective_config(cli: &Cli, keep_case: bool) -> Result<AppConfig> {
    let mut overrides = AppConfig::builder()
        .output_format(cli.output)
        .output_file(cli.output_file.clone())
        .no_color(cli.no_color)
        .quiet(cli.quiet);
    if keep_case {
        overrides = overrides.normalize_material_case(false);
    }
    if let Some(path) = &cli.state {
        overrides = overrides.state_path(path.clone());
    }
    let overrides = overrides.build();

    let (mut config, loaded_from) =
        AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
    if let Some(name) = &cli.preset {
        let preset = ConfigPreset::from_name(name)
            .with_context(|| format!("Unknown preset '{name}'"))?;
        let mut merged = AppConfig::from_preset(preset);
        merged.merge(&config);
        config = merged;
    }
    if let Some(path) = loaded_from {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<i32> {
    let cli = &cli;
    match cli.command {
        Commands::Reconcile(ref args) => {
            let mut config = effective_config(&cli, args.observation.keep_case)?;
            config.behavior.fail_on_shortage |= args.fail_on_shortage;
            config.behavior.fail_on_unlisted |= args.fail_on_unlisted;
            let options = args.observation.to_options(args.proposal.clone());
            cli::run_reconcile(&config, &options)
        }

        Commands::Finalize(ref args) => {
            let mut config = effective_config(&cli, args.observation.keep_case)?;
            if args.shortages_only {
                config.finalize.include_unlisted = false;
            }
            let options = FinalizeOptions {
                reconcile: args.observation.to_options(None),
                selection_file: args.selection.clone(),
                exclude: args.exclude.clone(),
            };
            let created = cli::run_finalize(&config, &options)?;
            if !config.behavior.quiet {
                eprintln!("Created {} action items", created.len());
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Import { ref items } => {
            let config = effective_config(&cli, false)?;
            let report = cli::run_import(&config, items)?;
            if !config.behavior.quiet {
                eprintln!(
                    "Imported {} line items, replaced {}",
                    report.created.len(),
                    report.deleted.len()
                );
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Boms(ref args) => {
            let config = effective_config(&cli, false)?;
            let options = BomListOptions {
                bom_code: args.bom_code.clone(),
                flat: args.flat,
                expand: args.expand.clone(),
                expand_all: args.expand_all,
            };
            cli::run_boms(&config, &options)?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Activate {
            ref bom_code,
            ref version_tag,
        } => {
            let config = effective_config(&cli, false)?;
            cli::run_activate(&config, bom_code, version_tag)?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Edit {
            ref bom_code,
            ref drafts,
            ref version_tag,
        } => {
            let config = effective_config(&cli, false)?;
            let options = EditOptions {
                bom_code: bom_code.clone(),
                version_tag: version_tag.clone(),
                drafts: drafts.clone(),
            };
            let report = cli::run_edit(&config, &options)?;
            if !config.behavior.quiet {
                eprintln!(
                    "{} created, {} updated, {} deleted",
                    report.created.len(),
                    report.updated.len(),
                    report.deleted.len()
                );
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Version { ref action } => {
            let config = effective_config(&cli, false)?;
            match action {
                VersionAction::Copy {
                    bom_code,
                    new_tag,
                    from,
                } => {
                    let ids = cli::run_copy_version(&config, bom_code, from.as_deref(), new_tag)?;
                    if !config.behavior.quiet {
                        eprintln!("Copied {} line items to {bom_code}/{new_tag}", ids.len());
                    }
                }
                VersionAction::Delete {
                    bom_code,
                    version_tag,
                } => {
                    let removed = cli::run_delete_version(&config, bom_code, version_tag)?;
                    if !config.behavior.quiet {
                        eprintln!("Deleted {removed} line items of {bom_code}/{version_tag}");
                    }
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Actions { ref action } => {
            let config = effective_config(&cli, false)?;
            match action {
                ActionsAction::List {
                    bom_code,
                    expand_all,
                } => cli::run_actions_list(&config, bom_code.as_deref(), *expand_all)?,
                ActionsAction::SetStatus { id, status } => {
                    let item = cli::run_set_status(&config, *id, *status)?;
                    if !config.behavior.quiet {
                        eprintln!("Action item {} is now {}", item.id, item.status);
                    }
                }
                ActionsAction::Reset { bom_code, yes } => {
                    if !yes {
                        anyhow::bail!(
                            "Resetting deletes every action item of {bom_code}; pass --yes to confirm"
                        );
                    }
                    let removed = cli::run_reset(&config, bom_code)?;
                    if !config.behavior.quiet {
                        eprintln!("Removed {removed} action items of {bom_code}");
                    }
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "bom-recon", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { ref action } => {
            run_config(action, &cli)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn run_config(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let (config, loaded_from) = bom_recon::config::load_or_default(cli.config.as_deref());
            if let Some(path) = &loaded_from {
                eprintln!("# Loaded from: {}", path.display());
            } else {
                eprintln!("# No config file found; showing defaults");
            }
            let yaml = serde_yaml_ng::to_string(&config).context("failed to serialize config")?;
            print!("{yaml}");
        }
        ConfigAction::Path => {
            let search_paths: [Option<String>; 3] = [
                std::env::current_dir().ok().map(|p| p.display().to_string()),
                ::dirs::config_dir().map(|p| p.join("bom-recon").display().to_string()),
                ::dirs::home_dir().map(|p| p.display().to_string()),
            ];
            eprintln!("Config file search paths (in order):");
            for path in search_paths.into_iter().flatten() {
                eprintln!("  {path}");
            }
            eprintln!();
            eprintln!("Recognized file names:");
            for name in &[
                ".bom-recon.yaml",
                ".bom-recon.yml",
                "bom-recon.yaml",
                "bom-recon.yml",
            ] {
                eprintln!("  {name}");
            }
            eprintln!();
            match bom_recon::config::discover_config_file(cli.config.as_deref()) {
                Some(path) => eprintln!("Active config file: {}", path.display()),
                None => eprintln!("No config file found."),
            }
        }
        ConfigAction::Init => {
            let target = std::env::current_dir()
                .context("cannot determine current directory")?
                .join(".bom-recon.yaml");
            if target.exists() {
                anyhow::bail!(
                    "{} already exists. Remove it first to re-initialize.",
                    target.display()
                );
            }
            let content = bom_recon::config::generate_full_example_config();
            std::fs::write(&target, content)
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Created {}", target.display());
        }
        ConfigAction::Schema { path } => {
            let schema = bom_recon::config::generate_json_schema();
            match path {
                Some(path) => {
                    std::fs::write(path, &schema)?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
        }
    }
    Ok(())
}
