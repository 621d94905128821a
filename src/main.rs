//! Curio CLI - run the collection pipeline end to end
//!
//! # Main Commands
//!
//! ```bash
//! curio run                          # Full pipeline on the embedded samples
//! curio run -j objects.json -o out.json
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! curio harvest                      # Just harvest sources to tables
//! curio enrich                       # Harvest + enrich, print documents
//! curio validate                     # Harvest + enrich + validate, print report
//! curio checks                       # Show the declared check catalog
//! ```

use clap::{Parser, Subcommand};
use curio::{
    enrich_objects, harvest_objects, harvest_objects_file, harvest_terminology,
    harvest_terminology_file, run, to_documents, Lookup, RunOptions, RunState, Table,
    OBJECT_SCHEMA,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "curio")]
#[command(about = "Enrich and validate museum collection records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: harvest → enrich → validate → output
    Run {
        /// Terminology source JSON (embedded sample if not specified)
        #[arg(short, long)]
        terminology: Option<PathBuf>,

        /// Objects source JSON (embedded sample if not specified)
        #[arg(short = 'j', long)]
        objects: Option<PathBuf>,

        /// Directory to persist intermediate tables into
        #[arg(short, long)]
        store_dir: Option<PathBuf>,

        /// Output file for the published documents
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Harvest the sources and print the resulting tables
    Harvest {
        #[arg(short, long)]
        terminology: Option<PathBuf>,

        #[arg(short = 'j', long)]
        objects: Option<PathBuf>,
    },

    /// Harvest and enrich, print the enriched documents
    Enrich {
        #[arg(short, long)]
        terminology: Option<PathBuf>,

        #[arg(short = 'j', long)]
        objects: Option<PathBuf>,
    },

    /// Harvest, enrich and validate, print the failure report
    Validate {
        #[arg(short, long)]
        terminology: Option<PathBuf>,

        #[arg(short = 'j', long)]
        objects: Option<PathBuf>,
    },

    /// Show the declared check catalog
    Checks,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("curio=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            terminology,
            objects,
            store_dir,
            output,
        } => cmd_run(RunOptions {
            terminology,
            objects,
            store_dir,
            output,
        }),

        Commands::Harvest {
            terminology,
            objects,
        } => cmd_harvest(terminology, objects),

        Commands::Enrich {
            terminology,
            objects,
        } => cmd_enrich(terminology, objects),

        Commands::Validate {
            terminology,
            objects,
        } => cmd_validate(terminology, objects),

        Commands::Checks => cmd_checks(),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = run(&options)?;
    if outcome.state == RunState::Output {
        eprintln!("published {} documents", outcome.documents.len());
        return Ok(());
    }
    eprintln!("validation failed, output blocked:");
    for entry in outcome.report.summary() {
        eprintln!(
            "  {} [{}] rows: {}",
            entry.check,
            entry.column,
            entry.row_keys.join(", ")
        );
    }
    std::process::exit(1);
}

fn harvest_pair(
    terminology: Option<PathBuf>,
    objects: Option<PathBuf>,
) -> Result<(Table, Table), Box<dyn std::error::Error>> {
    let terms = match terminology {
        Some(path) => harvest_terminology_file(path)?,
        None => harvest_terminology(curio::harvest::samples::TERMINOLOGY)?,
    };
    let objs = match objects {
        Some(path) => harvest_objects_file(path)?,
        None => harvest_objects(curio::harvest::samples::OBJECTS)?,
    };
    Ok((terms, objs))
}

fn cmd_harvest(
    terminology: Option<PathBuf>,
    objects: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (terms, objs) = harvest_pair(terminology, objects)?;
    eprintln!("{} terms, {} objects", terms.len(), objs.len());
    println!("{}", serde_json::to_string_pretty(&objs.to_records())?);
    Ok(())
}

fn cmd_enrich(
    terminology: Option<PathBuf>,
    objects: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (terms, objs) = harvest_pair(terminology, objects)?;
    let enriched = enrich_objects(&objs, &Lookup::new(terms, "key")?)?;
    println!("{}", serde_json::to_string_pretty(&to_documents(&enriched))?);
    Ok(())
}

fn cmd_validate(
    terminology: Option<PathBuf>,
    objects: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (terms, objs) = harvest_pair(terminology, objects)?;
    let enriched = enrich_objects(&objs, &Lookup::new(terms, "key")?)?;
    let report = OBJECT_SCHEMA.validate(&enriched)?;

    if report.passed {
        eprintln!("all checks passed ({} rows)", enriched.len());
        return Ok(());
    }
    eprintln!("{} failures", report.failures.len());
    println!("{}", serde_json::to_string_pretty(&report)?);
    std::process::exit(1);
}

fn cmd_checks() -> Result<(), Box<dyn std::error::Error>> {
    let schema = &*OBJECT_SCHEMA;
    println!("field rules:");
    for rule in &schema.fields {
        let mut parts = Vec::new();
        if !rule.nullable {
            parts.push("not_null".to_string());
        }
        if rule.unique {
            parts.push("unique".to_string());
        }
        if let Some(min) = rule.min_len {
            parts.push(format!("min_length({min})"));
        }
        if let Some(b) = rule.ge {
            parts.push(format!("ge({b})"));
        }
        if let Some(b) = rule.le {
            parts.push(format!("le({b})"));
        }
        println!("  {:<16} {}", rule.column, parts.join(", "));
    }
    println!("\nchecks:");
    for check in &schema.checks {
        let guarded = if check.guards.is_empty() {
            ""
        } else {
            " (guarded)"
        };
        println!("  {:<36} on {}{}", check.name, check.column, guarded);
    }
    Ok(())
}
