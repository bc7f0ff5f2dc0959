//! Command-line entry point for joint drift imports.
//!
//! # Responsibility
//! - Map arguments onto core services.
//! - Print results as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jointdrift_core::{
    default_log_level, init_logging, AggregateJointDriftRepository, CancellationToken,
    CombinedJointDriftRepository, InMemoryContext, JointDriftService, LegacyConnectionProvider,
    LegacyJointDriftRepository, PersistenceContext, SqliteContext, ValidationRules,
};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "jointdrift", version, about = "Import and inspect joint drift exports")]
struct Cli {
    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Require positive integer joint labels.
    #[arg(long, global = true)]
    numeric_labels: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the output cases present in a legacy export.
    Cases {
        legacy: PathBuf,
    },
    /// Print the rows of one output case.
    Entries {
        legacy: PathBuf,
        #[arg(long = "case")]
        output_case: String,
        /// Only rows of this joint; fails when none match.
        #[arg(long)]
        label: Option<String>,
    },
    /// Copy one output case into the application database.
    Import {
        legacy: PathBuf,
        #[arg(long = "case")]
        output_case: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Print every item stored in the application database.
    List {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Application database file; created when missing.
    #[arg(long = "db")]
    db_path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let rules = ValidationRules {
        numeric_labels: cli.numeric_labels,
    };
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Cases { legacy } => {
            let provider = open_legacy(&legacy)?;
            let service = build_service(&provider, InMemoryContext::new(), rules);
            print_json(&service.get_unique_case_names(&cancel)?)
        }
        Command::Entries {
            legacy,
            output_case,
            label,
        } => {
            let provider = open_legacy(&legacy)?;
            let service = build_service(&provider, InMemoryContext::new(), rules);
            let entries = match label {
                Some(label) => service.find_entries_by_label(&output_case, &label, &cancel)?,
                None => service.get_entries_by_case(&output_case, &cancel)?,
            };
            print_json(&entries)
        }
        Command::Import {
            legacy,
            output_case,
            store,
        } => {
            let provider = open_legacy(&legacy)?;
            let mut service = build_service(&provider, open_store(&store.db_path)?, rules);
            let imported = service
                .import_case(&output_case, &cancel)
                .with_context(|| format!("failed to import case `{output_case}`"))?;
            info!(
                "event=cli_import module=cli status=ok output_case=\"{output_case}\" items={imported}"
            );
            print_json(&serde_json::json!({
                "outputCase": output_case,
                "imported": imported,
            }))
        }
        Command::List { store } => {
            let provider = LegacyConnectionProvider::new();
            let service = build_service(&provider, open_store(&store.db_path)?, rules);
            print_json(&service.get_all_items()?)
        }
    }
}

fn open_legacy(path: &Path) -> Result<LegacyConnectionProvider> {
    let mut provider = LegacyConnectionProvider::new();
    provider
        .open(path)
        .with_context(|| format!("cannot read legacy export `{}`", path.display()))?;
    Ok(provider)
}

fn open_store(path: &Path) -> Result<SqliteContext> {
    let mut context = SqliteContext::open(path)
        .with_context(|| format!("cannot open application database `{}`", path.display()))?;
    context.ensure_list()?;
    Ok(context)
}

fn build_service<C: PersistenceContext>(
    provider: &LegacyConnectionProvider,
    context: C,
    rules: ValidationRules,
) -> JointDriftService<CombinedJointDriftRepository<'_, C>> {
    JointDriftService::new(CombinedJointDriftRepository::new(
        AggregateJointDriftRepository::with_rules(context, rules),
        LegacyJointDriftRepository::new(provider),
    ))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
