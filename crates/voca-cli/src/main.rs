//! Voca CLI - manage vocabulary decks and sync them from the terminal.

mod cli;
mod commands;
mod error;
mod remote;
mod settings;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::completions::run_completions;
use crate::commands::export::run_export;
use crate::commands::groups::{run_groups, run_reindex};
use crate::commands::sync::{run_sync, run_sync_conflicts};
use crate::commands::vocabulary::{run_add, run_delete, run_list, run_pin};
use crate::commands::words::{run_add_word, run_delete_word, run_edit_word, run_words};
use crate::error::CliError;
use crate::settings::CliSettings;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "voca=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completions { shell, output } = &command {
        return run_completions(*shell, output.as_deref());
    }

    let settings = CliSettings::resolve(cli.db_path, cli.groups_path, cli.config)?;

    match command {
        Commands::List { json } => run_list(json, &settings).await,
        Commands::Add { name, lang } => run_add(&name, lang.into(), &settings).await,
        Commands::Pin { id } => run_pin(&id, &settings).await,
        Commands::Delete { id } => run_delete(&id, &settings).await,
        Commands::Words { deck, json } => run_words(&deck, json, &settings).await,
        Commands::AddWord {
            deck,
            word,
            meanings,
            option,
        } => run_add_word(&deck, &word, &meanings, &option, &settings).await,
        Commands::EditWord {
            id,
            word,
            meanings,
            option,
        } => run_edit_word(&id, &word, &meanings, &option, &settings).await,
        Commands::DeleteWord { id } => run_delete_word(&id, &settings).await,
        Commands::Export {
            deck,
            format,
            output,
        } => run_export(&deck, format, output.as_deref(), &settings).await,
        Commands::Sync { command: None } => run_sync(&settings).await,
        Commands::Sync {
            command: Some(SyncCommands::Conflicts { limit, json }),
        } => run_sync_conflicts(limit, json, &settings).await,
        Commands::Groups { json } => run_groups(json, &settings).await,
        Commands::Reindex => run_reindex(&settings).await,
        Commands::Completions { .. } => Ok(()),
    }
}
