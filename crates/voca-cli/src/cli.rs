use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use voca_core::Nationality;

#[derive(Parser)]
#[command(name = "voca")]
#[command(about = "Keep vocabulary decks in sync from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the replicated deck group file
    #[arg(long, global = true, value_name = "PATH")]
    pub groups_path: Option<PathBuf>,

    /// Optional path to the JSON client configuration
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List vocabulary decks
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new vocabulary deck
    #[command(alias = "new")]
    Add {
        /// Deck name
        name: Vec<String>,
        /// Deck language
        #[arg(short, long, value_enum)]
        lang: Language,
    },
    /// Pin or unpin a deck
    Pin {
        /// Deck ID or unique ID prefix
        id: String,
    },
    /// Delete a deck and its words
    Delete {
        /// Deck ID or unique ID prefix
        id: String,
    },
    /// List the words of a deck
    Words {
        /// Deck ID or unique ID prefix
        deck: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a word to a deck
    AddWord {
        /// Deck ID or unique ID prefix
        deck: String,
        /// The word itself
        word: String,
        /// One sense of the word; repeat for several
        #[arg(short, long = "meaning", value_name = "TEXT", required = true)]
        meanings: Vec<String>,
        /// Free-form annotation such as gender or reading
        #[arg(short, long, default_value = "")]
        option: String,
    },
    /// Replace a word's text, senses and annotation
    EditWord {
        /// Word ID or unique ID prefix
        id: String,
        /// New word text
        word: String,
        /// One sense of the word; repeat for several
        #[arg(short, long = "meaning", value_name = "TEXT", required = true)]
        meanings: Vec<String>,
        /// Free-form annotation such as gender or reading
        #[arg(short, long, default_value = "")]
        option: String,
    },
    /// Delete a word
    DeleteWord {
        /// Word ID or unique ID prefix
        id: String,
    },
    /// Export a deck's words
    Export {
        /// Deck ID or unique ID prefix
        deck: String,
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Reconcile local decks with the remote store
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Show the replicated deck groups
    Groups {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rebuild deck groups from the local decks
    Reindex,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// List recently resolved sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Language {
    #[value(alias = "ko")]
    Korean,
    #[value(alias = "en")]
    English,
    #[value(alias = "ja")]
    Japanese,
    #[value(alias = "fr")]
    French,
}

impl From<Language> for Nationality {
    fn from(language: Language) -> Self {
        match language {
            Language::Korean => Self::Korean,
            Language::English => Self::English,
            Language::Japanese => Self::Japanese,
            Language::French => Self::French,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl From<ExportFormat> for voca_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Csv => Self::Csv,
            ExportFormat::Json => Self::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
