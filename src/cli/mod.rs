//! CLI module - Command-line interface for ChatList
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ChatList - send one prompt to many language models and keep the answers
#[derive(Parser)]
#[command(name = "chatlist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    Init,

    /// Manage saved prompts
    #[command(alias = "p")]
    Prompt {
        #[command(subcommand)]
        command: PromptCommands,
    },

    /// Manage model endpoints
    #[command(alias = "m")]
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    /// Send a prompt to all active models (or the ones named)
    #[command(alias = "s")]
    Send {
        /// Prompt text, or the id of a saved prompt with --prompt-id
        #[arg(required_unless_present = "prompt_id")]
        text: Vec<String>,
        /// Reuse a saved prompt
        #[arg(long, conflicts_with = "text")]
        prompt_id: Option<i32>,
        /// Comma-separated tags for a new prompt
        #[arg(long)]
        tags: Option<String>,
        /// Limit the dispatch to these model names
        #[arg(long = "model", short = 'm')]
        models: Vec<String>,
        /// Save every successful response
        #[arg(long)]
        save: bool,
        /// Overwrite responses already saved for this prompt
        #[arg(long)]
        replace: bool,
        /// Note attached to saved responses
        #[arg(long)]
        note: Option<String>,
        /// Per-model timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the outcomes in another format
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,
    },

    /// Browse saved responses
    #[command(name = "result", alias = "r")]
    Results {
        #[command(subcommand)]
        command: ResultCommands,
    },

    /// Read and change stored settings
    #[command(name = "setting")]
    Settings {
        #[command(subcommand)]
        command: SettingCommands,
    },
}

#[derive(Subcommand)]
pub enum PromptCommands {
    /// Save a prompt without sending it
    Add {
        #[arg(required = true)]
        text: Vec<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// List saved prompts
    #[command(alias = "ls")]
    List {
        /// Oldest first
        #[arg(long)]
        oldest: bool,
    },
    /// Search prompt text (and tags)
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Match tags only, comma-separated
        #[arg(long)]
        tags_only: bool,
    },
    /// Replace the tags of a prompt
    Tag {
        id: i32,
        /// Comma-separated tags; empty clears them
        tags: String,
    },
    /// Delete a prompt and its saved responses
    #[command(alias = "rm")]
    Delete { id: i32 },
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Register a model endpoint
    Add {
        /// Model identifier sent to the endpoint
        name: String,
        /// Chat-completions URL
        url: String,
        /// Name of the environment variable holding the API key
        credential: String,
        /// Provider label (OpenAI, DeepSeek, Groq, OpenRouter, ...)
        #[arg(long)]
        provider: Option<String>,
    },
    /// List models
    #[command(alias = "ls")]
    List {
        /// Include inactive models
        #[arg(long, short)]
        all: bool,
    },
    /// Search models by name or provider
    Search { query: String },
    /// Change fields of a model
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        credential: Option<String>,
        /// Provider label; empty clears it
        #[arg(long)]
        provider: Option<String>,
    },
    /// Include a model in dispatches
    Enable { id: i32 },
    /// Exclude a model from dispatches
    Disable { id: i32 },
    /// Delete a model and its saved responses
    #[command(alias = "rm")]
    Delete { id: i32 },
}

#[derive(Subcommand)]
pub enum ResultCommands {
    /// List saved responses
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        prompt: Option<i32>,
        #[arg(long)]
        model: Option<i32>,
    },
    /// Show one saved response in full
    Show { id: i32 },
    /// Search response text and notes
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Delete a saved response
    #[command(alias = "rm")]
    Delete { id: i32 },
}

#[derive(Subcommand)]
pub enum SettingCommands {
    Get { key: String },
    Set { key: String, value: String },
    /// Clear a setting
    Unset { key: String },
    #[command(alias = "ls")]
    List,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    #[value(alias = "markdown")]
    Md,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "chatlist", "send", "hello", "world", "-m", "gpt-4o", "--save", "--export", "md",
        ])
        .unwrap();

        let Commands::Send {
            text,
            models,
            save,
            export,
            prompt_id,
            ..
        } = cli.command
        else {
            panic!("expected send");
        };
        assert_eq!(text, ["hello", "world"]);
        assert_eq!(models, ["gpt-4o"]);
        assert!(save);
        assert_eq!(export, Some(ExportFormat::Md));
        assert_eq!(prompt_id, None);
    }

    #[test]
    fn test_send_requires_text_or_prompt_id() {
        assert!(Cli::try_parse_from(["chatlist", "send"]).is_err());
        assert!(Cli::try_parse_from(["chatlist", "send", "--prompt-id", "3"]).is_ok());
    }
}
