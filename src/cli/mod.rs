//! CLI command definitions for tasktree
//!
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::format::OutputFormat;
use clap::{Parser, Subcommand};

/// Nested task tree server and CLI tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the filtered, scheduled tree
    Show {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },

    /// List every tag in use
    Tags,

    /// Add a task
    Add {
        /// Parent task id; omitted creates a root task
        #[arg(short, long)]
        parent: Option<i64>,

        /// Put a new root task first instead of last
        #[arg(long, conflicts_with = "parent")]
        front: bool,

        /// Task name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["tasktree"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn parses_add_with_parent() {
        let cli = Cli::parse_from(["tasktree", "-d", "x.db", "add", "--parent", "4", "buy milk"]);
        assert_eq!(cli.database.as_deref(), Some("x.db"));
        match cli.command {
            Some(Command::Add { parent, front, name }) => {
                assert_eq!(parent, Some(4));
                assert!(!front);
                assert_eq!(name, "buy milk");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn front_conflicts_with_parent() {
        assert!(Cli::try_parse_from(["tasktree", "add", "--parent", "1", "--front", "x"]).is_err());
    }

    #[test]
    fn show_accepts_json() {
        let cli = Cli::parse_from(["tasktree", "show", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Show {
                format: OutputFormat::Json
            })
        ));
    }
}
