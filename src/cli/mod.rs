//! CLI module for keygate
//!
//! Provides subcommands:
//! - `serve`: run the HTTP server
//! - `issue-key`: issue an API key against the configured key store

pub mod issue_key;
pub mod serve;

use clap::{Parser, Subcommand};

/// keygate - API keys and tiered rate limiting
#[derive(Parser)]
#[command(name = "keygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Issue an API key and print it
    IssueKey(issue_key::IssueKeyArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["keygate"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_issue_key_args() {
        let cli =
            Cli::try_parse_from(["keygate", "issue-key", "--owner", "u1", "--ttl-days", "7"])
                .unwrap();

        match cli.command {
            Some(Command::IssueKey(args)) => {
                assert_eq!(args.owner, "u1");
                assert_eq!(args.ttl_days, Some(7));
            }
            _ => panic!("expected issue-key"),
        }
    }

    #[test]
    fn test_issue_key_requires_owner() {
        assert!(Cli::try_parse_from(["keygate", "issue-key"]).is_err());
    }
}
