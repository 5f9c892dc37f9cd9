//! Command-line interface for forumbridge.

use clap::{Parser, Subcommand};

/// Community forum backend bridged to an external identity provider
#[derive(Parser)]
#[command(name = "forumbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "s")]
    Serve,

    /// Write a default config.toml if none exists
    Init,

    /// Load or generate key material and print the public key
    Keys,

    /// Grant admin rights to a local user
    Promote {
        /// Local user ID
        user_id: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["forumbridge"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["forumbridge", "promote", "7"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Promote { user_id: 7 })));

        assert!(Cli::try_parse_from(["forumbridge", "promote", "abc"]).is_err());
    }
}
