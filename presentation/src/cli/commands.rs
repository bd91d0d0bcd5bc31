//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for lattia
#[derive(Parser, Debug)]
#[command(name = "lattia")]
#[command(author, version, about = "Conversational health-intake assistant")]
#[command(long_about = r#"
Lattia interviews a user about their health, one question per turn, and
accumulates the answers as structured intake fields.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./lattia.toml       Project-level config
3. ~/.config/lattia/config.toml   Global config
4. LATTIA_* environment variables (e.g. LATTIA_SERVER__BIND)

Example:
  lattia serve --bind 0.0.0.0:8000
  lattia chat --name Ana
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Listen address, overriding `[server] bind`
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Run an interview in the terminal with an in-memory session
    Chat {
        /// Name used in the greeting
        #[arg(short, long, default_value = "")]
        name: String,
    },
}

impl Cli {
    /// The requested command, `serve` when none is given.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Serve { bind: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["lattia"]).unwrap();
        assert_eq!(cli.command(), Command::Serve { bind: None });
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_chat_with_global_flags() {
        let cli =
            Cli::try_parse_from(["lattia", "chat", "--name", "Ana", "-vv", "--no-config"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Chat {
                name: "Ana".to_string()
            }
        );
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_config);
    }

    #[test]
    fn test_serve_bind_override() {
        let cli = Cli::try_parse_from(["lattia", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Serve {
                bind: Some("0.0.0.0:9000".to_string())
            }
        );
    }
}
