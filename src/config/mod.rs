pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::args::{CliConfig, Command, ExportFormat};

#[cfg(feature = "cli")]
mod args {
    use crate::core::properties::parse_assignment;
    use crate::utils::error::{PropsError, Result};
    use crate::utils::validation::Validate;
    use clap::{Parser, Subcommand, ValueEnum};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pytta-props")]
    #[command(about = "Inspect and change default measurement properties")]
    pub struct CliConfig {
        /// TOML file with factory-default overrides
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        /// JSON snapshot loaded before the command and saved after set/reset
        #[arg(short, long, global = true)]
        pub state: Option<PathBuf>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Print every property as a table
        Show,
        /// Print one property (or freqLims, margins, numSamples) as JSON
        Get { name: String },
        /// Change one or more properties at once
        Set {
            #[arg(value_name = "NAME=VALUE", required = true)]
            assignments: Vec<String>,
        },
        /// Go back to factory defaults
        Reset,
        /// Write the current properties as JSON or TOML
        Export {
            #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
            format: ExportFormat,
            #[arg(short, long)]
            output: Option<PathBuf>,
        },
        /// List audio devices known to the backend
        Devices,
        /// Validate the configuration file and print the factory table
        Check,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum ExportFormat {
        Json,
        Toml,
    }

    impl CliConfig {
        pub fn persists_state(&self) -> bool {
            matches!(self.command, Command::Set { .. } | Command::Reset)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if let Some(config) = &self.config {
                if !config.is_file() {
                    return Err(PropsError::InvalidConfigValueError {
                        field: "config".to_string(),
                        value: config.display().to_string(),
                        reason: "Configuration file does not exist".to_string(),
                    });
                }
            }
            if let Command::Set { assignments } = &self.command {
                for assignment in assignments {
                    parse_assignment(assignment)?;
                }
            }
            Ok(())
        }
    }

}
