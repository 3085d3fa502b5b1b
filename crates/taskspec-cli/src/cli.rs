use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "taskspec")]
#[command(about = "Validate task specifications before they are submitted")]
#[command(
    long_about = "Checks task documents for undeclared variable references, misplaced array parameters, duplicate names, and conflicting or reserved mount paths."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[clap(rename_all = "lower")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Task documents to validate (JSON or YAML)
    #[clap(required = true)]
    pub files: Vec<PathBuf>,

    /// Report format
    #[clap(long, short = 'f', default_value_t = OutputFormat::Text, value_enum)]
    pub format: OutputFormat,

    /// Validation config file (JSON or YAML)
    #[clap(long, short = 'c', env = "TASKSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log each validation stage
    #[clap(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Validation config file (JSON or YAML)
    #[clap(long, short = 'c', env = "TASKSPEC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate one or more task documents
    Validate(ValidateArgs),
    /// Print the effective validation config
    Config(ConfigArgs),
}
