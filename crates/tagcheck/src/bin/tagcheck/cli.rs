//! tagcheck cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;
use tagcheck::standard::{CloudProvider, DEFAULT_STANDARD_FILE_NAME};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; tagcheck ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve references (`var.x`, `local.y`, `"${var.x}-z"`) against a terraform tree
    Resolve(ResolveCommand),

    /// Validate resource tags against a tag standard
    Validate(ValidateCommand),

    /// Write an example tag standard
    Init(InitCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// References to resolve
    #[arg(required = true)]
    pub references: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ValidateCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Tag standard document
    #[clap(short = 's', long = "standard", default_value = DEFAULT_STANDARD_FILE_NAME)]
    pub standard: PathBuf,
}

#[derive(Parser, Debug)]
pub struct InitCommand {
    #[clap(short = 'p', long = "provider", default_value_t = CloudProvider::Aws)]
    pub provider: CloudProvider,

    /// Write to a file instead of stdout
    #[clap(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Root directory of the terraform tree
    #[clap(short = 'd', long = "dir", default_value = ".")]
    pub dir: PathBuf,

    /// Set a variable, NAME=VALUE
    ///
    /// Values are read as hcl literals (`3`, `true`, `["a", "b"]`) and
    /// fall back to plain strings. Takes precedence over all other sources.
    #[clap(long = "var")]
    pub vars: Vec<String>,

    /// Load an additional values file (.tfvars or .tfvars.json)
    #[clap(long = "var-file")]
    pub var_files: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Variable and local declarations
    Declarations,
    /// Variable values with their precedence and origin
    Store,
    /// Resolved locals
    Locals,
    /// Resources and their raw tags
    Resources,
}
