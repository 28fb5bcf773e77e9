//! CLI argument parsing, generalized from `why`'s own
//! `Cli { command, verbosity }` / `BuildArgs` shape to Amy's four pipeline
//! modes, each selected by a subcommand, and to multiple input files (Amy
//! programs concatenate multiple module files, where `why` compiles
//! exactly one).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specify the log level of the compiler.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    #[default]
    #[value(alias("0"))]
    Error,
    #[value(alias("1"))]
    Warn,
    #[value(alias("2"))]
    Info,
    #[value(alias("3"))]
    Debug,
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dump the lexed token stream for each file.
    Tokens(FilesArgs),

    /// Dump the parsed nominal AST.
    Parse(FilesArgs),

    /// Run the tree-walking interpreter over the top-level expressions.
    Interpret(FilesArgs),

    /// Compile to WebAssembly text. The default pipeline mode.
    Build(BuildArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FilesArgs {
    /// The Amy source files making up the program.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// The Amy source files making up the program.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Whether to also dump the parsed nominal AST.
    #[arg(long)]
    pub dump_parsed: bool,

    /// Whether to also dump the typed symbolic AST.
    #[arg(long)]
    pub dump_typed: bool,

    /// Emit the dumps above as JSON instead of Rust debug formatting.
    #[arg(long)]
    pub json: bool,

    /// Output path for the generated `.wat` file. Defaults to
    /// `<programName>.wat` next to the first input file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
