use clap::Parser;
use std::path::PathBuf;

/// MiniJava compiler back end: JSON syntax tree in, Jasmin assembly out.
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug)]
#[command(name = "mjc", version, about, long_about = None)]
pub struct Args {
    /// Directory receiving one `<Class>.j` file per class
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Stop after semantic analysis
    #[arg(long)]
    pub validate: bool,

    /// Print the scope table after symbol resolution
    #[arg(long)]
    pub dump_scopes: bool,

    /// Print the listings instead of writing files
    #[arg(long)]
    pub stdout: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Syntax tree serialised as JSON
    pub input: PathBuf,
}
