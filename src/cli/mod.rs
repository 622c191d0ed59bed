//! The `pgdf` command line interface
use crate::parser::pgdf::{DecodeOptions, RecoveryPolicy};
use clap::Parser;

/// Inspect PAMGuard binary data files
#[derive(Parser, Debug)]
#[command(name = "pgdf", version)]
pub struct Args {
    /// Skip data records that cannot be decoded instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,
    /// The subcommand to run
    #[command(subcommand)]
    pub cmd: Action,
}

impl Args {
    /// The decoder options selected on the command line
    pub fn options(&self) -> DecodeOptions {
        DecodeOptions {
            policy: if self.lenient {
                RecoveryPolicy::Lenient
            } else {
                RecoveryPolicy::Strict
            },
        }
    }
}

/// The subcommands
#[derive(clap::Subcommand, Debug)]
pub enum Action {
    /// Print a summary of a file
    Info {
        /// The file to read
        path: std::path::PathBuf,
    },
    /// List the records of a file
    List {
        /// The file to read
        path: std::path::PathBuf,
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Count the records of a file by type
    Count {
        /// The file to read
        path: std::path::PathBuf,
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Print the tracks of a file, ordered by start time
    Tracks {
        /// The file to read
        path: std::path::PathBuf,
        /// Only print the tracks with these UIDs
        #[arg(long)]
        uid: Vec<i64>,
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Export every track point to an Avro file
    Avro {
        /// The file to read
        path: std::path::PathBuf,
        /// The Avro file to write
        output: std::path::PathBuf,
    },
}

/// Run the selected subcommand
pub fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = args.options();
    match args.cmd {
        Action::Info { path } => {
            info::info(path, options)?;
        }
        Action::List { path, output } => {
            list::list(path, output)?;
        }
        Action::Count { path, output } => {
            count::count(path, output)?;
        }
        Action::Tracks { path, uid, output } => {
            tracks::tracks(path, &uid, output, options)?;
        }
        Action::Avro { path, output } => {
            avro::avro(&path, &output, options)?;
        }
    };
    Ok(())
}

/// Write to the given file, or to standard output if there is none
pub(crate) fn output_writer(
    output: Option<std::path::PathBuf>,
) -> std::io::Result<Box<dyn std::io::Write>> {
    Ok(match output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    })
}

pub mod avro;
pub mod count;
pub mod info;
pub mod list;
pub mod tracks;
