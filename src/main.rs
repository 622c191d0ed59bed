use clap::Parser;

use pgdf::cli::{self, Args};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Err(err) = cli::run(args) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
