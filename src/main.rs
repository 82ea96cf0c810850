use clap::Parser;
use log::LevelFilter;
use toolstrap::error::exit_code_for;
use toolstrap::models::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    if let Err(err) = toolstrap::cli::run(args) {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}
