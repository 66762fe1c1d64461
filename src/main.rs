use clap::{self, Parser};
use log::{error, info, Level};
use simple_logger::init_with_level;

use chippipe::{
    cli::{Args, SubArgs},
    config::Config,
    core::run,
};

fn main() {
    let start = std::time::Instant::now();

    let args: Args = Args::parse();

    match args.command {
        SubArgs::Run { args } => {
            init_with_level(Level::Info).expect("ERROR: Could not initialize logger");

            let mut config = Config::read(args.config).unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });

            config.load().unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });

            run(config).unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });
        }
        SubArgs::Step { args } => {
            let level = if args.quiet {
                Level::Warn
            } else if args.verbose {
                Level::Debug
            } else {
                Level::Info
            };
            init_with_level(level).expect("ERROR: Could not initialize logger");

            let mut config = Config::read(args.config.clone()).unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });

            config.aware(&args).unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });

            config.load().unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });

            run(config).unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });
        }
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
