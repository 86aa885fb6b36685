use npm_pin_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible.
    logging::init();

    if let Err(err) = Cli::run_from_args() {
        eprintln!("npm-pin error: {:#}", err);
        std::process::exit(1);
    }
}
