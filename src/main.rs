mod arrival;
mod cli;
mod config;
mod geo;
mod host;
mod model;
mod position;
mod throttle;
mod track;
mod walk;

use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
