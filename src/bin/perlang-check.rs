use log::{error, info};
use perlang_sema::compiler;
use std::{env, process};

fn main() {
    env_logger::init();
    info!("perlang-check {}", env!("CARGO_PKG_VERSION"));

    let command = compiler::Command::new();

    match command.run(env::args()) {
        Ok(outcome) => {
            print!("{}", outcome.report);
            if !outcome.success {
                process::exit(1);
            }
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("perlang-check: {}", err);
            process::exit(2);
        }
    }
}
