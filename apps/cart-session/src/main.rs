//! # cart-session Entry Point
//!
//! Runs one command inside one cart session and exits. The setup lives in
//! lib.rs for testability.

use std::process::ExitCode;

use cart_session_lib::{execute, init_tracing, USAGE};

fn main() -> ExitCode {
    init_tracing();

    match execute(std::env::args().skip(1)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            if err.is_usage() {
                eprintln!();
                eprintln!("{USAGE}");
            }
            ExitCode::FAILURE
        }
    }
}
