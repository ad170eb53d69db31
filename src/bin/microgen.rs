use std::process::ExitCode;

use microgen::cli::{print_error_trail, run_cli};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error_trail(&err);
            ExitCode::FAILURE
        }
    }
}
