use spotter::cli;
use std::process::ExitCode;

pub fn main() -> ExitCode {
    cli::process_command()
}
