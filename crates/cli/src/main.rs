use std::process::ExitCode;

fn main() -> ExitCode {
    pointsrus_cli::run()
}
