use std::process::ExitCode;

fn main() -> ExitCode {
    autoventa_cli::run()
}
