use std::process::ExitCode;

fn main() -> ExitCode {
    match dragonfly::runner::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("dragonfly: {error}");
            ExitCode::FAILURE
        }
    }
}
