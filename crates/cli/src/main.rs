use std::process::ExitCode;

fn main() -> ExitCode {
    voxdesk_cli::run()
}
