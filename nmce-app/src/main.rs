use std::process::ExitCode;

fn main() -> ExitCode {
    nm_connection_editor::run()
}
