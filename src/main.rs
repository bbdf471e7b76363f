use std::process::ExitCode;

fn main() -> ExitCode {
    quick_backup_lib::run()
}
