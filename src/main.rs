use std::process::ExitCode;

use bevy::app::AppExit;

fn main() -> ExitCode {
    match galleons::game::run() {
        Ok(AppExit::Success) => ExitCode::SUCCESS,
        Ok(AppExit::Error(code)) => ExitCode::from(code.get()),
        Err(err) => {
            eprintln!("galleons: {err}");
            ExitCode::FAILURE
        }
    }
}
