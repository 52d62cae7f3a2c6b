//! inkflow: replay a pointer session through the drawing engine.
//!
//! Usage: `inkflow [session.json] [config.json]`

use inkflow_app::{demo_session, load_config, load_session, replay, AppResult};
use inkflow_core::EngineConfig;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting inkflow");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> AppResult<()> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let session = args.next();
    let config = args.next();

    let config = match config {
        Some(path) => load_config(&path)?,
        None => EngineConfig::default(),
    };
    let events = match session {
        Some(path) => {
            log::info!("Replaying {}", path.display());
            load_session(&path)?
        }
        None => {
            log::info!("No session given, replaying the built-in demo");
            demo_session()
        }
    };

    let report = replay(config, &events)?;
    print!("{}", report.render());
    Ok(())
}
