use std::process::ExitCode;

use quiniela_caja::error::AppError;
use quiniela_caja::store::sqlite::SqliteStore;
use quiniela_caja::{db, server, AppState};

fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      log::error!("{}", err);
      ExitCode::FAILURE
    }
  }
}

fn run() -> Result<(), AppError> {
  let app_dir = db::resolve_app_dir()?;
  let db = db::init_db(&app_dir)?;
  log::info!("base de datos en {}", db.db_path.display());

  let port = std::env::var("QUINIELA_CAJA_PORT")
    .ok()
    .and_then(|value| value.parse::<u16>().ok())
    .unwrap_or(4000);

  let state = AppState {
    store: SqliteStore::new(db),
  };
  server::run(&state, port)
}
