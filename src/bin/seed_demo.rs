use std::path::PathBuf;

use chrono::{Duration, Local};
use rand::seq::SliceRandom;
use rand::Rng;

use quiniela_caja::db;
use quiniela_caja::models::{MovementKind, NewExpenseInput, NewQuinielaInput, SettlementInput};
use quiniela_caja::service;
use quiniela_caja::store::sqlite::SqliteStore;
use quiniela_caja::store::Store;

const EXPENSES: [(&str, &str); 5] = [
  ("Proveedores", "Pago a proveedor"),
  ("Servicios", "Factura de luz"),
  ("Limpieza", "Artículos de limpieza"),
  ("Librería", "Papelería y rollos de impresión"),
  ("Varios", "Gastos varios"),
];

const GAMES: [&str; 5] = ["Quiniela", "Quiniela Express", "Loto", "Quini 6", "Telekino"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let days = std::env::args()
    .nth(1)
    .and_then(|value| value.parse::<i64>().ok())
    .unwrap_or(30);

  let app_dir = if let Ok(path) = std::env::var("QUINIELA_CAJA_SEED_DIR") {
    PathBuf::from(path)
  } else {
    db::resolve_app_dir()?
  };

  let db = db::init_db(&app_dir)?;
  let store = SqliteStore::new(db);
  let mut rng = rand::thread_rng();

  let today = Local::now().date_naive();
  let mut movements = 0usize;
  let mut finalized = 0usize;

  for offset in (1..=days).rev() {
    let day = today - Duration::days(offset);
    if store.is_day_finalized(1, day)? {
      continue;
    }
    let date = day.to_string();

    for _ in 0..rng.gen_range(1..=3) {
      let (category, description) = EXPENSES.choose(&mut rng).copied().unwrap_or(EXPENSES[0]);
      service::create_expense(
        &store,
        1,
        NewExpenseInput {
          date: date.clone(),
          category: category.to_string(),
          subcategory: None,
          description: description.to_string(),
          amount: round_cents(rng.gen_range(5.0..180.0)),
        },
        Some("demo"),
      )?;
      movements += 1;
    }

    for _ in 0..rng.gen_range(2..=4) {
      let game = GAMES.choose(&mut rng).copied().unwrap_or("Quiniela");
      service::create_quiniela(
        &store,
        1,
        NewQuinielaInput {
          date: date.clone(),
          game: game.to_string(),
          kind: MovementKind::Income,
          amount: round_cents(rng.gen_range(200.0..2500.0)),
          description: None,
        },
        Some("demo"),
      )?;
      movements += 1;
    }

    if rng.gen_bool(0.6) {
      let game = GAMES.choose(&mut rng).copied().unwrap_or("Quiniela");
      service::create_quiniela(
        &store,
        1,
        NewQuinielaInput {
          date: date.clone(),
          game: game.to_string(),
          kind: MovementKind::Egress,
          amount: round_cents(rng.gen_range(50.0..900.0)),
          description: Some("Premio pagado".to_string()),
        },
        Some("demo"),
      )?;
      movements += 1;
    }

    if rng.gen_bool(0.25) {
      let created = service::settle_game_day(
        &store,
        1,
        SettlementInput {
          date: date.clone(),
          game: "Quiniela".to_string(),
          collected: round_cents(rng.gen_range(800.0..3000.0)),
          retained: 0.0,
          expired: 0.0,
          commission: round_cents(rng.gen_range(80.0..300.0)),
          prizes: round_cents(rng.gen_range(100.0..1200.0)),
        },
        Some("demo"),
      )?;
      movements += created.len();
    }

    // the two most recent days stay open for the app to work on
    if offset > 2 {
      service::finalize_day(&store, 1, &date, Some("demo"))?;
      finalized += 1;
    }
  }

  db::with_conn(&store.db, |conn| db::checkpoint(conn))?;

  println!(
    "Se registraron {} movimientos en {} días ({} finalizados) en {}",
    movements,
    days,
    finalized,
    app_dir.display()
  );
  Ok(())
}

fn round_cents(amount: f64) -> f64 {
  (amount * 100.0).round() / 100.0
}
