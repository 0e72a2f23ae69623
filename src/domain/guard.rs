use chrono::NaiveDate;

use crate::error::AppError;
use crate::store::Store;

// `noun` is the record kind as it appears in user-facing messages,
// "gastos" or "transacciones".
pub fn check_create(
  store: &dyn Store,
  account_id: i64,
  date: NaiveDate,
  today: NaiveDate,
  noun: &str,
) -> Result<(), AppError> {
  if date > today {
    return Err(AppError::future_date(format!(
      "No se pueden agregar {noun} a fechas futuras"
    )));
  }
  if store.is_day_finalized(account_id, date)? {
    return Err(AppError::day_finalized(format!(
      "No se puede agregar {noun} a un día finalizado"
    )));
  }
  Ok(())
}

pub fn check_update(
  store: &dyn Store,
  account_id: i64,
  current_date: NaiveDate,
  new_date: NaiveDate,
  today: NaiveDate,
  noun: &str,
) -> Result<(), AppError> {
  let locked = store.is_day_finalized(account_id, current_date)?
    || (new_date != current_date && store.is_day_finalized(account_id, new_date)?);
  if locked {
    return Err(AppError::day_finalized(format!(
      "No se puede editar {noun} de días finalizados"
    )));
  }
  if new_date > today {
    return Err(AppError::future_date(format!(
      "No se pueden mover {noun} a fechas futuras"
    )));
  }
  Ok(())
}

pub fn check_delete(
  store: &dyn Store,
  account_id: i64,
  date: NaiveDate,
  noun: &str,
) -> Result<(), AppError> {
  if store.is_day_finalized(account_id, date)? {
    return Err(AppError::day_finalized(format!(
      "No se puede eliminar {noun} de un día finalizado"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::DailySnapshot;
  use crate::store::memory::MemoryStore;

  fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
  }

  fn finalize(store: &MemoryStore, day: &str) {
    let snapshot = DailySnapshot {
      date: day.to_string(),
      opening_balance: 0.0,
      total_income: 0.0,
      total_egress: 0.0,
      closing_balance: 0.0,
      finalized: true,
    };
    store.save_finalized_day(1, date(day), &snapshot, None).unwrap();
  }

  #[test]
  fn create_rejects_future_dates_before_checking_finalization() {
    let store = MemoryStore::new();
    finalize(&store, "2024-03-11");
    let today = date("2024-03-10");

    let err = check_create(&store, 1, date("2024-03-11"), today, "gastos").unwrap_err();
    assert_eq!(err.code(), "FUTURE_DATE");
    assert_eq!(
      err.to_string(),
      "No se pueden agregar gastos a fechas futuras"
    );
  }

  #[test]
  fn create_rejects_finalized_days() {
    let store = MemoryStore::new();
    finalize(&store, "2024-03-08");
    let today = date("2024-03-10");

    assert!(check_create(&store, 1, date("2024-03-09"), today, "gastos").is_ok());
    let err = check_create(&store, 1, date("2024-03-08"), today, "transacciones").unwrap_err();
    assert_eq!(err.code(), "DAY_FINALIZED");
    assert_eq!(
      err.to_string(),
      "No se puede agregar transacciones a un día finalizado"
    );
  }

  #[test]
  fn update_rejects_when_either_day_is_finalized() {
    let store = MemoryStore::new();
    finalize(&store, "2024-03-05");
    let today = date("2024-03-10");

    let err = check_update(&store, 1, date("2024-03-05"), date("2024-03-06"), today, "gastos")
      .unwrap_err();
    assert_eq!(err.code(), "DAY_FINALIZED");

    let err = check_update(&store, 1, date("2024-03-06"), date("2024-03-05"), today, "gastos")
      .unwrap_err();
    assert_eq!(err.code(), "DAY_FINALIZED");

    assert!(check_update(&store, 1, date("2024-03-06"), date("2024-03-07"), today, "gastos").is_ok());
  }

  #[test]
  fn update_rejects_moves_into_the_future() {
    let store = MemoryStore::new();
    let today = date("2024-03-10");

    let err = check_update(&store, 1, date("2024-03-09"), date("2024-03-11"), today, "transacciones")
      .unwrap_err();
    assert_eq!(err.code(), "FUTURE_DATE");
    assert_eq!(
      err.to_string(),
      "No se pueden mover transacciones a fechas futuras"
    );
  }

  #[test]
  fn delete_only_checks_finalization() {
    let store = MemoryStore::new();
    finalize(&store, "2024-03-05");

    let err = check_delete(&store, 1, date("2024-03-05"), "gastos").unwrap_err();
    assert_eq!(err.code(), "DAY_FINALIZED");
    assert_eq!(
      err.to_string(),
      "No se puede eliminar gastos de un día finalizado"
    );
    assert!(check_delete(&store, 1, date("2024-03-06"), "gastos").is_ok());

    // other accounts are not affected by this account's closings
    assert!(check_delete(&store, 2, date("2024-03-05"), "gastos").is_ok());
  }
}
