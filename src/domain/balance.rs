use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::money;
use crate::error::AppError;
use crate::models::MovementKind;
use crate::store::Store;

pub fn resolve_opening_balance(
  store: &dyn Store,
  account_id: i64,
  date: NaiveDate,
) -> Result<f64, AppError> {
  let previous = date - Duration::days(1);
  if let Some(closing) = store.snapshot_closing_balance(account_id, previous)? {
    return Ok(money::normalize(closing));
  }
  accumulated_balance(store, account_id, date)
}

// Without a snapshot for the previous day the month is replayed from its
// first day up to the day before `date`.
fn accumulated_balance(store: &dyn Store, account_id: i64, date: NaiveDate) -> Result<f64, AppError> {
  let month_start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
  let previous = date - Duration::days(1);
  if previous < month_start {
    return Ok(0.0);
  }

  let expenses = store.sum_expenses(account_id, month_start, previous)?;
  let income = store.sum_quiniela(account_id, MovementKind::Income, month_start, previous)?;
  let egress = store.sum_quiniela(account_id, MovementKind::Egress, month_start, previous)?;
  Ok(money::normalize(income - (expenses + egress)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{DailySnapshot, NewExpenseInput, NewQuinielaInput};
  use crate::store::memory::MemoryStore;

  fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
  }

  fn expense(date: &str, amount: f64) -> NewExpenseInput {
    NewExpenseInput {
      date: date.to_string(),
      category: "Proveedores".to_string(),
      subcategory: None,
      description: "Compra".to_string(),
      amount,
    }
  }

  fn movement(date: &str, kind: MovementKind, amount: f64) -> NewQuinielaInput {
    NewQuinielaInput {
      date: date.to_string(),
      game: "Quiniela".to_string(),
      kind,
      amount,
      description: None,
    }
  }

  fn snapshot(date: &str, closing: f64) -> DailySnapshot {
    DailySnapshot {
      date: date.to_string(),
      opening_balance: 0.0,
      total_income: 0.0,
      total_egress: 0.0,
      closing_balance: closing,
      finalized: true,
    }
  }

  #[test]
  fn first_day_of_month_opens_at_zero() {
    let store = MemoryStore::new();
    let opening = resolve_opening_balance(&store, 1, date("2024-03-01")).unwrap();
    assert_eq!(opening, 0.0);
  }

  #[test]
  fn previous_snapshot_takes_precedence_over_history() {
    let store = MemoryStore::new();
    store.insert_quiniela(1, &movement("2024-03-03", MovementKind::Income, 500.0), None).unwrap();
    store
      .save_finalized_day(1, date("2024-03-03"), &snapshot("2024-03-03", 80.0), None)
      .unwrap();

    let opening = resolve_opening_balance(&store, 1, date("2024-03-04")).unwrap();
    assert_eq!(opening, 80.0);
  }

  #[test]
  fn missing_snapshot_falls_back_to_month_accumulation() {
    let store = MemoryStore::new();
    store.insert_quiniela(1, &movement("2024-03-01", MovementKind::Income, 100.0), None).unwrap();
    store.insert_expense(1, &expense("2024-03-01", 40.0), None).unwrap();
    store.insert_quiniela(1, &movement("2024-03-02", MovementKind::Income, 50.0), None).unwrap();
    store.insert_expense(1, &expense("2024-03-02", 30.0), None).unwrap();
    store.insert_quiniela(1, &movement("2024-03-02", MovementKind::Egress, 50.0), None).unwrap();
    store.insert_quiniela(1, &movement("2024-03-03", MovementKind::Income, 30.0), None).unwrap();
    store.insert_quiniela(1, &movement("2024-03-03", MovementKind::Egress, 30.0), None).unwrap();

    // 180 de ingresos - (70 de gastos + 80 de egresos)
    let opening = resolve_opening_balance(&store, 1, date("2024-03-04")).unwrap();
    assert_eq!(opening, 30.0);
  }

  #[test]
  fn accumulation_ignores_other_months_and_accounts() {
    let store = MemoryStore::new();
    store.insert_quiniela(1, &movement("2024-02-28", MovementKind::Income, 999.0), None).unwrap();
    store.insert_expense(1, &expense("2024-02-27", 500.0), None).unwrap();
    store.insert_quiniela(2, &movement("2024-03-02", MovementKind::Income, 700.0), None).unwrap();
    store.insert_quiniela(1, &movement("2024-03-02", MovementKind::Income, 20.0), None).unwrap();

    let opening = resolve_opening_balance(&store, 1, date("2024-03-05")).unwrap();
    assert_eq!(opening, 20.0);
  }

  #[test]
  fn corrupt_snapshot_value_resolves_to_zero() {
    let store = MemoryStore::new();
    store
      .save_finalized_day(1, date("2024-03-09"), &snapshot("2024-03-09", f64::NAN), None)
      .unwrap();

    let opening = resolve_opening_balance(&store, 1, date("2024-03-10")).unwrap();
    assert_eq!(opening, 0.0);
  }

  #[test]
  fn snapshot_closing_is_rounded_on_read() {
    let store = MemoryStore::new();
    store
      .save_finalized_day(1, date("2024-03-09"), &snapshot("2024-03-09", 10.004999), None)
      .unwrap();

    let opening = resolve_opening_balance(&store, 1, date("2024-03-10")).unwrap();
    assert_eq!(opening, 10.0);
  }
}
