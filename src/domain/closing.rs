use chrono::NaiveDate;

use crate::domain::money;
use crate::error::AppError;
use crate::models::{DailySnapshot, MovementKind};
use crate::store::Store;

pub struct DayTotals {
  pub expenses: f64,
  pub income: f64,
  pub quiniela_egress: f64,
}

impl DayTotals {
  pub fn total_egress(&self) -> f64 {
    self.expenses + self.quiniela_egress
  }
}

pub fn day_totals(store: &dyn Store, account_id: i64, date: NaiveDate) -> Result<DayTotals, AppError> {
  Ok(DayTotals {
    expenses: store.sum_expenses(account_id, date, date)?,
    income: store.sum_quiniela(account_id, MovementKind::Income, date, date)?,
    quiniela_egress: store.sum_quiniela(account_id, MovementKind::Egress, date, date)?,
  })
}

pub fn ensure_can_finalize(
  store: &dyn Store,
  account_id: i64,
  date: NaiveDate,
  today: NaiveDate,
) -> Result<(), AppError> {
  if store.is_day_finalized(account_id, date)? {
    return Err(AppError::already_finalized("El día ya está finalizado"));
  }
  if date > today {
    return Err(AppError::future_date("No se pueden finalizar días futuros"));
  }
  Ok(())
}

pub fn build_snapshot(date: NaiveDate, opening_balance: f64, totals: &DayTotals) -> DailySnapshot {
  let total_egress = totals.total_egress();
  let closing = opening_balance + totals.income - total_egress;
  DailySnapshot {
    date: date.to_string(),
    opening_balance: money::normalize(opening_balance),
    total_income: money::normalize(totals.income),
    total_egress: money::normalize(total_egress),
    closing_balance: money::normalize(closing),
    finalized: true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{NewExpenseInput, NewQuinielaInput};
  use crate::store::memory::MemoryStore;

  fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
  }

  fn totals(expenses: f64, income: f64, quiniela_egress: f64) -> DayTotals {
    DayTotals {
      expenses,
      income,
      quiniela_egress,
    }
  }

  #[test]
  fn snapshot_combines_opening_income_and_egress() {
    let snapshot = build_snapshot(date("2024-03-05"), 100.0, &totals(30.0, 50.0, 20.0));
    assert_eq!(snapshot.date, "2024-03-05");
    assert_eq!(snapshot.opening_balance, 100.0);
    assert_eq!(snapshot.total_income, 50.0);
    assert_eq!(snapshot.total_egress, 50.0);
    assert_eq!(snapshot.closing_balance, 100.0);
    assert!(snapshot.finalized);
  }

  #[test]
  fn snapshot_values_are_rounded_and_never_nan() {
    let snapshot = build_snapshot(date("2024-03-05"), f64::NAN, &totals(0.0, 0.1 + 0.2, 0.0));
    assert_eq!(snapshot.opening_balance, 0.0);
    assert_eq!(snapshot.total_income, 0.3);
    assert_eq!(snapshot.closing_balance, 0.0);

    let negative = build_snapshot(date("2024-03-06"), 0.0, &totals(25.0, 0.0, 0.0));
    assert_eq!(negative.total_egress, 25.0);
    assert_eq!(negative.closing_balance, -25.0);
  }

  #[test]
  fn day_totals_only_count_active_rows_of_the_day() {
    let store = MemoryStore::new();
    store
      .insert_expense(
        1,
        &NewExpenseInput {
          date: "2024-03-05".to_string(),
          category: "Servicios".to_string(),
          subcategory: Some("Luz".to_string()),
          description: "Factura".to_string(),
          amount: 30.0,
        },
        None,
      )
      .unwrap();
    let removed = store
      .insert_expense(
        1,
        &NewExpenseInput {
          date: "2024-03-05".to_string(),
          category: "Servicios".to_string(),
          subcategory: None,
          description: "Duplicado".to_string(),
          amount: 99.0,
        },
        None,
      )
      .unwrap();
    store.deactivate_expense(1, removed.id, None).unwrap();
    store
      .insert_quiniela(
        1,
        &NewQuinielaInput {
          date: "2024-03-05".to_string(),
          game: "Quiniela".to_string(),
          kind: MovementKind::Income,
          amount: 120.0,
          description: None,
        },
        None,
      )
      .unwrap();
    store
      .insert_quiniela(
        1,
        &NewQuinielaInput {
          date: "2024-03-06".to_string(),
          game: "Quiniela".to_string(),
          kind: MovementKind::Egress,
          amount: 500.0,
          description: None,
        },
        None,
      )
      .unwrap();

    let totals = day_totals(&store, 1, date("2024-03-05")).unwrap();
    assert_eq!(totals.expenses, 30.0);
    assert_eq!(totals.income, 120.0);
    assert_eq!(totals.quiniela_egress, 0.0);
    assert_eq!(totals.total_egress(), 30.0);
  }

  #[test]
  fn finalize_rejects_finalized_days_before_future_days() {
    let store = MemoryStore::new();
    let today = date("2024-03-10");

    assert!(ensure_can_finalize(&store, 1, date("2024-03-10"), today).is_ok());

    let err = ensure_can_finalize(&store, 1, date("2024-03-11"), today).unwrap_err();
    assert_eq!(err.code(), "FUTURE_DATE");

    let snapshot = build_snapshot(date("2024-03-11"), 0.0, &totals(0.0, 0.0, 0.0));
    store.save_finalized_day(1, date("2024-03-11"), &snapshot, None).unwrap();
    let err = ensure_can_finalize(&store, 1, date("2024-03-11"), today).unwrap_err();
    assert_eq!(err.code(), "ALREADY_FINALIZED");
  }
}
