use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::domain::money;
use crate::error::AppError;
use crate::models::{DayOverview, MonthOverview};
use crate::store::{DayActivity, Store};

pub fn month_overview(
  store: &dyn Store,
  account_id: i64,
  year: i32,
  month: u32,
) -> Result<MonthOverview, AppError> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)
    .ok_or_else(|| AppError::invalid_input("Mes inválido"))?;
  let last = last_day_of_month(first);
  let first_str = first.to_string();
  let last_str = last.to_string();

  let mut activity: HashMap<String, DayActivity> = HashMap::new();
  for day in store.day_activity_in_range(account_id, first, last)? {
    activity.insert(day.date.clone(), day);
  }

  let mut snapshots = HashMap::new();
  for snapshot in store.snapshots_in_range(account_id, first, last)? {
    snapshots.insert(snapshot.date.clone(), snapshot);
  }

  let finalized: HashSet<String> = store
    .list_finalized_days(account_id)?
    .into_iter()
    .map(|day| day.date)
    .filter(|date| date.as_str() >= first_str.as_str() && date.as_str() <= last_str.as_str())
    .collect();

  // Every calendar day appears, with zeros where nothing was recorded.
  let mut days = Vec::with_capacity(last.day() as usize);
  let mut current = first;
  while current <= last {
    let date = current.to_string();
    let day = activity
      .remove(&date)
      .unwrap_or_else(|| DayActivity::empty(&date));
    let balance =
      money::normalize(day.income_total - (day.expense_total + day.quiniela_egress_total));
    days.push(DayOverview {
      date: date.clone(),
      expense_total: day.expense_total,
      income_total: day.income_total,
      quiniela_egress_total: day.quiniela_egress_total,
      balance,
      finalized: finalized.contains(&date),
      closing_balance: snapshots.get(&date).map(|snapshot| snapshot.closing_balance),
    });
    current = match current.succ_opt() {
      Some(next) => next,
      None => break,
    };
  }

  Ok(MonthOverview { year, month, days })
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
  let next_month = if first.month() == 12 {
    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
  } else {
    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
  };
  next_month.and_then(|day| day.pred_opt()).unwrap_or(first)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{DailySnapshot, MovementKind, NewExpenseInput, NewQuinielaInput};
  use crate::store::memory::MemoryStore;

  fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
  }

  fn seed_movements(store: &MemoryStore) {
    store
      .insert_expense(
        1,
        &NewExpenseInput {
          date: "2024-02-10".to_string(),
          category: "Proveedores".to_string(),
          subcategory: None,
          description: "Compra".to_string(),
          amount: 10.0,
        },
        None,
      )
      .unwrap();
    store
      .insert_quiniela(
        1,
        &NewQuinielaInput {
          date: "2024-02-10".to_string(),
          game: "Quiniela".to_string(),
          kind: MovementKind::Income,
          amount: 50.0,
          description: None,
        },
        None,
      )
      .unwrap();
    store
      .insert_quiniela(
        1,
        &NewQuinielaInput {
          date: "2024-02-10".to_string(),
          game: "Quiniela".to_string(),
          kind: MovementKind::Egress,
          amount: 5.0,
          description: None,
        },
        None,
      )
      .unwrap();
  }

  #[test]
  fn overview_fills_every_day_of_the_month() {
    let store = MemoryStore::new();
    seed_movements(&store);
    store
      .save_finalized_day(
        1,
        date("2024-02-10"),
        &DailySnapshot {
          date: "2024-02-10".to_string(),
          opening_balance: 0.0,
          total_income: 50.0,
          total_egress: 15.0,
          closing_balance: 35.0,
          finalized: true,
        },
        None,
      )
      .unwrap();

    let overview = month_overview(&store, 1, 2024, 2).unwrap();
    assert_eq!(overview.year, 2024);
    assert_eq!(overview.month, 2);
    assert_eq!(overview.days.len(), 29);

    let tenth = &overview.days[9];
    assert_eq!(tenth.date, "2024-02-10");
    assert_eq!(tenth.expense_total, 10.0);
    assert_eq!(tenth.income_total, 50.0);
    assert_eq!(tenth.quiniela_egress_total, 5.0);
    assert_eq!(tenth.balance, 35.0);
    assert!(tenth.finalized);
    assert_eq!(tenth.closing_balance, Some(35.0));

    let eleventh = &overview.days[10];
    assert_eq!(eleventh.expense_total, 0.0);
    assert_eq!(eleventh.balance, 0.0);
    assert!(!eleventh.finalized);
    assert!(eleventh.closing_balance.is_none());
  }

  #[test]
  fn days_outside_the_month_never_leak_in() {
    let store = MemoryStore::new();
    seed_movements(&store);
    store
      .insert_expense(
        1,
        &NewExpenseInput {
          date: "2024-03-01".to_string(),
          category: "Proveedores".to_string(),
          subcategory: None,
          description: "Compra".to_string(),
          amount: 99.0,
        },
        None,
      )
      .unwrap();

    let overview = month_overview(&store, 1, 2024, 2).unwrap();
    let total: f64 = overview.days.iter().map(|day| day.expense_total).sum();
    assert_eq!(total, 10.0);
  }

  #[test]
  fn december_rolls_into_the_new_year() {
    let store = MemoryStore::new();
    let overview = month_overview(&store, 1, 2023, 12).unwrap();
    assert_eq!(overview.days.len(), 31);
    assert_eq!(overview.days[30].date, "2023-12-31");
  }

  #[test]
  fn invalid_months_are_rejected() {
    let store = MemoryStore::new();
    let err = month_overview(&store, 1, 2024, 13).unwrap_err();
    assert_eq!(err.to_string(), "Mes inválido");
    assert!(month_overview(&store, 1, 2024, 0).is_err());
  }
}
