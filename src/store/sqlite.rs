use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::audit::{append_audit, list_audit_log};
use crate::db::{self, Db};
use crate::error::AppError;
use crate::models::{
  Account, AuditLogEntry, DailySnapshot, DrawTime, Expense, ExpenseUpdateInput, FinalizedDay,
  MovementKind, NewExpenseInput, NewQuinielaInput, Paginated, QuinielaTransaction,
  QuinielaUpdateInput,
};
use crate::store::{DayActivity, Store};

pub struct SqliteStore {
  pub db: Db,
}

impl SqliteStore {
  pub fn new(db: Db) -> Self {
    SqliteStore { db }
  }
}

fn map_expense_row(row: &rusqlite::Row) -> Result<Expense, rusqlite::Error> {
  Ok(Expense {
    id: row.get(0)?,
    amount: row.get(1)?,
    category: row.get(2)?,
    subcategory: row.get(3)?,
    description: row.get(4)?,
    date: row.get(5)?,
    created_at: row.get(6)?,
  })
}

fn map_quiniela_row(row: &rusqlite::Row) -> Result<QuinielaTransaction, rusqlite::Error> {
  let kind: String = row.get(1)?;
  let kind = MovementKind::parse(&kind).ok_or_else(|| {
    rusqlite::Error::FromSqlConversionFailure(
      1,
      rusqlite::types::Type::Text,
      format!("tipo de movimiento desconocido: {kind}").into(),
    )
  })?;
  Ok(QuinielaTransaction {
    id: row.get(0)?,
    kind,
    category: row.get(2)?,
    amount: row.get(3)?,
    description: row.get(4)?,
    date: row.get(5)?,
    source: row.get(6)?,
    created_at: row.get(7)?,
  })
}

fn fetch_expense(conn: &Connection, account_id: i64, id: i64) -> Result<Option<Expense>, AppError> {
  let expense = conn
    .query_row(
      "SELECT id, amount, category, subcategory, description, date, created_at
       FROM expenses
       WHERE id = ?1 AND account_id = ?2 AND is_active = 1",
      params![id, account_id],
      map_expense_row,
    )
    .optional()?;
  Ok(expense)
}

fn fetch_quiniela(
  conn: &Connection,
  account_id: i64,
  id: i64,
) -> Result<Option<QuinielaTransaction>, AppError> {
  let transaction = conn
    .query_row(
      "SELECT id, kind, category, amount, description, date, source, created_at
       FROM quiniela_transactions
       WHERE id = ?1 AND account_id = ?2 AND is_active = 1",
      params![id, account_id],
      map_quiniela_row,
    )
    .optional()?;
  Ok(transaction)
}

impl Store for SqliteStore {
  fn accounts(&self) -> Result<Vec<Account>, AppError> {
    db::with_conn(&self.db, |conn| {
      let mut stmt = conn.prepare("SELECT id, name, created_at FROM accounts ORDER BY id")?;
      let rows = stmt.query_map([], |row| {
        Ok(Account {
          id: row.get(0)?,
          name: row.get(1)?,
          created_at: row.get(2)?,
        })
      })?;

      let mut accounts = Vec::new();
      for row in rows {
        accounts.push(row?);
      }
      Ok(accounts)
    })
  }

  fn expenses_by_date(&self, account_id: i64, date: NaiveDate) -> Result<Vec<Expense>, AppError> {
    db::with_conn(&self.db, |conn| {
      let mut stmt = conn.prepare(
        "SELECT id, amount, category, subcategory, description, date, created_at
         FROM expenses
         WHERE account_id = ?1 AND date = ?2 AND is_active = 1
         ORDER BY created_at DESC, id DESC",
      )?;
      let rows = stmt.query_map(params![account_id, date.to_string()], map_expense_row)?;

      let mut expenses = Vec::new();
      for row in rows {
        expenses.push(row?);
      }
      Ok(expenses)
    })
  }

  fn expense_by_id(&self, account_id: i64, id: i64) -> Result<Option<Expense>, AppError> {
    db::with_conn(&self.db, |conn| fetch_expense(conn, account_id, id))
  }

  fn insert_expense(
    &self,
    account_id: i64,
    input: &NewExpenseInput,
    actor: Option<&str>,
  ) -> Result<Expense, AppError> {
    let payload_json = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      tx.execute(
        "INSERT INTO expenses (account_id, amount, category, subcategory, description, date, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
        params![
          account_id,
          input.amount,
          input.category,
          input.subcategory,
          input.description,
          input.date,
          Utc::now().to_rfc3339()
        ],
      )?;
      let id = tx.last_insert_rowid();
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "CREATE_EXPENSE",
        "EXPENSE",
        Some(id.to_string()),
        None,
        payload_json,
        None,
      )?;
      tx.commit()?;

      fetch_expense(conn, account_id, id)?
        .ok_or_else(|| AppError::not_found("Gasto no encontrado"))
    })
  }

  fn update_expense(
    &self,
    account_id: i64,
    id: i64,
    input: &ExpenseUpdateInput,
    actor: Option<&str>,
  ) -> Result<Expense, AppError> {
    let payload_json = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      let affected = tx.execute(
        "UPDATE expenses
         SET amount = ?1, category = ?2, subcategory = ?3, description = ?4, date = ?5
         WHERE id = ?6 AND account_id = ?7 AND is_active = 1",
        params![
          input.amount,
          input.category,
          input.subcategory,
          input.description,
          input.date,
          id,
          account_id
        ],
      )?;
      if affected == 0 {
        return Err(AppError::not_found("Gasto no encontrado"));
      }
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "UPDATE_EXPENSE",
        "EXPENSE",
        Some(id.to_string()),
        None,
        payload_json,
        None,
      )?;
      tx.commit()?;

      fetch_expense(conn, account_id, id)?
        .ok_or_else(|| AppError::not_found("Gasto no encontrado"))
    })
  }

  fn deactivate_expense(&self, account_id: i64, id: i64, actor: Option<&str>) -> Result<(), AppError> {
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      let affected = tx.execute(
        "UPDATE expenses SET is_active = 0 WHERE id = ?1 AND account_id = ?2 AND is_active = 1",
        params![id, account_id],
      )?;
      if affected == 0 {
        return Err(AppError::not_found("Gasto no encontrado"));
      }
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "DELETE_EXPENSE",
        "EXPENSE",
        Some(id.to_string()),
        None,
        "{}".to_string(),
        Some("Gasto eliminado".to_string()),
      )?;
      tx.commit()?;
      Ok(())
    })
  }

  fn sum_expenses(&self, account_id: i64, from: NaiveDate, to: NaiveDate) -> Result<f64, AppError> {
    db::with_conn(&self.db, |conn| {
      let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0)
         FROM expenses
         WHERE account_id = ?1 AND date BETWEEN ?2 AND ?3 AND is_active = 1",
        params![account_id, from.to_string(), to.to_string()],
        |row| row.get(0),
      )?;
      Ok(total)
    })
  }

  fn quiniela_by_date(
    &self,
    account_id: i64,
    date: NaiveDate,
  ) -> Result<Vec<QuinielaTransaction>, AppError> {
    db::with_conn(&self.db, |conn| {
      let mut stmt = conn.prepare(
        "SELECT id, kind, category, amount, description, date, source, created_at
         FROM quiniela_transactions
         WHERE account_id = ?1 AND date = ?2 AND is_active = 1
         ORDER BY created_at DESC, id DESC",
      )?;
      let rows = stmt.query_map(params![account_id, date.to_string()], map_quiniela_row)?;

      let mut transactions = Vec::new();
      for row in rows {
        transactions.push(row?);
      }
      Ok(transactions)
    })
  }

  fn quiniela_by_id(&self, account_id: i64, id: i64) -> Result<Option<QuinielaTransaction>, AppError> {
    db::with_conn(&self.db, |conn| fetch_quiniela(conn, account_id, id))
  }

  fn insert_quiniela(
    &self,
    account_id: i64,
    input: &NewQuinielaInput,
    actor: Option<&str>,
  ) -> Result<QuinielaTransaction, AppError> {
    let payload_json = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      tx.execute(
        "INSERT INTO quiniela_transactions (account_id, kind, category, amount, description, date, source, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
        params![
          account_id,
          input.kind.as_str(),
          input.game,
          input.amount,
          input.description.clone().unwrap_or_default(),
          input.date,
          input.game,
          Utc::now().to_rfc3339()
        ],
      )?;
      let id = tx.last_insert_rowid();
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "CREATE_QUINIELA",
        "QUINIELA_TX",
        Some(id.to_string()),
        None,
        payload_json,
        None,
      )?;
      tx.commit()?;

      fetch_quiniela(conn, account_id, id)?
        .ok_or_else(|| AppError::not_found("Transacción no encontrada"))
    })
  }

  fn update_quiniela(
    &self,
    account_id: i64,
    id: i64,
    input: &QuinielaUpdateInput,
    actor: Option<&str>,
  ) -> Result<QuinielaTransaction, AppError> {
    let payload_json = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      let affected = tx.execute(
        "UPDATE quiniela_transactions
         SET kind = ?1, category = ?2, amount = ?3, description = ?4, date = ?5, source = ?6
         WHERE id = ?7 AND account_id = ?8 AND is_active = 1",
        params![
          input.kind.as_str(),
          input.game,
          input.amount,
          input.description.clone().unwrap_or_default(),
          input.date,
          input.game,
          id,
          account_id
        ],
      )?;
      if affected == 0 {
        return Err(AppError::not_found("Transacción no encontrada"));
      }
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "UPDATE_QUINIELA",
        "QUINIELA_TX",
        Some(id.to_string()),
        None,
        payload_json,
        None,
      )?;
      tx.commit()?;

      fetch_quiniela(conn, account_id, id)?
        .ok_or_else(|| AppError::not_found("Transacción no encontrada"))
    })
  }

  fn deactivate_quiniela(&self, account_id: i64, id: i64, actor: Option<&str>) -> Result<(), AppError> {
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      let affected = tx.execute(
        "UPDATE quiniela_transactions SET is_active = 0 WHERE id = ?1 AND account_id = ?2 AND is_active = 1",
        params![id, account_id],
      )?;
      if affected == 0 {
        return Err(AppError::not_found("Transacción no encontrada"));
      }
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "DELETE_QUINIELA",
        "QUINIELA_TX",
        Some(id.to_string()),
        None,
        "{}".to_string(),
        Some("Transacción eliminada".to_string()),
      )?;
      tx.commit()?;
      Ok(())
    })
  }

  fn sum_quiniela(
    &self,
    account_id: i64,
    kind: MovementKind,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<f64, AppError> {
    db::with_conn(&self.db, |conn| {
      let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0)
         FROM quiniela_transactions
         WHERE account_id = ?1 AND kind = ?2 AND date BETWEEN ?3 AND ?4 AND is_active = 1",
        params![account_id, kind.as_str(), from.to_string(), to.to_string()],
        |row| row.get(0),
      )?;
      Ok(total)
    })
  }

  fn snapshot_closing_balance(
    &self,
    account_id: i64,
    date: NaiveDate,
  ) -> Result<Option<f64>, AppError> {
    db::with_conn(&self.db, |conn| {
      let closing = conn
        .query_row(
          "SELECT closing_balance FROM daily_snapshots WHERE account_id = ?1 AND date = ?2",
          params![account_id, date.to_string()],
          |row| row.get::<_, f64>(0),
        )
        .optional()?;
      Ok(closing)
    })
  }

  fn snapshots_in_range(
    &self,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<DailySnapshot>, AppError> {
    db::with_conn(&self.db, |conn| {
      let mut stmt = conn.prepare(
        "SELECT date, opening_balance, total_income, total_egress, closing_balance
         FROM daily_snapshots
         WHERE account_id = ?1 AND date BETWEEN ?2 AND ?3
         ORDER BY date",
      )?;
      let rows = stmt.query_map(
        params![account_id, from.to_string(), to.to_string()],
        |row| {
          Ok(DailySnapshot {
            date: row.get(0)?,
            opening_balance: row.get(1)?,
            total_income: row.get(2)?,
            total_egress: row.get(3)?,
            closing_balance: row.get(4)?,
            finalized: true,
          })
        },
      )?;

      let mut snapshots = Vec::new();
      for row in rows {
        snapshots.push(row?);
      }
      Ok(snapshots)
    })
  }

  fn is_day_finalized(&self, account_id: i64, date: NaiveDate) -> Result<bool, AppError> {
    db::with_conn(&self.db, |conn| {
      let row = conn
        .query_row(
          "SELECT 1 FROM finalized_days WHERE account_id = ?1 AND date = ?2 LIMIT 1",
          params![account_id, date.to_string()],
          |row| row.get::<_, i64>(0),
        )
        .optional()?;
      Ok(row.is_some())
    })
  }

  fn list_finalized_days(&self, account_id: i64) -> Result<Vec<FinalizedDay>, AppError> {
    db::with_conn(&self.db, |conn| {
      let mut stmt = conn.prepare(
        "SELECT date, finalized_at FROM finalized_days WHERE account_id = ?1 ORDER BY date DESC",
      )?;
      let rows = stmt.query_map(params![account_id], |row| {
        Ok(FinalizedDay {
          date: row.get(0)?,
          finalized_at: row.get(1)?,
        })
      })?;

      let mut days = Vec::new();
      for row in rows {
        days.push(row?);
      }
      Ok(days)
    })
  }

  fn save_finalized_day(
    &self,
    account_id: i64,
    date: NaiveDate,
    snapshot: &DailySnapshot,
    actor: Option<&str>,
  ) -> Result<(), AppError> {
    let payload_json = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    let date = date.to_string();
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      tx.execute(
        "INSERT OR REPLACE INTO daily_snapshots (account_id, date, opening_balance, total_income, total_egress, closing_balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
          account_id,
          date,
          snapshot.opening_balance,
          snapshot.total_income,
          snapshot.total_egress,
          snapshot.closing_balance
        ],
      )?;
      // A duplicate marker aborts the whole transaction, snapshot included.
      match tx.execute(
        "INSERT INTO finalized_days (account_id, date, finalized_at) VALUES (?1, ?2, ?3)",
        params![account_id, date, Utc::now().to_rfc3339()],
      ) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
          if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
          return Err(AppError::already_finalized("El día ya está finalizado"));
        }
        Err(err) => return Err(err.into()),
      }
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "FINALIZE_DAY",
        "DAY",
        Some(date.clone()),
        None,
        payload_json,
        None,
      )?;
      tx.commit()?;
      Ok(())
    })
  }

  fn day_activity_in_range(
    &self,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<DayActivity>, AppError> {
    db::with_conn(&self.db, |conn| {
      let mut days: BTreeMap<String, DayActivity> = BTreeMap::new();

      let mut stmt = conn.prepare(
        "SELECT date, COALESCE(SUM(amount), 0)
         FROM expenses
         WHERE account_id = ?1 AND date BETWEEN ?2 AND ?3 AND is_active = 1
         GROUP BY date",
      )?;
      let rows = stmt.query_map(
        params![account_id, from.to_string(), to.to_string()],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
      )?;
      for row in rows {
        let (date, total) = row?;
        days
          .entry(date.clone())
          .or_insert_with(|| DayActivity::empty(&date))
          .expense_total = total;
      }

      let mut stmt = conn.prepare(
        "SELECT date,
            COALESCE(SUM(CASE WHEN kind = 'ingreso' THEN amount END), 0),
            COALESCE(SUM(CASE WHEN kind = 'egreso' THEN amount END), 0)
         FROM quiniela_transactions
         WHERE account_id = ?1 AND date BETWEEN ?2 AND ?3 AND is_active = 1
         GROUP BY date",
      )?;
      let rows = stmt.query_map(
        params![account_id, from.to_string(), to.to_string()],
        |row| {
          Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, f64>(2)?,
          ))
        },
      )?;
      for row in rows {
        let (date, income, egress) = row?;
        let entry = days
          .entry(date.clone())
          .or_insert_with(|| DayActivity::empty(&date));
        entry.income_total = income;
        entry.quiniela_egress_total = egress;
      }

      Ok(days.into_values().collect())
    })
  }

  fn draw_times(&self, account_id: i64) -> Result<Vec<DrawTime>, AppError> {
    db::with_conn(&self.db, |conn| {
      let mut stmt = conn.prepare(
        "SELECT modality_id, modality, opens_at, closes_at
         FROM draw_times
         WHERE account_id = ?1 AND is_active = 1
         ORDER BY modality_id",
      )?;
      let rows = stmt.query_map(params![account_id], |row| {
        Ok(DrawTime {
          modality_id: row.get(0)?,
          modality: row.get(1)?,
          opens_at: row.get(2)?,
          closes_at: row.get(3)?,
        })
      })?;

      let mut times = Vec::new();
      for row in rows {
        times.push(row?);
      }
      Ok(times)
    })
  }

  fn replace_draw_times(
    &self,
    account_id: i64,
    times: &[DrawTime],
    actor: Option<&str>,
  ) -> Result<(), AppError> {
    let payload_json = serde_json::to_string(times).unwrap_or_else(|_| "[]".to_string());
    db::with_conn(&self.db, |conn| {
      let tx = conn.transaction()?;
      tx.execute(
        "UPDATE draw_times SET is_active = 0 WHERE account_id = ?1 AND is_active = 1",
        params![account_id],
      )?;
      {
        let mut stmt = tx.prepare(
          "INSERT INTO draw_times (account_id, modality_id, modality, opens_at, closes_at, is_active)
           VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        )?;
        for time in times {
          stmt.execute(params![
            account_id,
            time.modality_id,
            time.modality,
            time.opens_at,
            time.closes_at
          ])?;
        }
      }
      append_audit(
        &tx,
        actor.map(|value| value.to_string()),
        "UPDATE_DRAW_TIMES",
        "DRAW_TIMES",
        None,
        None,
        payload_json,
        None,
      )?;
      tx.commit()?;
      Ok(())
    })
  }

  fn list_audit(&self, page: i64, page_size: i64) -> Result<Paginated<AuditLogEntry>, AppError> {
    db::with_conn(&self.db, |conn| list_audit_log(conn, page, page_size))
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;
  use std::sync::Mutex;

  use super::*;
  use crate::db::run_migrations;

  fn test_store() -> SqliteStore {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    run_migrations(&mut conn).unwrap();
    conn
      .execute(
        "INSERT INTO accounts (name, created_at) VALUES (?1, ?2)",
        params!["Caja Principal", Utc::now().to_rfc3339()],
      )
      .unwrap();
    SqliteStore::new(Db {
      conn: Mutex::new(conn),
      db_path: PathBuf::from(":memory:"),
    })
  }

  fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
  }

  fn expense_input(date: &str, amount: f64) -> NewExpenseInput {
    NewExpenseInput {
      date: date.to_string(),
      category: "Servicios".to_string(),
      subcategory: Some("Internet".to_string()),
      description: "Factura mensual".to_string(),
      amount,
    }
  }

  fn quiniela_input(date: &str, kind: MovementKind, amount: f64) -> NewQuinielaInput {
    NewQuinielaInput {
      date: date.to_string(),
      game: "Quiniela".to_string(),
      kind,
      amount,
      description: None,
    }
  }

  #[test]
  fn expense_rows_round_trip_with_audit() {
    let store = test_store();
    let created = store.insert_expense(1, &expense_input("2024-03-05", 30.5), Some("ana")).unwrap();
    assert!(created.id > 0);
    assert_eq!(created.subcategory.as_deref(), Some("Internet"));

    let listed = store.expenses_by_date(1, date("2024-03-05")).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].amount, 30.5);

    let update = ExpenseUpdateInput {
      date: "2024-03-06".to_string(),
      category: "Alquiler".to_string(),
      subcategory: None,
      description: "Alquiler local".to_string(),
      amount: 50.0,
    };
    let updated = store.update_expense(1, created.id, &update, None).unwrap();
    assert_eq!(updated.date, "2024-03-06");
    assert!(updated.subcategory.is_none());

    store.deactivate_expense(1, created.id, None).unwrap();
    assert!(store.expense_by_id(1, created.id).unwrap().is_none());

    let log = store.list_audit(1, 10).unwrap();
    assert_eq!(log.total, 3);
    assert_eq!(log.items[0].action, "DELETE_EXPENSE");
    assert_eq!(log.items[2].action, "CREATE_EXPENSE");
    assert_eq!(log.items[2].actor.as_deref(), Some("ana"));
  }

  #[test]
  fn missing_rows_surface_as_not_found() {
    let store = test_store();
    let update = ExpenseUpdateInput {
      date: "2024-03-06".to_string(),
      category: "Alquiler".to_string(),
      subcategory: None,
      description: "x".to_string(),
      amount: 50.0,
    };
    let err = store.update_expense(1, 999, &update, None).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    let err = store.deactivate_quiniela(1, 999, None).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    // nothing of the failed writes reaches the log
    assert_eq!(store.list_audit(1, 10).unwrap().total, 0);
  }

  #[test]
  fn quiniela_insert_stores_game_in_category_and_source() {
    let store = test_store();
    let tx = store
      .insert_quiniela(1, &quiniela_input("2024-03-05", MovementKind::Income, 150.0), None)
      .unwrap();
    assert_eq!(tx.category, "Quiniela");
    assert_eq!(tx.source, "Quiniela");
    assert_eq!(tx.description, "");
    assert_eq!(tx.kind, MovementKind::Income);

    let listed = store.quiniela_by_date(1, date("2024-03-05")).unwrap();
    assert_eq!(listed.len(), 1);
  }

  #[test]
  fn sums_filter_by_kind_and_range() {
    let store = test_store();
    store.insert_quiniela(1, &quiniela_input("2024-03-01", MovementKind::Income, 100.0), None).unwrap();
    store.insert_quiniela(1, &quiniela_input("2024-03-15", MovementKind::Income, 60.0), None).unwrap();
    store.insert_quiniela(1, &quiniela_input("2024-03-15", MovementKind::Egress, 40.0), None).unwrap();
    store.insert_quiniela(1, &quiniela_input("2024-04-01", MovementKind::Income, 999.0), None).unwrap();
    store.insert_expense(1, &expense_input("2024-03-10", 25.0), None).unwrap();

    assert_eq!(
      store.sum_quiniela(1, MovementKind::Income, date("2024-03-01"), date("2024-03-31")).unwrap(),
      160.0
    );
    assert_eq!(
      store.sum_quiniela(1, MovementKind::Egress, date("2024-03-01"), date("2024-03-31")).unwrap(),
      40.0
    );
    assert_eq!(
      store.sum_expenses(1, date("2024-03-01"), date("2024-03-31")).unwrap(),
      25.0
    );
  }

  #[test]
  fn duplicate_finalization_rolls_back_the_snapshot_upsert() {
    let store = test_store();
    let first = DailySnapshot {
      date: "2024-03-05".to_string(),
      opening_balance: 10.0,
      total_income: 20.0,
      total_egress: 5.0,
      closing_balance: 25.0,
      finalized: true,
    };
    store.save_finalized_day(1, date("2024-03-05"), &first, None).unwrap();
    assert!(store.is_day_finalized(1, date("2024-03-05")).unwrap());

    let mut second = first.clone();
    second.closing_balance = 999.0;
    let err = store.save_finalized_day(1, date("2024-03-05"), &second, None).unwrap_err();
    assert_eq!(err.code(), "ALREADY_FINALIZED");
    assert_eq!(
      store.snapshot_closing_balance(1, date("2024-03-05")).unwrap(),
      Some(25.0)
    );

    // only the first finalization is audited
    let log = store.list_audit(1, 10).unwrap();
    assert_eq!(log.total, 1);
    assert_eq!(log.items[0].action, "FINALIZE_DAY");
  }

  #[test]
  fn snapshots_and_activity_group_by_date() {
    let store = test_store();
    store.insert_expense(1, &expense_input("2024-03-01", 10.0), None).unwrap();
    store.insert_expense(1, &expense_input("2024-03-01", 5.0), None).unwrap();
    store.insert_quiniela(1, &quiniela_input("2024-03-01", MovementKind::Income, 40.0), None).unwrap();
    store.insert_quiniela(1, &quiniela_input("2024-03-02", MovementKind::Egress, 8.0), None).unwrap();

    let days = store
      .day_activity_in_range(1, date("2024-03-01"), date("2024-03-31"))
      .unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, "2024-03-01");
    assert_eq!(days[0].expense_total, 15.0);
    assert_eq!(days[0].income_total, 40.0);
    assert_eq!(days[1].quiniela_egress_total, 8.0);

    let snapshot = DailySnapshot {
      date: "2024-03-01".to_string(),
      opening_balance: 0.0,
      total_income: 40.0,
      total_egress: 15.0,
      closing_balance: 25.0,
      finalized: true,
    };
    store.save_finalized_day(1, date("2024-03-01"), &snapshot, None).unwrap();
    let snapshots = store
      .snapshots_in_range(1, date("2024-03-01"), date("2024-03-31"))
      .unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].closing_balance, 25.0);
  }

  #[test]
  fn draw_times_keep_only_the_latest_version() {
    let store = test_store();
    let first = vec![DrawTime {
      modality_id: 1,
      modality: "La Primera".to_string(),
      opens_at: "08:00".to_string(),
      closes_at: "09:15".to_string(),
    }];
    store.replace_draw_times(1, &first, None).unwrap();

    let second = vec![
      DrawTime {
        modality_id: 1,
        modality: "La Primera".to_string(),
        opens_at: "08:00".to_string(),
        closes_at: "09:30".to_string(),
      },
      DrawTime {
        modality_id: 2,
        modality: "Matutina".to_string(),
        opens_at: "08:00".to_string(),
        closes_at: "11:45".to_string(),
      },
    ];
    store.replace_draw_times(1, &second, None).unwrap();

    let times = store.draw_times(1).unwrap();
    assert_eq!(times.len(), 2);
    assert_eq!(times[0].closes_at, "09:30");
    assert_eq!(times[1].modality, "Matutina");
  }
}
