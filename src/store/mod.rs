use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{
  Account, AuditLogEntry, DailySnapshot, DrawTime, Expense, ExpenseUpdateInput, FinalizedDay,
  MovementKind, NewExpenseInput, NewQuinielaInput, Paginated, QuinielaTransaction,
  QuinielaUpdateInput,
};

pub mod memory;
pub mod sqlite;

pub struct DayActivity {
  pub date: String,
  pub expense_total: f64,
  pub income_total: f64,
  pub quiniela_egress_total: f64,
}

impl DayActivity {
  pub fn empty(date: &str) -> DayActivity {
    DayActivity {
      date: date.to_string(),
      expense_total: 0.0,
      income_total: 0.0,
      quiniela_egress_total: 0.0,
    }
  }
}

// Persistence seam for the daily bookkeeping. The SQLite backend is the
// real one; the in-memory backend backs the tests. Mutating operations
// leave an audit entry as part of the same write.
pub trait Store: Send + Sync {
  fn accounts(&self) -> Result<Vec<Account>, AppError>;

  fn expenses_by_date(&self, account_id: i64, date: NaiveDate) -> Result<Vec<Expense>, AppError>;
  fn expense_by_id(&self, account_id: i64, id: i64) -> Result<Option<Expense>, AppError>;
  fn insert_expense(
    &self,
    account_id: i64,
    input: &NewExpenseInput,
    actor: Option<&str>,
  ) -> Result<Expense, AppError>;
  fn update_expense(
    &self,
    account_id: i64,
    id: i64,
    input: &ExpenseUpdateInput,
    actor: Option<&str>,
  ) -> Result<Expense, AppError>;
  fn deactivate_expense(&self, account_id: i64, id: i64, actor: Option<&str>) -> Result<(), AppError>;
  fn sum_expenses(&self, account_id: i64, from: NaiveDate, to: NaiveDate) -> Result<f64, AppError>;

  fn quiniela_by_date(
    &self,
    account_id: i64,
    date: NaiveDate,
  ) -> Result<Vec<QuinielaTransaction>, AppError>;
  fn quiniela_by_id(&self, account_id: i64, id: i64) -> Result<Option<QuinielaTransaction>, AppError>;
  fn insert_quiniela(
    &self,
    account_id: i64,
    input: &NewQuinielaInput,
    actor: Option<&str>,
  ) -> Result<QuinielaTransaction, AppError>;
  fn update_quiniela(
    &self,
    account_id: i64,
    id: i64,
    input: &QuinielaUpdateInput,
    actor: Option<&str>,
  ) -> Result<QuinielaTransaction, AppError>;
  fn deactivate_quiniela(&self, account_id: i64, id: i64, actor: Option<&str>) -> Result<(), AppError>;
  fn sum_quiniela(
    &self,
    account_id: i64,
    kind: MovementKind,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<f64, AppError>;

  fn snapshot_closing_balance(
    &self,
    account_id: i64,
    date: NaiveDate,
  ) -> Result<Option<f64>, AppError>;
  fn snapshots_in_range(
    &self,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<DailySnapshot>, AppError>;
  fn is_day_finalized(&self, account_id: i64, date: NaiveDate) -> Result<bool, AppError>;
  fn list_finalized_days(&self, account_id: i64) -> Result<Vec<FinalizedDay>, AppError>;
  // Upserts the snapshot and inserts the finalization marker as one unit;
  // a marker that already exists fails the whole write with AlreadyFinalized.
  fn save_finalized_day(
    &self,
    account_id: i64,
    date: NaiveDate,
    snapshot: &DailySnapshot,
    actor: Option<&str>,
  ) -> Result<(), AppError>;

  fn day_activity_in_range(
    &self,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<DayActivity>, AppError>;

  fn draw_times(&self, account_id: i64) -> Result<Vec<DrawTime>, AppError>;
  fn replace_draw_times(
    &self,
    account_id: i64,
    times: &[DrawTime],
    actor: Option<&str>,
  ) -> Result<(), AppError>;

  fn list_audit(&self, page: i64, page_size: i64) -> Result<Paginated<AuditLogEntry>, AppError>;
}
