use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};

use crate::error::AppError;
use crate::models::{
  Account, AuditLogEntry, DailySnapshot, DrawTime, Expense, ExpenseUpdateInput, FinalizedDay,
  MovementKind, NewExpenseInput, NewQuinielaInput, Paginated, QuinielaTransaction,
  QuinielaUpdateInput,
};
use crate::store::{DayActivity, Store};

#[derive(Clone)]
struct ExpenseRow {
  id: i64,
  account_id: i64,
  amount: f64,
  category: String,
  subcategory: Option<String>,
  description: String,
  date: String,
  is_active: bool,
  created_at: String,
}

impl ExpenseRow {
  fn to_expense(&self) -> Expense {
    Expense {
      id: self.id,
      amount: self.amount,
      category: self.category.clone(),
      subcategory: self.subcategory.clone(),
      description: self.description.clone(),
      date: self.date.clone(),
      created_at: self.created_at.clone(),
    }
  }
}

#[derive(Clone)]
struct QuinielaRow {
  id: i64,
  account_id: i64,
  kind: MovementKind,
  category: String,
  amount: f64,
  description: String,
  date: String,
  source: String,
  is_active: bool,
  created_at: String,
}

impl QuinielaRow {
  fn to_transaction(&self) -> QuinielaTransaction {
    QuinielaTransaction {
      id: self.id,
      kind: self.kind,
      category: self.category.clone(),
      amount: self.amount,
      description: self.description.clone(),
      date: self.date.clone(),
      source: self.source.clone(),
      created_at: self.created_at.clone(),
    }
  }
}

#[derive(Clone)]
struct SnapshotRow {
  account_id: i64,
  date: String,
  opening_balance: f64,
  total_income: f64,
  total_egress: f64,
  closing_balance: f64,
}

#[derive(Clone)]
struct FinalizedRow {
  account_id: i64,
  date: String,
  finalized_at: String,
}

#[derive(Default)]
struct MemoryState {
  accounts: Vec<Account>,
  expenses: Vec<ExpenseRow>,
  quiniela: Vec<QuinielaRow>,
  snapshots: Vec<SnapshotRow>,
  finalized: Vec<FinalizedRow>,
  draw_times: HashMap<i64, Vec<DrawTime>>,
  audit: Vec<AuditLogEntry>,
  next_expense_id: i64,
  next_quiniela_id: i64,
  next_audit_id: i64,
}

pub struct MemoryStore {
  state: Mutex<MemoryState>,
}

impl MemoryStore {
  pub fn new() -> Self {
    let mut state = MemoryState::default();
    state.accounts.push(Account {
      id: 1,
      name: "Caja Principal".to_string(),
      created_at: Utc::now().to_rfc3339(),
    });
    MemoryStore {
      state: Mutex::new(state),
    }
  }
}

fn push_audit(
  state: &mut MemoryState,
  actor: Option<&str>,
  action: &str,
  entity_type: &str,
  entity_id: Option<String>,
  payload_json: String,
  details: Option<String>,
) {
  state.next_audit_id += 1;
  state.audit.push(AuditLogEntry {
    id: state.next_audit_id,
    ts: Utc::now().to_rfc3339(),
    actor: actor.map(|value| value.to_string()),
    action: action.to_string(),
    entity_type: entity_type.to_string(),
    entity_id,
    ref_id: None,
    payload_json,
    details,
  });
}

fn in_range(date: &str, from: &str, to: &str) -> bool {
  date >= from && date <= to
}

impl Store for MemoryStore {
  fn accounts(&self) -> Result<Vec<Account>, AppError> {
    let state = self.state.lock()?;
    Ok(state.accounts.clone())
  }

  fn expenses_by_date(&self, account_id: i64, date: NaiveDate) -> Result<Vec<Expense>, AppError> {
    let state = self.state.lock()?;
    let date = date.to_string();
    let mut rows: Vec<Expense> = state
      .expenses
      .iter()
      .filter(|row| row.account_id == account_id && row.is_active && row.date == date)
      .map(ExpenseRow::to_expense)
      .collect();
    rows.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(rows)
  }

  fn expense_by_id(&self, account_id: i64, id: i64) -> Result<Option<Expense>, AppError> {
    let state = self.state.lock()?;
    Ok(
      state
        .expenses
        .iter()
        .find(|row| row.id == id && row.account_id == account_id && row.is_active)
        .map(ExpenseRow::to_expense),
    )
  }

  fn insert_expense(
    &self,
    account_id: i64,
    input: &NewExpenseInput,
    actor: Option<&str>,
  ) -> Result<Expense, AppError> {
    let mut state = self.state.lock()?;
    state.next_expense_id += 1;
    let row = ExpenseRow {
      id: state.next_expense_id,
      account_id,
      amount: input.amount,
      category: input.category.clone(),
      subcategory: input.subcategory.clone(),
      description: input.description.clone(),
      date: input.date.clone(),
      is_active: true,
      created_at: Utc::now().to_rfc3339(),
    };
    let expense = row.to_expense();
    state.expenses.push(row);
    let payload = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    push_audit(
      &mut state,
      actor,
      "CREATE_EXPENSE",
      "EXPENSE",
      Some(expense.id.to_string()),
      payload,
      None,
    );
    Ok(expense)
  }

  fn update_expense(
    &self,
    account_id: i64,
    id: i64,
    input: &ExpenseUpdateInput,
    actor: Option<&str>,
  ) -> Result<Expense, AppError> {
    let mut state = self.state.lock()?;
    let row = state
      .expenses
      .iter_mut()
      .find(|row| row.id == id && row.account_id == account_id && row.is_active)
      .ok_or_else(|| AppError::not_found("Gasto no encontrado"))?;
    row.amount = input.amount;
    row.category = input.category.clone();
    row.subcategory = input.subcategory.clone();
    row.description = input.description.clone();
    row.date = input.date.clone();
    let expense = row.to_expense();
    let payload = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    push_audit(
      &mut state,
      actor,
      "UPDATE_EXPENSE",
      "EXPENSE",
      Some(id.to_string()),
      payload,
      None,
    );
    Ok(expense)
  }

  fn deactivate_expense(&self, account_id: i64, id: i64, actor: Option<&str>) -> Result<(), AppError> {
    let mut state = self.state.lock()?;
    let row = state
      .expenses
      .iter_mut()
      .find(|row| row.id == id && row.account_id == account_id && row.is_active)
      .ok_or_else(|| AppError::not_found("Gasto no encontrado"))?;
    row.is_active = false;
    push_audit(
      &mut state,
      actor,
      "DELETE_EXPENSE",
      "EXPENSE",
      Some(id.to_string()),
      "{}".to_string(),
      Some("Gasto eliminado".to_string()),
    );
    Ok(())
  }

  fn sum_expenses(&self, account_id: i64, from: NaiveDate, to: NaiveDate) -> Result<f64, AppError> {
    let state = self.state.lock()?;
    let (from, to) = (from.to_string(), to.to_string());
    Ok(
      state
        .expenses
        .iter()
        .filter(|row| row.account_id == account_id && row.is_active && in_range(&row.date, &from, &to))
        .map(|row| row.amount)
        .sum(),
    )
  }

  fn quiniela_by_date(
    &self,
    account_id: i64,
    date: NaiveDate,
  ) -> Result<Vec<QuinielaTransaction>, AppError> {
    let state = self.state.lock()?;
    let date = date.to_string();
    let mut rows: Vec<QuinielaTransaction> = state
      .quiniela
      .iter()
      .filter(|row| row.account_id == account_id && row.is_active && row.date == date)
      .map(QuinielaRow::to_transaction)
      .collect();
    rows.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(rows)
  }

  fn quiniela_by_id(&self, account_id: i64, id: i64) -> Result<Option<QuinielaTransaction>, AppError> {
    let state = self.state.lock()?;
    Ok(
      state
        .quiniela
        .iter()
        .find(|row| row.id == id && row.account_id == account_id && row.is_active)
        .map(QuinielaRow::to_transaction),
    )
  }

  fn insert_quiniela(
    &self,
    account_id: i64,
    input: &NewQuinielaInput,
    actor: Option<&str>,
  ) -> Result<QuinielaTransaction, AppError> {
    let mut state = self.state.lock()?;
    state.next_quiniela_id += 1;
    let row = QuinielaRow {
      id: state.next_quiniela_id,
      account_id,
      kind: input.kind,
      category: input.game.clone(),
      amount: input.amount,
      description: input.description.clone().unwrap_or_default(),
      date: input.date.clone(),
      source: input.game.clone(),
      is_active: true,
      created_at: Utc::now().to_rfc3339(),
    };
    let transaction = row.to_transaction();
    state.quiniela.push(row);
    let payload = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    push_audit(
      &mut state,
      actor,
      "CREATE_QUINIELA",
      "QUINIELA_TX",
      Some(transaction.id.to_string()),
      payload,
      None,
    );
    Ok(transaction)
  }

  fn update_quiniela(
    &self,
    account_id: i64,
    id: i64,
    input: &QuinielaUpdateInput,
    actor: Option<&str>,
  ) -> Result<QuinielaTransaction, AppError> {
    let mut state = self.state.lock()?;
    let row = state
      .quiniela
      .iter_mut()
      .find(|row| row.id == id && row.account_id == account_id && row.is_active)
      .ok_or_else(|| AppError::not_found("Transacción no encontrada"))?;
    row.kind = input.kind;
    row.category = input.game.clone();
    row.amount = input.amount;
    row.description = input.description.clone().unwrap_or_default();
    row.date = input.date.clone();
    row.source = input.game.clone();
    let transaction = row.to_transaction();
    let payload = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
    push_audit(
      &mut state,
      actor,
      "UPDATE_QUINIELA",
      "QUINIELA_TX",
      Some(id.to_string()),
      payload,
      None,
    );
    Ok(transaction)
  }

  fn deactivate_quiniela(&self, account_id: i64, id: i64, actor: Option<&str>) -> Result<(), AppError> {
    let mut state = self.state.lock()?;
    let row = state
      .quiniela
      .iter_mut()
      .find(|row| row.id == id && row.account_id == account_id && row.is_active)
      .ok_or_else(|| AppError::not_found("Transacción no encontrada"))?;
    row.is_active = false;
    push_audit(
      &mut state,
      actor,
      "DELETE_QUINIELA",
      "QUINIELA_TX",
      Some(id.to_string()),
      "{}".to_string(),
      Some("Transacción eliminada".to_string()),
    );
    Ok(())
  }

  fn sum_quiniela(
    &self,
    account_id: i64,
    kind: MovementKind,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<f64, AppError> {
    let state = self.state.lock()?;
    let (from, to) = (from.to_string(), to.to_string());
    Ok(
      state
        .quiniela
        .iter()
        .filter(|row| {
          row.account_id == account_id
            && row.is_active
            && row.kind == kind
            && in_range(&row.date, &from, &to)
        })
        .map(|row| row.amount)
        .sum(),
    )
  }

  fn snapshot_closing_balance(
    &self,
    account_id: i64,
    date: NaiveDate,
  ) -> Result<Option<f64>, AppError> {
    let state = self.state.lock()?;
    let date = date.to_string();
    Ok(
      state
        .snapshots
        .iter()
        .find(|row| row.account_id == account_id && row.date == date)
        .map(|row| row.closing_balance),
    )
  }

  fn snapshots_in_range(
    &self,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<DailySnapshot>, AppError> {
    let state = self.state.lock()?;
    let (from, to) = (from.to_string(), to.to_string());
    let mut rows: Vec<DailySnapshot> = state
      .snapshots
      .iter()
      .filter(|row| row.account_id == account_id && in_range(&row.date, &from, &to))
      .map(|row| DailySnapshot {
        date: row.date.clone(),
        opening_balance: row.opening_balance,
        total_income: row.total_income,
        total_egress: row.total_egress,
        closing_balance: row.closing_balance,
        finalized: true,
      })
      .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(rows)
  }

  fn is_day_finalized(&self, account_id: i64, date: NaiveDate) -> Result<bool, AppError> {
    let state = self.state.lock()?;
    let date = date.to_string();
    Ok(
      state
        .finalized
        .iter()
        .any(|row| row.account_id == account_id && row.date == date),
    )
  }

  fn list_finalized_days(&self, account_id: i64) -> Result<Vec<FinalizedDay>, AppError> {
    let state = self.state.lock()?;
    let mut days: Vec<FinalizedDay> = state
      .finalized
      .iter()
      .filter(|row| row.account_id == account_id)
      .map(|row| FinalizedDay {
        date: row.date.clone(),
        finalized_at: row.finalized_at.clone(),
      })
      .collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(days)
  }

  fn save_finalized_day(
    &self,
    account_id: i64,
    date: NaiveDate,
    snapshot: &DailySnapshot,
    actor: Option<&str>,
  ) -> Result<(), AppError> {
    let mut state = self.state.lock()?;
    let date = date.to_string();
    if state
      .finalized
      .iter()
      .any(|row| row.account_id == account_id && row.date == date)
    {
      return Err(AppError::already_finalized("El día ya está finalizado"));
    }

    match state
      .snapshots
      .iter_mut()
      .find(|row| row.account_id == account_id && row.date == date)
    {
      Some(row) => {
        row.opening_balance = snapshot.opening_balance;
        row.total_income = snapshot.total_income;
        row.total_egress = snapshot.total_egress;
        row.closing_balance = snapshot.closing_balance;
      }
      None => state.snapshots.push(SnapshotRow {
        account_id,
        date: date.clone(),
        opening_balance: snapshot.opening_balance,
        total_income: snapshot.total_income,
        total_egress: snapshot.total_egress,
        closing_balance: snapshot.closing_balance,
      }),
    }
    state.finalized.push(FinalizedRow {
      account_id,
      date: date.clone(),
      finalized_at: Utc::now().to_rfc3339(),
    });
    let payload = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    push_audit(&mut state, actor, "FINALIZE_DAY", "DAY", Some(date), payload, None);
    Ok(())
  }

  fn day_activity_in_range(
    &self,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<DayActivity>, AppError> {
    let state = self.state.lock()?;
    let (from, to) = (from.to_string(), to.to_string());
    let mut days: BTreeMap<String, DayActivity> = BTreeMap::new();

    for row in state
      .expenses
      .iter()
      .filter(|row| row.account_id == account_id && row.is_active && in_range(&row.date, &from, &to))
    {
      let entry = days
        .entry(row.date.clone())
        .or_insert_with(|| DayActivity::empty(&row.date));
      entry.expense_total += row.amount;
    }
    for row in state
      .quiniela
      .iter()
      .filter(|row| row.account_id == account_id && row.is_active && in_range(&row.date, &from, &to))
    {
      let entry = days
        .entry(row.date.clone())
        .or_insert_with(|| DayActivity::empty(&row.date));
      match row.kind {
        MovementKind::Income => entry.income_total += row.amount,
        MovementKind::Egress => entry.quiniela_egress_total += row.amount,
      }
    }

    Ok(days.into_values().collect())
  }

  fn draw_times(&self, account_id: i64) -> Result<Vec<DrawTime>, AppError> {
    let state = self.state.lock()?;
    Ok(state.draw_times.get(&account_id).cloned().unwrap_or_default())
  }

  fn replace_draw_times(
    &self,
    account_id: i64,
    times: &[DrawTime],
    actor: Option<&str>,
  ) -> Result<(), AppError> {
    let mut state = self.state.lock()?;
    state.draw_times.insert(account_id, times.to_vec());
    let payload = serde_json::to_string(times).unwrap_or_else(|_| "[]".to_string());
    push_audit(&mut state, actor, "UPDATE_DRAW_TIMES", "DRAW_TIMES", None, payload, None);
    Ok(())
  }

  fn list_audit(&self, page: i64, page_size: i64) -> Result<Paginated<AuditLogEntry>, AppError> {
    let state = self.state.lock()?;
    let page = if page < 1 { 1 } else { page };
    let page_size = if page_size < 1 { 100 } else { page_size };
    let offset = ((page - 1) * page_size) as usize;

    let total = state.audit.len() as i64;
    let items: Vec<AuditLogEntry> = state
      .audit
      .iter()
      .rev()
      .skip(offset)
      .take(page_size as usize)
      .cloned()
      .collect();
    Ok(Paginated { total, items })
  }
}
