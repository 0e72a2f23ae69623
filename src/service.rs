use chrono::Local;

use crate::domain::{balance, closing, games, guard, schedule, validation};
use crate::error::AppError;
use crate::models::{
  DailySnapshot, DaySummary, DrawTime, Expense, ExpenseUpdateInput, ModalityStatus,
  NewExpenseInput, NewQuinielaInput, QuinielaTransaction, QuinielaUpdateInput, SettlementInput,
};
use crate::store::Store;

pub fn list_expenses(store: &dyn Store, account_id: i64, date: &str) -> Result<Vec<Expense>, AppError> {
  let date = validation::parse_date(date)?;
  store.expenses_by_date(account_id, date)
}

pub fn create_expense(
  store: &dyn Store,
  account_id: i64,
  input: NewExpenseInput,
  actor: Option<&str>,
) -> Result<Expense, AppError> {
  let date = validation::parse_date(&input.date)?;
  validation::ensure_category(&input.category)?;
  validation::ensure_subcategory(input.subcategory.as_deref())?;
  validation::ensure_description_required(&input.description)?;
  validation::ensure_amount_positive(input.amount)?;

  guard::check_create(store, account_id, date, Local::now().date_naive(), "gastos")?;

  let expense = store.insert_expense(account_id, &input, actor)?;
  log::info!("gasto {} registrado para {}", expense.id, expense.date);
  Ok(expense)
}

pub fn update_expense(
  store: &dyn Store,
  account_id: i64,
  id: i64,
  input: ExpenseUpdateInput,
  actor: Option<&str>,
) -> Result<Expense, AppError> {
  let new_date = validation::parse_date(&input.date)?;
  validation::ensure_category(&input.category)?;
  validation::ensure_subcategory(input.subcategory.as_deref())?;
  validation::ensure_description_required(&input.description)?;
  validation::ensure_amount_positive(input.amount)?;

  let current = store
    .expense_by_id(account_id, id)?
    .ok_or_else(|| AppError::not_found("Gasto no encontrado"))?;
  let current_date = validation::parse_date(&current.date)?;
  guard::check_update(
    store,
    account_id,
    current_date,
    new_date,
    Local::now().date_naive(),
    "gastos",
  )?;

  let expense = store.update_expense(account_id, id, &input, actor)?;
  log::info!("gasto {} actualizado", expense.id);
  Ok(expense)
}

pub fn delete_expense(
  store: &dyn Store,
  account_id: i64,
  id: i64,
  actor: Option<&str>,
) -> Result<(), AppError> {
  let current = store
    .expense_by_id(account_id, id)?
    .ok_or_else(|| AppError::not_found("Gasto no encontrado"))?;
  let date = validation::parse_date(&current.date)?;
  guard::check_delete(store, account_id, date, "gastos")?;

  store.deactivate_expense(account_id, id, actor)?;
  log::info!("gasto {} eliminado", id);
  Ok(())
}

pub fn list_quiniela(
  store: &dyn Store,
  account_id: i64,
  date: &str,
) -> Result<Vec<QuinielaTransaction>, AppError> {
  let date = validation::parse_date(date)?;
  store.quiniela_by_date(account_id, date)
}

pub fn create_quiniela(
  store: &dyn Store,
  account_id: i64,
  input: NewQuinielaInput,
  actor: Option<&str>,
) -> Result<QuinielaTransaction, AppError> {
  let date = validation::parse_date(&input.date)?;
  validation::ensure_game(&input.game)?;
  validation::ensure_amount_non_negative(input.amount)?;
  if let Some(description) = input.description.as_deref() {
    validation::ensure_description_length(description)?;
  }

  guard::check_create(store, account_id, date, Local::now().date_naive(), "transacciones")?;

  let transaction = store.insert_quiniela(account_id, &input, actor)?;
  log::info!(
    "movimiento de quiniela {} ({}) registrado para {}",
    transaction.id,
    transaction.kind.as_str(),
    transaction.date
  );
  Ok(transaction)
}

pub fn update_quiniela(
  store: &dyn Store,
  account_id: i64,
  id: i64,
  input: QuinielaUpdateInput,
  actor: Option<&str>,
) -> Result<QuinielaTransaction, AppError> {
  let new_date = validation::parse_date(&input.date)?;
  validation::ensure_game(&input.game)?;
  validation::ensure_amount_non_negative(input.amount)?;
  if let Some(description) = input.description.as_deref() {
    validation::ensure_description_length(description)?;
  }

  let current = store
    .quiniela_by_id(account_id, id)?
    .ok_or_else(|| AppError::not_found("Transacción no encontrada"))?;
  let current_date = validation::parse_date(&current.date)?;
  guard::check_update(
    store,
    account_id,
    current_date,
    new_date,
    Local::now().date_naive(),
    "transacciones",
  )?;

  let transaction = store.update_quiniela(account_id, id, &input, actor)?;
  log::info!("movimiento de quiniela {} actualizado", transaction.id);
  Ok(transaction)
}

pub fn delete_quiniela(
  store: &dyn Store,
  account_id: i64,
  id: i64,
  actor: Option<&str>,
) -> Result<(), AppError> {
  let current = store
    .quiniela_by_id(account_id, id)?
    .ok_or_else(|| AppError::not_found("Transacción no encontrada"))?;
  let date = validation::parse_date(&current.date)?;
  guard::check_delete(store, account_id, date, "transacciones")?;

  store.deactivate_quiniela(account_id, id, actor)?;
  log::info!("movimiento de quiniela {} eliminado", id);
  Ok(())
}

pub fn settle_game_day(
  store: &dyn Store,
  account_id: i64,
  input: SettlementInput,
  actor: Option<&str>,
) -> Result<Vec<QuinielaTransaction>, AppError> {
  let date = validation::parse_date(&input.date)?;
  validation::ensure_game(&input.game)?;

  let entries = games::expand_settlement(&input)?;
  if entries.is_empty() {
    return Err(AppError::invalid_input("El cierre no tiene importes para registrar"));
  }

  guard::check_create(store, account_id, date, Local::now().date_naive(), "transacciones")?;

  let mut created = Vec::with_capacity(entries.len());
  for entry in &entries {
    created.push(store.insert_quiniela(account_id, entry, actor)?);
  }
  log::info!(
    "cierre de {} registrado para {}: {} movimientos",
    input.game,
    input.date,
    created.len()
  );
  Ok(created)
}

pub fn get_opening_balance(store: &dyn Store, account_id: i64, date: &str) -> Result<f64, AppError> {
  let date = validation::parse_date(date)?;
  balance::resolve_opening_balance(store, account_id, date)
}

pub fn get_day_data(store: &dyn Store, account_id: i64, date: &str) -> Result<DaySummary, AppError> {
  let parsed = validation::parse_date(date)?;
  Ok(DaySummary {
    expenses: store.expenses_by_date(account_id, parsed)?,
    quiniela_transactions: store.quiniela_by_date(account_id, parsed)?,
    opening_balance: balance::resolve_opening_balance(store, account_id, parsed)?,
    finalized: store.is_day_finalized(account_id, parsed)?,
  })
}

pub fn finalize_day(
  store: &dyn Store,
  account_id: i64,
  date: &str,
  actor: Option<&str>,
) -> Result<DailySnapshot, AppError> {
  let parsed = validation::parse_date(date)?;
  closing::ensure_can_finalize(store, account_id, parsed, Local::now().date_naive())?;

  let opening = balance::resolve_opening_balance(store, account_id, parsed)?;
  let totals = closing::day_totals(store, account_id, parsed)?;
  let snapshot = closing::build_snapshot(parsed, opening, &totals);

  store.save_finalized_day(account_id, parsed, &snapshot, actor)?;
  log::info!("día {} finalizado con saldo de cierre {}", date, snapshot.closing_balance);
  Ok(snapshot)
}

pub fn get_draw_times(store: &dyn Store, account_id: i64) -> Result<Vec<DrawTime>, AppError> {
  let times = store.draw_times(account_id)?;
  if times.is_empty() {
    return Ok(schedule::default_draw_times());
  }
  Ok(times)
}

pub fn update_draw_times(
  store: &dyn Store,
  account_id: i64,
  times: Vec<DrawTime>,
  actor: Option<&str>,
) -> Result<Vec<DrawTime>, AppError> {
  schedule::ensure_draw_times(&times)?;
  store.replace_draw_times(account_id, &times, actor)?;
  log::info!("horarios de sorteo actualizados: {} modalidades", times.len());
  get_draw_times(store, account_id)
}

pub fn get_modality_status(store: &dyn Store, account_id: i64) -> Result<Vec<ModalityStatus>, AppError> {
  let times = get_draw_times(store, account_id)?;
  schedule::modality_status(&times, Local::now().time())
}
