use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
  #[serde(rename = "ingreso")]
  Income,
  #[serde(rename = "egreso")]
  Egress,
}

impl MovementKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      MovementKind::Income => "ingreso",
      MovementKind::Egress => "egreso",
    }
  }

  pub fn parse(value: &str) -> Option<MovementKind> {
    match value {
      "ingreso" => Some(MovementKind::Income),
      "egreso" => Some(MovementKind::Egress),
      _ => None,
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Account {
  pub id: i64,
  pub name: String,
  pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Expense {
  pub id: i64,
  pub amount: f64,
  pub category: String,
  pub subcategory: Option<String>,
  pub description: String,
  pub date: String,
  pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewExpenseInput {
  pub date: String,
  pub category: String,
  pub subcategory: Option<String>,
  pub description: String,
  pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExpenseUpdateInput {
  pub date: String,
  pub category: String,
  pub subcategory: Option<String>,
  pub description: String,
  pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuinielaTransaction {
  pub id: i64,
  pub kind: MovementKind,
  pub category: String,
  pub amount: f64,
  pub description: String,
  pub date: String,
  pub source: String,
  pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewQuinielaInput {
  pub date: String,
  pub game: String,
  pub kind: MovementKind,
  pub amount: f64,
  pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuinielaUpdateInput {
  pub date: String,
  pub game: String,
  pub kind: MovementKind,
  pub amount: f64,
  pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DailySnapshot {
  pub date: String,
  pub opening_balance: f64,
  pub total_income: f64,
  pub total_egress: f64,
  pub closing_balance: f64,
  pub finalized: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FinalizedDay {
  pub date: String,
  pub finalized_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DaySummary {
  pub expenses: Vec<Expense>,
  pub quiniela_transactions: Vec<QuinielaTransaction>,
  pub opening_balance: f64,
  pub finalized: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SettlementInput {
  pub date: String,
  pub game: String,
  #[serde(default)]
  pub collected: f64,
  #[serde(default)]
  pub retained: f64,
  #[serde(default)]
  pub expired: f64,
  #[serde(default)]
  pub commission: f64,
  #[serde(default)]
  pub prizes: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DrawTime {
  pub modality_id: i64,
  pub modality: String,
  pub opens_at: String,
  pub closes_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModalityStatus {
  pub modality_id: i64,
  pub modality: String,
  pub opens_at: String,
  pub closes_at: String,
  pub open: bool,
  pub minutes_left: i64,
  pub current_time: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
  pub shop_name: String,
  pub default_account_id: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DayOverview {
  pub date: String,
  pub expense_total: f64,
  pub income_total: f64,
  pub quiniela_egress_total: f64,
  pub balance: f64,
  pub finalized: bool,
  pub closing_balance: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonthOverview {
  pub year: i32,
  pub month: u32,
  pub days: Vec<DayOverview>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditLogEntry {
  pub id: i64,
  pub ts: String,
  pub actor: Option<String>,
  pub action: String,
  pub entity_type: String,
  pub entity_id: Option<String>,
  pub ref_id: Option<String>,
  pub payload_json: String,
  pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
  pub total: i64,
  pub items: Vec<T>,
}
