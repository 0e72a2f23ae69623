use serde::{Deserialize, Serialize};

use crate::domain::validation;
use crate::error::AppError;
use crate::models::{MovementKind, NewQuinielaInput, SettlementInput};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Game {
  Quiniela,
  QuinielaExpress,
  Loto,
  LotoPlus,
  Quini6,
  Brinco,
  Loto5,
  Poceada,
  Telekino,
}

pub const EGRESS_CATEGORIES: [&str; 3] = ["Premio Pagado", "Comisión Pagada", "Devolución"];

pub const DEFAULT_INCOME_CATEGORY: &str = "Apuestas Nuevas";

impl Game {
  pub const CATALOG: [Game; 9] = [
    Game::Quiniela,
    Game::QuinielaExpress,
    Game::Loto,
    Game::LotoPlus,
    Game::Quini6,
    Game::Brinco,
    Game::Loto5,
    Game::Poceada,
    Game::Telekino,
  ];

  pub fn display_name(self) -> &'static str {
    match self {
      Game::Quiniela => "Quiniela",
      Game::QuinielaExpress => "Quiniela Express",
      Game::Loto => "Loto",
      Game::LotoPlus => "Loto Plus",
      Game::Quini6 => "Quini 6",
      Game::Brinco => "Brinco",
      Game::Loto5 => "Loto 5",
      Game::Poceada => "Poceada",
      Game::Telekino => "Telekino",
    }
  }

  // Names arrive as catalog labels, sometimes with a modality suffix
  // ("Quiniela - Matutina"). The suffix never changes the game.
  pub fn parse(name: &str) -> Option<Game> {
    let base = name.split(" - ").next().unwrap_or(name).trim().to_lowercase();
    match base.as_str() {
      "quiniela" => Some(Game::Quiniela),
      "quiniela express" => Some(Game::QuinielaExpress),
      "loto" => Some(Game::Loto),
      "loto plus" | "lotoplus" => Some(Game::LotoPlus),
      "quini 6" | "quini6" => Some(Game::Quini6),
      "brinco" => Some(Game::Brinco),
      "loto 5" | "loto5" => Some(Game::Loto5),
      "poceada" => Some(Game::Poceada),
      "telekino" | "telekino tj" => Some(Game::Telekino),
      _ => None,
    }
  }

  pub fn is_pooled(self) -> bool {
    !matches!(self, Game::Quiniela | Game::QuinielaExpress)
  }

  pub fn income_category(self) -> &'static str {
    match self {
      Game::Quiniela => "Apuestas Nuevas",
      Game::QuinielaExpress => "Valor de Jugada",
      Game::Loto
      | Game::LotoPlus
      | Game::Quini6
      | Game::Brinco
      | Game::Loto5
      | Game::Poceada
      | Game::Telekino => "Venta de Tickets",
    }
  }
}

pub fn income_categories(game_name: &str) -> Vec<String> {
  let category = Game::parse(game_name)
    .map(Game::income_category)
    .unwrap_or(DEFAULT_INCOME_CATEGORY);
  vec![category.to_string()]
}

pub fn egress_categories() -> Vec<String> {
  EGRESS_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

pub fn expand_settlement(input: &SettlementInput) -> Result<Vec<NewQuinielaInput>, AppError> {
  if !input.collected.is_finite() {
    return Err(AppError::invalid_input("El monto debe ser un número válido"));
  }
  validation::ensure_amount_non_negative(input.retained)?;
  validation::ensure_amount_non_negative(input.expired)?;
  validation::ensure_amount_non_negative(input.commission)?;
  validation::ensure_amount_non_negative(input.prizes)?;

  let entry = |kind: MovementKind, amount: f64, description: &str| NewQuinielaInput {
    date: input.date.clone(),
    game: input.game.clone(),
    kind,
    amount,
    description: Some(description.to_string()),
  };

  let mut entries = Vec::new();

  if input.collected != 0.0 {
    let kind = if input.collected >= 0.0 {
      MovementKind::Income
    } else {
      MovementKind::Egress
    };
    let label = if input.collected >= 0.0 {
      "Cierre del día - Recaudación total"
    } else {
      "Cierre del día - Recaudación (pérdida)"
    };
    entries.push(entry(kind, input.collected.abs(), label));
  }
  if input.retained > 0.0 {
    entries.push(entry(MovementKind::Egress, input.retained, "Cierre del día - Retención"));
  }
  if input.expired > 0.0 {
    entries.push(entry(MovementKind::Egress, input.expired, "Cierre del día - Caducos"));
  }
  if input.commission > 0.0 {
    entries.push(entry(MovementKind::Egress, input.commission, "Cierre del día - Comisión"));
  }
  if input.prizes > 0.0 {
    entries.push(entry(
      MovementKind::Egress,
      input.prizes,
      "Cierre del día - Premios pagados",
    ));
  }

  Ok(entries)
}
