use chrono::NaiveDate;

use crate::error::AppError;

pub fn parse_date(date: &str) -> Result<NaiveDate, AppError> {
  NaiveDate::parse_from_str(date, "%Y-%m-%d")
    .map_err(|_| AppError::invalid_input("La fecha debe tener formato YYYY-MM-DD"))
}

pub fn ensure_amount_positive(amount: f64) -> Result<(), AppError> {
  if !amount.is_finite() {
    return Err(AppError::invalid_input("El monto debe ser un número válido"));
  }
  if amount <= 0.0 {
    return Err(AppError::invalid_input("El monto debe ser mayor a 0"));
  }
  Ok(())
}

pub fn ensure_amount_non_negative(amount: f64) -> Result<(), AppError> {
  if !amount.is_finite() {
    return Err(AppError::invalid_input("El monto debe ser un número válido"));
  }
  if amount < 0.0 {
    return Err(AppError::invalid_input("El monto no puede ser negativo"));
  }
  Ok(())
}

pub fn ensure_category(category: &str) -> Result<(), AppError> {
  if category.trim().is_empty() {
    return Err(AppError::invalid_input("La categoría es requerida"));
  }
  if category.chars().count() > 50 {
    return Err(AppError::invalid_input(
      "La categoría no puede tener más de 50 caracteres",
    ));
  }
  Ok(())
}

pub fn ensure_subcategory(subcategory: Option<&str>) -> Result<(), AppError> {
  if let Some(value) = subcategory {
    if value.chars().count() > 50 {
      return Err(AppError::invalid_input(
        "La subcategoría no puede tener más de 50 caracteres",
      ));
    }
  }
  Ok(())
}

pub fn ensure_description_required(description: &str) -> Result<(), AppError> {
  if description.trim().is_empty() {
    return Err(AppError::invalid_input("La descripción es requerida"));
  }
  ensure_description_length(description)
}

pub fn ensure_description_length(description: &str) -> Result<(), AppError> {
  if description.chars().count() > 255 {
    return Err(AppError::invalid_input(
      "La descripción no puede tener más de 255 caracteres",
    ));
  }
  Ok(())
}

pub fn ensure_game(game: &str) -> Result<(), AppError> {
  if game.trim().is_empty() {
    return Err(AppError::invalid_input("El juego es requerido"));
  }
  if game.chars().count() > 50 {
    return Err(AppError::invalid_input(
      "El juego no puede tener más de 50 caracteres",
    ));
  }
  Ok(())
}
