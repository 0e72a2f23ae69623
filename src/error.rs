use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  AlreadyFinalized(String),
  #[error("{0}")]
  DayFinalized(String),
  #[error("{0}")]
  FutureDate(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  InvalidInput(String),
  #[error("Error de base de datos: {0}")]
  Db(#[from] rusqlite::Error),
  #[error("Error de E/S: {0}")]
  Io(#[from] std::io::Error),
  #[error("Error interno: acceso a la base de datos bloqueado")]
  Lock,
}

impl AppError {
  pub fn already_finalized(message: impl Into<String>) -> Self {
    AppError::AlreadyFinalized(message.into())
  }

  pub fn day_finalized(message: impl Into<String>) -> Self {
    AppError::DayFinalized(message.into())
  }

  pub fn future_date(message: impl Into<String>) -> Self {
    AppError::FutureDate(message.into())
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    AppError::NotFound(message.into())
  }

  pub fn invalid_input(message: impl Into<String>) -> Self {
    AppError::InvalidInput(message.into())
  }

  pub fn code(&self) -> &'static str {
    match self {
      AppError::AlreadyFinalized(_) => "ALREADY_FINALIZED",
      AppError::DayFinalized(_) => "DAY_FINALIZED",
      AppError::FutureDate(_) => "FUTURE_DATE",
      AppError::NotFound(_) => "NOT_FOUND",
      AppError::InvalidInput(_) => "INVALID_INPUT",
      AppError::Db(_) => "DB_ERROR",
      AppError::Io(_) => "IO_ERROR",
      AppError::Lock => "LOCK_ERROR",
    }
  }

  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      AppError::AlreadyFinalized(_)
        | AppError::DayFinalized(_)
        | AppError::FutureDate(_)
        | AppError::NotFound(_)
        | AppError::InvalidInput(_)
    )
  }
}

impl Serialize for AppError {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("AppError", 2)?;
    state.serialize_field("code", self.code())?;
    state.serialize_field("message", &self.to_string())?;
    state.end()
  }
}

impl<T> From<std::sync::PoisonError<T>> for AppError {
  fn from(_: std::sync::PoisonError<T>) -> Self {
    AppError::Lock
  }
}
