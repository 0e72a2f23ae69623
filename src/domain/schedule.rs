use chrono::{NaiveTime, Timelike};

use crate::error::AppError;
use crate::models::{DrawTime, ModalityStatus};

pub fn default_draw_times() -> Vec<DrawTime> {
  [
    (1, "La Primera", "08:00", "09:15"),
    (2, "Matutina", "08:00", "11:45"),
    (3, "Vespertina", "08:00", "13:15"),
    (4, "De la Tarde", "08:00", "18:45"),
    (5, "Nocturna", "08:00", "20:45"),
  ]
  .into_iter()
  .map(|(modality_id, modality, opens_at, closes_at)| DrawTime {
    modality_id,
    modality: modality.to_string(),
    opens_at: opens_at.to_string(),
    closes_at: closes_at.to_string(),
  })
  .collect()
}

pub fn parse_clock_minutes(value: &str) -> Result<i64, AppError> {
  let trimmed = value.trim();
  let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
    .map_err(|_| AppError::invalid_input("El horario debe tener formato HH:MM"))?;
  Ok(i64::from(parsed.hour()) * 60 + i64::from(parsed.minute()))
}

pub fn ensure_draw_times(times: &[DrawTime]) -> Result<(), AppError> {
  if times.is_empty() {
    return Err(AppError::invalid_input("Se requiere un array de horarios válido"));
  }
  for time in times {
    if time.modality.trim().is_empty() || time.modality_id <= 0 {
      return Err(AppError::invalid_input(
        "Faltan campos requeridos en la configuración de horarios",
      ));
    }
    parse_clock_minutes(&time.opens_at)?;
    parse_clock_minutes(&time.closes_at)?;
  }
  Ok(())
}

// A modality accepts bets all day until its closing time.
pub fn modality_status(times: &[DrawTime], now: NaiveTime) -> Result<Vec<ModalityStatus>, AppError> {
  let current = i64::from(now.hour()) * 60 + i64::from(now.minute());
  let current_time = format!("{:02}:{:02}", now.hour(), now.minute());

  let mut statuses = Vec::with_capacity(times.len());
  for time in times {
    let closes = parse_clock_minutes(&time.closes_at)?;
    let open = current < closes;
    statuses.push(ModalityStatus {
      modality_id: time.modality_id,
      modality: time.modality.clone(),
      opens_at: time.opens_at.clone(),
      closes_at: time.closes_at.clone(),
      open,
      minutes_left: if open { closes - current } else { 0 },
      current_time: current_time.clone(),
    });
  }
  Ok(statuses)
}
