use rusqlite::{params, Connection};

use crate::error::AppError;
use crate::models::Settings;

const KEY_SHOP_NAME: &str = "shop_name";
const KEY_DEFAULT_ACCOUNT: &str = "default_account_id";

pub fn ensure_defaults(conn: &Connection, default_account_id: i64) -> Result<(), AppError> {
  conn.execute(
    "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
    params![KEY_SHOP_NAME, "Agencia de Quiniela"],
  )?;
  conn.execute(
    "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
    params![KEY_DEFAULT_ACCOUNT, default_account_id.to_string()],
  )?;
  Ok(())
}

pub fn get_settings(conn: &Connection) -> Result<Settings, AppError> {
  let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
  let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

  let mut shop_name = "Agencia de Quiniela".to_string();
  let mut default_account_id = 1_i64;

  for row in rows {
    let (key, value) = row?;
    match key.as_str() {
      KEY_SHOP_NAME => {
        shop_name = value;
      }
      KEY_DEFAULT_ACCOUNT => {
        default_account_id = value.parse().unwrap_or(default_account_id);
      }
      _ => {}
    }
  }

  Ok(Settings {
    shop_name,
    default_account_id,
  })
}

pub fn update_settings(conn: &Connection, settings: &Settings) -> Result<(), AppError> {
  conn.execute(
    "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
    params![KEY_SHOP_NAME, settings.shop_name.clone()],
  )?;
  conn.execute(
    "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
    params![KEY_DEFAULT_ACCOUNT, settings.default_account_id.to_string()],
  )?;
  Ok(())
}
