use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::AppError;
use crate::models::{AuditLogEntry, Paginated};

pub fn append_audit(
  conn: &Connection,
  actor: Option<String>,
  action: &str,
  entity_type: &str,
  entity_id: Option<String>,
  ref_id: Option<String>,
  payload_json: String,
  details: Option<String>,
) -> Result<(), AppError> {
  let ts = Utc::now().to_rfc3339();
  conn.execute(
    "INSERT INTO audit_log (ts, actor, action, entity_type, entity_id, ref_id, payload_json, details) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      ts,
      actor,
      action,
      entity_type,
      entity_id,
      ref_id,
      payload_json,
      details
    ],
  )?;
  Ok(())
}

pub fn list_audit_log(
  conn: &Connection,
  page: i64,
  page_size: i64,
) -> Result<Paginated<AuditLogEntry>, AppError> {
  let page = if page < 1 { 1 } else { page };
  let page_size = if page_size < 1 { 100 } else { page_size };
  let offset = (page - 1) * page_size;

  let total: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
  let mut stmt = conn.prepare(
    "SELECT id, ts, actor, action, entity_type, entity_id, ref_id, payload_json, details
     FROM audit_log
     ORDER BY ts DESC, id DESC
     LIMIT ?1 OFFSET ?2",
  )?;
  let rows = stmt.query_map(params![page_size, offset], |row| {
    Ok(AuditLogEntry {
      id: row.get(0)?,
      ts: row.get(1)?,
      actor: row.get(2)?,
      action: row.get(3)?,
      entity_type: row.get(4)?,
      entity_id: row.get(5)?,
      ref_id: row.get(6)?,
      payload_json: row.get(7)?,
      details: row.get(8)?,
    })
  })?;

  let mut items = Vec::new();
  for row in rows {
    items.push(row?);
  }

  Ok(Paginated { total, items })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db;

  fn test_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::run_migrations(&mut conn).unwrap();
    conn
  }

  #[test]
  fn append_and_list_newest_first() {
    let conn = test_conn();
    append_audit(&conn, Some("ana".to_string()), "CREATE_EXPENSE", "EXPENSE", Some("1".to_string()), None, "{}".to_string(), None).unwrap();
    append_audit(&conn, None, "UPDATE_EXPENSE", "EXPENSE", Some("1".to_string()), None, "{}".to_string(), None).unwrap();
    append_audit(&conn, None, "FINALIZE_DAY", "DAY", Some("2024-03-05".to_string()), None, "{}".to_string(), None).unwrap();

    let log = list_audit_log(&conn, 1, 10).unwrap();
    assert_eq!(log.total, 3);
    assert_eq!(log.items[0].action, "FINALIZE_DAY");
    assert_eq!(log.items[2].action, "CREATE_EXPENSE");
    assert_eq!(log.items[2].actor.as_deref(), Some("ana"));
  }

  #[test]
  fn pagination_clamps_invalid_values() {
    let conn = test_conn();
    for i in 0..5 {
      append_audit(&conn, None, "CREATE_EXPENSE", "EXPENSE", Some(i.to_string()), None, "{}".to_string(), None).unwrap();
    }

    let page = list_audit_log(&conn, 2, 2).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);

    let clamped = list_audit_log(&conn, 0, -1).unwrap();
    assert_eq!(clamped.items.len(), 5);
  }
}
