use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::audit::append_audit;
use crate::db;
use crate::domain::games::{self, Game};
use crate::error::AppError;
use crate::models::{
  DrawTime, ExpenseUpdateInput, NewExpenseInput, NewQuinielaInput, QuinielaUpdateInput, Settings,
  SettlementInput,
};
use crate::reports;
use crate::service;
use crate::settings;
use crate::store::Store;
use crate::AppState;

pub fn run(state: &AppState, port: u16) -> Result<(), AppError> {
  let server = Server::http(("0.0.0.0", port)).map_err(|err| {
    AppError::Io(std::io::Error::new(std::io::ErrorKind::AddrInUse, err.to_string()))
  })?;
  log::info!("API escuchando en http://{}:{}", local_ip_string(), port);

  for request in server.incoming_requests() {
    handle_request(request, state);
  }
  Ok(())
}

pub fn local_ip_string() -> String {
  local_ip_address::local_ip()
    .map(|ip| ip.to_string())
    .unwrap_or_else(|_| "0.0.0.0".to_string())
}

fn handle_request(mut request: Request, state: &AppState) {
  let method = request.method().clone();
  let url = request.url().to_string();
  let mut parts = url.splitn(2, '?');
  let path = parts.next().unwrap_or("");
  let query = parts.next().unwrap_or("");
  let segments: Vec<&str> = path
    .trim_start_matches('/')
    .split('/')
    .filter(|segment| !segment.is_empty())
    .collect();

  let response = match (method, segments.as_slice()) {
    (Method::Get, ["api", "v1", "health"]) => handle_health(),
    (Method::Get, ["api", "v1", "cuentas"]) => respond(state.store.accounts()),
    (Method::Get, ["api", "v1", "configuracion"]) => handle_get_settings(state),
    (Method::Put, ["api", "v1", "configuracion"]) => handle_update_settings(&mut request, state),

    (Method::Get, ["api", "v1", "gastos", fecha]) => handle_list_expenses(&request, state, fecha),
    (Method::Post, ["api", "v1", "gastos"]) => handle_create_expense(&mut request, state),
    (Method::Put, ["api", "v1", "gastos", id]) => handle_update_expense(&mut request, state, id),
    (Method::Delete, ["api", "v1", "gastos", id]) => handle_delete_expense(&request, state, id),

    (Method::Get, ["api", "v1", "quinielas", "transacciones", fecha]) => {
      handle_list_quiniela(&request, state, fecha)
    }
    (Method::Post, ["api", "v1", "quinielas", "transacciones"]) => {
      handle_create_quiniela(&mut request, state)
    }
    (Method::Put, ["api", "v1", "quinielas", "transacciones", id]) => {
      handle_update_quiniela(&mut request, state, id)
    }
    (Method::Delete, ["api", "v1", "quinielas", "transacciones", id]) => {
      handle_delete_quiniela(&request, state, id)
    }
    (Method::Post, ["api", "v1", "quinielas", "cierre-dia"]) => {
      handle_settlement(&mut request, state)
    }
    (Method::Get, ["api", "v1", "quinielas", "horarios"]) => handle_draw_times(&request, state),
    (Method::Post, ["api", "v1", "quinielas", "horarios"]) => {
      handle_update_draw_times(&mut request, state)
    }
    (Method::Get, ["api", "v1", "quinielas", "estado-modalidades"]) => {
      handle_modality_status(&request, state)
    }
    (Method::Get, ["api", "v1", "quinielas", "categorias", juego]) => handle_game_categories(juego),
    (Method::Get, ["api", "v1", "quinielas", "juegos"]) => handle_games(),

    (Method::Get, ["api", "v1", "saldos", "saldo-anterior", fecha]) => {
      handle_opening_balance(&request, state, fecha)
    }
    (Method::Get, ["api", "v1", "saldos", "datos-dia", fecha]) => {
      handle_day_data(&request, state, fecha)
    }
    (Method::Post, ["api", "v1", "saldos", "finalizar-dia", fecha]) => {
      handle_finalize_day(&request, state, fecha)
    }
    (Method::Get, ["api", "v1", "saldos", "dias-finalizados"]) => {
      handle_finalized_days(&request, state)
    }
    (Method::Get, ["api", "v1", "saldos", "resumen-mensual", anio, mes]) => {
      handle_month_overview(&request, state, anio, mes)
    }

    (Method::Get, ["api", "v1", "auditoria"]) => handle_audit(state, query),

    _ => json_error(StatusCode(404), "NOT_FOUND", "Ruta no encontrada"),
  };
  let _ = request.respond(response);
}

fn handle_health() -> Response<std::io::Cursor<Vec<u8>>> {
  json_response(StatusCode(200), &serde_json::json!({ "status": "ok" }))
}

fn handle_get_settings(state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  respond(db::with_conn(&state.store.db, |conn| settings::get_settings(conn)))
}

fn handle_update_settings(request: &mut Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let actor = read_header(request, "X-Caja-Actor");
  let input: Settings = match read_body(request) {
    Ok(input) => input,
    Err(err) => return error_response(&err),
  };

  let payload_json = serde_json::to_string(&input).unwrap_or_else(|_| "{}".to_string());
  respond(db::with_conn(&state.store.db, |conn| {
    let tx = conn.transaction()?;
    settings::update_settings(&tx, &input)?;
    append_audit(&tx, actor, "UPDATE_SETTINGS", "SETTINGS", None, None, payload_json, None)?;
    tx.commit()?;
    settings::get_settings(conn)
  }))
}

fn handle_list_expenses(request: &Request, state: &AppState, date: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  respond(service::list_expenses(&state.store, account_id, date))
}

fn handle_create_expense(request: &mut Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let actor = read_header(request, "X-Caja-Actor");
  let input: NewExpenseInput = match read_body(request) {
    Ok(input) => input,
    Err(err) => return error_response(&err),
  };
  respond(service::create_expense(&state.store, account_id, input, actor.as_deref()))
}

fn handle_update_expense(
  request: &mut Request,
  state: &AppState,
  id: &str,
) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let id = match parse_id(id) {
    Ok(id) => id,
    Err(err) => return error_response(&err),
  };
  let actor = read_header(request, "X-Caja-Actor");
  let input: ExpenseUpdateInput = match read_body(request) {
    Ok(input) => input,
    Err(err) => return error_response(&err),
  };
  respond(service::update_expense(&state.store, account_id, id, input, actor.as_deref()))
}

fn handle_delete_expense(request: &Request, state: &AppState, id: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let id = match parse_id(id) {
    Ok(id) => id,
    Err(err) => return error_response(&err),
  };
  let actor = read_header(request, "X-Caja-Actor");
  match service::delete_expense(&state.store, account_id, id, actor.as_deref()) {
    Ok(()) => json_response(StatusCode(200), &serde_json::json!({ "ok": true })),
    Err(err) => error_response(&err),
  }
}

fn handle_list_quiniela(request: &Request, state: &AppState, date: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  respond(service::list_quiniela(&state.store, account_id, date))
}

fn handle_create_quiniela(request: &mut Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let actor = read_header(request, "X-Caja-Actor");
  let input: NewQuinielaInput = match read_body(request) {
    Ok(input) => input,
    Err(err) => return error_response(&err),
  };
  respond(service::create_quiniela(&state.store, account_id, input, actor.as_deref()))
}

fn handle_update_quiniela(
  request: &mut Request,
  state: &AppState,
  id: &str,
) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let id = match parse_id(id) {
    Ok(id) => id,
    Err(err) => return error_response(&err),
  };
  let actor = read_header(request, "X-Caja-Actor");
  let input: QuinielaUpdateInput = match read_body(request) {
    Ok(input) => input,
    Err(err) => return error_response(&err),
  };
  respond(service::update_quiniela(&state.store, account_id, id, input, actor.as_deref()))
}

fn handle_delete_quiniela(request: &Request, state: &AppState, id: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let id = match parse_id(id) {
    Ok(id) => id,
    Err(err) => return error_response(&err),
  };
  let actor = read_header(request, "X-Caja-Actor");
  match service::delete_quiniela(&state.store, account_id, id, actor.as_deref()) {
    Ok(()) => json_response(StatusCode(200), &serde_json::json!({ "ok": true })),
    Err(err) => error_response(&err),
  }
}

fn handle_settlement(request: &mut Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let actor = read_header(request, "X-Caja-Actor");
  let input: SettlementInput = match read_body(request) {
    Ok(input) => input,
    Err(err) => return error_response(&err),
  };
  respond(service::settle_game_day(&state.store, account_id, input, actor.as_deref()))
}

fn handle_draw_times(request: &Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  respond(service::get_draw_times(&state.store, account_id))
}

fn handle_update_draw_times(request: &mut Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let actor = read_header(request, "X-Caja-Actor");
  let times: Vec<DrawTime> = match read_body(request) {
    Ok(times) => times,
    Err(err) => return error_response(&err),
  };
  respond(service::update_draw_times(&state.store, account_id, times, actor.as_deref()))
}

fn handle_modality_status(request: &Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  respond(service::get_modality_status(&state.store, account_id))
}

fn handle_game_categories(game: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  json_response(
    StatusCode(200),
    &serde_json::json!({
      "income": games::income_categories(game),
      "egress": games::egress_categories(),
    }),
  )
}

fn handle_games() -> Response<std::io::Cursor<Vec<u8>>> {
  let catalog: Vec<serde_json::Value> = Game::CATALOG
    .iter()
    .map(|game| {
      serde_json::json!({
        "name": game.display_name(),
        "pooled": game.is_pooled(),
      })
    })
    .collect();
  json_response(StatusCode(200), &catalog)
}

fn handle_opening_balance(request: &Request, state: &AppState, date: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  respond(
    service::get_opening_balance(&state.store, account_id, date)
      .map(|opening| serde_json::json!({ "opening_balance": opening })),
  )
}

fn handle_day_data(request: &Request, state: &AppState, date: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  respond(service::get_day_data(&state.store, account_id, date))
}

fn handle_finalize_day(request: &Request, state: &AppState, date: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let actor = read_header(request, "X-Caja-Actor");
  respond(service::finalize_day(&state.store, account_id, date, actor.as_deref()))
}

fn handle_finalized_days(request: &Request, state: &AppState) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  respond(state.store.list_finalized_days(account_id))
}

fn handle_month_overview(
  request: &Request,
  state: &AppState,
  year: &str,
  month: &str,
) -> Response<std::io::Cursor<Vec<u8>>> {
  let account_id = match resolve_account(request, state) {
    Ok(id) => id,
    Err(response) => return response,
  };
  let year = match year.parse::<i32>() {
    Ok(value) => value,
    Err(_) => return error_response(&AppError::invalid_input("El año debe ser numérico")),
  };
  let month = match month.parse::<u32>() {
    Ok(value) => value,
    Err(_) => return error_response(&AppError::invalid_input("El mes debe ser numérico")),
  };
  respond(reports::month_overview(&state.store, account_id, year, month))
}

fn handle_audit(state: &AppState, query: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  let page = query_param(query, "page")
    .and_then(|value| value.parse::<i64>().ok())
    .unwrap_or(1);
  let page_size = query_param(query, "page_size")
    .and_then(|value| value.parse::<i64>().ok())
    .unwrap_or(50);
  respond(state.store.list_audit(page, page_size))
}

// The account comes from the X-Caja-Account header; without it the
// configured default account is used.
fn resolve_account(request: &Request, state: &AppState) -> Result<i64, Response<std::io::Cursor<Vec<u8>>>> {
  let account_id = match read_header(request, "X-Caja-Account") {
    Some(value) => match value.trim().parse::<i64>() {
      Ok(id) => id,
      Err(_) => {
        return Err(error_response(&AppError::invalid_input(
          "El encabezado X-Caja-Account debe ser numérico",
        )))
      }
    },
    None => match db::with_conn(&state.store.db, |conn| settings::get_settings(conn)) {
      Ok(settings) => settings.default_account_id,
      Err(err) => return Err(error_response(&err)),
    },
  };

  let known = match state.store.accounts() {
    Ok(accounts) => accounts.iter().any(|account| account.id == account_id),
    Err(err) => return Err(error_response(&err)),
  };
  if !known {
    return Err(error_response(&AppError::not_found("Cuenta desconocida")));
  }
  Ok(account_id)
}

fn read_body<T: serde::de::DeserializeOwned>(request: &mut Request) -> Result<T, AppError> {
  let mut body = Vec::new();
  if request.as_reader().read_to_end(&mut body).is_err() {
    return Err(AppError::invalid_input("No se pudo leer el cuerpo de la solicitud"));
  }
  serde_json::from_slice(&body)
    .map_err(|_| AppError::invalid_input("El cuerpo de la solicitud no es JSON válido"))
}

fn read_header(request: &Request, name: &str) -> Option<String> {
  request
    .headers()
    .iter()
    .find(|header| header.field.as_str().as_str().eq_ignore_ascii_case(name))
    .map(|header| header.value.to_string())
}

fn query_param(query: &str, name: &str) -> Option<String> {
  query.split('&').find_map(|pair| {
    let mut parts = pair.splitn(2, '=');
    match (parts.next(), parts.next()) {
      (Some(key), Some(value)) if key == name => Some(value.to_string()),
      _ => None,
    }
  })
}

fn parse_id(value: &str) -> Result<i64, AppError> {
  value
    .parse::<i64>()
    .map_err(|_| AppError::invalid_input("El identificador debe ser numérico"))
}

fn respond<T: Serialize>(result: Result<T, AppError>) -> Response<std::io::Cursor<Vec<u8>>> {
  match result {
    Ok(payload) => json_response(StatusCode(200), &payload),
    Err(err) => error_response(&err),
  }
}

fn error_response(err: &AppError) -> Response<std::io::Cursor<Vec<u8>>> {
  if err.is_client_error() {
    log::warn!("solicitud rechazada: {}", err);
  } else {
    log::error!("error interno: {}", err);
  }
  json_response(StatusCode(status_for(err)), err)
}

fn status_for(err: &AppError) -> u16 {
  match err {
    AppError::NotFound(_) => 404,
    AppError::AlreadyFinalized(_) => 409,
    AppError::DayFinalized(_) | AppError::FutureDate(_) | AppError::InvalidInput(_) => 400,
    _ => 500,
  }
}

fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response<std::io::Cursor<Vec<u8>>> {
  let body = serde_json::to_vec(payload).unwrap_or_else(|_| b"{}".to_vec());
  let mut response = Response::from_data(body);
  response = response.with_status_code(status);
  response.add_header(json_header("Content-Type", "application/json"));
  response
}

fn json_error(status: StatusCode, code: &str, message: &str) -> Response<std::io::Cursor<Vec<u8>>> {
  json_response(
    status,
    &serde_json::json!({
      "code": code,
      "message": message,
    }),
  )
}

fn json_header(name: &str, value: &str) -> Header {
  Header::from_bytes(name, value).unwrap()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_codes_follow_the_error_kind() {
    assert_eq!(status_for(&AppError::invalid_input("x")), 400);
    assert_eq!(status_for(&AppError::day_finalized("x")), 400);
    assert_eq!(status_for(&AppError::future_date("x")), 400);
    assert_eq!(status_for(&AppError::not_found("x")), 404);
    assert_eq!(status_for(&AppError::already_finalized("x")), 409);
    assert_eq!(status_for(&AppError::Lock), 500);
  }

  #[test]
  fn query_params_are_read_by_name() {
    assert_eq!(query_param("page=2&page_size=10", "page").as_deref(), Some("2"));
    assert_eq!(query_param("page=2&page_size=10", "page_size").as_deref(), Some("10"));
    assert_eq!(query_param("page=2", "page_size"), None);
    assert_eq!(query_param("", "page"), None);
    assert_eq!(query_param("flag&page=7", "page").as_deref(), Some("7"));
  }

  #[test]
  fn path_ids_must_be_numeric() {
    assert_eq!(parse_id("42").unwrap(), 42);
    assert!(parse_id("abc").is_err());
    assert!(parse_id("").is_err());
  }
}
