pub mod audit;
pub mod db;
pub mod domain;
pub mod error;
pub mod models;
pub mod reports;
pub mod server;
pub mod service;
pub mod settings;
pub mod store;

use store::sqlite::SqliteStore;

pub struct AppState {
  pub store: SqliteStore,
}
