pub mod app;
pub mod config;
pub mod controller;
pub mod errors;
pub mod filter;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod ui;
mod wire;

#[cfg(test)]
mod testing;

pub use app::{App, build};
pub use config::Config;
pub use controller::ViewController;
pub use errors::{MutationOutcome, Rejection};
pub use gateway::{HttpGateway, RemoteGateway};
pub use session::{AuthPhase, SessionStore};
pub use store::CounterStore;
