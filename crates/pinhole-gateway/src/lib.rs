//! HTTP surface of the Pinhole URL shortener.
//!
//! [`App::router`] wires the shortening, resolution and cleanup services held
//! in [`AppState`] to their routes.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::{AppError, Result};
pub use state::AppState;
