use std::sync::Arc;

use pinhole_core::{Redirector, Shortener, Sweeper};
use pinhole_shortener::AdminGuard;
use typed_builder::TypedBuilder;

#[derive(Clone, TypedBuilder)]
pub struct AppState {
    pub shortener: Arc<dyn Shortener>,
    pub redirector: Arc<dyn Redirector>,
    pub sweeper: Arc<dyn Sweeper>,
    #[builder(default, setter(transform = |guard: AdminGuard| Arc::new(guard)))]
    pub admin: Arc<AdminGuard>,
    /// Prefix of every public short URL, e.g. `https://pin.example`.
    #[builder(setter(into))]
    pub base_url: String,
}
