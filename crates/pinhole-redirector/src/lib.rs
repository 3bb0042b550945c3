//! Resolution engine.
//!
//! This crate provides a [`RedirectorService`] that resolves short codes to
//! their target URLs, enforces expiration and counts visits. Counting is a
//! compare-and-swap against the repository, so concurrent resolutions never
//! lose a visit or overshoot a visit limit.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pinhole_core::{Redirector, Resolution, ShortCode};
//! use pinhole_redirector::RedirectorService;
//! use pinhole_storage::InMemoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedirectorService::new(Arc::new(InMemoryRepository::new()));
//!
//! let code = ShortCode::new("abc123")?;
//! if let Resolution::Redirect(url) = service.resolve(&code, None).await? {
//!     println!("Redirect to: {}", url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod service;

pub use service::RedirectorService;
