//! Core types and traits for the Pinhole URL shortener.
//!
//! This crate provides the shared vocabulary used by the shortening engine,
//! the resolution engine and the storage backends: the [`ShortLink`] record,
//! the pure expiration rules, the [`Repository`] contract and the error
//! taxonomy.

pub mod error;
pub mod expiration;
pub mod link;
pub mod lookup;
pub mod redirector;
pub mod repository;
pub mod shortcode;
pub mod shortener;
pub mod sweeper;

pub use error::{ShortenerError, StorageError};
pub use expiration::ExpirationMode;
pub use link::{ShortLink, Visit};
pub use lookup::Lookup;
pub use redirector::{Redirector, Resolution};
pub use repository::{ReadRepository, Repository, VisitUpdate};
pub use shortcode::ShortCode;
pub use shortener::{LinkStatus, ShortenParams, Shortener};
pub use sweeper::{CleanupAction, CleanupReport, Sweeper};
