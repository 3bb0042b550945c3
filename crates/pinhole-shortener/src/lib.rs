//! URL shortening engine.
//!
//! This crate provides [`ShortenerService`], which validates and normalizes
//! target URLs, reserves custom aliases, allocates collision-free generated
//! codes and attaches expiration policies, plus the administrative
//! [`CleanupService`] and its [`AdminGuard`].

pub mod admin;
pub mod config;
pub mod policy;
pub mod service;
pub mod sweeper;
pub mod target;

pub use admin::AdminGuard;
pub use config::{ReservedAliases, ShortenerConfig};
pub use policy::{Degradation, ResolvedExpiration};
pub use service::ShortenerService;
pub use sweeper::CleanupService;
