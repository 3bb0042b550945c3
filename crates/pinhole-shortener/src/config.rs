use std::collections::HashSet;
use typed_builder::TypedBuilder;

/// Words that cannot be claimed as custom aliases because they collide with
/// routes of the HTTP surface.
pub const DEFAULT_RESERVED_ALIASES: &[&str] = &[
    "api", "admin", "health", "login", "logout", "static", "shorten", "status", "v1",
];

pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 64;
pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const MAX_RECENT_LIMIT: usize = 100;

/// A case-insensitive set of reserved aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedAliases(HashSet<String>);

impl ReservedAliases {
    pub fn contains(&self, alias: &str) -> bool {
        self.0.contains(&alias.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ReservedAliases {
    fn default() -> Self {
        DEFAULT_RESERVED_ALIASES.iter().copied().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ReservedAliases {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|word| word.as_ref().trim().to_ascii_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        )
    }
}

/// Tunables of the shortening engine.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    #[builder(default)]
    pub reserved_aliases: ReservedAliases,
    /// Upper bound on generate-and-check rounds for one request.
    #[builder(default = DEFAULT_MAX_GENERATION_ATTEMPTS)]
    pub max_generation_attempts: u32,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
