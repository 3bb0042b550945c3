use crate::Generator;
use pinhole_core::ShortCode;
use rand::distr::Alphanumeric;
use rand::Rng;

pub const DEFAULT_LENGTH: usize = 6;

/// Produces a uniformly random string over `[A-Za-z0-9]` of exactly `length`
/// characters.
pub fn generate(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Random fixed-length alphanumeric code generator.
///
/// At the default length there are 62^6 (about 5.7e10) candidates, so
/// collisions are rare but possible; the shortening engine retries them.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH)
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        ShortCode::new_unchecked(generate(self.length))
    }
}
