//! Import aliases for generated registration code.
//!
//! Two plugin packages frequently share a final path element (`.../v4`,
//! `.../plugin`), so every import is given a random five-letter alias. The
//! generator remembers what it has handed out and redraws on collision, so
//! aliases are unique within one build.

use std::collections::HashSet;

use rand::Rng;
use rand::rngs::ThreadRng;

/// Length of every generated alias.
pub const ALIAS_LEN: usize = 5;

const LETTERS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Five-letter words that would not compile, or would shadow a builtin,
/// when used as an import name.
const RESERVED: &[&str] = &[
    "break", "const", "defer", "range", "false", "close", "panic", "print", "clear", "error",
];

/// Issues unique aliases for the entries of one build.
#[derive(Debug)]
pub struct AliasGenerator<R = ThreadRng> {
    rng: R,
    issued: HashSet<String>,
}

impl AliasGenerator<ThreadRng> {
    /// Generator backed by the thread-local RNG.
    pub fn new() -> Self {
        Self::with_rng(rand::rng())
    }
}

impl Default for AliasGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> AliasGenerator<R> {
    /// Generator backed by a caller-supplied RNG (seeded in tests).
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    /// Draw an alias that has not been issued by this generator before.
    pub fn next_alias(&mut self) -> String {
        loop {
            let alias = random_alias(&mut self.rng, ALIAS_LEN);
            if RESERVED.contains(&alias.as_str()) {
                continue;
            }
            if self.issued.insert(alias.clone()) {
                return alias;
            }
            tracing::trace!(alias = %alias, "alias collision, redrawing");
        }
    }
}

/// Draw `len` letters uniformly from `[a-zA-Z]`.
pub fn random_alias<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(LETTERS[rng.random_range(0..LETTERS.len())]))
        .collect()
}
