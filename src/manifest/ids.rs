use super::Document;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::collections::HashSet;

/// Width of an object identifier in hex characters.
pub const ID_LEN: usize = 24;

/// Generates 24-character uppercase hex identifiers, Xcode style.
///
/// Identifiers come from 96 random bits. An identifier is never handed out
/// twice by the same generator and never collides with text already present
/// in the document it is generated for.
pub struct IdGenerator<R: Rng = ThreadRng> {
    rng: R,
    issued: HashSet<String>,
}

impl IdGenerator<ThreadRng> {
    /// Generator backed by the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(rand::rng())
    }
}

impl Default for IdGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> IdGenerator<R> {
    /// Generator backed by `rng`; a seeded RNG gives reproducible output.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    /// Fresh identifier not present in `doc`.
    pub fn new_id(&mut self, doc: &Document) -> String {
        loop {
            let bits = self.rng.random::<u128>() >> 32;
            let id = format!("{bits:0width$X}", width = ID_LEN);
            if !doc.contains_id(&id) && self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}
