//! Savepoint name generation and bookkeeping for nested transaction levels.

use std::collections::HashSet;

use rand::Rng;

use crate::error::QueryError;

/// Source of candidate savepoint names.
///
/// Names only need to be unique among the savepoints currently open; the
/// [`SavepointStack`] rejects and redraws candidates that are already in use.
pub trait SavepointNamer: Send {
    fn next_name(&mut self) -> String;
}

/// 128 random bits, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNamer;

impl SavepointNamer for RandomNamer {
    fn next_name(&mut self) -> String {
        let mut rng = rand::rng();
        format!("{:016x}{:016x}", rng.random::<u64>(), rng.random::<u64>())
    }
}

/// `sp_1`, `sp_2`, ...: predictable names for tests and logs.
#[derive(Debug, Clone)]
pub struct SequentialNamer {
    prefix: String,
    next: u64,
}

impl SequentialNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialNamer {
    fn default() -> Self {
        Self::new("sp_")
    }
}

impl SavepointNamer for SequentialNamer {
    fn next_name(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }
}

/// Open savepoints, innermost last, plus the set of names currently in use.
///
/// The outermost `BEGIN` level is never on the stack.
pub struct SavepointStack {
    names: Vec<String>,
    registry: HashSet<String>,
    namer: Box<dyn SavepointNamer>,
}

impl SavepointStack {
    #[must_use]
    pub fn new(namer: Box<dyn SavepointNamer>) -> Self {
        Self {
            names: Vec::new(),
            registry: HashSet::new(),
            namer,
        }
    }

    /// Draw a name that no open savepoint uses, trying at most `max_attempts` candidates.
    /// At least one candidate is always drawn, even for a `max_attempts` of zero.
    ///
    /// # Errors
    /// Returns [`QueryError::Exhausted`] if every candidate was already taken.
    pub fn fresh_name(&mut self, max_attempts: usize) -> Result<String, QueryError> {
        let max_attempts = max_attempts.max(1);
        for _ in 0..max_attempts {
            let candidate = self.namer.next_name();
            if !self.registry.contains(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(name = %candidate, "savepoint name already in use, drawing again");
        }
        Err(QueryError::Exhausted(format!(
            "no unused savepoint name after {max_attempts} attempts"
        )))
    }

    /// Record a savepoint that now exists on the server.
    pub fn push(&mut self, name: String) {
        self.registry.insert(name.clone());
        self.names.push(name);
    }

    /// Take the innermost savepoint off the stack. Its name stays registered.
    pub fn pop(&mut self) -> Option<String> {
        self.names.pop()
    }

    /// Release `name` for reuse.
    pub fn forget(&mut self, name: &str) {
        self.registry.remove(name);
    }

    /// Drop every level, e.g. once the enclosing transaction has ended.
    pub fn clear(&mut self) {
        self.names.clear();
        self.registry.clear();
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }
}

impl std::fmt::Debug for SavepointStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavepointStack")
            .field("names", &self.names)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
