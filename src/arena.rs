//! Clause storage for a single query model.
//!
//! Clauses never point at each other directly. A clause refers to another
//! clause's item through a [`ClauseId`], which is only meaningful inside the
//! arena that allocated it: every handle carries the [`ModelId`] of its arena,
//! so a handle leaking from one model into another is detectable.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::clauses::Clause;
use crate::error::{QueryError, QueryResult};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one clause arena (and therefore of one query model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a clause inside a [`ClauseArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseId {
    model: ModelId,
    index: usize,
}

impl ClauseId {
    /// The model whose arena allocated this handle
    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.model, self.index)
    }
}

/// Slot storage for the clauses of one model.
///
/// Slots are reserved before they are filled so that a clause can be
/// registered under its final handle before its dependents are cloned.
#[derive(Debug)]
pub struct ClauseArena {
    model: ModelId,
    slots: Vec<Option<Clause>>,
}

impl ClauseArena {
    /// Create an empty arena with a fresh model identity.
    pub fn new() -> Self {
        ClauseArena {
            model: ModelId::next(),
            slots: Vec::new(),
        }
    }

    pub fn model_id(&self) -> ModelId {
        self.model
    }

    /// Reserve a handle for a clause that will be stored with [`fill`](Self::fill).
    pub fn reserve(&mut self) -> ClauseId {
        let id = self.next_id();
        self.slots.push(None);
        id
    }

    /// Store a clause in a previously reserved slot.
    pub fn fill(&mut self, id: ClauseId, clause: Clause) -> QueryResult<()> {
        self.check_owner(id)?;
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.is_none() => {
                *slot = Some(clause);
                Ok(())
            }
            Some(_) => Err(QueryError::InvalidOperation(format!(
                "clause slot {} is already filled",
                id
            ))),
            None => Err(QueryError::NotFound(format!("clause slot {}", id))),
        }
    }

    /// The handle the next [`insert`](Self::insert) or [`reserve`](Self::reserve) will return.
    pub fn next_id(&self) -> ClauseId {
        ClauseId {
            model: self.model,
            index: self.slots.len(),
        }
    }

    /// Reserve and fill in one step.
    pub fn insert(&mut self, clause: Clause) -> ClauseId {
        let id = self.next_id();
        self.slots.push(Some(clause));
        id
    }

    pub fn get(&self, id: ClauseId) -> QueryResult<&Clause> {
        self.check_owner(id)?;
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| QueryError::NotFound(format!("clause {}", id)))
    }

    pub fn get_mut(&mut self, id: ClauseId) -> QueryResult<&mut Clause> {
        self.check_owner(id)?;
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| QueryError::NotFound(format!("clause {}", id)))
    }

    /// True when `id` belongs to this arena and its slot is reserved.
    pub fn contains(&self, id: ClauseId) -> bool {
        id.model == self.model && id.index() < self.slots.len()
    }

    /// Number of reserved slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn check_owner(&self, id: ClauseId) -> QueryResult<()> {
        if id.model != self.model {
            return Err(QueryError::NotFound(format!(
                "clause {} belongs to model {}, not model {}",
                id, id.model, self.model
            )));
        }
        Ok(())
    }
}

impl Default for ClauseArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clauses::WhereClause;
    use crate::ast::Expr;

    fn where_clause() -> Clause {
        Clause::Where(WhereClause::new(Expr::Boolean(true)))
    }

    #[test]
    fn test_arenas_have_distinct_identities() {
        let a = ClauseArena::new();
        let b = ClauseArena::new();
        assert_ne!(a.model_id(), b.model_id());
    }

    #[test]
    fn test_reserve_then_fill() {
        let mut arena = ClauseArena::new();
        let id = arena.reserve();
        assert!(arena.contains(id));
        assert!(arena.get(id).unwrap_err().is_not_found());

        arena.fill(id, where_clause()).unwrap();
        assert!(arena.get(id).is_ok());
        assert!(arena.fill(id, where_clause()).unwrap_err().is_invalid_operation());
    }

    #[test]
    fn test_handles_index_slots_in_order() {
        let mut arena = ClauseArena::new();
        let ids: Vec<usize> = (0..5).map(|_| arena.insert(where_clause()).index()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(arena.next_id().index(), 5);
    }

    #[test]
    fn test_foreign_handle_is_rejected() {
        let mut a = ClauseArena::new();
        let b = ClauseArena::new();
        let id = a.insert(where_clause());
        assert!(!b.contains(id));
        assert!(b.get(id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_display() {
        let mut arena = ClauseArena::new();
        let id = arena.insert(where_clause());
        assert_eq!(id.to_string(), format!("#{}:0", arena.model_id()));
    }
}
