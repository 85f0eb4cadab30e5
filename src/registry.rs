//! Insertion-ordered, id-keyed record collections.
//!
//! Records are only ever added at seed time and never removed, so the
//! position index stays valid for the life of the registry.

use std::collections::HashMap;

use crate::error::{EngineError, EntityKind};

pub trait Keyed {
    const KIND: EntityKind;
    fn id(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct Registry<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed + Clone> Registry<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_records(records: Vec<T>) -> Result<Self, EngineError> {
        let mut reg = Self::new();
        for record in records {
            reg.insert(record)?;
        }
        Ok(reg)
    }

    pub fn insert(&mut self, record: T) -> Result<(), EngineError> {
        let id = record.id().to_string();
        if self.index.contains_key(&id) {
            return Err(EngineError::DuplicateId { kind: T::KIND, id });
        }
        self.index.insert(id, self.items.len());
        self.items.push(record);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.index.get(id) {
            Some(&i) => self.items.get_mut(i),
            None => None,
        }
    }

    /// Like `get`, but a missing id is a `NotFound` error.
    pub fn require(&self, id: &str) -> Result<&T, EngineError> {
        self.get(id).ok_or_else(|| EngineError::not_found(T::KIND, id))
    }

    pub fn require_mut(&mut self, id: &str) -> Result<&mut T, EngineError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.items[i]),
            None => Err(EngineError::not_found(T::KIND, id)),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|r| r.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cloned records in seed order.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: Keyed + Clone> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
