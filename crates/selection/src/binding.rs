use std::{fmt, sync::Arc};

use shared::{
    domain::{Identifier, Record, StateKey},
    error::{Result, SelectionError},
};

type IdentityFn<R> = dyn Fn(&R) -> Option<Identifier> + Send + Sync;

/// Ties a controller to one state key and a way of reading record identity.
pub struct SelectionBinding<R> {
    state_key: StateKey,
    identity: Arc<IdentityFn<R>>,
}

impl<R> SelectionBinding<R> {
    pub fn new<F>(state_key: StateKey, identity: F) -> Self
    where
        F: Fn(&R) -> Option<Identifier> + Send + Sync + 'static,
    {
        Self {
            state_key,
            identity: Arc::new(identity),
        }
    }

    pub fn state_key(&self) -> &StateKey {
        &self.state_key
    }

    /// `None` means the record has no usable identity and is never selected.
    pub fn identify(&self, record: &R) -> Option<Identifier> {
        (self.identity)(record)
    }
}

impl<R: Record + 'static> SelectionBinding<R> {
    /// Reads identity from the named record field.
    pub fn for_field(state_key: StateKey, field: impl Into<String>) -> Result<Self> {
        let field = field.into();
        let field = field.trim().to_string();
        if field.is_empty() {
            return Err(SelectionError::Configuration(
                "record index field must not be empty".to_string(),
            ));
        }
        Ok(Self::new(state_key, move |record: &R| record.field(&field)))
    }
}

impl<R> Clone for SelectionBinding<R> {
    fn clone(&self) -> Self {
        Self {
            state_key: self.state_key.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<R> fmt::Debug for SelectionBinding<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionBinding")
            .field("state_key", &self.state_key)
            .finish_non_exhaustive()
    }
}
