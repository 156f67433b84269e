use crate::error::Result;
use parking_lot::RwLock;
use shale_base::TypeDesc;
use std::collections::HashMap;

/// Process-wide memo of functions derived from a type.
///
/// Entries are pure functions of the type, they are computed outside the lock and the first
/// published one wins.
pub(crate) struct TypeCache<F> {
    entries: RwLock<HashMap<TypeDesc, F>>,
}

impl<F: Clone> TypeCache<F> {
    pub(crate) fn new() -> Self {
        TypeCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_try_insert(
        &self,
        desc: &TypeDesc,
        make: impl FnOnce() -> Result<F>,
    ) -> Result<F> {
        if let Some(f) = self.entries.read().get(desc) {
            return Ok(f.clone());
        }
        let f = make()?;
        Ok(self
            .entries
            .write()
            .entry(desc.clone())
            .or_insert(f)
            .clone())
    }
}
