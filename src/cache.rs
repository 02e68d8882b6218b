use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
};
use core::mem;

use crate::{bean::Bean, definition::Definition};

#[derive(Default)]
pub(crate) struct Cache {
    /// Frozen definitions handed out to object creation and type matching
    merged: BTreeMap<String, Definition>,
    singletons: BTreeMap<String, Bean>,
    /// Names created at least once, their merged definitions survive [`Cache::clear_merged`]
    created: BTreeSet<String>,
    in_creation: BTreeSet<String>,
}

impl Cache {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn get_merged(&self, name: &str) -> Option<Definition> {
        self.merged.get(name).cloned()
    }

    #[inline]
    pub(crate) fn insert_merged(&mut self, definition: Definition) {
        self.merged.insert(definition.name().into(), definition);
    }

    #[inline]
    pub(crate) fn remove_merged(&mut self, name: &str) {
        self.merged.remove(name);
    }

    pub(crate) fn clear_merged(&mut self) {
        let created = &self.created;
        self.merged.retain(|name, _| created.contains(name));
    }

    #[inline]
    #[must_use]
    pub(crate) fn get_singleton(&self, name: &str) -> Option<Bean> {
        self.singletons.get(name).cloned()
    }

    #[inline]
    pub(crate) fn insert_singleton(&mut self, name: &str, bean: Bean) {
        self.singletons.insert(name.into(), bean);
    }

    #[inline]
    pub(crate) fn remove_singleton(&mut self, name: &str) -> Option<Bean> {
        self.singletons.remove(name)
    }

    #[inline]
    #[must_use]
    pub(crate) fn take_singletons(&mut self) -> BTreeMap<String, Bean> {
        mem::take(&mut self.singletons)
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.contains_key(name)
    }

    #[inline]
    pub(crate) fn mark_created(&mut self, name: &str) {
        if !self.created.contains(name) {
            self.created.insert(name.into());
        }
    }

    /// Returns `false` if the name is already in creation
    #[inline]
    #[must_use]
    pub(crate) fn begin_creation(&mut self, name: &str) -> bool {
        self.in_creation.insert(name.into())
    }

    #[inline]
    pub(crate) fn end_creation(&mut self, name: &str) {
        self.in_creation.remove(name);
    }
}
