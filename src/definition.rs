use alloc::{collections::BTreeMap, string::String, sync::Arc};
use core::fmt::{self, Debug, Formatter};

use crate::{
    instantiator::{Instantiator, Populator},
    order::Tier,
    scope::{Role, Scope},
};

bitflags::bitflags! {
    /// Capability tags of a definition.
    ///
    /// Tags are attached at registration time and are what type matching looks at,
    /// so the kind and tier of a post-processor are known without instantiating it.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Can add and remove definitions. Always also a [`Capabilities::FACTORY_PROCESSOR`]
        const REGISTRY_PROCESSOR = 1;
        /// Can alter existing definitions and factory config
        const FACTORY_PROCESSOR = 1 << 1;
        /// Intercepts construction and initialization of every object
        const INSTANCE_PROCESSOR = 1 << 2;
        /// Instance processor that also observes merged per-object metadata
        const MERGED_DEFINITION_AWARE = 1 << 3;
        const PRIORITY_ORDERED = 1 << 4;
        const ORDERED = 1 << 5;
        const APPLICATION_LISTENER = 1 << 6;
    }
}

impl Capabilities {
    /// Adds capabilities implied by the present ones
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut capabilities = self;
        if capabilities.contains(Self::REGISTRY_PROCESSOR) {
            capabilities |= Self::FACTORY_PROCESSOR;
        }
        if capabilities.contains(Self::MERGED_DEFINITION_AWARE) {
            capabilities |= Self::INSTANCE_PROCESSOR;
        }
        if capabilities.contains(Self::PRIORITY_ORDERED) {
            capabilities |= Self::ORDERED;
        }
        capabilities
    }

    #[inline]
    #[must_use]
    pub fn tier(self) -> Tier {
        if self.contains(Self::PRIORITY_ORDERED) {
            Tier::Priority
        } else if self.contains(Self::ORDERED) {
            Tier::Explicit
        } else {
            Tier::Unordered
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyValues(BTreeMap<String, String>);

impl PropertyValues {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[inline]
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Metadata for one managed object
#[derive(Clone)]
pub struct Definition {
    name: String,
    instantiator: Arc<dyn Instantiator>,
    populator: Option<Arc<dyn Populator>>,
    properties: PropertyValues,
    capabilities: Capabilities,
    role: Role,
    scope: Scope,
}

impl Definition {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, instantiator: impl Instantiator) -> Self {
        Self {
            name: name.into(),
            instantiator: Arc::new(instantiator),
            populator: None,
            properties: PropertyValues::new(),
            capabilities: Capabilities::empty(),
            role: Role::default(),
            scope: Scope::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.add_capabilities(capabilities);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name, value);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_populator(mut self, populator: impl Populator) -> Self {
        self.populator = Some(Arc::new(populator));
        self
    }
}

impl Definition {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[inline]
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[inline]
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    #[inline]
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.capabilities.tier()
    }

    #[inline]
    #[must_use]
    pub const fn properties(&self) -> &PropertyValues {
        &self.properties
    }

    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyValues {
        &mut self.properties
    }

    #[inline]
    pub fn add_capabilities(&mut self, capabilities: Capabilities) {
        self.capabilities = (self.capabilities | capabilities).normalized();
    }

    #[inline]
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    #[inline]
    pub fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    /// Replaces the construction strategy, keeping every other attribute
    #[inline]
    pub fn set_instantiator(&mut self, instantiator: impl Instantiator) {
        self.instantiator = Arc::new(instantiator);
    }

    #[inline]
    pub fn set_populator(&mut self, populator: impl Populator) {
        self.populator = Some(Arc::new(populator));
    }

    #[inline]
    #[must_use]
    pub(crate) fn instantiator(&self) -> &dyn Instantiator {
        &*self.instantiator
    }

    #[inline]
    #[must_use]
    pub(crate) fn populator(&self) -> Option<&dyn Populator> {
        self.populator.as_deref()
    }
}

impl Debug for Definition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("role", &self.role)
            .field("scope", &self.scope)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
