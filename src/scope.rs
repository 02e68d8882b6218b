#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Scope {
    /// One shared instance, cached by the factory after creation
    #[default]
    Singleton,
    /// A new instance on every request, never cached
    Prototype,
}

impl Scope {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Scope::Singleton => "singleton",
            Scope::Prototype => "prototype",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

/// Role hint of a definition.
/// Infrastructure definitions are internal to the container and are excluded from some diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Role {
    #[default]
    Application,
    Support,
    Infrastructure,
}
