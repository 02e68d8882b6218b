/// Config for a factory
/// ## Fields
/// - `allow_definition_overriding`:
///   If `true`, registering a definition under a taken name replaces the old one.
///   Otherwise registration fails with [`crate::DefinitionErrorKind::OverrideNotAllowed`].
///
/// - `pre_instantiate_singletons`:
///   If `true`, refreshing a context eagerly creates every singleton after the post-processors are installed.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub allow_definition_overriding: bool,
    pub pre_instantiate_singletons: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_definition_overriding: true,
            pre_instantiate_singletons: true,
        }
    }
}
