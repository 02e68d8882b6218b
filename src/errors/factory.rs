use alloc::string::String;

use super::{definition::DefinitionErrorKind, instantiate::InstantiateErrorKind};
use crate::processor::HookPhase;

#[derive(thiserror::Error, Debug)]
pub enum FactoryErrorKind {
    #[error(transparent)]
    Definition(#[from] DefinitionErrorKind),
    #[error("Instantiation of '{name}' failed: {source}")]
    Instantiate { name: String, source: InstantiateErrorKind },
    #[error("Populating properties of '{name}' failed: {source}")]
    Populate { name: String, source: InstantiateErrorKind },
    #[error("Instance post-processor failed on '{name}' at {phase:?}: {source}")]
    Hook {
        name: String,
        phase: HookPhase,
        source: anyhow::Error,
    },
    #[error("Incorrect type of '{name}'. Expected: {expected}, actual: {actual}")]
    IncorrectType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Singleton '{name}' is currently in creation. Is there an unresolvable circular reference?")]
    CurrentlyInCreation { name: String },
}
