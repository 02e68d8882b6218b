use alloc::string::String;

use crate::definition::Capabilities;

#[derive(thiserror::Error, Debug)]
pub enum DefinitionErrorKind {
    #[error("Definition with name '{name}' not found in registry")]
    NoDefinition { name: String },
    #[error("Definition with name '{name}' already registered and overriding isn't allowed")]
    OverrideNotAllowed { name: String },
    #[error("Incorrect type of '{name}'. Expected capabilities: {expected:?}, actual: {actual:?}")]
    IncorrectType {
        name: String,
        expected: Capabilities,
        actual: Capabilities,
    },
}
