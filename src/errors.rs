mod definition;
mod factory;
mod instantiate;
mod pipeline;

pub use definition::DefinitionErrorKind;
pub use factory::FactoryErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use pipeline::{ContextErrorKind, Phase, PipelineErrorKind};
