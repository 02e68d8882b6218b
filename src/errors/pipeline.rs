use super::{definition::DefinitionErrorKind, factory::FactoryErrorKind};

/// Step of a factory-level post-processor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    RegistryMutation,
    ConfigMutation,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineErrorKind {
    #[error(transparent)]
    Factory(#[from] FactoryErrorKind),
    #[error("Factory post-processor failed at {phase:?}: {source}")]
    Processor { phase: Phase, source: anyhow::Error },
}

impl From<DefinitionErrorKind> for PipelineErrorKind {
    #[inline]
    fn from(err: DefinitionErrorKind) -> Self {
        Self::Factory(err.into())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ContextErrorKind {
    #[error(transparent)]
    Pipeline(#[from] PipelineErrorKind),
    #[error(transparent)]
    Factory(#[from] FactoryErrorKind),
    #[error("Context already refreshed. Multiple refreshes aren't supported")]
    AlreadyRefreshed,
}
