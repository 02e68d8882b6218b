use alloc::sync::Arc;
use core::fmt::{self, Debug, Formatter};

use crate::{
    any::Instance,
    definition::Capabilities,
    listener::ApplicationListener,
    processor::{FactoryProcessor, InstanceProcessor},
};

/// Live object produced by a definition.
///
/// The variant tells what the object is able to do,
/// so the pipeline matches on it instead of inspecting types at runtime.
#[derive(Clone)]
pub enum Bean {
    Object(Instance),
    FactoryProcessor(FactoryProcessor),
    InstanceProcessor(InstanceProcessor),
    Listener(Arc<dyn ApplicationListener>),
}

impl Bean {
    #[inline]
    #[must_use]
    pub fn object<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Object(Instance::new(value))
    }

    #[inline]
    #[must_use]
    pub fn listener<L: ApplicationListener + 'static>(listener: L) -> Self {
        Self::Listener(Arc::new(listener))
    }

    /// Capabilities the live object actually has
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Bean::Object(_) => Capabilities::empty(),
            Bean::FactoryProcessor(FactoryProcessor::Registry(_)) => Capabilities::REGISTRY_PROCESSOR.normalized(),
            Bean::FactoryProcessor(FactoryProcessor::Config(_)) => Capabilities::FACTORY_PROCESSOR,
            Bean::InstanceProcessor(InstanceProcessor::Plain(_)) => Capabilities::INSTANCE_PROCESSOR,
            Bean::InstanceProcessor(InstanceProcessor::MergedDefinitionAware(_)) => Capabilities::MERGED_DEFINITION_AWARE.normalized(),
            Bean::Listener(_) => Capabilities::APPLICATION_LISTENER,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_instance_processor(&self) -> bool {
        matches!(self, Bean::InstanceProcessor(_))
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Bean::Object(instance) => instance.type_info().name,
            Bean::FactoryProcessor(_) => "factory post-processor",
            Bean::InstanceProcessor(_) => "instance post-processor",
            Bean::Listener(_) => "application listener",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Bean::Object(instance) => Some(instance),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.as_instance().and_then(Instance::downcast::<T>)
    }
}

impl From<Instance> for Bean {
    #[inline]
    fn from(instance: Instance) -> Self {
        Self::Object(instance)
    }
}

impl From<FactoryProcessor> for Bean {
    #[inline]
    fn from(processor: FactoryProcessor) -> Self {
        Self::FactoryProcessor(processor)
    }
}

impl From<InstanceProcessor> for Bean {
    #[inline]
    fn from(processor: InstanceProcessor) -> Self {
        Self::InstanceProcessor(processor)
    }
}

impl Debug for Bean {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Bean::Object(instance) => Debug::fmt(instance, f),
            _ => f.write_str(self.type_name()),
        }
    }
}
