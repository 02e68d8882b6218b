use alloc::sync::Arc;
use core::fmt::{self, Debug, Formatter};

use crate::{
    bean::Bean,
    definition::{Definition, PropertyValues},
    factory::{DefinitionRegistry, ListableFactory},
    order::Ordered,
};

/// Factory-level processor that alters existing definitions or factory config
pub trait FactoryPostProcessor: Ordered + Send + Sync {
    #[allow(clippy::missing_errors_doc)]
    fn post_process_factory(&self, factory: &dyn ListableFactory) -> anyhow::Result<()>;
}

/// Factory-level processor that can also add and remove definitions.
///
/// [`RegistryPostProcessor::post_process_registry`] of every registry processor runs before
/// [`FactoryPostProcessor::post_process_factory`] of any of them.
pub trait RegistryPostProcessor: FactoryPostProcessor {
    #[allow(clippy::missing_errors_doc)]
    fn post_process_registry(&self, registry: &dyn DefinitionRegistry) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub enum FactoryProcessor {
    Registry(Arc<dyn RegistryPostProcessor>),
    Config(Arc<dyn FactoryPostProcessor>),
}

impl FactoryProcessor {
    #[inline]
    #[must_use]
    pub fn registry<P: RegistryPostProcessor + 'static>(processor: P) -> Self {
        Self::Registry(Arc::new(processor))
    }

    #[inline]
    #[must_use]
    pub fn config<P: FactoryPostProcessor + 'static>(processor: P) -> Self {
        Self::Config(Arc::new(processor))
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn post_process_factory(&self, factory: &dyn ListableFactory) -> anyhow::Result<()> {
        match self {
            FactoryProcessor::Registry(processor) => processor.post_process_factory(factory),
            FactoryProcessor::Config(processor) => processor.post_process_factory(factory),
        }
    }
}

impl Ordered for FactoryProcessor {
    #[inline]
    fn order(&self) -> i32 {
        match self {
            FactoryProcessor::Registry(processor) => processor.order(),
            FactoryProcessor::Config(processor) => processor.order(),
        }
    }
}

impl Debug for FactoryProcessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FactoryProcessor::Registry(_) => f.write_str("FactoryProcessor::Registry"),
            FactoryProcessor::Config(_) => f.write_str("FactoryProcessor::Config"),
        }
    }
}

/// Outcome of a hook that may replace the value it was given
#[derive(Debug)]
pub enum Hook<T> {
    /// Continue the chain with this value
    Proceed(T),
    /// Stop the chain and keep the current value
    Skip,
}

/// Step of the per-object lifecycle, used to report hook failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookPhase {
    BeforeInstantiation,
    MergedDefinition,
    AfterInstantiation,
    Properties,
    BeforeInitialization,
    AfterInitialization,
}

/// What a hook knows about the object being processed
pub struct BeanContext<'a> {
    pub name: &'a str,
    pub definition: &'a Definition,
    pub factory: &'a dyn ListableFactory,
}

/// Instance-level processor.
/// Every hook has a pass-through default, so implementors override only the ones they need.
pub trait InstancePostProcessor: Ordered + Send + Sync {
    /// Returning `Some` short-circuits the regular construction,
    /// only [`InstancePostProcessor::after_initialization`] is applied to the returned object then.
    #[allow(clippy::missing_errors_doc)]
    fn before_instantiation(&self, _ctx: &BeanContext<'_>) -> anyhow::Result<Option<Bean>> {
        Ok(None)
    }

    /// Returning `false` skips property population of the object
    #[allow(clippy::missing_errors_doc)]
    fn after_instantiation(&self, _bean: &Bean, _ctx: &BeanContext<'_>) -> anyhow::Result<bool> {
        Ok(true)
    }

    #[allow(clippy::missing_errors_doc)]
    fn post_process_properties(
        &self,
        properties: PropertyValues,
        _bean: &Bean,
        _ctx: &BeanContext<'_>,
    ) -> anyhow::Result<Hook<PropertyValues>> {
        Ok(Hook::Proceed(properties))
    }

    #[allow(clippy::missing_errors_doc)]
    fn before_initialization(&self, bean: &Bean, _ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
        Ok(Hook::Proceed(bean.clone()))
    }

    #[allow(clippy::missing_errors_doc)]
    fn after_initialization(&self, bean: &Bean, _ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
        Ok(Hook::Proceed(bean.clone()))
    }
}

/// Instance-level processor that also observes the merged definition of every object right after its instantiation
pub trait MergedDefinitionPostProcessor: InstancePostProcessor {
    #[allow(clippy::missing_errors_doc)]
    fn post_process_merged_definition(&self, definition: &Definition, name: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub enum InstanceProcessor {
    Plain(Arc<dyn InstancePostProcessor>),
    MergedDefinitionAware(Arc<dyn MergedDefinitionPostProcessor>),
}

macro_rules! dispatch {
    ($self:ident, $processor:ident => $call:expr) => {
        match $self {
            InstanceProcessor::Plain($processor) => $call,
            InstanceProcessor::MergedDefinitionAware($processor) => $call,
        }
    };
}

impl InstanceProcessor {
    #[inline]
    #[must_use]
    pub fn plain<P: InstancePostProcessor + 'static>(processor: P) -> Self {
        Self::Plain(Arc::new(processor))
    }

    #[inline]
    #[must_use]
    pub fn merged<P: MergedDefinitionPostProcessor + 'static>(processor: P) -> Self {
        Self::MergedDefinitionAware(Arc::new(processor))
    }

    #[inline]
    #[must_use]
    pub fn is_merged_definition_aware(&self) -> bool {
        matches!(self, InstanceProcessor::MergedDefinitionAware(_))
    }

    /// Whether both point to the same processor object
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        let left = dispatch!(self, processor => Arc::as_ptr(processor).cast::<()>());
        let right = dispatch!(other, processor => Arc::as_ptr(processor).cast::<()>());
        core::ptr::eq(left, right)
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn before_instantiation(&self, ctx: &BeanContext<'_>) -> anyhow::Result<Option<Bean>> {
        dispatch!(self, processor => processor.before_instantiation(ctx))
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn post_process_merged_definition(&self, definition: &Definition, name: &str) -> anyhow::Result<()> {
        match self {
            InstanceProcessor::Plain(_) => Ok(()),
            InstanceProcessor::MergedDefinitionAware(processor) => processor.post_process_merged_definition(definition, name),
        }
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn after_instantiation(&self, bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<bool> {
        dispatch!(self, processor => processor.after_instantiation(bean, ctx))
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn post_process_properties(
        &self,
        properties: PropertyValues,
        bean: &Bean,
        ctx: &BeanContext<'_>,
    ) -> anyhow::Result<Hook<PropertyValues>> {
        dispatch!(self, processor => processor.post_process_properties(properties, bean, ctx))
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn before_initialization(&self, bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
        dispatch!(self, processor => processor.before_initialization(bean, ctx))
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn after_initialization(&self, bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
        dispatch!(self, processor => processor.after_initialization(bean, ctx))
    }
}

impl Ordered for InstanceProcessor {
    #[inline]
    fn order(&self) -> i32 {
        dispatch!(self, processor => processor.order())
    }
}

impl Debug for InstanceProcessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            InstanceProcessor::Plain(_) => f.write_str("InstanceProcessor::Plain"),
            InstanceProcessor::MergedDefinitionAware(_) => f.write_str("InstanceProcessor::MergedDefinitionAware"),
        }
    }
}
