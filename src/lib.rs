#![no_std]

extern crate alloc;

pub(crate) mod any;
pub(crate) mod bean;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod definition;
pub(crate) mod errors;
pub(crate) mod factory;
pub(crate) mod guard;
pub(crate) mod instantiator;
pub(crate) mod listener;
pub(crate) mod order;
pub(crate) mod processor;
pub(crate) mod registration;
pub(crate) mod scope;

pub use any::{Instance, TypeInfo};
pub use bean::Bean;
pub use config::Config;
pub use context::ApplicationContext;
pub use definition::{Capabilities, Definition, PropertyValues};
pub use errors::{ContextErrorKind, DefinitionErrorKind, FactoryErrorKind, InstantiateErrorKind, Phase, PipelineErrorKind};
pub use factory::{DefaultFactory, DefinitionRegistry, ListableFactory};
pub use guard::GuardProcessor;
pub use instantiator::{instance, Instantiator, Populator};
pub use listener::{ApplicationEvent, ApplicationListener, ApplicationListenerDetector, EventMulticaster};
pub use order::{sort_post_processors, DefaultOrderComparator, OrderComparator, Ordered, Tier, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE};
pub use processor::{
    BeanContext, FactoryPostProcessor, FactoryProcessor, Hook, HookPhase, InstancePostProcessor, InstanceProcessor,
    MergedDefinitionPostProcessor, RegistryPostProcessor,
};
pub use registration::{register_instance_processors, run_factory_processors};
pub use scope::{Role, Scope};
