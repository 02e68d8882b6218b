use alloc::{sync::Arc, vec::Vec};
use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    bean::Bean,
    config::Config,
    definition::{Capabilities, Definition},
    errors::{ContextErrorKind, DefinitionErrorKind, FactoryErrorKind},
    factory::{DefaultFactory, DefinitionRegistry as _, ListableFactory as _},
    listener::{ApplicationEvent, EventMulticaster},
    processor::FactoryProcessor,
    registration::{register_instance_processors, run_factory_processors},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Created,
    Active,
    Closed,
}

/// Embedding container of the startup pipeline.
///
/// Definitions and explicit factory processors are added first,
/// then [`ApplicationContext::refresh`] runs factory processors, installs instance processors
/// and creates the singletons.
pub struct ApplicationContext {
    factory: DefaultFactory,
    factory_processors: Mutex<Vec<FactoryProcessor>>,
    multicaster: Arc<EventMulticaster>,
    state: Mutex<State>,
}

impl Default for ApplicationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationContext {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn new_with_config(config: Config) -> Self {
        Self {
            factory: DefaultFactory::new_with_config(config),
            factory_processors: Mutex::new(Vec::new()),
            multicaster: Arc::new(EventMulticaster::new()),
            state: Mutex::new(State::Created),
        }
    }

    #[inline]
    #[must_use]
    pub const fn factory(&self) -> &DefaultFactory {
        &self.factory
    }

    #[inline]
    #[must_use]
    pub fn multicaster(&self) -> &Arc<EventMulticaster> {
        &self.multicaster
    }

    /// # Errors
    /// Returns [`DefinitionErrorKind::OverrideNotAllowed`] if the name is taken and overriding is disabled
    #[inline]
    pub fn register_definition(&self, definition: Definition) -> Result<Option<Definition>, DefinitionErrorKind> {
        self.factory.register_definition(definition)
    }

    /// Adds a factory processor that is invoked on refresh before any discovered one
    pub fn add_factory_processor(&self, processor: FactoryProcessor) {
        let mut processors = self.factory_processors.lock();
        processors.push(processor);
        debug!(count = processors.len(), "Factory post-processor added");
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.state.lock() == State::Active
    }

    /// Runs the startup pipeline. Can be called only once.
    ///
    /// # Errors
    /// Returns [`ContextErrorKind::AlreadyRefreshed`] on the second call,
    /// or the first pipeline or creation error. Singletons created before the failure are dropped then.
    pub fn refresh(&self) -> Result<(), ContextErrorKind> {
        let span = info_span!("refresh");
        let _guard = span.enter();

        {
            let mut state = self.state.lock();
            if *state != State::Created {
                let err = ContextErrorKind::AlreadyRefreshed;
                error!("{}", err);
                return Err(err);
            }
            // Failed refresh leaves the context closed
            *state = State::Closed;
        }

        if let Err(err) = self.start() {
            error!("{}", err);
            self.factory.destroy_singletons();
            return Err(err);
        }

        *self.state.lock() = State::Active;
        self.publish_event(&ApplicationEvent::ContextRefreshed);
        debug!("Context refreshed");
        Ok(())
    }

    fn start(&self) -> Result<(), ContextErrorKind> {
        let explicit = self.factory_processors.lock().clone();
        run_factory_processors(&self.factory, &explicit)?;
        register_instance_processors(&self.factory, &self.multicaster)?;

        if self.factory.config().pre_instantiate_singletons {
            self.factory.pre_instantiate_singletons()?;
        }
        Ok(())
    }

    #[inline]
    pub fn publish_event(&self, event: &ApplicationEvent) {
        self.multicaster.multicast_event(event);
    }

    /// # Errors
    /// Returns an error if the definition is missing, the creation fails or the object has other capabilities
    #[inline]
    pub fn get_bean(&self, name: &str, expected: Capabilities) -> Result<Bean, FactoryErrorKind> {
        self.factory.get_bean(name, expected)
    }

    /// # Errors
    /// Returns [`FactoryErrorKind::IncorrectType`] if the object isn't a `T`,
    /// or any error of [`ApplicationContext::get_bean`]
    #[inline]
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, FactoryErrorKind> {
        self.factory.get(name)
    }

    /// Publishes [`ApplicationEvent::ContextClosed`] and drops cached singletons.
    /// Does nothing if the context isn't active.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if *state != State::Active {
                return;
            }
            *state = State::Closed;
        }

        self.publish_event(&ApplicationEvent::ContextClosed);
        self.factory.destroy_singletons();
        debug!("Context closed");
    }
}

impl Drop for ApplicationContext {
    fn drop(&mut self) {
        self.close();
        debug!("Context closed on drop");
    }
}
