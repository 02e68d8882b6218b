use alloc::{string::String, sync::Arc, vec::Vec};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{
    any::Instance,
    bean::Bean,
    definition::{Capabilities, Definition},
    order::{Ordered, LOWEST_PRECEDENCE},
    processor::{BeanContext, Hook, InstancePostProcessor, MergedDefinitionPostProcessor},
};

#[derive(Clone, Debug)]
pub enum ApplicationEvent {
    ContextRefreshed,
    ContextClosed,
    Custom(Instance),
}

pub trait ApplicationListener: Send + Sync {
    fn on_application_event(&self, event: &ApplicationEvent);
}

impl<F> ApplicationListener for F
where
    F: Fn(&ApplicationEvent) + Send + Sync,
{
    #[inline]
    fn on_application_event(&self, event: &ApplicationEvent) {
        self(event);
    }
}

/// Listeners of an application context, keyed by the name of their definition
#[derive(Default)]
pub struct EventMulticaster {
    listeners: RwLock<Vec<(String, Arc<dyn ApplicationListener>)>>,
}

impl EventMulticaster {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the listener, replacing one previously added under the same name
    pub fn add_listener(&self, name: &str, listener: Arc<dyn ApplicationListener>) {
        let mut listeners = self.listeners.write();
        listeners.retain(|(registered, _)| registered != name);
        listeners.push((name.into(), listener));
        debug!(listener = name, "Listener added");
    }

    pub fn remove_listener(&self, name: &str) -> bool {
        let mut listeners = self.listeners.write();
        let len = listeners.len();
        listeners.retain(|(registered, _)| registered != name);
        len != listeners.len()
    }

    #[inline]
    #[must_use]
    pub fn listener_names(&self) -> Vec<String> {
        self.listeners.read().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Calls every listener in the order they were added
    pub fn multicast_event(&self, event: &ApplicationEvent) {
        let listeners = self.listeners.read().clone();
        debug!(count = listeners.len(), ?event, "Multicasting event");
        for (_, listener) in listeners {
            listener.on_application_event(event);
        }
    }
}

/// Registers singleton listeners with the multicaster once they are initialized.
///
/// Singleton-ness is taken from the definition being processed,
/// because the listener object itself doesn't know how it's scoped.
pub struct ApplicationListenerDetector {
    multicaster: Arc<EventMulticaster>,
}

impl ApplicationListenerDetector {
    #[inline]
    #[must_use]
    pub const fn new(multicaster: Arc<EventMulticaster>) -> Self {
        Self { multicaster }
    }
}

impl Ordered for ApplicationListenerDetector {
    #[inline]
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }
}

impl MergedDefinitionPostProcessor for ApplicationListenerDetector {
    fn post_process_merged_definition(&self, definition: &Definition, name: &str) -> anyhow::Result<()> {
        if definition.capabilities().contains(Capabilities::APPLICATION_LISTENER) {
            debug!(listener = name, scope = definition.scope().name(), "Listener definition merged");
        }
        Ok(())
    }
}

impl InstancePostProcessor for ApplicationListenerDetector {
    fn after_initialization(&self, bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
        if let Bean::Listener(listener) = bean {
            if ctx.definition.scope().is_singleton() {
                self.multicaster.add_listener(ctx.name, listener.clone());
            } else {
                warn!(
                    "Inner bean '{}' implements application listener but is not reachable for event multicasting \
                     by its containing context because it does not have singleton scope",
                    ctx.name,
                );
            }
        }
        Ok(Hook::Proceed(bean.clone()))
    }
}
