use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::any::type_name;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info_span};

use crate::{
    bean::Bean,
    cache::Cache,
    config::Config,
    definition::{Capabilities, Definition},
    errors::{DefinitionErrorKind, FactoryErrorKind},
    order::OrderComparator,
    processor::{BeanContext, Hook, HookPhase, InstanceProcessor},
};

/// Store of named definitions
pub trait DefinitionRegistry {
    /// Adds the definition or replaces the one with the same name, returning the replaced one
    ///
    /// # Errors
    /// Returns [`DefinitionErrorKind::OverrideNotAllowed`] if the name is taken and overriding is disabled
    fn register_definition(&self, definition: Definition) -> Result<Option<Definition>, DefinitionErrorKind>;

    /// # Errors
    /// Returns [`DefinitionErrorKind::NoDefinition`] if there is no definition with the name
    fn remove_definition(&self, name: &str) -> Result<Definition, DefinitionErrorKind>;

    /// # Errors
    /// Returns [`DefinitionErrorKind::NoDefinition`] if there is no definition with the name
    fn definition(&self, name: &str) -> Result<Definition, DefinitionErrorKind>;

    #[must_use]
    fn contains_definition(&self, name: &str) -> bool;

    /// Names in registration order
    #[must_use]
    fn definition_names(&self) -> Vec<String>;

    #[must_use]
    fn definition_count(&self) -> usize {
        self.definition_names().len()
    }
}

/// Runtime that resolves definitions into live objects and holds the live instance processor sequence
pub trait ListableFactory {
    /// Names of definitions tagged with all of the capabilities, in registration order.
    /// Doesn't instantiate anything.
    #[must_use]
    fn names_for_capability(&self, capabilities: Capabilities, include_non_singletons: bool, allow_eager_init: bool) -> Vec<String>;

    /// Checks the capability tags of a definition without instantiating it
    ///
    /// # Errors
    /// Returns [`DefinitionErrorKind::NoDefinition`] if there is no definition with the name
    fn is_type_match(&self, name: &str, capabilities: Capabilities) -> Result<bool, DefinitionErrorKind>;

    /// Gets a cached singleton or creates the object, checking it has the expected capabilities
    ///
    /// # Errors
    /// Returns an error if the definition is missing, the creation fails or the object has other capabilities
    fn get_bean(&self, name: &str, expected: Capabilities) -> Result<Bean, FactoryErrorKind>;

    /// Definition used for object creation, cached until the metadata cache is cleared
    ///
    /// # Errors
    /// Returns [`DefinitionErrorKind::NoDefinition`] if there is no definition with the name
    fn merged_definition(&self, name: &str) -> Result<Definition, DefinitionErrorKind>;

    /// Edits a definition in place.
    /// Cached merged definition isn't reset, so changes are visible to object creation after [`ListableFactory::clear_metadata_cache`].
    ///
    /// # Errors
    /// Returns [`DefinitionErrorKind::NoDefinition`] if there is no definition with the name
    fn modify_definition(&self, name: &str, modify: &mut dyn FnMut(&mut Definition)) -> Result<(), DefinitionErrorKind>;

    #[must_use]
    fn instance_processor_count(&self) -> usize;

    /// Appends to the live processor sequence
    fn add_instance_processor(&self, processor: InstanceProcessor);

    /// Drops cached merged definitions of objects that haven't been created yet
    fn clear_metadata_cache(&self);

    #[must_use]
    fn dependency_comparator(&self) -> Option<Arc<dyn OrderComparator>>;

    /// `Some` if definitions can be added and removed through this factory
    #[must_use]
    fn as_registry(&self) -> Option<&dyn DefinitionRegistry>;
}

#[derive(Default)]
struct Definitions {
    names: Vec<String>,
    map: BTreeMap<String, Definition>,
}

/// In-memory registry and factory.
///
/// Locks are never held while user code runs,
/// so processors and suppliers are free to call back into the factory.
pub struct DefaultFactory {
    config: Config,
    definitions: RwLock<Definitions>,
    cache: Mutex<Cache>,
    processors: RwLock<Vec<InstanceProcessor>>,
    comparator: RwLock<Option<Arc<dyn OrderComparator>>>,
}

impl Default for DefaultFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultFactory {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn new_with_config(config: Config) -> Self {
        Self {
            config,
            definitions: RwLock::new(Definitions::default()),
            cache: Mutex::new(Cache::new()),
            processors: RwLock::new(Vec::new()),
            comparator: RwLock::new(None),
        }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Comparator used to sort post-processors instead of the default one
    #[inline]
    pub fn set_dependency_comparator(&self, comparator: impl OrderComparator + 'static) {
        *self.comparator.write() = Some(Arc::new(comparator));
    }

    /// Snapshot of the live processor sequence in invocation order
    #[inline]
    #[must_use]
    pub fn instance_processors(&self) -> Vec<InstanceProcessor> {
        self.processors.read().clone()
    }

    #[inline]
    #[must_use]
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.cache.lock().contains_singleton(name)
    }

    /// Gets a plain object and downcasts it
    ///
    /// # Errors
    /// Returns [`FactoryErrorKind::IncorrectType`] if the object isn't a `T`,
    /// or any error of [`ListableFactory::get_bean`]
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, FactoryErrorKind> {
        let bean = self.get_bean(name, Capabilities::empty())?;
        match bean.downcast::<T>() {
            Some(value) => Ok(value),
            None => {
                let err = FactoryErrorKind::IncorrectType {
                    name: name.into(),
                    expected: type_name::<T>(),
                    actual: bean.type_name(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Creates every singleton that isn't created yet
    ///
    /// # Errors
    /// Returns the first creation error
    pub fn pre_instantiate_singletons(&self) -> Result<(), FactoryErrorKind> {
        let span = info_span!("pre_instantiate_singletons");
        let _guard = span.enter();

        for name in self.definition_names() {
            if self.merged_definition(&name)?.scope().is_singleton() {
                self.get_bean(&name, Capabilities::empty())?;
            }
        }
        Ok(())
    }

    /// Drops all cached singletons
    pub fn destroy_singletons(&self) {
        let singletons = self.cache.lock().take_singletons();
        debug!(count = singletons.len(), "Singletons destroyed");
    }
}

impl DefaultFactory {
    fn get_singleton(&self, name: &str, definition: &Definition) -> Result<Bean, FactoryErrorKind> {
        {
            let mut cache = self.cache.lock();
            if let Some(bean) = cache.get_singleton(name) {
                debug!("Found in cache");
                return Ok(bean);
            }
            if !cache.begin_creation(name) {
                let err = FactoryErrorKind::CurrentlyInCreation { name: name.into() };
                error!("{}", err);
                return Err(err);
            }
        }
        debug!("Not found in cache");

        let result = self.create_bean(name, definition);

        let mut cache = self.cache.lock();
        cache.end_creation(name);
        if let Ok(bean) = &result {
            cache.mark_created(name);
            cache.insert_singleton(name, bean.clone());
            debug!("Cached");
        }
        result
    }

    fn create_bean(&self, name: &str, definition: &Definition) -> Result<Bean, FactoryErrorKind> {
        let processors = self.instance_processors();
        let ctx = BeanContext {
            name,
            definition,
            factory: self,
        };

        for processor in &processors {
            let short_circuit = processor
                .before_instantiation(&ctx)
                .map_err(|source| hook_error(name, HookPhase::BeforeInstantiation, source))?;
            if let Some(bean) = short_circuit {
                debug!("Instantiation short-circuited by post-processor");
                return apply_after_initialization(&processors, bean, &ctx);
            }
        }

        let bean = match definition.instantiator().instantiate() {
            Ok(bean) => bean,
            Err(source) => {
                let err = FactoryErrorKind::Instantiate { name: name.into(), source };
                error!("{}", err);
                return Err(err);
            }
        };

        for processor in &processors {
            processor
                .post_process_merged_definition(definition, name)
                .map_err(|source| hook_error(name, HookPhase::MergedDefinition, source))?;
        }

        populate(&processors, &bean, &ctx)?;

        let mut current = bean;
        for processor in &processors {
            match processor
                .before_initialization(&current, &ctx)
                .map_err(|source| hook_error(name, HookPhase::BeforeInitialization, source))?
            {
                Hook::Proceed(bean) => current = bean,
                Hook::Skip => break,
            }
        }

        apply_after_initialization(&processors, current, &ctx)
    }
}

fn hook_error(name: &str, phase: HookPhase, source: anyhow::Error) -> FactoryErrorKind {
    let err = FactoryErrorKind::Hook {
        name: name.into(),
        phase,
        source,
    };
    error!("{}", err);
    err
}

fn populate(processors: &[InstanceProcessor], bean: &Bean, ctx: &BeanContext<'_>) -> Result<(), FactoryErrorKind> {
    for processor in processors {
        let proceed = processor
            .after_instantiation(bean, ctx)
            .map_err(|source| hook_error(ctx.name, HookPhase::AfterInstantiation, source))?;
        if !proceed {
            debug!("Property population skipped by post-processor");
            return Ok(());
        }
    }

    let mut properties = ctx.definition.properties().clone();
    for processor in processors {
        match processor
            .post_process_properties(properties, bean, ctx)
            .map_err(|source| hook_error(ctx.name, HookPhase::Properties, source))?
        {
            Hook::Proceed(processed) => properties = processed,
            Hook::Skip => {
                debug!("Property values discarded by post-processor");
                return Ok(());
            }
        }
    }

    if let Some(populator) = ctx.definition.populator() {
        if let Err(source) = populator.populate(bean, &properties) {
            let err = FactoryErrorKind::Populate {
                name: ctx.name.into(),
                source,
            };
            error!("{}", err);
            return Err(err);
        }
        debug!(count = properties.len(), "Properties populated");
    }
    Ok(())
}

fn apply_after_initialization(processors: &[InstanceProcessor], bean: Bean, ctx: &BeanContext<'_>) -> Result<Bean, FactoryErrorKind> {
    let mut current = bean;
    for processor in processors {
        match processor
            .after_initialization(&current, ctx)
            .map_err(|source| hook_error(ctx.name, HookPhase::AfterInitialization, source))?
        {
            Hook::Proceed(bean) => current = bean,
            Hook::Skip => break,
        }
    }
    Ok(current)
}

impl DefinitionRegistry for DefaultFactory {
    fn register_definition(&self, definition: Definition) -> Result<Option<Definition>, DefinitionErrorKind> {
        let name = String::from(definition.name());
        let previous = {
            let mut definitions = self.definitions.write();
            if !self.config.allow_definition_overriding && definitions.map.contains_key(&name) {
                let err = DefinitionErrorKind::OverrideNotAllowed { name };
                error!("{}", err);
                return Err(err);
            }
            let previous = definitions.map.insert(name.clone(), definition);
            if previous.is_none() {
                definitions.names.push(name.clone());
            }
            previous
        };

        let mut cache = self.cache.lock();
        cache.remove_merged(&name);
        cache.remove_singleton(&name);

        if previous.is_some() {
            debug!(bean = %name, "Definition overridden");
        } else {
            debug!(bean = %name, "Definition registered");
        }
        Ok(previous)
    }

    fn remove_definition(&self, name: &str) -> Result<Definition, DefinitionErrorKind> {
        let removed = {
            let mut definitions = self.definitions.write();
            let removed = definitions.map.remove(name);
            if removed.is_some() {
                definitions.names.retain(|registered| registered != name);
            }
            removed
        };

        let Some(definition) = removed else {
            let err = DefinitionErrorKind::NoDefinition { name: name.into() };
            error!("{}", err);
            return Err(err);
        };

        let mut cache = self.cache.lock();
        cache.remove_merged(name);
        cache.remove_singleton(name);

        debug!(bean = %name, "Definition removed");
        Ok(definition)
    }

    fn definition(&self, name: &str) -> Result<Definition, DefinitionErrorKind> {
        self.definitions
            .read()
            .map
            .get(name)
            .cloned()
            .ok_or_else(|| DefinitionErrorKind::NoDefinition { name: name.into() })
    }

    #[inline]
    fn contains_definition(&self, name: &str) -> bool {
        self.definitions.read().map.contains_key(name)
    }

    #[inline]
    fn definition_names(&self) -> Vec<String> {
        self.definitions.read().names.clone()
    }

    #[inline]
    fn definition_count(&self) -> usize {
        self.definitions.read().names.len()
    }
}

impl ListableFactory for DefaultFactory {
    fn names_for_capability(&self, capabilities: Capabilities, include_non_singletons: bool, _allow_eager_init: bool) -> Vec<String> {
        let definitions = self.definitions.read();
        definitions
            .names
            .iter()
            .filter(|name| {
                definitions.map.get(*name).is_some_and(|definition| {
                    definition.capabilities().contains(capabilities) && (include_non_singletons || definition.scope().is_singleton())
                })
            })
            .cloned()
            .collect()
    }

    fn is_type_match(&self, name: &str, capabilities: Capabilities) -> Result<bool, DefinitionErrorKind> {
        Ok(self.merged_definition(name)?.capabilities().contains(capabilities))
    }

    fn get_bean(&self, name: &str, expected: Capabilities) -> Result<Bean, FactoryErrorKind> {
        let span = info_span!("get_bean", bean = name);
        let _guard = span.enter();

        let definition = match self.merged_definition(name) {
            Ok(definition) => definition,
            Err(err) => {
                error!("{}", err);
                return Err(err.into());
            }
        };

        let bean = if definition.scope().is_singleton() {
            self.get_singleton(name, &definition)?
        } else {
            let bean = self.create_bean(name, &definition)?;
            self.cache.lock().mark_created(name);
            bean
        };

        let actual = bean.capabilities();
        if !actual.contains(expected) {
            let err = DefinitionErrorKind::IncorrectType {
                name: name.into(),
                expected,
                actual,
            };
            error!("{}", err);
            return Err(err.into());
        }
        Ok(bean)
    }

    fn merged_definition(&self, name: &str) -> Result<Definition, DefinitionErrorKind> {
        let cached = self.cache.lock().get_merged(name);
        if let Some(definition) = cached {
            return Ok(definition);
        }

        let definition = self.definition(name)?;
        self.cache.lock().insert_merged(definition.clone());
        Ok(definition)
    }

    fn modify_definition(&self, name: &str, modify: &mut dyn FnMut(&mut Definition)) -> Result<(), DefinitionErrorKind> {
        let mut definition = self.definition(name)?;
        modify(&mut definition);
        self.definitions.write().map.insert(name.into(), definition);
        debug!(bean = %name, "Definition modified");
        Ok(())
    }

    #[inline]
    fn instance_processor_count(&self) -> usize {
        self.processors.read().len()
    }

    #[inline]
    fn add_instance_processor(&self, processor: InstanceProcessor) {
        let mut processors = self.processors.write();
        processors.push(processor);
        debug!(count = processors.len(), "Instance post-processor added");
    }

    #[inline]
    fn clear_metadata_cache(&self) {
        self.cache.lock().clear_merged();
        debug!("Metadata cache cleared");
    }

    #[inline]
    fn dependency_comparator(&self) -> Option<Arc<dyn OrderComparator>> {
        self.comparator.read().clone()
    }

    #[inline]
    fn as_registry(&self) -> Option<&dyn DefinitionRegistry> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{DefaultFactory, DefinitionRegistry, ListableFactory};
    use crate::{
        any::Instance,
        bean::Bean,
        config::Config,
        definition::{Capabilities, Definition, PropertyValues},
        errors::{DefinitionErrorKind, FactoryErrorKind, InstantiateErrorKind},
        order::Ordered,
        processor::{BeanContext, Hook, HookPhase, InstancePostProcessor, InstanceProcessor, MergedDefinitionPostProcessor},
        scope::Scope,
    };

    use alloc::{
        format,
        string::{String, ToString},
        sync::Arc,
        vec::Vec,
    };
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Logs every hook and behaves as configured
    #[derive(Default)]
    struct Recorder {
        label: &'static str,
        log: Log,
        short_circuit: bool,
        skip_population: bool,
        skip_after_initialization: bool,
        property: Option<(&'static str, &'static str)>,
    }

    impl Recorder {
        fn push(&self, hook: &str, name: &str) {
            self.log.lock().push(format!("{}.{hook}({name})", self.label));
        }
    }

    impl Ordered for Recorder {}

    impl InstancePostProcessor for Recorder {
        fn before_instantiation(&self, ctx: &BeanContext<'_>) -> anyhow::Result<Option<Bean>> {
            self.push("before_instantiation", ctx.name);
            Ok(self.short_circuit.then(|| Bean::object(0u32)))
        }

        fn after_instantiation(&self, _bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<bool> {
            self.push("after_instantiation", ctx.name);
            Ok(!self.skip_population)
        }

        fn post_process_properties(
            &self,
            mut properties: PropertyValues,
            _bean: &Bean,
            ctx: &BeanContext<'_>,
        ) -> anyhow::Result<Hook<PropertyValues>> {
            self.push("properties", ctx.name);
            if let Some((name, value)) = self.property {
                properties.insert(name, value);
            }
            Ok(Hook::Proceed(properties))
        }

        fn before_initialization(&self, bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
            self.push("before_initialization", ctx.name);
            Ok(Hook::Proceed(bean.clone()))
        }

        fn after_initialization(&self, bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
            self.push("after_initialization", ctx.name);
            if self.skip_after_initialization {
                return Ok(Hook::Skip);
            }
            Ok(Hook::Proceed(bean.clone()))
        }
    }

    impl MergedDefinitionPostProcessor for Recorder {
        fn post_process_merged_definition(&self, _definition: &Definition, name: &str) -> anyhow::Result<()> {
            self.push("merged_definition", name);
            Ok(())
        }
    }

    fn recording_definition(name: &'static str, log: &Log) -> Definition {
        let log = log.clone();
        let populate_log = log.clone();
        Definition::new(name, move || {
            log.lock().push(format!("instantiate({name})"));
            Ok::<_, anyhow::Error>(Instance::new(1u32))
        })
        .with_populator(move |_: &Bean, properties: &PropertyValues| {
            let pairs: Vec<_> = properties.iter().map(|(key, value)| format!("{key}={value}")).collect();
            populate_log.lock().push(format!("populate({name}: {})", pairs.join(",")));
            Ok::<_, InstantiateErrorKind>(())
        })
    }

    #[test]
    #[traced_test]
    fn test_lifecycle_order() {
        let log = Log::default();
        let factory = DefaultFactory::new();
        factory.add_instance_processor(InstanceProcessor::merged(Recorder {
            label: "first",
            log: log.clone(),
            property: Some(("added", "yes")),
            ..Recorder::default()
        }));
        factory.add_instance_processor(InstanceProcessor::plain(Recorder {
            label: "second",
            log: log.clone(),
            ..Recorder::default()
        }));
        factory
            .register_definition(recording_definition("bean", &log).with_property("initial", "1"))
            .unwrap();

        factory.get_bean("bean", Capabilities::empty()).unwrap();

        assert_eq!(
            *log.lock(),
            [
                "first.before_instantiation(bean)",
                "second.before_instantiation(bean)",
                "instantiate(bean)",
                "first.merged_definition(bean)",
                "first.after_instantiation(bean)",
                "second.after_instantiation(bean)",
                "first.properties(bean)",
                "second.properties(bean)",
                "populate(bean: added=yes,initial=1)",
                "first.before_initialization(bean)",
                "second.before_initialization(bean)",
                "first.after_initialization(bean)",
                "second.after_initialization(bean)",
            ]
        );
    }

    #[test]
    #[traced_test]
    fn test_short_circuit_before_instantiation() {
        let log = Log::default();
        let factory = DefaultFactory::new();
        factory.add_instance_processor(InstanceProcessor::plain(Recorder {
            label: "proxy",
            log: log.clone(),
            short_circuit: true,
            ..Recorder::default()
        }));
        factory.register_definition(recording_definition("bean", &log)).unwrap();

        let bean = factory.get_bean("bean", Capabilities::empty()).unwrap();

        assert_eq!(bean.downcast::<u32>().as_deref(), Some(&0));
        assert_eq!(*log.lock(), ["proxy.before_instantiation(bean)", "proxy.after_initialization(bean)"]);
    }

    #[test]
    #[traced_test]
    fn test_skip_population_and_after_initialization() {
        let log = Log::default();
        let factory = DefaultFactory::new();
        factory.add_instance_processor(InstanceProcessor::plain(Recorder {
            label: "skipping",
            log: log.clone(),
            skip_population: true,
            skip_after_initialization: true,
            ..Recorder::default()
        }));
        factory.add_instance_processor(InstanceProcessor::plain(Recorder {
            label: "last",
            log: log.clone(),
            ..Recorder::default()
        }));
        factory.register_definition(recording_definition("bean", &log)).unwrap();

        let bean = factory.get_bean("bean", Capabilities::empty()).unwrap();

        assert_eq!(bean.downcast::<u32>().as_deref(), Some(&1));
        let log = log.lock();
        assert!(!log.iter().any(|entry| entry.starts_with("populate") || entry.contains("properties")));
        assert!(!log.contains(&String::from("last.after_instantiation(bean)")));
        assert!(!log.contains(&String::from("last.after_initialization(bean)")));
        assert!(log.contains(&String::from("last.before_initialization(bean)")));
    }

    #[test]
    #[traced_test]
    fn test_hook_error() {
        struct Failing;

        impl Ordered for Failing {}

        impl InstancePostProcessor for Failing {
            fn before_initialization(&self, _bean: &Bean, _ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
                anyhow::bail!("not today")
            }
        }

        let factory = DefaultFactory::new();
        factory.add_instance_processor(InstanceProcessor::plain(Failing));
        factory
            .register_definition(Definition::new("bean", || Ok::<_, anyhow::Error>(Bean::object(1u8))))
            .unwrap();

        let err = factory.get_bean("bean", Capabilities::empty()).unwrap_err();

        assert!(matches!(
            err,
            FactoryErrorKind::Hook {
                phase: HookPhase::BeforeInitialization,
                ..
            }
        ));
        assert!(!factory.contains_singleton("bean"));
        assert!(logs_contain("not today"));
    }

    #[test]
    #[traced_test]
    fn test_singleton_and_prototype() {
        let factory = DefaultFactory::new();
        factory
            .register_definition(Definition::new("singleton", || Ok::<_, anyhow::Error>(Bean::object(1u8))))
            .unwrap();
        factory
            .register_definition(Definition::new("prototype", || Ok::<_, anyhow::Error>(Bean::object(1u8))).with_scope(Scope::Prototype))
            .unwrap();

        let first = factory.get::<u8>("singleton").unwrap();
        let second = factory.get::<u8>("singleton").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let first = factory.get::<u8>("prototype").unwrap();
        let second = factory.get::<u8>("prototype").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!factory.contains_singleton("prototype"));
    }

    #[test]
    #[traced_test]
    fn test_override() {
        let factory = DefaultFactory::new();
        factory
            .register_definition(Definition::new("a", || Ok::<_, anyhow::Error>(Bean::object(1u8))))
            .unwrap();
        factory
            .register_definition(Definition::new("b", || Ok::<_, anyhow::Error>(Bean::object(2u8))))
            .unwrap();
        assert_eq!(*factory.get::<u8>("a").unwrap(), 1);

        let previous = factory
            .register_definition(Definition::new("a", || Ok::<_, anyhow::Error>(Bean::object(3u8))))
            .unwrap();

        assert!(previous.is_some());
        assert_eq!(factory.definition_names(), ["a", "b"]);
        assert_eq!(*factory.get::<u8>("a").unwrap(), 3);
    }

    #[test]
    #[traced_test]
    fn test_override_not_allowed() {
        let factory = DefaultFactory::new_with_config(Config {
            allow_definition_overriding: false,
            ..Config::default()
        });
        factory
            .register_definition(Definition::new("a", || Ok::<_, anyhow::Error>(Bean::object(1u8))))
            .unwrap();

        let err = factory
            .register_definition(Definition::new("a", || Ok::<_, anyhow::Error>(Bean::object(2u8))))
            .unwrap_err();

        assert!(matches!(err, DefinitionErrorKind::OverrideNotAllowed { .. }));
        assert_eq!(*factory.get::<u8>("a").unwrap(), 1);
    }

    #[test]
    #[traced_test]
    fn test_remove_definition() {
        let factory = DefaultFactory::new();
        factory
            .register_definition(Definition::new("a", || Ok::<_, anyhow::Error>(Bean::object(1u8))))
            .unwrap();
        factory.get_bean("a", Capabilities::empty()).unwrap();

        factory.remove_definition("a").unwrap();

        assert_eq!(factory.definition_count(), 0);
        assert!(!factory.contains_singleton("a"));
        assert!(matches!(
            factory.get_bean("a", Capabilities::empty()),
            Err(FactoryErrorKind::Definition(DefinitionErrorKind::NoDefinition { .. }))
        ));
        assert!(matches!(factory.remove_definition("a"), Err(DefinitionErrorKind::NoDefinition { .. })));
    }

    #[test]
    #[traced_test]
    fn test_modify_definition_visible_after_cache_clear() {
        let factory = DefaultFactory::new();
        factory
            .register_definition(Definition::new("a", || Ok::<_, anyhow::Error>(Bean::object(1u8))))
            .unwrap();
        assert!(!factory.is_type_match("a", Capabilities::ORDERED).unwrap());

        factory
            .modify_definition("a", &mut |definition: &mut Definition| {
                definition.add_capabilities(Capabilities::ORDERED);
                definition.set_instantiator(|| Ok::<_, anyhow::Error>(Bean::object(2u8)));
            })
            .unwrap();
        assert!(!factory.is_type_match("a", Capabilities::ORDERED).unwrap());

        factory.clear_metadata_cache();

        assert!(factory.is_type_match("a", Capabilities::ORDERED).unwrap());
        assert_eq!(*factory.get::<u8>("a").unwrap(), 2);
    }

    #[test]
    #[traced_test]
    fn test_failed_singleton_definition_refreshed_after_cache_clear() {
        let factory = DefaultFactory::new();
        factory
            .register_definition(Definition::new("flaky", || Err::<Bean, _>(anyhow::anyhow!("not ready"))))
            .unwrap();
        assert!(matches!(
            factory.get_bean("flaky", Capabilities::empty()),
            Err(FactoryErrorKind::Instantiate { .. })
        ));

        factory
            .modify_definition("flaky", &mut |definition: &mut Definition| {
                definition.set_instantiator(|| Ok::<_, anyhow::Error>(Bean::object(4u8)));
            })
            .unwrap();
        factory.clear_metadata_cache();

        assert_eq!(*factory.get::<u8>("flaky").unwrap(), 4);
    }

    #[test]
    #[traced_test]
    fn test_names_for_capability() {
        let factory = DefaultFactory::new();
        factory
            .register_definition(
                Definition::new("prototype", || Ok::<_, anyhow::Error>(Bean::object(1u8)))
                    .with_capabilities(Capabilities::ORDERED)
                    .with_scope(Scope::Prototype),
            )
            .unwrap();
        factory
            .register_definition(Definition::new("singleton", || Ok::<_, anyhow::Error>(Bean::object(1u8))).with_capabilities(Capabilities::PRIORITY_ORDERED))
            .unwrap();
        factory
            .register_definition(Definition::new("plain", || Ok::<_, anyhow::Error>(Bean::object(1u8))))
            .unwrap();

        assert_eq!(factory.names_for_capability(Capabilities::ORDERED, true, false), ["prototype", "singleton"]);
        assert_eq!(factory.names_for_capability(Capabilities::ORDERED, false, false), ["singleton"]);
        assert_eq!(factory.names_for_capability(Capabilities::empty(), true, false).len(), 3);
    }

    #[test]
    #[traced_test]
    fn test_circular_singleton() {
        let factory = Arc::new(DefaultFactory::new());
        let weak = Arc::downgrade(&factory);
        factory
            .register_definition(Definition::new("cycle", move || {
                let factory = weak.upgrade().ok_or_else(|| anyhow::anyhow!("factory dropped"))?;
                factory.get_bean("cycle", Capabilities::empty())?;
                Ok::<_, anyhow::Error>(Bean::object(1u8))
            }))
            .unwrap();

        let err = factory.get_bean("cycle", Capabilities::empty()).unwrap_err();

        assert!(matches!(err, FactoryErrorKind::Instantiate { .. }));
        assert!(logs_contain("currently in creation"));
        // Creation guard is released after the failure
        assert!(matches!(
            factory.get_bean("cycle", Capabilities::empty()),
            Err(FactoryErrorKind::Instantiate { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_get_checks_capabilities() {
        let factory = DefaultFactory::new();
        factory
            .register_definition(Definition::new("plain", || Ok::<_, anyhow::Error>(Bean::object(1u8))).with_capabilities(Capabilities::INSTANCE_PROCESSOR))
            .unwrap();

        assert!(matches!(
            factory.get_bean("plain", Capabilities::INSTANCE_PROCESSOR),
            Err(FactoryErrorKind::Definition(DefinitionErrorKind::IncorrectType { .. }))
        ));
        assert!(matches!(factory.get::<u16>("plain"), Err(FactoryErrorKind::IncorrectType { .. })));
    }
}
