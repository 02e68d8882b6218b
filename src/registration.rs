use alloc::{collections::BTreeSet, string::String, sync::Arc, vec::Vec};
use tracing::{debug, error, info_span};

use crate::{
    bean::Bean,
    definition::Capabilities,
    errors::{DefinitionErrorKind, FactoryErrorKind, Phase, PipelineErrorKind},
    factory::{DefinitionRegistry, ListableFactory},
    guard::GuardProcessor,
    listener::{ApplicationListenerDetector, EventMulticaster},
    order::{sort_post_processors, DefaultOrderComparator, OrderComparator, Tier},
    processor::{FactoryPostProcessor, FactoryProcessor, InstanceProcessor, RegistryPostProcessor},
};

/// Discovers and invokes factory-level post-processors.
///
/// Explicit processors are invoked in the given order, the ones found in the registry
/// tier by tier: priority, explicit order, then the rest.
/// If the factory is registry-capable, registry mutation of every registry processor
/// (including those registered by other registry processors) runs before any config mutation.
///
/// # Errors
/// Returns the first definition, creation or processor error. Remaining processors aren't invoked then.
pub fn run_factory_processors(factory: &dyn ListableFactory, explicit_processors: &[FactoryProcessor]) -> Result<(), PipelineErrorKind> {
    let span = info_span!("run_factory_processors", explicit = explicit_processors.len());
    let _guard = span.enter();

    let comparator = comparator_for(factory);
    let mut processed = BTreeSet::new();

    if let Some(registry) = factory.as_registry() {
        let mut regular_processors: Vec<Arc<dyn FactoryPostProcessor>> = Vec::new();
        let mut registry_processors: Vec<Arc<dyn RegistryPostProcessor>> = Vec::new();

        for processor in explicit_processors {
            match processor {
                FactoryProcessor::Registry(processor) => {
                    processor
                        .post_process_registry(registry)
                        .map_err(|source| processor_error(Phase::RegistryMutation, source))?;
                    registry_processors.push(processor.clone());
                }
                FactoryProcessor::Config(processor) => regular_processors.push(processor.clone()),
            }
        }

        let mut current = Vec::new();

        for name in factory.names_for_capability(Capabilities::REGISTRY_PROCESSOR, true, false) {
            if factory.merged_definition(&name)?.tier() == Tier::Priority {
                processed.insert(name.clone());
                current.push(get_registry_processor(factory, &name)?);
            }
        }
        invoke_registry_wave(&mut current, registry, &*comparator, &mut registry_processors)?;

        for name in factory.names_for_capability(Capabilities::REGISTRY_PROCESSOR, true, false) {
            if !processed.contains(&name) && factory.merged_definition(&name)?.tier() != Tier::Unordered {
                processed.insert(name.clone());
                current.push(get_registry_processor(factory, &name)?);
            }
        }
        invoke_registry_wave(&mut current, registry, &*comparator, &mut registry_processors)?;

        // Registry processors may register further ones, rescan until nothing new shows up
        let mut reiterate = true;
        while reiterate {
            reiterate = false;
            for name in factory.names_for_capability(Capabilities::REGISTRY_PROCESSOR, true, false) {
                if !processed.contains(&name) {
                    processed.insert(name.clone());
                    current.push(get_registry_processor(factory, &name)?);
                    reiterate = true;
                }
            }
            invoke_registry_wave(&mut current, registry, &*comparator, &mut registry_processors)?;
        }

        debug!(count = registry_processors.len(), "Invoking config mutation of registry processors");
        for processor in &registry_processors {
            processor
                .post_process_factory(factory)
                .map_err(|source| processor_error(Phase::ConfigMutation, source))?;
        }
        for processor in &regular_processors {
            processor
                .post_process_factory(factory)
                .map_err(|source| processor_error(Phase::ConfigMutation, source))?;
        }
    } else {
        debug!("Factory isn't registry-capable, invoking explicit processors only");
        invoke_factory_processors(explicit_processors, factory)?;
    }

    // Ordered and unordered names are captured here, before the priority processors run.
    // Processors registered by a priority one aren't discovered in this run.
    let mut priority_processors = Vec::new();
    let mut ordered_names = Vec::new();
    let mut unordered_names = Vec::new();
    for name in factory.names_for_capability(Capabilities::FACTORY_PROCESSOR, true, false) {
        // Already invoked as a registry processor
        if processed.contains(&name) {
            continue;
        }
        match factory.merged_definition(&name)?.tier() {
            Tier::Priority => priority_processors.push(get_factory_processor(factory, &name)?),
            Tier::Explicit => ordered_names.push(name),
            Tier::Unordered => unordered_names.push(name),
        }
    }

    sort_post_processors(&mut priority_processors, &*comparator);
    invoke_factory_processors(&priority_processors, factory)?;

    let mut ordered_processors = get_factory_processors(factory, &ordered_names)?;
    sort_post_processors(&mut ordered_processors, &*comparator);
    invoke_factory_processors(&ordered_processors, factory)?;

    let unordered_processors = get_factory_processors(factory, &unordered_names)?;
    invoke_factory_processors(&unordered_processors, factory)?;

    // Post-processors might have modified definitions, so merged ones are stale
    factory.clear_metadata_cache();
    Ok(())
}

/// Discovers instance-level post-processors and installs them into the factory's live sequence.
///
/// Resulting sequence: guard, priority tier (sorted), explicit tier (sorted), unordered tier,
/// merged-definition-aware processors again (sorted), listener detector.
/// Processors aren't invoked here, the factory applies them to every object created afterwards.
///
/// # Errors
/// Returns the first definition or creation error
pub fn register_instance_processors(factory: &dyn ListableFactory, multicaster: &Arc<EventMulticaster>) -> Result<(), FactoryErrorKind> {
    let span = info_span!("register_instance_processors");
    let _guard = span.enter();

    let names = factory.names_for_capability(Capabilities::INSTANCE_PROCESSOR, true, false);

    let target_count = factory.instance_processor_count() + 1 + names.len();
    factory.add_instance_processor(InstanceProcessor::plain(GuardProcessor::new(target_count)));

    let comparator = comparator_for(factory);

    let mut priority_processors = Vec::new();
    let mut internal_processors = Vec::new();
    let mut ordered_names = Vec::new();
    let mut unordered_names = Vec::new();
    for name in names {
        match factory.merged_definition(&name)?.tier() {
            Tier::Priority => {
                let processor = get_instance_processor(factory, &name)?;
                if processor.is_merged_definition_aware() {
                    internal_processors.push(processor.clone());
                }
                priority_processors.push(processor);
            }
            Tier::Explicit => ordered_names.push(name),
            Tier::Unordered => unordered_names.push(name),
        }
    }

    sort_post_processors(&mut priority_processors, &*comparator);
    install_instance_processors(factory, &priority_processors);

    let mut ordered_processors = Vec::with_capacity(ordered_names.len());
    for name in &ordered_names {
        let processor = get_instance_processor(factory, name)?;
        if processor.is_merged_definition_aware() {
            internal_processors.push(processor.clone());
        }
        ordered_processors.push(processor);
    }
    sort_post_processors(&mut ordered_processors, &*comparator);
    install_instance_processors(factory, &ordered_processors);

    let mut unordered_processors = Vec::with_capacity(unordered_names.len());
    for name in &unordered_names {
        let processor = get_instance_processor(factory, name)?;
        if processor.is_merged_definition_aware() {
            internal_processors.push(processor.clone());
        }
        unordered_processors.push(processor);
    }
    install_instance_processors(factory, &unordered_processors);

    // Re-register merged-definition-aware ones at the end of the chain
    sort_post_processors(&mut internal_processors, &*comparator);
    install_instance_processors(factory, &internal_processors);

    // Last, so that it sees objects after every other processor, proxies included
    factory.add_instance_processor(InstanceProcessor::merged(ApplicationListenerDetector::new(multicaster.clone())));

    debug!(count = factory.instance_processor_count(), "Instance post-processors registered");
    Ok(())
}

fn comparator_for(factory: &dyn ListableFactory) -> Arc<dyn OrderComparator> {
    match factory.dependency_comparator() {
        Some(comparator) => comparator,
        None => Arc::new(DefaultOrderComparator),
    }
}

fn processor_error(phase: Phase, source: anyhow::Error) -> PipelineErrorKind {
    let err = PipelineErrorKind::Processor { phase, source };
    error!("{}", err);
    err
}

fn incorrect_type(name: &str, expected: Capabilities, bean: &Bean) -> FactoryErrorKind {
    let err = DefinitionErrorKind::IncorrectType {
        name: name.into(),
        expected,
        actual: bean.capabilities(),
    };
    error!("{}", err);
    err.into()
}

fn get_registry_processor(factory: &dyn ListableFactory, name: &str) -> Result<Arc<dyn RegistryPostProcessor>, FactoryErrorKind> {
    match factory.get_bean(name, Capabilities::REGISTRY_PROCESSOR)? {
        Bean::FactoryProcessor(FactoryProcessor::Registry(processor)) => Ok(processor),
        bean => Err(incorrect_type(name, Capabilities::REGISTRY_PROCESSOR, &bean)),
    }
}

fn get_factory_processor(factory: &dyn ListableFactory, name: &str) -> Result<FactoryProcessor, FactoryErrorKind> {
    match factory.get_bean(name, Capabilities::FACTORY_PROCESSOR)? {
        Bean::FactoryProcessor(processor) => Ok(processor),
        bean => Err(incorrect_type(name, Capabilities::FACTORY_PROCESSOR, &bean)),
    }
}

fn get_factory_processors(factory: &dyn ListableFactory, names: &[String]) -> Result<Vec<FactoryProcessor>, FactoryErrorKind> {
    names.iter().map(|name| get_factory_processor(factory, name)).collect()
}

fn get_instance_processor(factory: &dyn ListableFactory, name: &str) -> Result<InstanceProcessor, FactoryErrorKind> {
    match factory.get_bean(name, Capabilities::INSTANCE_PROCESSOR)? {
        Bean::InstanceProcessor(processor) => Ok(processor),
        bean => Err(incorrect_type(name, Capabilities::INSTANCE_PROCESSOR, &bean)),
    }
}

/// Sorts the wave, invokes registry mutation of each processor in it
/// and moves them to the processors whose config mutation runs later
fn invoke_registry_wave(
    current: &mut Vec<Arc<dyn RegistryPostProcessor>>,
    registry: &dyn DefinitionRegistry,
    comparator: &dyn OrderComparator,
    registry_processors: &mut Vec<Arc<dyn RegistryPostProcessor>>,
) -> Result<(), PipelineErrorKind> {
    sort_post_processors(current, comparator);
    registry_processors.extend(current.iter().cloned());

    debug!(count = current.len(), "Invoking registry mutation");
    for processor in current.drain(..) {
        processor
            .post_process_registry(registry)
            .map_err(|source| processor_error(Phase::RegistryMutation, source))?;
    }
    Ok(())
}

fn invoke_factory_processors(processors: &[FactoryProcessor], factory: &dyn ListableFactory) -> Result<(), PipelineErrorKind> {
    debug!(count = processors.len(), "Invoking config mutation");
    for processor in processors {
        processor
            .post_process_factory(factory)
            .map_err(|source| processor_error(Phase::ConfigMutation, source))?;
    }
    Ok(())
}

fn install_instance_processors(factory: &dyn ListableFactory, processors: &[InstanceProcessor]) {
    for processor in processors {
        factory.add_instance_processor(processor.clone());
    }
}
