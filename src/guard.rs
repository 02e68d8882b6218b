use tracing::info;

use crate::{
    bean::Bean,
    order::Ordered,
    processor::{BeanContext, Hook, InstancePostProcessor},
    scope::Role,
};

/// Logs a notice when an object is fully initialized while the processor chain is still being installed,
/// i.e. when the object isn't eligible for getting processed by all instance post-processors.
pub struct GuardProcessor {
    target_count: usize,
}

impl GuardProcessor {
    #[inline]
    #[must_use]
    pub const fn new(target_count: usize) -> Self {
        Self { target_count }
    }

    #[inline]
    #[must_use]
    pub const fn target_count(&self) -> usize {
        self.target_count
    }
}

fn is_infrastructure(ctx: &BeanContext<'_>) -> bool {
    let Some(registry) = ctx.factory.as_registry() else {
        return false;
    };
    if !registry.contains_definition(ctx.name) {
        return false;
    }
    registry
        .definition(ctx.name)
        .is_ok_and(|definition| definition.role() == Role::Infrastructure)
}

impl Ordered for GuardProcessor {}

impl InstancePostProcessor for GuardProcessor {
    fn after_initialization(&self, bean: &Bean, ctx: &BeanContext<'_>) -> anyhow::Result<Hook<Bean>> {
        if !bean.is_instance_processor() && !is_infrastructure(ctx) && ctx.factory.instance_processor_count() < self.target_count {
            info!(
                "Bean '{}' of type [{}] is not eligible for getting processed by all instance post-processors",
                ctx.name,
                bean.type_name(),
            );
        }
        Ok(Hook::Proceed(bean.clone()))
    }
}
