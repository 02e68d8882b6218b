use tracing::debug;

use crate::{bean::Bean, definition::PropertyValues, errors::InstantiateErrorKind};

/// Construction strategy of a definition
pub trait Instantiator: Send + Sync + 'static {
    fn instantiate(&self) -> Result<Bean, InstantiateErrorKind>;
}

impl<F, Response, Err> Instantiator for F
where
    F: Fn() -> Result<Response, Err> + Send + Sync + 'static,
    Response: Into<Bean>,
    Err: Into<InstantiateErrorKind>,
{
    #[inline]
    fn instantiate(&self) -> Result<Bean, InstantiateErrorKind> {
        match self() {
            Ok(response) => {
                debug!("Instantiated");
                Ok(response.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Applies resolved property values to a freshly created object
pub trait Populator: Send + Sync + 'static {
    fn populate(&self, bean: &Bean, properties: &PropertyValues) -> Result<(), InstantiateErrorKind>;
}

impl<F, Err> Populator for F
where
    F: Fn(&Bean, &PropertyValues) -> Result<(), Err> + Send + Sync + 'static,
    Err: Into<InstantiateErrorKind>,
{
    #[inline]
    fn populate(&self, bean: &Bean, properties: &PropertyValues) -> Result<(), InstantiateErrorKind> {
        self(bean, properties).map_err(Into::into)
    }
}

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the container.
#[inline]
#[must_use]
pub fn instance<T: Into<Bean> + Clone + Send + Sync + 'static>(val: T) -> impl Instantiator {
    move || Ok::<_, InstantiateErrorKind>(val.clone())
}

#[cfg(test)]
mod tests {
    use super::{instance, Instantiator, Populator};
    use crate::{any::Instance, bean::Bean, definition::PropertyValues};

    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};

    #[test]
    fn test_closure_instantiator() {
        let calls = Arc::new(AtomicU8::new(0));
        let instantiator = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(Instance::new(1u16))
            }
        };

        let first = instantiator.instantiate().unwrap();
        let second = instantiator.instantiate().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!first.as_instance().unwrap().ptr_eq(second.as_instance().unwrap()));
    }

    #[test]
    fn test_instance_shares_value() {
        let value = Instance::new(1u16);
        let instantiator = instance(value.clone());

        let bean = instantiator.instantiate().unwrap();
        assert!(bean.as_instance().unwrap().ptr_eq(&value));
    }

    #[test]
    fn test_failed_instantiator() {
        let instantiator = || Err::<Instance, _>(anyhow::anyhow!("boom"));
        assert!(instantiator.instantiate().is_err());
    }

    #[test]
    fn test_closure_populator() {
        let populator = |bean: &Bean, properties: &PropertyValues| {
            if bean.as_instance().is_some() && properties.contains("name") {
                Ok(())
            } else {
                Err(anyhow::anyhow!("missing name"))
            }
        };

        let mut properties = PropertyValues::new();
        assert!(populator.populate(&Bean::object(1u8), &properties).is_err());

        properties.insert("name", "alice");
        assert!(populator.populate(&Bean::object(1u8), &properties).is_ok());
    }
}
