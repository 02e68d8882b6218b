use alloc::sync::Arc;
use core::cmp::Ordering;

/// Order key that runs first
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;
/// Order key that runs last, used when a processor doesn't declare one
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Coarse ordering class of a post-processor definition.
///
/// All [`Tier::Priority`] processors run before all [`Tier::Explicit`] ones,
/// which run before all [`Tier::Unordered`] ones.
/// Tier membership is read from the definition's capability tags,
/// so it's known before the processor is instantiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Priority,
    Explicit,
    Unordered,
}

pub trait Ordered {
    /// Lower values run first
    #[must_use]
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }
}

impl<T: Ordered + ?Sized> Ordered for Arc<T> {
    #[inline]
    fn order(&self) -> i32 {
        (**self).order()
    }
}

pub trait OrderComparator: Send + Sync {
    fn compare(&self, left: &dyn Ordered, right: &dyn Ordered) -> Ordering;
}

/// Compares order keys only
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultOrderComparator;

impl OrderComparator for DefaultOrderComparator {
    #[inline]
    fn compare(&self, left: &dyn Ordered, right: &dyn Ordered) -> Ordering {
        left.order().cmp(&right.order())
    }
}

/// Stable ascending sort of post-processors by the given comparator.
///
/// Equal keys keep their discovery order.
/// Tier partitioning is the caller's business, this only looks at keys.
pub fn sort_post_processors<T: Ordered>(processors: &mut [T], comparator: &dyn OrderComparator) {
    if processors.len() <= 1 {
        return;
    }
    processors.sort_by(|left, right| comparator.compare(left, right));
}
