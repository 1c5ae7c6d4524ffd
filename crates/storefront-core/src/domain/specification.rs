//! Specification pattern for composable record predicates
//!
//! Catalog filters are evaluated as specifications: a list query's filters
//! form an [`AllOf`], its or-filters an [`AnyOf`], and the two are joined with
//! [`Specification::and`].

use std::sync::Arc;

/// Core specification trait
pub trait Specification<T>: Send + Sync {
    /// Check if the entity satisfies this specification
    fn is_satisfied_by(&self, entity: &T) -> bool;

    /// Combine with another specification using AND
    fn and<S: Specification<T> + 'static>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
    {
        AndSpecification {
            left: Arc::new(self),
            right: Arc::new(other),
        }
    }
}

/// AND composite specification
pub struct AndSpecification<T> {
    left: Arc<dyn Specification<T>>,
    right: Arc<dyn Specification<T>>,
}

impl<T> Specification<T> for AndSpecification<T>
where
    T: Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.left.is_satisfied_by(entity) && self.right.is_satisfied_by(entity)
    }
}

/// Satisfied when every member is; an empty list is always satisfied.
pub struct AllOf<T> {
    specs: Vec<Box<dyn Specification<T>>>,
}

impl<T> AllOf<T> {
    pub fn new(specs: Vec<Box<dyn Specification<T>>>) -> Self {
        Self { specs }
    }
}

impl<T: Send + Sync> Specification<T> for AllOf<T> {
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.specs.iter().all(|s| s.is_satisfied_by(entity))
    }
}

/// Satisfied when any member is; an empty list is always satisfied,
/// matching the "no or-filters" case of a list query.
pub struct AnyOf<T> {
    specs: Vec<Box<dyn Specification<T>>>,
}

impl<T> AnyOf<T> {
    pub fn new(specs: Vec<Box<dyn Specification<T>>>) -> Self {
        Self { specs }
    }
}

impl<T: Send + Sync> Specification<T> for AnyOf<T> {
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.specs.is_empty() || self.specs.iter().any(|s| s.is_satisfied_by(entity))
    }
}

/// A specification that uses a closure
pub struct PredicateSpec<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    predicate: F,
    _phantom: std::marker::PhantomData<fn(&T)>,
}

impl<T, F> PredicateSpec<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T, F> Specification<T> for PredicateSpec<T, F>
where
    T: Send + Sync,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        (self.predicate)(entity)
    }
}

/// Helper function to create a specification from a closure
pub fn spec<T, F>(predicate: F) -> PredicateSpec<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateSpec::new(predicate)
}
