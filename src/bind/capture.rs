use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Shared reference to caller storage, created by [`by_ref`].
///
/// The borrow checker keeps the referent alive for as long as the task can
/// run, which is why these only launch inside [`scope`](crate::scope).
pub struct Ref<'a, T: ?Sized>(&'a T);

/// Exclusive reference to caller storage, created by [`by_mut`].
///
/// Mutations made by the task are visible to the caller once it joins.
pub struct Mut<'a, T: ?Sized>(&'a mut T);

/// Shared ownership of a value, created by [`shared`].
///
/// The value lives as long as its last holder, so this launches anywhere.
/// Mutation needs interior mutability chosen by the caller.
pub struct Shared<T: ?Sized>(Arc<T>);

/// A receiver passed by value to [`bind_member`](super::bind_member).
///
/// The task mutates its own copy; the caller's value is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owned<T>(pub T);

/// Pass `value` by shared reference.
pub fn by_ref<T: ?Sized>(value: &T) -> Ref<'_, T> {
    Ref(value)
}

/// Pass `value` by exclusive reference.
pub fn by_mut<T: ?Sized>(value: &mut T) -> Mut<'_, T> {
    Mut(value)
}

/// Pass a new strong reference to `value`.
pub fn shared<T: ?Sized>(value: &Arc<T>) -> Shared<T> {
    Shared(Arc::clone(value))
}

/// Pass an independent copy of `value`.
pub fn copied<T: Clone>(value: &T) -> T {
    value.clone()
}

/// Move `value` out, leaving `T::default()` in its place.
pub fn take<T: Default>(value: &mut T) -> T {
    mem::take(value)
}

impl<'a, T: ?Sized> Ref<'a, T> {
    /// The underlying reference, with the full borrow lifetime.
    pub fn get(&self) -> &'a T {
        self.0
    }
}

impl<'a, T: ?Sized> Mut<'a, T> {
    pub fn into_inner(self) -> &'a mut T {
        self.0
    }
}

impl<T: ?Sized> Shared<T> {
    pub fn into_arc(self) -> Arc<T> {
        self.0
    }

    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }
}

impl<'a, T: ?Sized> Clone for Ref<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: ?Sized> Copy for Ref<'a, T> {}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }
}

impl<'a, T: ?Sized> Deref for Ref<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.0
    }
}

impl<'a, T: ?Sized> Deref for Mut<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.0
    }
}

impl<'a, T: ?Sized> DerefMut for Mut<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.0
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Owned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<'a, T: ?Sized + fmt::Debug> fmt::Debug for Ref<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.0).finish()
    }
}

impl<'a, T: ?Sized + fmt::Debug> fmt::Debug for Mut<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mut").field(&&*self.0).finish()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&&*self.0).finish()
    }
}
