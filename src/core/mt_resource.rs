use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// Clones share the same value. The mesh buffer pool lives in one of these so
/// that build workers and the primary thread can hand buffers back and forth.
///
/// A panic while a guard is held poisons the lock; the next access recovers
/// the inner value instead of propagating the panic, because every value kept
/// here is valid between two operations.
///
/// # Examples
/// ```
/// use voxel_streaming::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let shared = counter.clone();
///
/// std::thread::spawn(move || *shared.get_mut() += 1)
///     .join()
///     .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a guard that allows reading the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a guard that allows modifying the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access and returns its result.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.get_mut())
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_lock_is_recovered() {
        let resource = MtResource::new(vec![1, 2, 3]);
        let shared = resource.clone();

        let outcome = std::thread::spawn(move || {
            let mut guard = shared.get_mut();
            guard.push(4);
            panic!("worker failed while holding the lock");
        })
        .join();

        assert!(outcome.is_err());
        assert_eq!(resource.get().len(), 4);
    }
}
