//! Lock helpers that recover from poisoning.
//!
//! A panic inside a contact callback must not wedge the world for every
//! later caller, so poisoned guards are taken over and logged.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::warn!("recovering poisoned mutex");
        poisoned.into_inner()
    })
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::warn!("recovering poisoned rwlock (read)");
        poisoned.into_inner()
    })
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::warn!("recovering poisoned rwlock (write)");
        poisoned.into_inner()
    })
}
