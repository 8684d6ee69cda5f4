pub mod config;
pub mod error;
pub mod telemetry;

pub use config::BrokerConfig;
pub use error::Error;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Latest value shared between threads, for example between the thread
/// talking to the broker and the UI thread rendering the data.
///
/// Every [`ValueStore::update`] marks the value as fresh; the reader picks it
/// up once with [`ValueStore::take_fresh`].
#[derive(Clone, Default)]
pub struct ValueStore<T>(Arc<Mutex<Slot<T>>>);

#[derive(Default)]
struct Slot<T> {
    value: T,
    fresh: bool,
}

impl<T: Clone> ValueStore<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(Slot { value, fresh: false })))
    }

    /// Replaces the value with the result of `f` and marks it fresh.
    pub fn update(&self, f: impl FnOnce(T) -> T) {
        let mut slot = self.lock();
        slot.value = f(slot.value.clone());
        slot.fresh = true;
    }

    /// Returns the value if it changed since the last call.
    pub fn take_fresh(&self) -> Option<T> {
        let mut slot = self.lock();
        std::mem::take(&mut slot.fresh).then(|| slot.value.clone())
    }

    pub fn snapshot(&self) -> T {
        self.lock().value.clone()
    }

    // A panic while holding the lock leaves a complete value behind, so the
    // poison flag carries no information here.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[test]
fn test_value_store_hands_out_updates_once() {
    let store = ValueStore::new(1u32);
    assert_eq!(store.take_fresh(), None);

    store.update(|v| v + 1);
    assert_eq!(store.take_fresh(), Some(2));
    assert_eq!(store.take_fresh(), None);
    assert_eq!(store.snapshot(), 2);
}

#[test]
fn test_value_store_is_shared_between_threads() {
    let store = ValueStore::<Vec<u8>>::default();
    let writer = store.clone();

    std::thread::spawn(move || {
        for i in 0..10 {
            writer.update(|mut v| {
                v.push(i);
                v
            });
        }
    })
    .join()
    .unwrap();

    assert_eq!(store.take_fresh().map(|v| v.len()), Some(10));
}
