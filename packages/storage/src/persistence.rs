//! Keyed autosave/restore of form-shaped data over a [`TieredStore`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Debouncer, TieredStore};

/// Tuning for a [`FormPersistence`] instance.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceOptions {
    /// How long the persisted draft stays valid.
    pub expiry: Duration,
    /// Quiet window before an update is written out.
    pub debounce: Duration,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self {
            // One week, matching the draft lifetime of the intake form.
            expiry: Duration::from_secs(7 * 24 * 60 * 60),
            debounce: Duration::from_millis(300),
        }
    }
}

/// Autosaving holder for a draft value of type `T`.
///
/// Callers must not treat the value as authoritative until [`load`] has
/// run (`is_loaded` returns `true`); rendering defaults before hydration
/// would overwrite a restored draft on the next autosave.
///
/// [`load`]: FormPersistence::load
pub struct FormPersistence<T> {
    key: String,
    initial: T,
    value: Mutex<T>,
    loaded: AtomicBool,
    store: TieredStore,
    expiry: Duration,
    debouncer: Debouncer<String>,
}

impl<T> FormPersistence<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Creates a persistence holder for `key` starting from `initial`.
    #[must_use]
    pub fn new(key: &str, initial: T, store: TieredStore, options: PersistenceOptions) -> Self {
        let write_store = store.clone();
        let write_key = key.to_string();
        let expiry = options.expiry;
        let debouncer = Debouncer::new(options.debounce, move |json: String| {
            write_store.write(&write_key, &json, Some(expiry));
        });

        Self {
            key: key.to_string(),
            value: Mutex::new(initial.clone()),
            initial,
            loaded: AtomicBool::new(false),
            store,
            expiry,
            debouncer,
        }
    }

    /// Hydrates the value from storage, falling back to the initial
    /// value when nothing is stored or the stored JSON fails to parse.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn load(&self) {
        if let Some(raw) = self.store.read(&self.key) {
            match serde_json::from_str::<T>(&raw) {
                Ok(restored) => {
                    *self.value.lock().expect("persistence mutex poisoned") = restored;
                }
                Err(e) => {
                    log::warn!("Failed to parse persisted draft {}: {e}", self.key);
                }
            }
        }
        self.loaded.store(true, Ordering::SeqCst);
    }

    /// Whether initial hydration has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Returns a clone of the current value.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn value(&self) -> T {
        self.value
            .lock()
            .expect("persistence mutex poisoned")
            .clone()
    }

    /// Mutates the current value in place and schedules a debounced
    /// write of the result.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) {
        let mut value = self.value.lock().expect("persistence mutex poisoned");
        mutate(&mut value);
        match serde_json::to_string(&*value) {
            Ok(json) => self.debouncer.submit(json),
            Err(e) => log::warn!("Failed to serialize draft {}: {e}", self.key),
        }
    }

    /// Forces any pending debounced write out immediately.
    pub fn flush(&self) {
        self.debouncer.flush_now();
    }

    /// Clears the draft from every storage tier and resets the in-memory
    /// value to the initial value.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.store.remove(&self.key);
        *self.value.lock().expect("persistence mutex poisoned") = self.initial.clone();
    }

    /// The draft expiry configured for this holder.
    #[must_use]
    pub const fn expiry(&self) -> Duration {
        self.expiry
    }
}
