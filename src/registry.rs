//! Process-wide registry of named preference stores
//!
//! One store per namespace, created on first request. Initialization is
//! race-free: the registry lock is held across the existence check and the
//! construction, so concurrent first access cannot double-construct.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::store::Preferences;

/// Handle to a registered store. The store itself stays single-owner; the
/// mutex is what makes handing it across threads safe.
pub type SharedPreferences = Arc<Mutex<Preferences>>;

fn stores() -> &'static Mutex<HashMap<String, SharedPreferences>> {
    static STORES: OnceLock<Mutex<HashMap<String, SharedPreferences>>> = OnceLock::new();
    STORES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Fetch the store registered under `namespace`, constructing it with
/// `init` on first access.
pub fn get_or_init<F>(namespace: &str, init: F) -> SharedPreferences
where
    F: FnOnce() -> Preferences,
{
    let mut map = stores().lock().unwrap_or_else(PoisonError::into_inner);
    match map.get(namespace) {
        Some(existing) => Arc::clone(existing),
        None => {
            debug!(namespace = %namespace, "constructing preference store");
            let created = Arc::new(Mutex::new(init()));
            map.insert(namespace.to_string(), Arc::clone(&created));
            created
        }
    }
}

/// Fetch an already-registered store without constructing one.
pub fn get(namespace: &str) -> Option<SharedPreferences> {
    let map = stores().lock().unwrap_or_else(PoisonError::into_inner);
    map.get(namespace).map(Arc::clone)
}

/// Drop a store from the registry (existing handles stay valid).
pub fn discard(namespace: &str) -> bool {
    let mut map = stores().lock().unwrap_or_else(PoisonError::into_inner);
    map.remove(namespace).is_some()
}
