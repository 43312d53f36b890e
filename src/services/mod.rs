//! Domain services used by page, REST and websocket routes.
//!
//! ARCHITECTURE
//! ============
//! Record services own defaults and validation over an injected record store.
//! The save scheduler owns debounced geometry writes. The editor session ties
//! a canvas engine to both for one open dashboard.

pub mod block;
pub mod dashboard;
pub mod editor;
pub mod persistence;

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
