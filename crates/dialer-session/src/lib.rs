//! Call session state for the Dialer core.
//!
//! Implements the session reducer (a pure transition function over a
//! tagged action enum), the `CallSessionStore` that owns the state and
//! runs its side effects (the once-per-second duration ticker and
//! preference persistence), and the SQLite-backed preference cache.
//!
//! The reducer itself is deterministic and side-effect free; everything
//! that touches a clock or the filesystem lives in the store.

mod error;
mod prefs;
mod reducer;
mod store;

pub use error::SessionError;
pub use prefs::PreferenceStore;
pub use reducer::{reduce, CallAction, CallSession};
pub use store::CallSessionStore;
