//! Live state shared by concurrent syncs.
//!
//! - [`LiveIndex`]: the in-memory mirror of offering reservations and
//!   published student views, guarded per offering
//! - [`StudentLocks`]: exclusive per-student locks serializing syncs of the
//!   same student

mod error;
mod index;
mod locks;
mod view;

pub use error::{LiveError, LiveResult};
pub use index::{LiveIndex, LiveOffering, LiveReservation};
pub use locks::{LockKey, StudentLock, StudentLocks};
pub use view::{RequestView, StudentView};
