//! Expiring in-memory caches.
//!
//! Entries carry their own TTL and are judged fresh or stale only when read;
//! nothing runs in the background.

mod clock;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{CacheEntry, TtlCache};
