// ── Collection store ──
//
// Normalized per-type state and the adapter that mutates it.

pub mod adapter;
pub mod cache;
pub mod collection;

pub use adapter::EntityAdapter;
pub use cache::EntityCache;
pub use collection::EntityCollection;
