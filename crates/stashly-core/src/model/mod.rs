// ── Entity model ──
//
// Entities are JSON objects inside the cache; keys, partial updates and
// comparers are the only structure the engine imposes on them.

pub mod key;
pub mod sort;
pub mod update;

pub use key::{DEFAULT_ID_FIELD, EntityKey, IdSelector, default_select_id, select_id_by_field};
pub use sort::{SortComparer, compare_values, sort_by_field};
pub use update::{Update, merge};
