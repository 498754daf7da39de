pub use self::capacity::resolve_over_capacity;
pub use self::preference::{PoolOrder, match_preferences};
pub use self::special::allocate_special_admissions;

mod capacity;
mod preference;
mod special;
