pub mod filter;
pub mod storage;
pub mod types;

pub use filter::{export_flagged, filter_flagged};
pub use storage::{get_flags_path, load_flag_state, save_flag_state};
pub use types::{FlagEntry, FlagState};
