pub use crate::api::StatsResponse;
pub use crate::filter::{StatusFilter, TaskFilter};
pub use crate::tables::{Priority, Task};
pub mod tasks;
// Re-export the modules
pub use tasks::*;
