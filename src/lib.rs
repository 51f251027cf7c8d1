pub mod api;
pub mod client;
pub mod filter;
pub mod schema;
pub mod stats;
pub mod store;
pub mod tables;
pub const BASE_URL: &str = "http://localhost:37240";
pub const TASKS_API: &str = "tasks";
pub const STATS_API: &str = "stats";
