pub mod api;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod schema;
pub mod stats;
pub mod store;
pub mod theme;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use models::{MonthGoal, Note, Principal, Rule, Task};
pub use store::{PlannerStore, SessionStore, StoreError};
pub use utils::Profile;
