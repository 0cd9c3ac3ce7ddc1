pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod risk;
pub mod seed;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use seed::SeedData;
pub use store::{DemoStore, ResolutionMode, SharedStore, StoreOptions};
