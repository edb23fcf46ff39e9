pub mod audit;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod providers;
pub mod store;
pub mod telegram;
