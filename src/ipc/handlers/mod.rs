pub mod auth;
pub mod browse;
pub mod core;
pub mod dashboard;
pub mod students;
