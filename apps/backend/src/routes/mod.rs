pub mod auth;
pub mod progress;
pub mod questions;
pub mod teacher;
pub mod upload;
