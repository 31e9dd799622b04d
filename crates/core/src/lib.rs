//! Core business logic for snapcircle.

pub mod services;

pub use services::*;
