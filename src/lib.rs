// src/lib.rs
pub mod clock;
pub mod config;
pub mod domain;
pub mod lifecycle;
pub mod money;
pub mod notifications;
pub mod persistence;
pub mod scheduler;
pub mod web;

pub use domain::*;
pub use lifecycle::{LifecycleConfig, LifecycleManager};
pub use money::*;
