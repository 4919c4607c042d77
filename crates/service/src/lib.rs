//! Business layer of the Capital M investment platform.
//! - Services own tenant scoping, role checks and lifecycle state machines.
//! - Persistence sits behind repository traits (SeaORM and in-memory).
//! - Side effects (email, push, documents) go through pluggable backends.

pub mod app;
pub mod auth;
pub mod errors;
pub mod metrics;
pub mod notify;
pub mod pagination;
pub mod portfolio;
pub mod render;
pub mod repository;
pub mod services;
pub mod storage;

mod test_support;

pub use app::{Backends, Services};
