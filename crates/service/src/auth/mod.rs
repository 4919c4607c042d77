//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login, token verification and the user directory used for
//! notifications all live here.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use domain::Principal;
pub use service::AuthService;
