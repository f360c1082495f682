//! Auth module: domain types, repository contracts, and the two core
//! components (credential verifier, token authority) composed by `AuthService`.

pub mod deadline;
pub mod domain;
pub mod errors;
pub mod password;
pub mod repository;
pub mod repo;
pub mod service;
pub mod token;

pub use service::AuthService;
