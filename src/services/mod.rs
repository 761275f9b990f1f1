//! Service layer for shelf
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation and cross-entity rules such as "a book can only be
//! on one open loan".

pub mod lending;

pub use lending::LendingService;
