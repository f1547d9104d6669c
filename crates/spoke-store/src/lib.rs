//! Spoke Store - shared-state abstractions
//!
//! Repository traits for the nonce ledger and the principal store, with
//! in-memory (DashMap) and PostgreSQL (sqlx) implementations. Both stores
//! are shared across concurrent validations; the nonce check-and-record is
//! a single atomic `insert_if_absent` at the trait level.

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryNonceLedger, MemoryPrincipalRepository};
pub use models::PrincipalRow;
pub use pool::DbPool;
pub use repo::{CreatePrincipal, NonceLedger, PrincipalRepository};
