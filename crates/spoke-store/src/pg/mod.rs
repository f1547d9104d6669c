//! PostgreSQL store implementations

mod nonce;
mod principal;

pub use nonce::PgNonceLedger;
pub use principal::PgPrincipalRepository;
