//! # cosign-core
//!
//! Domain services for the cooperative signing service: user lifecycle and
//! sessions, the per-user share store, the cosign operations (key init,
//! sign, decrypt), the audit sink, and the session expiry sweeper.
//!
//! Services are generic over the [`cosign_storage::Storage`] backend and
//! own no process-wide state; construct them with an `Arc` of the opened
//! store and the configuration values they need.

pub mod audit;
pub mod cosign;
pub mod errors;
pub mod shares;
pub mod sweeper;
pub mod types;
pub mod users;


pub use audit::AuditSink;
pub use cosign::CosignService;
pub use errors::{Result, ServiceError};
pub use shares::ShareStore;
pub use types::{actions, AuditRecord, Session, ShareRecord, User};
pub use users::UserService;
