//! cirrus-store: the hosted object store as seen from cloud code.
//!
//! [`ObjectStore`] is the seam: [`RestStore`] talks to the hosted platform
//! with the master key, [`MemoryStore`] keeps everything in process.

pub mod acl;
pub mod error;
pub mod memory;
pub mod object;
pub mod query;
pub mod rest;
pub mod store;
mod webhooks;

pub use acl::{Acl, Permission};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use object::{FieldOp, ParseObject, Pointer, ROLE_CLASS, USER_CLASS};
pub use query::{Constraint, Query};
pub use rest::RestStore;
pub use store::{ObjectStore, PAGE_SIZE};
