pub mod roles;
pub mod users_hooks;
pub mod users_shared;

pub use roles::{RoleDirectory, ROLE_USERS};
pub use users_hooks::{RoleReconciliation, SignupPolicyGate, GUEST_DENIED, MEMBER_ROLE, SIGNUP_DENIED};
