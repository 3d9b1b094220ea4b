//! Boundary toward the external directory (Microsoft Graph).
//!
//! The claims provider never talks to Graph itself. It hands an
//! [`OperationContext`](crate::operation::OperationContext) to a
//! [`DirectoryProvider`] and interprets the objects it gets back.

pub mod in_memory;
pub mod object;
pub mod provider;

pub use in_memory::InMemoryDirectory;
pub use object::{
    DirectoryGroup, DirectoryObject, DirectoryUser, GUEST_USER_TYPE, MEMBER_USER_TYPE,
};
pub use provider::DirectoryProvider;
