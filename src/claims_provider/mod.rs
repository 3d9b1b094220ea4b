//! The claims provider front end.
//!
//! # Module Organization
//!
//! * [`core`] - `EntraClaimsProvider` struct and settings refresh
//! * [`operations`] - Search, resolution and validation of entities
//! * [`augmentation`] - Group claims added at sign-in
//! * [`hierarchy`] - Hierarchy nodes and the claim types the provider advertises

pub mod augmentation;
pub mod core;
pub mod hierarchy;
pub mod operations;

pub use core::EntraClaimsProvider;
