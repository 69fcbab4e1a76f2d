//! A generic, in-memory permission hierarchy.
//!
//! Permissions live on dotted paths (`"fs.read"`, `"fs.write.*"`) in a pair
//! of tries per [`PermissionSet`](set::PermissionSet) — one for permissions
//! anchored exactly at a path, one for permissions that cover everything
//! below it. [`PermissionGroup`](group::PermissionGroup) bundles a set with
//! priority-ordered references to other groups, and
//! [`PermissionsRegistry`](registry::PermissionsRegistry) ties users and
//! named groups together behind one query surface, generic over whatever
//! `UserId` type the embedding application already uses.
//!
//! Nothing here touches disk or the network: [`PermissionsRegistry::save`]
//! and [`PermissionsRegistry::load`] only produce and consume in-memory
//! strings, leaving persistence to the caller.

pub mod error;
pub mod group;
pub mod path;
pub mod permission;
pub mod registry;
pub mod set;

pub use error::{LoadError, MissingPermissionError, ParseError, UserMissingPermissionError};
pub use group::PermissionGroup;
pub use permission::{Condition, Permission};
pub use registry::{PermissionStatus, PermissionsRegistry, RegistryConfig};
pub use set::{Match, PermissionSet};
