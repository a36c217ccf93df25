//! Ripple Core - Shared domain types
//!
//! This crate holds the vocabulary the rest of Ripple speaks: code
//! entities and their critical-capability markers, the descriptors the
//! structural parser produces, and the change records derived from a
//! pull request's files.
//!
//! # Example
//!
//! ```
//! use ripple_core::{CodeEntity, EntityKind, Marker};
//!
//! let entity = CodeEntity::new(
//!     "shop.OrderService.checkout",
//!     EntityKind::Method,
//!     "checkout",
//! )
//! .with_markers([Marker::Transactional]);
//!
//! assert!(entity.has_critical_marker());
//! ```

mod change;
mod descriptor;
mod entity;

pub use change::{ChangeKind, ChangeRecord, LineRange, MethodSpan};
pub use descriptor::{DescriptorKind, EntityDescriptor, MethodDescriptor, SourceParser};
pub use entity::{CodeEntity, EntityKind, Marker};
