//! Structural source parsing for Ripple.
//!
//! Turns source trees into [`ripple_core::EntityDescriptor`]s that the graph
//! builder can merge. The extractors here are deliberately line-oriented:
//! they recover the structural facts the impact engine needs (declarations,
//! annotations, method spans, outbound call names) without a full grammar,
//! and they degrade to an empty result on files they cannot read.

mod error;
mod java;
mod walk;

pub use error::ParserError;
pub use java::JavaParser;
pub use walk::parse_repo;
