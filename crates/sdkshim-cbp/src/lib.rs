//! Code::Blocks project file patching
//!
//! Generated `.cbp` files reference system paths (`/usr/include/...`).
//! [`patch`] redirects them into an SDK root and records that root inside
//! the document itself, so a later run can tell whether anything changed.

pub mod error;
pub mod patch;
pub mod xml;

pub use error::{Error, Result};
pub use patch::{PatchContext, PatchOutcome, PatchStatus, SdkNote, patch};
pub use xml::{Document, NodeId};
