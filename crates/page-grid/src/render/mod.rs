//! PDF rendering for vector composites
//!
//! This module handles all lopdf-specific operations:
//! - Reading page boxes and rotation from source documents
//! - Turning source pages into Form XObjects
//! - Deep copying PDF objects between documents
//! - Building output pages from composite placements

mod page;
mod xobject;

pub(crate) use page::{ObjectCaches, render_composite_page};
pub(crate) use xobject::page_box;
