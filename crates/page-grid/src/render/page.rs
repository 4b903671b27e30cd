//! Output page rendering for vector composites

use super::xobject::create_page_xobject;
use crate::page::{GridPage, Transform, VectorContent, VectorPage};
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::sync::Arc;

/// Copied-object maps, one per source document.
///
/// Object IDs are only unique within a document, so each source keeps its
/// own map. Keyed by the address of the shared document.
#[derive(Default)]
pub(crate) struct ObjectCaches {
    by_document: HashMap<usize, HashMap<ObjectId, ObjectId>>,
}

impl ObjectCaches {
    fn for_document(&mut self, document: &Arc<Document>) -> &mut HashMap<ObjectId, ObjectId> {
        self.by_document
            .entry(Arc::as_ptr(document) as usize)
            .or_default()
    }
}

/// Render one composite page into `output` and return its page object ID.
pub(crate) fn render_composite_page(
    output: &mut Document,
    page: &VectorPage,
    parent_pages_id: ObjectId,
    caches: &mut ObjectCaches,
) -> Result<ObjectId> {
    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page.width()),
            Object::Real(page.height()),
        ]),
    );

    let mut content_ops = String::new();
    let mut xobjects = Dictionary::new();

    // The page itself is the canvas; only its content is drawn
    draw_content(
        output,
        page.content(),
        &mut content_ops,
        &mut xobjects,
        caches,
    )?;

    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content_id = output.add_object(Stream::new(Dictionary::new(), content_ops.into_bytes()));

    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(output.add_object(page_dict))
}

/// Append drawing operators for a placed page.
fn draw_page(
    output: &mut Document,
    page: &VectorPage,
    ops: &mut String,
    xobjects: &mut Dictionary,
    caches: &mut ObjectCaches,
) -> Result<()> {
    if page.is_blank() {
        return Ok(());
    }

    ops.push_str("q\n");
    push_transform(ops, page.placement());
    draw_content(output, page.content(), ops, xobjects, caches)?;
    ops.push_str("Q\n");
    Ok(())
}

fn draw_content(
    output: &mut Document,
    content: &VectorContent,
    ops: &mut String,
    xobjects: &mut Dictionary,
    caches: &mut ObjectCaches,
) -> Result<()> {
    match content {
        VectorContent::Blank => Ok(()),
        VectorContent::Source {
            document,
            page_id,
            view,
        } => {
            let xobject_id =
                create_page_xobject(output, document, *page_id, caches.for_document(document))?;
            let name = format!("P{}", xobjects.len());
            xobjects.set(name.as_bytes(), Object::Reference(xobject_id));

            // Bring the visible box, upright, to the origin before placement
            push_transform(ops, *view);
            ops.push_str(&format!("/{} Do\n", name));
            Ok(())
        }
        VectorContent::Composite(children) => {
            for child in children.iter() {
                draw_page(output, child, ops, xobjects, caches)?;
            }
            Ok(())
        }
    }
}

fn push_transform(ops: &mut String, transform: Transform) {
    if !transform.is_identity() {
        ops.push_str(&transform.to_operator());
        ops.push('\n');
    }
}
