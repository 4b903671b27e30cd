//! Output Sink
//!
//! Serializes composite pages for retrieval. Raster composites become one
//! PNG each; vector composites become the pages of a single PDF.

use crate::constants::OUTPUT_NAME_PREFIX;
use crate::page::{RasterPage, VectorPage};
use crate::render::{ObjectCaches, render_composite_page};
use crate::types::*;
use image::ImageFormat;
use lopdf::{Dictionary, Document, Object};
use std::io::Cursor;

/// One named output file
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Encode each composite as PNG, named `merged_{n}.png` from 1.
pub fn emit_images(pages: Vec<RasterPage>) -> Result<Vec<EmittedFile>> {
    pages
        .into_iter()
        .enumerate()
        .map(|(index, page)| {
            let mut bytes = Cursor::new(Vec::new());
            page.image().write_to(&mut bytes, ImageFormat::Png)?;
            Ok(EmittedFile {
                name: format!(
                    "{}_{}.{}",
                    OUTPUT_NAME_PREFIX,
                    index + 1,
                    OutputFormat::Png.extension()
                ),
                bytes: bytes.into_inner(),
                mime_type: OutputFormat::Png.mime_type(),
            })
        })
        .collect()
}

/// Write all composites as the pages of one `merged.pdf`, in order.
pub fn emit_document(pages: Vec<VectorPage>) -> Result<EmittedFile> {
    let mut output = Document::with_version("1.7");
    let pages_tree_id = output.new_object_id();
    let mut caches = ObjectCaches::default();
    let mut page_refs = Vec::with_capacity(pages.len());

    for page in &pages {
        let page_id = render_composite_page(&mut output, page, pages_tree_id, &mut caches)?;
        page_refs.push(Object::Reference(page_id));
    }

    // Create pages tree
    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    // Create catalog
    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    output.save_to(&mut bytes)?;

    Ok(EmittedFile {
        name: format!("{}.{}", OUTPUT_NAME_PREFIX, OutputFormat::Pdf.extension()),
        bytes,
        mime_type: OutputFormat::Pdf.mime_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Transform, VectorContent};
    use image::{Rgb, RgbImage};
    use lopdf::Stream;
    use std::sync::Arc;

    fn source_document() -> Arc<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            b"0 0 1 rg 0 0 200 100 re f".to_vec(),
        ));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 200.into(), 100.into()]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]));
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);
        Arc::new(doc)
    }

    fn composite_of_one_source() -> VectorPage {
        let document = source_document();
        let page_id = *document.get_pages().values().next().unwrap();
        let child = VectorPage::new(
            200.0,
            100.0,
            VectorContent::Source {
                document,
                page_id,
                view: Transform::IDENTITY,
            },
        )
        .unwrap()
        .placed(Transform::scale_translate(0.5, 0.5, 0.0, 50.0));
        let blank = VectorPage::blank(200.0, 100.0)
            .unwrap()
            .placed(Transform::scale_translate(0.5, 0.5, 100.0, 50.0));

        VectorPage::new(
            200.0,
            100.0,
            VectorContent::Composite(Arc::from(vec![child, blank])),
        )
        .unwrap()
    }

    #[test]
    fn test_images_are_named_from_one() {
        let pages = vec![
            RasterPage::new(RgbImage::from_pixel(4, 3, Rgb([255, 0, 0]))).unwrap(),
            RasterPage::new(RgbImage::from_pixel(2, 2, Rgb([0, 0, 255]))).unwrap(),
        ];
        let files = emit_images(pages).unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["merged_1.png", "merged_2.png"]);
        assert!(files.iter().all(|f| f.mime_type == "image/png"));

        let decoded = image::load_from_memory(&files[0].bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_document_has_one_page_per_composite() {
        let file =
            emit_document(vec![composite_of_one_source(), composite_of_one_source()]).unwrap();
        assert_eq!(file.name, "merged.pdf");
        assert_eq!(file.mime_type, "application/pdf");

        let doc = Document::load_mem(&file.bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let first = doc.get_dictionary(pages[&1]).unwrap();
        let media_box = first.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 200.0);
        assert_eq!(media_box[3].as_float().unwrap(), 100.0);

        let content = doc.get_page_content(pages[&1]).unwrap();
        let content = String::from_utf8(content).unwrap();
        assert!(content.contains("0.5 0 0 0.5 0 50 cm"));
        assert!(content.contains("/P0 Do"));
        // Blank cells draw nothing
        assert_eq!(content.matches(" Do").count(), 1);
    }

    #[test]
    fn test_document_output_is_deterministic() {
        let page = composite_of_one_source();
        let a = emit_document(vec![page.clone()]).unwrap();
        let b = emit_document(vec![page]).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }
}
