//! XObject creation for composite pages
//!
//! Source pages become Form XObjects in the output document and are then
//! drawn into their grid cells with a transform.

use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::page::Transform;
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Pages may inherit their boxes from ancestors; stop after this many hops
const MAX_INHERITANCE_DEPTH: usize = 32;

// =============================================================================
// XObject Creation
// =============================================================================

/// Create a Form XObject from a source page.
///
/// Referenced objects are copied once per source document; `cache` maps
/// source object IDs to their copies in `output`.
pub(crate) fn create_page_xobject(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page_dict = source.get_dictionary(page_id)?;

    // Clip to the visible area; rotation is applied when the form is drawn
    let visible = page_box(source, page_id)?;
    let bbox = vec![
        Object::Real(visible.x),
        Object::Real(visible.y),
        Object::Real(visible.x + visible.width),
        Object::Real(visible.y + visible.height),
    ];

    let content_data = get_page_content(source, page_dict)?;

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("BBox", Object::Array(bbox));
    xobject_dict.set("FormType", Object::Integer(1));

    if let Some(resources) = inherited_attribute(source, page_id, b"Resources")? {
        xobject_dict.set(
            "Resources",
            copy_object_deep(output, source, &resources, cache)?,
        );
    }

    Ok(output.add_object(Stream::new(xobject_dict, content_data)))
}

// =============================================================================
// Page Content Extraction
// =============================================================================

/// Get the content stream data from a page.
fn get_page_content(doc: &Document, page_dict: &Dictionary) -> Result<Vec<u8>> {
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(id) => get_single_content_stream(doc, *id),
        Object::Array(arr) => get_concatenated_content_streams(doc, arr),
        _ => Ok(Vec::new()),
    }
}

fn get_single_content_stream(doc: &Document, id: ObjectId) -> Result<Vec<u8>> {
    match doc.get_object(id)? {
        Object::Stream(stream) => Ok(stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())),
        Object::Array(arr) => get_concatenated_content_streams(doc, arr),
        _ => Ok(Vec::new()),
    }
}

fn get_concatenated_content_streams(doc: &Document, refs: &[Object]) -> Result<Vec<u8>> {
    let mut result = Vec::new();

    for obj in refs {
        if let Object::Reference(id) = obj {
            if let Ok(stream) = doc.get_object(*id)?.as_stream() {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                result.extend_from_slice(&content);
                result.push(b'\n');
            }
        }
    }

    Ok(result)
}

// =============================================================================
// Deep Copy
// =============================================================================

/// Deep copy an object from source to output document, following references.
pub(crate) fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            // Reserve the ID first so reference cycles terminate
            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let referenced = source.get_object(*id)?;
            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                // Parent links would drag the whole source page tree along
                if key.as_slice() == b"Parent" {
                    continue;
                }
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Stream(Stream {
                dict: new_dict,
                content: stream.content.clone(),
                allows_compression: stream.allows_compression,
                start_position: None,
            }))
        }
        _ => Ok(obj.clone()),
    }
}

// =============================================================================
// Page Geometry
// =============================================================================

/// Visible area of a page: its CropBox clipped to its MediaBox, in the
/// page's own user space, plus the rotation it is displayed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Clockwise display rotation: 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageBox {
    /// Width and height of the page as displayed
    pub fn display_size(&self) -> (f32, f32) {
        if self.rotation % 180 == 90 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Maps the page's user space onto the displayed page at
    /// `[0 0 display_width display_height]`.
    pub fn view_transform(&self) -> Transform {
        let Self {
            x,
            y,
            width: w,
            height: h,
            ..
        } = *self;
        let (a, b, c, d, e, f) = match self.rotation {
            90 => (0.0, -1.0, 1.0, 0.0, -y, w + x),
            180 => (-1.0, 0.0, 0.0, -1.0, w + x, h + y),
            270 => (0.0, 1.0, -1.0, 0.0, h + y, -x),
            _ => (1.0, 0.0, 0.0, 1.0, -x, -y),
        };
        Transform { a, b, c, d, e, f }
    }
}

/// Displayed geometry of a page.
///
/// The MediaBox falls back to US Letter when no usable box is found on the
/// page or its ancestors. A missing or disjoint CropBox means the whole
/// MediaBox is visible.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> Result<PageBox> {
    let media = read_rect(doc, page_id, b"MediaBox")?.unwrap_or(Rect {
        left: 0.0,
        bottom: 0.0,
        right: DEFAULT_PAGE_DIMENSIONS.0,
        top: DEFAULT_PAGE_DIMENSIONS.1,
    });
    let visible = read_rect(doc, page_id, b"CropBox")?
        .and_then(|crop| crop.intersect(&media))
        .unwrap_or(media);

    Ok(PageBox {
        x: visible.left,
        y: visible.bottom,
        width: visible.right - visible.left,
        height: visible.top - visible.bottom,
        rotation: page_rotation(doc, page_id)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    left: f32,
    bottom: f32,
    right: f32,
    top: f32,
}

impl Rect {
    fn intersect(&self, other: &Rect) -> Option<Rect> {
        let rect = Rect {
            left: self.left.max(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.min(other.right),
            top: self.top.min(other.top),
        };
        (rect.right > rect.left && rect.top > rect.bottom).then_some(rect)
    }
}

/// A page box rectangle, normalized so left < right and bottom < top.
/// `None` if absent, malformed or empty.
fn read_rect(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Rect>> {
    let Some(value) = inherited_attribute(doc, page_id, key)? else {
        return Ok(None);
    };
    let value = resolve(doc, value)?;
    let Ok(values) = value.as_array() else {
        return Ok(None);
    };
    let numbers: Vec<f32> = values.iter().filter_map(extract_number).collect();
    if numbers.len() != 4 || numbers.iter().any(|n| !n.is_finite()) {
        return Ok(None);
    }

    let rect = Rect {
        left: numbers[0].min(numbers[2]),
        bottom: numbers[1].min(numbers[3]),
        right: numbers[0].max(numbers[2]),
        top: numbers[1].max(numbers[3]),
    };
    Ok((rect.right > rect.left && rect.top > rect.bottom).then_some(rect))
}

/// Inherited `/Rotate`, normalized to 0, 90, 180 or 270.
/// Values that are not a multiple of 90 are treated as 0.
fn page_rotation(doc: &Document, page_id: ObjectId) -> Result<u16> {
    let Some(value) = inherited_attribute(doc, page_id, b"Rotate")? else {
        return Ok(0);
    };
    let degrees = match resolve(doc, value)? {
        Object::Integer(i) => i,
        Object::Real(r) if r.fract() == 0.0 => r as i64,
        _ => return Ok(0),
    };
    match degrees.rem_euclid(360) {
        90 => Ok(90),
        180 => Ok(180),
        270 => Ok(270),
        _ => Ok(0),
    }
}

fn resolve(doc: &Document, value: Object) -> Result<Object> {
    match value {
        Object::Reference(id) => Ok(doc.get_object(id)?.clone()),
        other => Ok(other),
    }
}

/// Look up a page attribute, walking `Parent` links for inheritable keys.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
    let mut dict = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value.clone()));
        }
        match dict.get(b"Parent").and_then(|p| p.as_reference()) {
            Ok(parent_id) => dict = doc.get_dictionary(parent_id)?,
            Err(_) => break,
        }
    }
    Ok(None)
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
