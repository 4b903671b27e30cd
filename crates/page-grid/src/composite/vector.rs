//! Vector page merge
//!
//! Source pages are not re-rendered: each member is kept by reference and
//! given a placement transform into its cell. PDF space has a bottom-left
//! origin, so the planner's top-left offsets are flipped here.

use super::Composite;
use crate::layout::GridPlan;
use crate::page::{GridPage, Transform, VectorContent, VectorPage};
use crate::types::Result;
use std::sync::Arc;

impl Composite for VectorPage {
    fn compose(pages: &[Self], plan: &GridPlan<f32>) -> Result<Self> {
        let (cell_width, cell_height) = (plan.cell.width, plan.cell.height);

        let children: Vec<VectorPage> = pages
            .iter()
            .zip(&plan.placements)
            .map(|(page, cell)| {
                let bottom = plan.canvas_height - cell.y - cell_height;
                page.placed(Transform::scale_translate(
                    cell_width / page.width(),
                    cell_height / page.height(),
                    cell.x,
                    bottom,
                ))
            })
            .collect();

        VectorPage::new(
            plan.canvas_width,
            plan.canvas_height,
            VectorContent::Composite(Arc::from(children)),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::batch::batch;
    use crate::composite::composite;
    use crate::page::{GridPage, VectorContent, VectorPage};
    use crate::types::GridShape;

    fn children(page: &VectorPage) -> &[VectorPage] {
        match page.content() {
            VectorContent::Composite(children) => &children[..],
            other => panic!("expected composite content, got {:?}", other),
        }
    }

    #[test]
    fn test_cell_regions_in_pdf_space() {
        let pages = vec![
            VectorPage::blank(100.0, 200.0).unwrap(),
            VectorPage::blank(50.0, 50.0).unwrap(),
            VectorPage::blank(80.0, 80.0).unwrap(),
            VectorPage::blank(100.0, 100.0).unwrap(),
        ];
        let batches = batch(pages, 4).unwrap();
        let merged = composite(&batches[0], GridShape::default()).unwrap();

        assert_eq!((merged.width(), merged.height()), (100.0, 100.0));

        // Map each child's own box corners into the composite
        let regions: Vec<_> = children(&merged)
            .iter()
            .map(|child| {
                let t = child.placement();
                (t.apply(0.0, 0.0), t.apply(child.width(), child.height()))
            })
            .collect();

        // Top row sits at y 50..100 in bottom-left space
        assert_eq!(regions[0], ((0.0, 50.0), (50.0, 100.0)));
        assert_eq!(regions[1], ((50.0, 50.0), (100.0, 100.0)));
        assert_eq!(regions[2], ((0.0, 0.0), (50.0, 50.0)));
        assert_eq!(regions[3], ((50.0, 0.0), (100.0, 50.0)));
    }

    #[test]
    fn test_inputs_keep_identity_placement() {
        let pages = vec![
            VectorPage::blank(612.0, 792.0).unwrap(),
            VectorPage::blank(595.0, 842.0).unwrap(),
        ];
        let batches = batch(pages, 2).unwrap();
        let merged = composite(&batches[0], GridShape::new(1, 2)).unwrap();

        assert!(batches[0].pages().iter().all(|p| p.placement().is_identity()));
        assert_eq!((merged.width(), merged.height()), (1190.0, 792.0));
        assert_eq!(children(&merged).len(), 2);
    }

    #[test]
    fn test_filler_children_are_blank() {
        let batches = batch(vec![VectorPage::blank(200.0, 300.0).unwrap()], 4).unwrap();
        let merged = composite(&batches[0], GridShape::default()).unwrap();

        let kids = children(&merged);
        assert_eq!(kids.len(), 4);
        assert!(kids[1..].iter().all(|k| k.is_blank()));
        assert!(kids.iter().all(|k| k.width() == 200.0 && k.height() == 300.0));
    }
}
