//! Pixel grid compositing

use super::Composite;
use crate::constants::BACKGROUND;
use crate::layout::GridPlan;
use crate::page::RasterPage;
use crate::types::Result;
use image::RgbImage;
use image::imageops::{self, FilterType};

/// Bicubic resampling
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

impl Composite for RasterPage {
    fn compose(pages: &[Self], plan: &GridPlan<u32>) -> Result<Self> {
        let mut canvas = RgbImage::from_pixel(plan.canvas_width, plan.canvas_height, BACKGROUND);
        let (cell_width, cell_height) = (plan.cell.width, plan.cell.height);

        for (page, cell) in pages.iter().zip(&plan.placements) {
            let (x, y) = (i64::from(cell.x), i64::from(cell.y));
            if page.dimensions() == (cell_width, cell_height) {
                imageops::replace(&mut canvas, page.image(), x, y);
            } else {
                // Stretch per axis; aspect ratio is not kept
                let scaled =
                    imageops::resize(page.image(), cell_width, cell_height, RESIZE_FILTER);
                imageops::replace(&mut canvas, &scaled, x, y);
            }
        }

        RasterPage::new(canvas)
    }
}
