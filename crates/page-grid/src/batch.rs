//! Grouping pages into fixed-size batches

use crate::page::GridPage;
use crate::types::{GridError, Result};

/// A fixed-size group of consecutive pages destined for one composite.
///
/// Filler pages, if any, always follow the real ones.
#[derive(Debug, Clone)]
pub struct Batch<P> {
    pages: Vec<P>,
    real_pages: usize,
}

impl<P> Batch<P> {
    /// All members, real pages first
    pub fn pages(&self) -> &[P] {
        &self.pages
    }

    /// Members that came from the input sequence
    pub fn real(&self) -> &[P] {
        &self.pages[..self.real_pages]
    }

    pub fn real_pages(&self) -> usize {
        self.real_pages
    }

    pub fn filler_pages(&self) -> usize {
        self.pages.len() - self.real_pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn into_pages(self) -> Vec<P> {
        self.pages
    }
}

/// Split `pages` in order into groups of `batch_size`.
///
/// A short final group is completed with blank pages shaped like that
/// group's first page. An empty input yields no batches.
pub fn batch<P: GridPage>(pages: Vec<P>, batch_size: usize) -> Result<Vec<Batch<P>>> {
    if batch_size == 0 {
        return Err(GridError::Config(
            "Batch size must be at least 1".to_string(),
        ));
    }

    let mut batches = Vec::with_capacity(pages.len().div_ceil(batch_size));
    let mut pages = pages.into_iter().peekable();

    while pages.peek().is_some() {
        let mut group: Vec<P> = pages.by_ref().take(batch_size).collect();
        let real_pages = group.len();

        if real_pages < batch_size {
            let filler = group[0].blank_like();
            group.extend((real_pages..batch_size).map(|_| filler.blank_like()));
        }

        batches.push(Batch {
            pages: group,
            real_pages,
        });
    }

    Ok(batches)
}
