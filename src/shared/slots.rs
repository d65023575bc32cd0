use std::collections::HashMap;

use crate::chart::ChartDataset;

/// A surface able to draw chart datasets
///
/// Implementations hand back an opaque handle per drawn chart; the handle must
/// be given back through `release` before the slot is drawn again.
pub trait ChartRenderer {
    type Handle;

    fn create(&mut self, slot: &str, dataset: &ChartDataset) -> Self::Handle;

    fn release(&mut self, slot: &str, handle: Self::Handle);
}

/// Per-slot chart registry
///
/// Each display slot owns at most one live chart. Re-rendering a slot releases
/// the previous chart first; unmounting or dropping the registry releases all.
pub struct ChartSlots<R: ChartRenderer> {
    renderer: R,
    active: HashMap<String, R::Handle>,
}

impl<R: ChartRenderer> ChartSlots<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            active: HashMap::new(),
        }
    }

    /// Draw a dataset into a slot, replacing whatever was there
    pub fn render(&mut self, slot: &str, dataset: &ChartDataset) {
        if let Some(previous) = self.active.remove(slot) {
            self.renderer.release(slot, previous);
        }
        let handle = self.renderer.create(slot, dataset);
        self.active.insert(slot.to_string(), handle);
    }

    /// Release a slot's chart; returns whether there was one
    pub fn unmount(&mut self, slot: &str) -> bool {
        match self.active.remove(slot) {
            Some(handle) => {
                self.renderer.release(slot, handle);
                true
            }
            None => false,
        }
    }

    /// Release every slot not in `keep`
    ///
    /// Used after a re-render when plants disappear from the view.
    pub fn retain<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) {
        let keep: Vec<&str> = keep.into_iter().collect();
        let stale: Vec<String> = self
            .active
            .keys()
            .filter(|slot| !keep.contains(&slot.as_str()))
            .cloned()
            .collect();
        for slot in stale {
            self.unmount(&slot);
        }
    }

    /// Release every chart
    pub fn clear(&mut self) {
        for (slot, handle) in self.active.drain() {
            self.renderer.release(&slot, handle);
        }
    }

    pub fn is_mounted(&self, slot: &str) -> bool {
        self.active.contains_key(slot)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

impl<R: ChartRenderer> Drop for ChartSlots<R> {
    fn drop(&mut self) {
        self.clear();
    }
}
