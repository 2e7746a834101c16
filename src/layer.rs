use std::collections::BTreeMap;

use kurbo::Point;

use crate::style::MarkerStyle;

/// The displayed feature set, keyed by event index. Backed by the mapping
/// library in a real UI; the engine only ever adds, removes, restyles and
/// clears, so reconciliation stays incremental.
pub trait DisplayLayer {
    fn contains(&self, id: usize) -> bool;
    fn add(&mut self, id: usize, position: Point, style: &MarkerStyle);
    fn set_style(&mut self, id: usize, style: &MarkerStyle);
    fn remove(&mut self, id: usize);
    fn clear(&mut self);
}

/// In-memory layer for tests and headless replay.
#[derive(Debug, Default)]
pub struct MemoryLayer {
    markers: BTreeMap<usize, (Point, MarkerStyle)>,
    adds: u64,
    removes: u64,
    restyles: u64,
}

impl MemoryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn marker(&self, id: usize) -> Option<&(Point, MarkerStyle)> {
        self.markers.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.markers.keys().copied()
    }

    /// Churn counters, for asserting that reconciliation left untouched
    /// markers alone.
    pub fn adds(&self) -> u64 {
        self.adds
    }

    pub fn removes(&self) -> u64 {
        self.removes
    }

    pub fn restyles(&self) -> u64 {
        self.restyles
    }
}

impl DisplayLayer for MemoryLayer {
    fn contains(&self, id: usize) -> bool {
        self.markers.contains_key(&id)
    }

    fn add(&mut self, id: usize, position: Point, style: &MarkerStyle) {
        self.adds += 1;
        self.markers.insert(id, (position, style.clone()));
    }

    fn set_style(&mut self, id: usize, style: &MarkerStyle) {
        if let Some(entry) = self.markers.get_mut(&id) {
            entry.1 = style.clone();
            self.restyles += 1;
        }
    }

    fn remove(&mut self, id: usize) {
        if self.markers.remove(&id).is_some() {
            self.removes += 1;
        }
    }

    fn clear(&mut self) {
        self.markers.clear();
    }
}
