use std::cell::Cell;
use std::rc::Rc;

use eframe::egui::Vec2;

/// A world-space position that can be shared between a drawn entity and a
/// simulated body.
///
/// Cloning shares the storage; `detached` makes an independent copy. Bodies
/// own their cell through an `Rc`, so a world is free to move its body
/// records around without invalidating positions held by nodes or edges.
#[derive(Clone, Debug)]
pub struct PositionCell(Rc<Cell<Vec2>>);

impl PositionCell {
    pub fn new(position: Vec2) -> Self {
        Self(Rc::new(Cell::new(position)))
    }

    pub fn get(&self) -> Vec2 {
        self.0.get()
    }

    pub fn set(&self, position: Vec2) {
        self.0.set(position);
    }

    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn detached(&self) -> Self {
        Self::new(self.get())
    }

    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    #[test]
    fn clones_alias_and_detached_copies_do_not() {
        let cell = PositionCell::new(vec2(1.0, 2.0));
        let alias = cell.clone();
        let copy = cell.detached();

        alias.set(vec2(5.0, 6.0));
        assert_eq!(cell.get(), vec2(5.0, 6.0));
        assert_eq!(copy.get(), vec2(1.0, 2.0));
        assert!(cell.shares_storage_with(&alias));
        assert!(!cell.shares_storage_with(&copy));
        assert_eq!(cell.holders(), 2);
    }

    #[test]
    fn storage_outlives_either_holder() {
        let body_side = PositionCell::new(vec2(3.0, 4.0));
        let node_side = body_side.clone();
        drop(body_side);
        node_side.set(vec2(7.0, 8.0));
        assert_eq!(node_side.get(), vec2(7.0, 8.0));
        assert_eq!(node_side.holders(), 1);
    }
}
