//! The tray of pieces offered to the player
//!
//! Fixed number of slots; a slot empties when its shape is placed. The tray
//! is refilled as a whole batch once every slot is empty.

use serde::{Deserialize, Serialize};

use super::shape::Shape;
use crate::consts::TRAY_SIZE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tray {
    slots: [Option<Shape>; TRAY_SIZE],
}

impl Tray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every slot with the given shapes (missing ones leave a slot empty)
    pub fn fill(&mut self, shapes: Vec<Shape>) {
        let mut shapes = shapes.into_iter();
        for slot in &mut self.slots {
            *slot = shapes.next();
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Shape> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Remove and return the shape in a slot
    pub fn take(&mut self, slot: usize) -> Option<Shape> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Put a shape back into an empty slot (used when a placement bounces)
    pub fn put_back(&mut self, slot: usize, shape: Shape) {
        if let Some(s) = self.slots.get_mut(slot) {
            debug_assert!(s.is_none(), "slot {slot} already holds a shape");
            *s = Some(shape);
        }
    }

    /// Swap a slot's shape for a transformed copy (rotation)
    pub fn replace(&mut self, slot: usize, shape: Shape) -> bool {
        match self.slots.get_mut(slot) {
            Some(s @ Some(_)) => {
                *s = Some(shape);
                true
            }
            _ => false,
        }
    }

    /// All slots empty: time for a new batch
    pub fn is_exhausted(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Remaining shapes with their slot indices
    pub fn shapes(&self) -> impl Iterator<Item = (usize, &Shape)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|shape| (i, shape)))
    }

    pub fn remaining(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn slots(&self) -> &[Option<Shape>; TRAY_SIZE] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::shape::Pattern;

    fn shape(id: u64) -> Shape {
        Shape::new(id, 0, Pattern::literal(&[&[1]]), 1)
    }

    #[test]
    fn test_take_until_exhausted() {
        let mut tray = Tray::new();
        assert!(tray.is_exhausted());
        tray.fill(vec![shape(1), shape(2), shape(3)]);
        assert_eq!(tray.remaining(), 3);

        assert_eq!(tray.take(1).map(|s| s.id()), Some(2));
        assert_eq!(tray.take(1), None);
        assert!(!tray.is_exhausted());
        tray.take(0);
        tray.take(2);
        assert!(tray.is_exhausted());
        assert_eq!(tray.take(7), None);
    }

    #[test]
    fn test_replace_only_occupied_slots() {
        let mut tray = Tray::new();
        tray.fill(vec![shape(1)]);
        assert!(tray.replace(0, shape(9)));
        assert!(!tray.replace(1, shape(10)));
        assert_eq!(tray.get(0).map(Shape::id), Some(9));
        assert_eq!(tray.shapes().count(), 1);
    }
}
