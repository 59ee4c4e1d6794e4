//! The two stimulus patches and the closed enums naming them.

use crate::config::PatchGeometry;
use crate::error::{FieldError, Result};
use crate::spatial::Rect;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Which of the two patches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    /// The opposite side.
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Horizontal direction of coherent motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// `-1.0` for left, `1.0` for right.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    /// Unit vector pointing along this direction.
    #[inline]
    pub fn unit(self) -> DVec2 {
        DVec2::new(self.sign(), 0.0)
    }

    pub fn reversed(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// One bounded region holding a dot population.
///
/// The outline is drawn inside the raw rectangle, so dots move within the
/// rectangle inset by the outline thickness on every side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Patch {
    pub side: Side,
    /// Raw rectangle including the outline.
    pub rect: Rect,
    /// Outline thickness.
    pub outline: f64,
}

impl Patch {
    pub fn new(side: Side, rect: Rect, outline: f64) -> Self {
        Self { side, rect, outline }
    }

    /// Movement bounds: the rectangle inset by the outline thickness.
    pub fn inner(&self) -> Rect {
        self.rect.inset(self.outline)
    }

    /// Region a dot centre of the given radius may occupy without its
    /// circle crossing the inner bounds.
    pub fn centre_area(&self, radius: f64) -> Rect {
        self.inner().inset(radius)
    }

    /// Whether a circle lies fully inside the inner bounds.
    pub fn contains_circle(&self, center: DVec2, radius: f64) -> bool {
        let inner = self.inner();
        center.x - radius >= inner.min_x()
            && center.x + radius <= inner.max_x()
            && center.y - radius >= inner.min_y()
            && center.y + radius <= inner.max_y()
    }
}

/// The left and right patches of one field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchPair {
    pub left: Patch,
    pub right: Patch,
}

impl PatchPair {
    /// Lay the two patches out side by side, `gap` apart.
    pub fn from_geometry(geometry: &PatchGeometry) -> Result<Self> {
        geometry.validate()?;
        let left = Rect::new(
            geometry.origin_x,
            geometry.origin_y,
            geometry.width,
            geometry.height,
        );
        let right = Rect::new(
            geometry.origin_x + geometry.width + geometry.gap,
            geometry.origin_y,
            geometry.width,
            geometry.height,
        );
        if left.overlaps(&right) {
            return Err(FieldError::InvalidConfig("patches overlap".into()));
        }
        Ok(Self {
            left: Patch::new(Side::Left, left, geometry.outline_thickness),
            right: Patch::new(Side::Right, right, geometry.outline_thickness),
        })
    }

    pub fn get(&self, side: Side) -> &Patch {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Smallest rectangle covering both patches.
    pub fn union(&self) -> Rect {
        let min_x = self.left.rect.min_x().min(self.right.rect.min_x());
        let min_y = self.left.rect.min_y().min(self.right.rect.min_y());
        let max_x = self.left.rect.max_x().max(self.right.rect.max_x());
        let max_y = self.left.rect.max_y().max(self.right.rect.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}
