//! Region quadtree for neighbour queries between dots.
//!
//! The tree covers a fixed rectangle (both patches) and is cleared and
//! refilled once per side per frame. Nothing is maintained incrementally.
//!
//! Entries are stored in every leaf their bounding rectangle touches, and a
//! query returns the contents of every leaf the query rectangle touches. The
//! result is a superset of the true neighbours; callers must still run an
//! exact distance test.

use crate::error::{FieldError, Result};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Bounding box of a circle.
    pub fn around(center: DVec2, radius: f64) -> Self {
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Shrink by `amount` on every side.
    pub fn inset(&self, amount: f64) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            self.width - amount * 2.0,
            self.height - amount * 2.0,
        )
    }

    /// Closed intersection test: touching edges count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }

    /// Open intersection test: touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// Clip into `bounds`. A rectangle entirely outside collapses onto the
    /// nearest edge, so it still touches at least one leaf.
    pub fn clamped_to(&self, bounds: &Rect) -> Self {
        let min_x = self.min_x().clamp(bounds.min_x(), bounds.max_x());
        let max_x = self.max_x().clamp(bounds.min_x(), bounds.max_x());
        let min_y = self.min_y().clamp(bounds.min_y(), bounds.max_y());
        let max_y = self.max_y().clamp(bounds.min_y(), bounds.max_y());
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Split at the centre into top-right, top-left, bottom-left, bottom-right.
    pub fn quadrants(&self) -> [Rect; 4] {
        let w = self.width * 0.5;
        let h = self.height * 0.5;
        [
            Rect::new(self.x + w, self.y, w, h),
            Rect::new(self.x, self.y, w, h),
            Rect::new(self.x, self.y + h, w, h),
            Rect::new(self.x + w, self.y + h, w, h),
        ]
    }
}

/// Tuning for the quadtree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Entries a leaf holds before it splits.
    pub capacity: usize,
    /// Deepest level a leaf may split to. Leaves at this depth grow
    /// without bound, which stops coincident dots splitting forever.
    pub max_depth: u32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            max_depth: 5,
        }
    }
}

impl SpatialConfig {
    pub fn new(capacity: usize, max_depth: u32) -> Self {
        Self { capacity, max_depth }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(FieldError::InvalidConfig(
                "spatial index capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    id: usize,
    rect: Rect,
}

#[derive(Clone, Debug)]
struct Node {
    bounds: Rect,
    depth: u32,
    entries: Vec<Entry>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn leaf(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, entry: Entry, config: &SpatialConfig) {
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.bounds.intersects(&entry.rect) {
                    child.insert(entry, config);
                }
            }
            return;
        }

        if self.entries.len() >= config.capacity && self.depth < config.max_depth {
            self.split(config);
            self.insert(entry, config);
            return;
        }

        self.entries.push(entry);
    }

    fn split(&mut self, config: &SpatialConfig) {
        let depth = self.depth + 1;
        let children = self.bounds.quadrants().map(|q| Node::leaf(q, depth));
        self.children = Some(Box::new(children));
        for entry in std::mem::take(&mut self.entries) {
            self.insert(entry, config);
        }
    }

    fn retrieve(&self, rect: &Rect, out: &mut Vec<usize>) {
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    if child.bounds.intersects(rect) {
                        child.retrieve(rect, out);
                    }
                }
            }
            None => out.extend(self.entries.iter().map(|e| e.id)),
        }
    }

    fn depth(&self) -> u32 {
        match &self.children {
            Some(children) => children.iter().map(Node::depth).max().unwrap_or(self.depth),
            None => self.depth,
        }
    }

    fn collect_leaves(&self, out: &mut Vec<Rect>) {
        match &self.children {
            Some(children) => children.iter().for_each(|c| c.collect_leaves(out)),
            None => out.push(self.bounds),
        }
    }
}

/// Quadtree over a fixed rectangle, keyed by caller-supplied ids.
///
/// # Example
///
/// ```
/// use rdk::spatial::{QuadTree, Rect, SpatialConfig};
///
/// let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), SpatialConfig::default());
/// tree.insert(0, Rect::new(10.0, 10.0, 4.0, 4.0));
/// tree.insert(1, Rect::new(80.0, 80.0, 4.0, 4.0));
///
/// let mut hits = Vec::new();
/// tree.retrieve(&Rect::new(8.0, 8.0, 4.0, 4.0), &mut hits);
/// assert!(hits.contains(&0));
/// ```
#[derive(Clone, Debug)]
pub struct QuadTree {
    root: Node,
    config: SpatialConfig,
    len: usize,
}

impl QuadTree {
    pub fn new(bounds: Rect, config: SpatialConfig) -> Self {
        Self {
            root: Node::leaf(bounds, 0),
            config,
            len: 0,
        }
    }

    /// Drop every entry and subdivision, leaving one empty leaf over the
    /// tree bounds.
    pub fn clear(&mut self) {
        self.root = Node::leaf(self.root.bounds, 0);
        self.len = 0;
    }

    /// Add `id` to every leaf that `rect` touches.
    pub fn insert(&mut self, id: usize, rect: Rect) {
        let rect = rect.clamped_to(&self.root.bounds);
        self.root.insert(Entry { id, rect }, &self.config);
        self.len += 1;
    }

    /// Clear, then insert every `(id, rect)` pair.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (usize, Rect)>,
    {
        self.clear();
        for (id, rect) in entries {
            self.insert(id, rect);
        }
    }

    /// Replace `out` with the ids stored in every leaf `rect` touches,
    /// sorted and without duplicates.
    pub fn retrieve(&self, rect: &Rect, out: &mut Vec<usize>) {
        out.clear();
        let rect = rect.clamped_to(&self.root.bounds);
        self.root.retrieve(&rect, out);
        out.sort_unstable();
        out.dedup();
    }

    /// Number of inserted entries (not leaf references).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Depth of the deepest leaf; 0 for an unsplit tree.
    pub fn depth(&self) -> u32 {
        self.root.depth()
    }

    /// Rectangles of all current leaves, for debug overlays.
    pub fn leaf_bounds(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }
}
