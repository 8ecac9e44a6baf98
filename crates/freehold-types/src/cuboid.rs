//! Axis-aligned block geometry: [`BlockPos`] and the immutable [`Cuboid`].
//!
//! A [`Cuboid`] is always stored in normalized form (`min <= max` per axis)
//! regardless of the corner order it was constructed from, so containment
//! and overlap tests never need to re-sort coordinates. Coordinates are
//! block cells, not points: two cuboids overlap only if they share at least
//! one block, so regions that merely touch along an edge do not conflict.

use serde::{Deserialize, Serialize};

/// An integer block position in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North-south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position from raw coordinates.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Raw corner pair used for deserialization; re-normalized on conversion.
#[derive(Debug, Clone, Copy, Deserialize)]
struct CuboidCorners {
    min: BlockPos,
    max: BlockPos,
}

impl From<CuboidCorners> for Cuboid {
    fn from(corners: CuboidCorners) -> Self {
        Self::new(corners.min, corners.max)
    }
}

/// An immutable axis-aligned box of blocks between two corner positions.
///
/// The stored corners are normalized: `min.x <= max.x`, `min.y <= max.y`,
/// `min.z <= max.z`. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CuboidCorners")]
pub struct Cuboid {
    /// The corner with the smallest coordinate on every axis.
    min: BlockPos,
    /// The corner with the largest coordinate on every axis.
    max: BlockPos,
}

impl Cuboid {
    /// Create a cuboid from two opposite corners, in any order.
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// The normalized minimum corner.
    pub const fn min(&self) -> BlockPos {
        self.min
    }

    /// The normalized maximum corner.
    pub const fn max(&self) -> BlockPos {
        self.max
    }

    /// All eight corner blocks, bottom face first, for callers that render
    /// claim borders.
    pub const fn corners(&self) -> [BlockPos; 8] {
        let (min, max) = (self.min, self.max);
        [
            BlockPos::new(min.x, min.y, min.z),
            BlockPos::new(max.x, min.y, min.z),
            BlockPos::new(min.x, min.y, max.z),
            BlockPos::new(max.x, min.y, max.z),
            BlockPos::new(min.x, max.y, min.z),
            BlockPos::new(max.x, max.y, min.z),
            BlockPos::new(min.x, max.y, max.z),
            BlockPos::new(max.x, max.y, max.z),
        ]
    }

    /// Whether the given block lies inside this cuboid (corners inclusive).
    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Whether this cuboid shares at least one block with another.
    ///
    /// The test is inclusive of boundary coordinates: boxes whose faces
    /// meet on the same block column overlap, while boxes that are merely
    /// adjacent (`other.min.x == self.max.x + 1`) do not.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Number of blocks spanned on the x axis.
    pub fn width(&self) -> i64 {
        axis_span(self.min.x, self.max.x)
    }

    /// Number of blocks spanned on the z axis.
    pub fn length(&self) -> i64 {
        axis_span(self.min.z, self.max.z)
    }

    /// Number of blocks spanned on the y axis.
    pub fn height(&self) -> i64 {
        axis_span(self.min.y, self.max.y)
    }

    /// Footprint area in blocks: width times length, height ignored.
    ///
    /// Billing and claim costs are charged on the footprint, so a claim
    /// from bedrock to sky costs the same as a one-layer slice.
    pub fn area(&self) -> i64 {
        // i32 spans always fit an i64; the product of two spans cannot
        // exceed (2^32)^2 < 2^63, so saturation never actually triggers.
        self.width().checked_mul(self.length()).unwrap_or(i64::MAX)
    }
}

/// Inclusive block count along one axis of a normalized cuboid.
fn axis_span(min: i32, max: i32) -> i64 {
    i64::from(max)
        .checked_sub(i64::from(min))
        .and_then(|d| d.checked_add(1))
        .unwrap_or(i64::MAX)
}
