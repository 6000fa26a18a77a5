//! Splitting a round's candidate grid into one block per lane.

use nanpow_kernel::BLOCK_SIZE;

use crate::WorkError;

/// Largest lane count a pool accepts.
pub const MAX_LANES: usize = 256;

/// Blocks per grid axis are capped because the kernel packs `index + 1`
/// into a single byte.
pub const MAX_AXIS_BLOCKS: u32 = 255;

/// A square region of the grid handed to one lane for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    pub offset_x: u32,
    pub offset_y: u32,
    pub size: u32,
}

impl Block {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.offset_x
            && x < self.offset_x + self.size
            && y >= self.offset_y
            && y < self.offset_y + self.size
    }

    pub fn overlaps(&self, other: &Block) -> bool {
        self.offset_x < other.offset_x + other.size
            && other.offset_x < self.offset_x + self.size
            && self.offset_y < other.offset_y + other.size
            && other.offset_y < self.offset_y + self.size
    }

    pub fn area(&self) -> u64 {
        u64::from(self.size) * u64::from(self.size)
    }
}

/// `rows × columns` blocks of [`BLOCK_SIZE`] candidates per side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: u32,
    columns: u32,
}

impl Grid {
    /// Factor `lanes` into the most square `rows × columns` arrangement,
    /// with `rows <= columns`.
    pub fn for_lanes(lanes: usize) -> Result<Self, WorkError> {
        if lanes == 0 || lanes > MAX_LANES {
            return Err(WorkError::Config(format!(
                "lane count must be between 1 and {MAX_LANES}, got {lanes}"
            )));
        }
        let n = lanes as u32;
        let mut root = 1;
        while (root + 1) * (root + 1) <= n {
            root += 1;
        }
        let rows = (1..=root).rev().find(|r| n % r == 0).unwrap_or(1);
        let columns = n / rows;
        if columns > MAX_AXIS_BLOCKS {
            return Err(WorkError::Config(format!(
                "{lanes} lanes need {columns} blocks on one axis; at most {MAX_AXIS_BLOCKS} fit"
            )));
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn lanes(&self) -> usize {
        (self.rows * self.columns) as usize
    }

    /// Grid width and height in candidates.
    pub fn extent(&self) -> (u32, u32) {
        (self.columns * BLOCK_SIZE, self.rows * BLOCK_SIZE)
    }

    /// Blocks in row-major order; lane `i` gets block `i`.
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(self.lanes());
        for row in 0..self.rows {
            for column in 0..self.columns {
                blocks.push(Block {
                    offset_x: column * BLOCK_SIZE,
                    offset_y: row * BLOCK_SIZE,
                    size: BLOCK_SIZE,
                });
            }
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lane_count_is_four_by_four() {
        let grid = Grid::for_lanes(16).unwrap();
        assert_eq!((grid.rows(), grid.columns()), (4, 4));
        let blocks = grid.blocks();
        assert_eq!(blocks[0], Block { offset_x: 0, offset_y: 0, size: 256 });
        assert_eq!(blocks[5], Block { offset_x: 256, offset_y: 256, size: 256 });
        assert_eq!(blocks[15], Block { offset_x: 768, offset_y: 768, size: 256 });
    }

    #[test]
    fn factoring() {
        let shape = |n| {
            let g = Grid::for_lanes(n).unwrap();
            (g.rows(), g.columns())
        };
        assert_eq!(shape(1), (1, 1));
        assert_eq!(shape(2), (1, 2));
        assert_eq!(shape(7), (1, 7));
        assert_eq!(shape(12), (3, 4));
        assert_eq!(shape(36), (6, 6));
        assert_eq!(shape(251), (1, 251));
        assert_eq!(shape(256), (16, 16));
    }

    #[test]
    fn out_of_range_lane_counts_are_rejected() {
        assert!(matches!(Grid::for_lanes(0), Err(WorkError::Config(_))));
        assert!(matches!(Grid::for_lanes(257), Err(WorkError::Config(_))));
    }

    #[test]
    fn overlap_detection() {
        let a = Block { offset_x: 0, offset_y: 0, size: 256 };
        let b = Block { offset_x: 256, offset_y: 0, size: 256 };
        let c = Block { offset_x: 128, offset_y: 128, size: 256 };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
        assert!(a.contains(255, 255));
        assert!(!a.contains(256, 0));
    }
}
