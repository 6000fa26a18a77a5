//! The kernel calling contract.
//!
//! `Calculate(block_offset_x, block_offset_y, block_size, difficulty,
//! work0[4], work1[4], hash0[4], hash1[4]) -> u32`, where a return of 0 means
//! no candidate in the block qualified. Any other value packs the winning
//! candidate's grid coordinates as four bytes, most significant first:
//! `x_index + 1`, `y_index + 1`, `x_pos`, `y_pos`.

use nanpow_types::{HashWords, SeedPair};

use crate::KernelError;

/// Edge length of one search block, in candidates.
pub const BLOCK_SIZE: u32 = 256;

/// Arguments of one `Calculate` invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalculateArgs {
    pub block_offset_x: u32,
    pub block_offset_y: u32,
    pub block_size: u32,
    pub difficulty: u32,
    pub work0: [u8; 4],
    pub work1: [u8; 4],
    pub hash0: [u32; 4],
    pub hash1: [u32; 4],
}

impl CalculateArgs {
    pub fn new(
        block_offset_x: u32,
        block_offset_y: u32,
        block_size: u32,
        difficulty: u32,
        seeds: SeedPair,
        words: HashWords,
    ) -> Self {
        Self {
            block_offset_x,
            block_offset_y,
            block_size,
            difficulty,
            work0: seeds.work0,
            work1: seeds.work1,
            hash0: words.hash0,
            hash1: words.hash1,
        }
    }

    /// The twenty scalar parameters in ABI order.
    pub fn to_params(&self) -> [u32; 20] {
        let w0 = self.work0.map(u32::from);
        let w1 = self.work1.map(u32::from);
        [
            self.block_offset_x,
            self.block_offset_y,
            self.block_size,
            self.difficulty,
            w0[0],
            w0[1],
            w0[2],
            w0[3],
            w1[0],
            w1[1],
            w1[2],
            w1[3],
            self.hash0[0],
            self.hash0[1],
            self.hash0[2],
            self.hash0[3],
            self.hash1[0],
            self.hash1[1],
            self.hash1[2],
            self.hash1[3],
        ]
    }
}

/// One instantiated kernel. Instances are private to the lane that owns them.
pub trait Kernel {
    fn calculate(&mut self, args: &CalculateArgs) -> Result<u32, KernelError>;
}

/// A loaded kernel that can stamp out private instances.
pub trait KernelFactory: Send + Sync {
    fn name(&self) -> &str;

    fn instantiate(&self) -> Result<Box<dyn Kernel>, KernelError>;
}

/// Pack a candidate's coordinates into the kernel's result word.
pub fn pack_result(x_index: u32, y_index: u32, x_pos: u32, y_pos: u32) -> u32 {
    ((x_index.wrapping_add(1) & 0xFF) << 24)
        | ((y_index.wrapping_add(1) & 0xFF) << 16)
        | ((x_pos & 0xFF) << 8)
        | (y_pos & 0xFF)
}
