//! Built-in kernel: Blake2b-64 over `nonce_le || hash`, scanned block by block.

use nanpow_crypto::blake2b_64;

use crate::abi::{pack_result, CalculateArgs, Kernel, KernelFactory};
use crate::validator::meets_difficulty;
use crate::KernelError;

/// Native implementation of the `Calculate` contract.
///
/// Candidate `(xx, yy)` of a block sits at grid position
/// `(offset_x + xx, offset_y + yy)`. Its position inside the block and the
/// block's index on each axis make up the low 32 bits of the nonce, mixed
/// with bytes 2 and 3 of `work0`; `work1` is the high 32 bits.
pub struct NativeKernel {
    input: [u8; 40],
}

impl Default for NativeKernel {
    fn default() -> Self {
        Self { input: [0; 40] }
    }
}

impl NativeKernel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Kernel for NativeKernel {
    fn calculate(&mut self, args: &CalculateArgs) -> Result<u32, KernelError> {
        let size = args.block_size;
        if size == 0 {
            return Ok(0);
        }

        for (chunk, word) in self.input[8..]
            .chunks_exact_mut(4)
            .zip(args.hash0.iter().chain(args.hash1.iter()))
        {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        self.input[4..8].copy_from_slice(&args.work1);

        let work0_2 = u32::from(args.work0[2]);
        let work0_3 = u32::from(args.work0[3]);

        for yy in 0..size {
            let uv_y = args.block_offset_y.wrapping_add(yy);
            let y_pos = uv_y % size;
            let y_index = uv_y / size;
            for xx in 0..size {
                let uv_x = args.block_offset_x.wrapping_add(xx);
                let x_pos = uv_x % size;
                let x_index = uv_x / size;

                let low = x_pos
                    ^ (y_pos << 8)
                    ^ ((work0_2 ^ x_index) << 16)
                    ^ ((work0_3 ^ y_index) << 24);
                self.input[..4].copy_from_slice(&low.to_le_bytes());

                let value = u64::from_le_bytes(blake2b_64(&self.input));
                if meets_difficulty(value, args.difficulty) {
                    return Ok(pack_result(x_index, y_index, x_pos, y_pos));
                }
            }
        }

        Ok(0)
    }
}

/// Factory for [`NativeKernel`] instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeKernelFactory;

impl KernelFactory for NativeKernelFactory {
    fn name(&self) -> &str {
        "native-blake2b"
    }

    fn instantiate(&self) -> Result<Box<dyn Kernel>, KernelError> {
        Ok(Box::new(NativeKernel::new()))
    }
}
