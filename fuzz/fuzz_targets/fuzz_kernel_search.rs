#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nanpow_kernel::{validate_work, CalculateArgs, Kernel, NativeKernel};
use nanpow_types::{BlockHash, SeedPair};
use nanpow_work::derive_nonce;

#[derive(Debug, Arbitrary)]
struct Search {
    hash: [u8; 32],
    work0: [u8; 4],
    work1: [u8; 4],
    difficulty: u32,
    block_x: u8,
    block_y: u8,
    size: u8,
}

fuzz_target!(|input: Search| {
    // Keep blocks small so each run stays fast. Block indices stay below
    // 255 so they fit the result word.
    let size = u32::from(input.size % 8) + 1;
    let hash = BlockHash::new(input.hash);
    let seeds = SeedPair::new(input.work0, input.work1);
    let args = CalculateArgs::new(
        u32::from(input.block_x % 255) * size,
        u32::from(input.block_y % 255) * size,
        size,
        input.difficulty,
        seeds,
        hash.kernel_words(),
    );

    let mut kernel = NativeKernel::new();
    let Ok(word) = kernel.calculate(&args) else {
        return;
    };
    // Whatever the kernel reports must survive the transform and verify.
    if word != 0 {
        let nonce = derive_nonce(word, seeds);
        assert!(validate_work(&hash, &nonce, input.difficulty));
    }
});
