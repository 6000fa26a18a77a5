//! The search kernel and everything needed to talk to it.
//!
//! A kernel scans one block of the candidate grid and reports the first
//! candidate whose work value clears the difficulty. Kernels are opaque to the
//! orchestrator: it only sees the [`Kernel`] calling contract. Two sources are
//! provided, the built-in [`NativeKernel`] and bytecode modules loaded through
//! [`KernelModule::load`].

pub mod abi;
pub mod error;
pub mod module;
pub mod native;
pub mod validator;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use abi::{pack_result, CalculateArgs, Kernel, KernelFactory, BLOCK_SIZE};
pub use error::KernelError;
pub use module::{KernelModule, KernelSource};
pub use native::{NativeKernel, NativeKernelFactory};
pub use validator::{meets_difficulty, validate_work, work_value};
