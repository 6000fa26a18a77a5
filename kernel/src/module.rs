//! Loaded kernel handles.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::abi::{Kernel, KernelFactory};
use crate::native::NativeKernelFactory;
use crate::KernelError;

/// A loaded kernel, shared read-only by every lane of a pool.
///
/// Cloning is cheap; each lane calls [`KernelModule::instantiate`] to get its
/// own private instance.
#[derive(Clone)]
pub struct KernelModule {
    factory: Arc<dyn KernelFactory>,
}

impl KernelModule {
    /// The built-in Blake2b kernel.
    pub fn native() -> Self {
        Self::from_factory(NativeKernelFactory)
    }

    /// Compile and validate kernel bytecode.
    ///
    /// The module is instantiated once against a fixed 4-page linear memory
    /// so that a bad export or an unsatisfiable import surfaces here rather
    /// than inside a lane.
    #[cfg(feature = "wasm")]
    pub fn load(bytecode: &[u8]) -> Result<Self, KernelError> {
        let factory = crate::wasm::WasmKernelFactory::load(bytecode)?;
        Ok(Self::from_factory(factory))
    }

    #[cfg(not(feature = "wasm"))]
    pub fn load(_bytecode: &[u8]) -> Result<Self, KernelError> {
        Err(KernelError::WasmUnsupported)
    }

    pub fn from_factory(factory: impl KernelFactory + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        self.factory.name()
    }

    pub fn instantiate(&self) -> Result<Box<dyn Kernel>, KernelError> {
        self.factory.instantiate()
    }
}

impl fmt::Debug for KernelModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelModule")
            .field("name", &self.name())
            .finish()
    }
}

/// Where a pool gets its kernel from. Resolved once, when the pool is built.
#[derive(Clone, Debug, Default)]
pub enum KernelSource {
    #[default]
    Native,
    Bytecode(Arc<[u8]>),
    File(PathBuf),
    Loaded(KernelModule),
}

impl KernelSource {
    pub fn load(&self) -> Result<KernelModule, KernelError> {
        match self {
            KernelSource::Native => Ok(KernelModule::native()),
            KernelSource::Bytecode(bytes) => KernelModule::load(bytes),
            KernelSource::File(path) => {
                let bytes = std::fs::read(path)
                    .map_err(|e| KernelError::Read(format!("{}: {e}", path.display())))?;
                KernelModule::load(&bytes)
            }
            KernelSource::Loaded(module) => Ok(module.clone()),
        }
    }
}

impl From<KernelModule> for KernelSource {
    fn from(module: KernelModule) -> Self {
        KernelSource::Loaded(module)
    }
}
