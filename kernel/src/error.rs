use thiserror::Error;

/// Failures loading, instantiating or invoking a kernel.
///
/// Every variant raised while loading is fatal for the pool that asked for
/// the kernel; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("kernel bytecode could not be compiled: {0}")]
    Compile(String),

    #[error("kernel could not be instantiated: {0}")]
    Instantiate(String),

    #[error("kernel linear memory could not be created: {0}")]
    Memory(String),

    #[error("kernel does not export `{0}`")]
    MissingExport(String),

    #[error("kernel export `{name}` has the wrong signature: {found}")]
    SignatureMismatch { name: String, found: String },

    #[error("kernel trapped: {0}")]
    Trap(String),

    #[error("bytecode kernels are not supported in this build")]
    WasmUnsupported,

    #[error("could not read kernel file: {0}")]
    Read(String),
}
