//! Nullable kernel: scripted search results.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use nanpow_kernel::{CalculateArgs, Kernel, KernelError, KernelFactory, KernelModule};

/// One `calculate` invocation as seen by a script.
#[derive(Clone, Copy, Debug)]
pub struct KernelCall {
    /// Which instance is calling, numbered in instantiation order.
    pub instance: usize,
    /// How many times this instance has been called before.
    pub call: u64,
    pub args: CalculateArgs,
}

type Script = dyn Fn(&KernelCall) -> Result<u32, KernelError> + Send + Sync;

/// A deterministic kernel for testing.
///
/// Every instance answers `calculate` by running the same script. Clones
/// share their counters, so keep one clone to inspect after handing another
/// to a pool.
#[derive(Clone)]
pub struct ScriptedKernelFactory {
    script: Arc<Script>,
    fail_instantiate: bool,
    instances: Arc<AtomicUsize>,
    calls: Arc<AtomicU64>,
}

impl ScriptedKernelFactory {
    pub fn new(
        script: impl Fn(&KernelCall) -> Result<u32, KernelError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Arc::new(script),
            fail_instantiate: false,
            instances: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Every block comes back empty.
    pub fn never_finds() -> Self {
        Self::new(|_| Ok(0))
    }

    /// Every block returns `word`.
    pub fn always_finds(word: u32) -> Self {
        Self::new(move |_| Ok(word))
    }

    /// Instantiation fails, as it would for a kernel that cannot get its memory.
    pub fn failing_instantiation() -> Self {
        let mut factory = Self::never_finds();
        factory.fail_instantiate = true;
        factory
    }

    pub fn module(&self) -> KernelModule {
        KernelModule::from_factory(self.clone())
    }

    /// Instances created so far, including failed attempts.
    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::SeqCst)
    }

    /// Total `calculate` calls across all instances.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KernelFactory for ScriptedKernelFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    fn instantiate(&self) -> Result<Box<dyn Kernel>, KernelError> {
        let instance = self.instances.fetch_add(1, Ordering::SeqCst);
        if self.fail_instantiate {
            return Err(KernelError::Instantiate("scripted failure".to_string()));
        }
        Ok(Box::new(NullKernel {
            instance,
            calls: 0,
            script: Arc::clone(&self.script),
            total: Arc::clone(&self.calls),
        }))
    }
}

struct NullKernel {
    instance: usize,
    calls: u64,
    script: Arc<Script>,
    total: Arc<AtomicU64>,
}

impl Kernel for NullKernel {
    fn calculate(&mut self, args: &CalculateArgs) -> Result<u32, KernelError> {
        let call = KernelCall {
            instance: self.instance,
            call: self.calls,
            args: *args,
        };
        self.calls += 1;
        self.total.fetch_add(1, Ordering::SeqCst);
        (self.script)(&call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanpow_kernel::BLOCK_SIZE;
    use nanpow_types::{BlockHash, SeedPair};

    fn args() -> CalculateArgs {
        CalculateArgs::new(
            0,
            0,
            BLOCK_SIZE,
            0,
            SeedPair::default(),
            BlockHash::ZERO.kernel_words(),
        )
    }

    #[test]
    fn script_sees_per_instance_call_index() {
        let factory = ScriptedKernelFactory::new(|call| Ok(call.call as u32 * 10 + call.instance as u32));
        let module = factory.module();
        let mut first = module.instantiate().unwrap();
        let mut second = module.instantiate().unwrap();

        assert_eq!(first.calculate(&args()).unwrap(), 0);
        assert_eq!(first.calculate(&args()).unwrap(), 10);
        assert_eq!(second.calculate(&args()).unwrap(), 1);
        assert_eq!(factory.instances(), 2);
        assert_eq!(factory.calls(), 3);
    }

    #[test]
    fn failing_instantiation_is_counted() {
        let factory = ScriptedKernelFactory::failing_instantiation();
        assert!(factory.module().instantiate().is_err());
        assert_eq!(factory.instances(), 1);
    }
}
