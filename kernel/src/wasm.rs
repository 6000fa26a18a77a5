//! Bytecode kernels running on wasmer.

use tracing::debug;
use wasmer::{imports, Engine, Function, Instance, Memory, MemoryType, Module, Store, Type, Value};

use crate::abi::{CalculateArgs, Kernel, KernelFactory};
use crate::KernelError;

/// Pages of linear memory handed to a kernel. Fixed: the memory cannot grow.
pub const KERNEL_MEMORY_PAGES: u32 = 4;

/// Name of the search entry point a kernel module must export.
pub const CALCULATE_EXPORT: &str = "Calculate";

const CALCULATE_PARAMS: usize = 20;

/// A compiled kernel module plus the engine it was compiled for.
pub struct WasmKernelFactory {
    engine: Engine,
    module: Module,
}

impl WasmKernelFactory {
    pub fn load(bytecode: &[u8]) -> Result<Self, KernelError> {
        let engine = Engine::default();
        let module =
            Module::new(&engine, bytecode).map_err(|e| KernelError::Compile(e.to_string()))?;
        let factory = Self { engine, module };
        // Probe instantiation so import and export problems fail the load.
        factory.instantiate_inner()?;
        debug!(
            imports = factory.module.imports().count(),
            "kernel bytecode loaded"
        );
        Ok(factory)
    }

    fn instantiate_inner(&self) -> Result<WasmKernel, KernelError> {
        let mut store = Store::new(self.engine.clone());
        let memory = Memory::new(
            &mut store,
            MemoryType::new(KERNEL_MEMORY_PAGES, Some(KERNEL_MEMORY_PAGES), false),
        )
        .map_err(|e| KernelError::Memory(e.to_string()))?;
        let import_object = imports! {
            "env" => {
                "memory" => memory,
            }
        };
        let instance = Instance::new(&mut store, &self.module, &import_object)
            .map_err(|e| KernelError::Instantiate(e.to_string()))?;

        let calculate = instance
            .exports
            .get_function(CALCULATE_EXPORT)
            .map_err(|_| KernelError::MissingExport(CALCULATE_EXPORT.to_string()))?
            .clone();

        let ty = calculate.ty(&store);
        let params_ok = ty.params().len() == CALCULATE_PARAMS
            && ty.params().iter().all(|t| *t == Type::I32);
        let results_ok = ty.results().len() == 1 && ty.results()[0] == Type::I32;
        if !params_ok || !results_ok {
            return Err(KernelError::SignatureMismatch {
                name: CALCULATE_EXPORT.to_string(),
                found: format!("{ty:?}"),
            });
        }

        Ok(WasmKernel {
            store,
            _instance: instance,
            calculate,
        })
    }
}

impl KernelFactory for WasmKernelFactory {
    fn name(&self) -> &str {
        "wasm"
    }

    fn instantiate(&self) -> Result<Box<dyn Kernel>, KernelError> {
        Ok(Box::new(self.instantiate_inner()?))
    }
}

/// One instantiated bytecode kernel with its own store and memory.
pub struct WasmKernel {
    store: Store,
    _instance: Instance,
    calculate: Function,
}

impl Kernel for WasmKernel {
    fn calculate(&mut self, args: &CalculateArgs) -> Result<u32, KernelError> {
        let params = args.to_params().map(|p| Value::I32(p as i32));
        let results = self
            .calculate
            .call(&mut self.store, &params)
            .map_err(|e| KernelError::Trap(e.to_string()))?;
        match results.first() {
            Some(Value::I32(word)) => Ok(*word as u32),
            other => Err(KernelError::Trap(format!(
                "unexpected return value {other:?}"
            ))),
        }
    }
}
