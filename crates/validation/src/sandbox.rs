//! Sandboxed execution of generated artifacts.
//!
//! [`Sandbox`] is the seam between the pipeline and whatever actually runs
//! the artifact. [`WasmSandbox`] runs WebAssembly modules in wasmtime with:
//!
//! - An empty linker: no WASI, no host imports
//! - A fuel limit (instruction budget) per instantiation
//! - A linear-memory ceiling enforced by the store's resource limiter
//! - A fresh store per resolved entry point

use serde::{Deserialize, Serialize};
use tracing::debug;
use wasmtime::{
    Config, Engine, ExternType, Instance, Linker, Memory, Module, Store, StoreLimits,
    StoreLimitsBuilder, Trap, TypedFunc, WasmParams, WasmResults,
};

use crate::error::ValidationError;

/// Runs generated artifacts in isolation.
pub trait Sandbox: Send + Sync {
    type Module;
    type Entry: EntryPoint;

    /// Parse and compile an artifact. Failures are [`ValidationError::InvalidSyntax`].
    fn compile(&self, source: &str) -> Result<Self::Module, ValidationError>;

    /// Instantiate a compiled artifact and bind its entry point.
    fn resolve(&self, module: &Self::Module, entry_point: &str) -> Result<Self::Entry, ValidationError>;
}

/// A bound, callable entry point of an instantiated artifact.
pub trait EntryPoint {
    /// Call the entry point with `input` and return its raw output text.
    fn call(&mut self, input: &str) -> Result<String, ValidationError>;
}

/// Resource limits applied to each artifact instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLimits {
    /// Instruction budget (0 = unlimited).
    #[serde(default = "default_max_fuel")]
    pub max_fuel: u64,

    /// Maximum linear memory in bytes.
    #[serde(default = "default_max_memory")]
    pub max_memory_bytes: usize,
}

fn default_max_fuel() -> u64 {
    100_000_000
}

fn default_max_memory() -> usize {
    16 * 1024 * 1024 // 16 MiB
}

impl Default for ArtifactLimits {
    fn default() -> Self {
        Self {
            max_fuel: default_max_fuel(),
            max_memory_bytes: default_max_memory(),
        }
    }
}

/// A [`Sandbox`] backed by wasmtime.
pub struct WasmSandbox {
    engine: Engine,
    limits: ArtifactLimits,
}

impl std::fmt::Debug for WasmSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmSandbox")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl WasmSandbox {
    pub fn new(limits: ArtifactLimits) -> Result<Self, ValidationError> {
        let mut config = Config::new();
        config.consume_fuel(limits.max_fuel > 0);

        let engine = Engine::new(&config)
            .map_err(|e| ValidationError::LoadFailed(format!("Failed to create WASM engine: {e}")))?;

        Ok(Self { engine, limits })
    }

    pub fn limits(&self) -> ArtifactLimits {
        self.limits
    }
}

impl Sandbox for WasmSandbox {
    type Module = Module;
    type Entry = WasmEntryPoint;

    fn compile(&self, source: &str) -> Result<Module, ValidationError> {
        let bytes = wat::parse_str(source).map_err(|e| ValidationError::InvalidSyntax(e.to_string()))?;
        let module = Module::from_binary(&self.engine, &bytes)
            .map_err(|e| ValidationError::InvalidSyntax(format!("{e:#}")))?;

        debug!(bytes = bytes.len(), "Compiled artifact");
        Ok(module)
    }

    fn resolve(&self, module: &Module, entry_point: &str) -> Result<WasmEntryPoint, ValidationError> {
        match module.get_export(entry_point) {
            None => return Err(ValidationError::EntryPointMissing(entry_point.to_string())),
            Some(ExternType::Func(_)) => {}
            Some(other) => {
                return Err(ValidationError::EntryPointNotCallable {
                    name: entry_point.to_string(),
                    reason: format!("it is a {}, not a function", extern_kind(&other)),
                });
            }
        }

        let limits = StoreLimitsBuilder::new()
            .memory_size(self.limits.max_memory_bytes)
            .build();
        let mut store = Store::new(&self.engine, limits);
        store.limiter(|limits| limits);

        if self.limits.max_fuel > 0 {
            store
                .set_fuel(self.limits.max_fuel)
                .map_err(|e| ValidationError::LoadFailed(format!("Failed to set fuel: {e}")))?;
        }

        // Empty linker: the artifact gets no host imports at all.
        let linker = Linker::<StoreLimits>::new(&self.engine);
        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|e| ValidationError::LoadFailed(format!("{e:#}")))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| ValidationError::EntryPointMissing("memory".into()))?;
        let alloc = typed_export::<i32, i32>(&instance, &mut store, "alloc")?;
        let entry = typed_export::<(i32, i32), i32>(&instance, &mut store, entry_point)?;

        Ok(WasmEntryPoint {
            name: entry_point.to_string(),
            max_fuel: self.limits.max_fuel,
            store,
            memory,
            alloc,
            entry,
        })
    }
}

fn typed_export<P: WasmParams, R: WasmResults>(
    instance: &Instance,
    store: &mut Store<StoreLimits>,
    name: &str,
) -> Result<TypedFunc<P, R>, ValidationError> {
    let func = instance
        .get_func(&mut *store, name)
        .ok_or_else(|| ValidationError::EntryPointMissing(name.to_string()))?;

    func.typed::<P, R>(&*store)
        .map_err(|e| ValidationError::EntryPointNotCallable {
            name: name.to_string(),
            reason: format!("{e:#}"),
        })
}

#[allow(unreachable_patterns)]
fn extern_kind(ty: &ExternType) -> &'static str {
    match ty {
        ExternType::Func(_) => "function",
        ExternType::Global(_) => "global",
        ExternType::Table(_) => "table",
        ExternType::Memory(_) => "memory",
        _ => "non-function export",
    }
}

fn trap_error(export: &str, err: wasmtime::Error, max_fuel: u64) -> ValidationError {
    if matches!(err.downcast_ref::<Trap>(), Some(Trap::OutOfFuel)) {
        ValidationError::ArtifactFailed(format!(
            "'{export}' exceeded the fuel limit of {max_fuel} instructions"
        ))
    } else {
        ValidationError::ArtifactFailed(format!("'{export}' trapped: {err:#}"))
    }
}

/// An instantiated WebAssembly artifact with its entry point bound.
pub struct WasmEntryPoint {
    name: String,
    max_fuel: u64,
    store: Store<StoreLimits>,
    memory: Memory,
    alloc: TypedFunc<i32, i32>,
    entry: TypedFunc<(i32, i32), i32>,
}

impl std::fmt::Debug for WasmEntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmEntryPoint")
            .field("name", &self.name)
            .field("max_fuel", &self.max_fuel)
            .finish_non_exhaustive()
    }
}

impl EntryPoint for WasmEntryPoint {
    fn call(&mut self, input: &str) -> Result<String, ValidationError> {
        let input_bytes = input.as_bytes();
        let input_len = i32::try_from(input_bytes.len())
            .map_err(|_| ValidationError::ArtifactFailed("Input too large for WASM memory".into()))?;

        let input_ptr = self
            .alloc
            .call(&mut self.store, input_len)
            .map_err(|e| trap_error("alloc", e, self.max_fuel))?;

        // Write input to WASM memory.
        let mem_data = self.memory.data_mut(&mut self.store);
        let start = usize::try_from(input_ptr).map_err(|_| {
            ValidationError::ArtifactFailed(format!("alloc returned a negative pointer ({input_ptr})"))
        })?;
        let end = start
            .checked_add(input_bytes.len())
            .filter(|end| *end <= mem_data.len())
            .ok_or_else(|| ValidationError::ArtifactFailed("Input too large for WASM memory".into()))?;
        mem_data[start..end].copy_from_slice(input_bytes);

        let result_ptr = self
            .entry
            .call(&mut self.store, (input_ptr, input_len))
            .map_err(|e| trap_error(&self.name, e, self.max_fuel))?;

        if self.max_fuel > 0 {
            if let Ok(remaining) = self.store.get_fuel() {
                debug!(
                    entry_point = %self.name,
                    fuel_used = self.max_fuel - remaining,
                    "Artifact returned"
                );
            }
        }

        // The result is a NUL-terminated string at result_ptr.
        let mem_data = self.memory.data(&self.store);
        let result_start = usize::try_from(result_ptr)
            .ok()
            .filter(|s| *s < mem_data.len())
            .ok_or_else(|| {
                ValidationError::ArtifactFailed(format!("Invalid result pointer from WASM ({result_ptr})"))
            })?;

        let result_end = mem_data[result_start..]
            .iter()
            .position(|&b| b == 0)
            .map(|pos| result_start + pos)
            .unwrap_or(mem_data.len());

        let text = std::str::from_utf8(&mem_data[result_start..result_end])
            .map_err(|e| ValidationError::OutputShapeMismatch(format!("output is not UTF-8: {e}")))?;

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn sandbox() -> WasmSandbox {
        WasmSandbox::new(ArtifactLimits::default()).unwrap()
    }

    fn run(source: &str, input: &str) -> Result<String, ValidationError> {
        let sandbox = sandbox();
        let module = sandbox.compile(source)?;
        let mut entry = sandbox.resolve(&module, "transform")?;
        entry.call(input)
    }

    #[test]
    fn limits_defaults() {
        let limits: ArtifactLimits = serde_json::from_str("{}").unwrap();
        assert_eq!(limits, ArtifactLimits::default());
        assert_eq!(limits.max_memory_bytes, 16 * 1024 * 1024);
        assert_eq!(limits.max_fuel, 100_000_000);
    }

    #[test]
    fn echo_artifact_returns_input() {
        let output = run(fixtures::ECHO, r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(output, r#"{"name":"Ada"}"#);
    }

    #[test]
    fn constant_artifact_reads_data_segment() {
        let output = run(fixtures::CONST_OBJECT, "{}").unwrap();
        assert_eq!(output, r#"{"ok":true}"#);
    }

    #[test]
    fn malformed_text_is_invalid_syntax() {
        let err = sandbox().compile("(module (func").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSyntax(_)));
    }

    #[test]
    fn ill_typed_module_is_invalid_syntax() {
        let err = sandbox().compile(fixtures::ILL_TYPED).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSyntax(_)));
    }

    #[test]
    fn absent_entry_point_is_missing() {
        let err = run(fixtures::ECHO.replace("\"transform\"", "\"convert\"").as_str(), "{}").unwrap_err();
        assert_eq!(err, ValidationError::EntryPointMissing("transform".into()));
    }

    #[test]
    fn global_entry_point_is_not_callable() {
        let err = run(fixtures::GLOBAL_ENTRY, "{}").unwrap_err();
        match err {
            ValidationError::EntryPointNotCallable { name, reason } => {
                assert_eq!(name, "transform");
                assert!(reason.contains("global"));
            }
            other => panic!("expected EntryPointNotCallable, got {other:?}"),
        }
    }

    #[test]
    fn wrong_signature_is_not_callable() {
        let err = run(fixtures::WRONG_SIGNATURE, "{}").unwrap_err();
        assert!(matches!(err, ValidationError::EntryPointNotCallable { .. }));
    }

    #[test]
    fn missing_alloc_is_reported_by_name() {
        let err = run(fixtures::NO_ALLOC, "{}").unwrap_err();
        assert_eq!(err, ValidationError::EntryPointMissing("alloc".into()));
    }

    #[test]
    fn trap_is_artifact_failure() {
        let err = run(fixtures::TRAPS, "{}").unwrap_err();
        match err {
            ValidationError::ArtifactFailed(reason) => assert!(reason.contains("transform")),
            other => panic!("expected ArtifactFailed, got {other:?}"),
        }
    }

    #[test]
    fn infinite_loop_runs_out_of_fuel() {
        let sandbox = WasmSandbox::new(ArtifactLimits {
            max_fuel: 10_000,
            ..Default::default()
        })
        .unwrap();
        let module = sandbox.compile(fixtures::SPINS).unwrap();
        let mut entry = sandbox.resolve(&module, "transform").unwrap();

        let err = entry.call("{}").unwrap_err();
        match err {
            ValidationError::ArtifactFailed(reason) => assert!(reason.contains("fuel limit of 10000")),
            other => panic!("expected fuel exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn oversized_memory_fails_to_load() {
        let sandbox = WasmSandbox::new(ArtifactLimits {
            max_memory_bytes: 64 * 1024,
            ..Default::default()
        })
        .unwrap();
        let module = sandbox.compile(fixtures::LARGE_MEMORY).unwrap();
        let err = sandbox.resolve(&module, "transform").unwrap_err();
        assert!(matches!(err, ValidationError::LoadFailed(_)));
    }
}
