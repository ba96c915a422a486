//! WAT artifacts used across the validation tests.

/// Copies the input to offset 4096 and returns it, NUL-terminated.
pub const ECHO: &str = r#"
(module
    (memory (export "memory") 1)
    (global $next (mut i32) (i32.const 1024))
    (func (export "alloc") (param $len i32) (result i32)
        (local $ptr i32)
        (local.set $ptr (global.get $next))
        (global.set $next (i32.add (global.get $next) (local.get $len)))
        (local.get $ptr))
    (func (export "transform") (param $ptr i32) (param $len i32) (result i32)
        (memory.copy (i32.const 4096) (local.get $ptr) (local.get $len))
        (i32.store8 (i32.add (i32.const 4096) (local.get $len)) (i32.const 0))
        (i32.const 4096))
)
"#;

/// Always returns `{"ok":true}` from a data segment.
pub const CONST_OBJECT: &str = r#"
(module
    (memory (export "memory") 1)
    (data (i32.const 2048) "{\"ok\":true}\00")
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
    (func (export "transform") (param i32 i32) (result i32)
        i32.const 2048)
)
"#;

/// Always returns the JSON array `[1,2]`.
pub const CONST_ARRAY: &str = r#"
(module
    (memory (export "memory") 1)
    (data (i32.const 2048) "[1,2]\00")
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
    (func (export "transform") (param i32 i32) (result i32)
        i32.const 2048)
)
"#;

/// Returns text that is not JSON.
pub const NOT_JSON: &str = r#"
(module
    (memory (export "memory") 1)
    (data (i32.const 2048) "done\00")
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
    (func (export "transform") (param i32 i32) (result i32)
        i32.const 2048)
)
"#;

/// Parses as text but fails type checking.
pub const ILL_TYPED: &str = r#"
(module
    (func (export "transform") (param i32 i32) (result i32)
        f64.const 1.5)
)
"#;

pub const GLOBAL_ENTRY: &str = r#"
(module
    (memory (export "memory") 1)
    (global (export "transform") i32 (i32.const 0))
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
)
"#;

pub const WRONG_SIGNATURE: &str = r#"
(module
    (memory (export "memory") 1)
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
    (func (export "transform") (param i32) (result i32)
        i32.const 0)
)
"#;

pub const NO_ALLOC: &str = r#"
(module
    (memory (export "memory") 1)
    (func (export "transform") (param i32 i32) (result i32)
        i32.const 0)
)
"#;

pub const TRAPS: &str = r#"
(module
    (memory (export "memory") 1)
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
    (func (export "transform") (param i32 i32) (result i32)
        unreachable)
)
"#;

pub const SPINS: &str = r#"
(module
    (memory (export "memory") 1)
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
    (func (export "transform") (param i32 i32) (result i32)
        (loop $forever
            (br $forever))
        i32.const 0)
)
"#;

/// Asks for 4 pages (256 KiB) up front.
pub const LARGE_MEMORY: &str = r#"
(module
    (memory (export "memory") 4)
    (func (export "alloc") (param i32) (result i32)
        i32.const 1024)
    (func (export "transform") (param i32 i32) (result i32)
        i32.const 0)
)
"#;
