//! The front end's own version, in the `MMmmpp` form used by the `__VERSION__`
//! family of built-in macros (see `wisp_preprocessor::builtins`).

pub const MAJOR: u32 = 1;
pub const MINOR: u32 = 3;
pub const PATCH: u32 = 0;

/// `major * 10000 + minor * 100 + patch`, e.g. `1.3.0` -> `10300`.
pub const VERSION: u32 = MAJOR * 10_000 + MINOR * 100 + PATCH;

pub const VERSION_STR: &str = "1.3.0";
