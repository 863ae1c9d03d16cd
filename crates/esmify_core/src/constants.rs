/// Extensions of files that may hold CommonJS code.
pub const CJS_EXTENSIONS: &[&str] = &["js", "cjs", "jsx", "ts", "cts", "tsx"];

/// Directories never descended into when collecting inputs.
pub const SKIP_DIRS: &[&str] = &["node_modules"];

pub const CONFIG_FILE_NAME: &str = "esmify.json";
