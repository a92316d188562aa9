//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn timezone() -> String {
        "UTC".into()
    }

    pub fn permalink() -> String {
        "pretty".into()
    }

    pub fn output() -> PathBuf {
        "build".into()
    }
}
