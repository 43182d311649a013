//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        String::new()
    }

    pub fn language() -> String {
        "en-US".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn src() -> PathBuf {
        "src".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn components() -> PathBuf {
        "components".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn renderer_command() -> Vec<String> {
        vec!["pandoc".into()]
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        8080
    }

    pub fn poll_interval_ms() -> u64 {
        1000
    }
}
