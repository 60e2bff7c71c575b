//! Version information, taken from Cargo.toml at build time

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Name and version, as shown in the chat banner
pub fn full_version() -> String {
    format!("{} v{}", APP_NAME, VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "ragchat");
    }

    #[test]
    fn test_full_version() {
        let full = full_version();
        assert!(full.starts_with("ragchat v"));
        assert!(full.contains(VERSION));
    }
}
