//! Build version information.

/// Git commit hash injected at build time through `LIFT_EMU_GIT_HASH`.
const GIT_HASH: Option<&str> = option_env!("LIFT_EMU_GIT_HASH");

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Commit the binary was built from, or `"unknown"`.
pub fn git_hash() -> &'static str {
    GIT_HASH.unwrap_or("unknown")
}

/// Version line for the CLI.
pub fn banner() -> String {
    format!("lift-emu v{} ({})", version(), git_hash())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner() {
        let banner = banner();
        assert!(banner.starts_with("lift-emu v"));
        assert!(banner.contains(version()));
        assert!(banner.ends_with(&format!("({})", git_hash())));
    }
}
