//! Version command implementation

use anyhow::Result;

use crate::cli::output;

/// Execute the version command
pub async fn execute() -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let description = env!("CARGO_PKG_DESCRIPTION");
    let repository = env!("CARGO_PKG_REPOSITORY");

    output::header(&format!("{name} v{version}"));
    output::key_value("Description:", description);
    output::key_value("Repository:", repository);
    output::key_value("Rust edition:", "2024");
    output::key_value(
        "Profile:",
        if cfg!(debug_assertions) { "debug" } else { "release" },
    );
    output::blank_line();
    output::success(&format!("Run '{name} --help' for usage information"));

    Ok(())
}
