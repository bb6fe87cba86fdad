use std::path::{Path, PathBuf};

use anyhow::Result;

use anchorscroll_core::AnchorConfig;

/// Always ~/.config/anchorscroll/config.toml, on every platform
pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("anchorscroll")
        .join("config.toml")
}

pub fn run(config: &AnchorConfig, path: &Path) -> Result<()> {
    let source = if path.exists() { "file" } else { "defaults" };
    println!("# {} ({})", path.display(), source);
    print!("{}", config.to_toml_string()?);
    Ok(())
}
