use anyhow::{Context, Result};
use sessiontree_runtime_config::{load_layered, ViewerConfig, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SESSIONTREE_CONFIG";

/// Get the config directory path (~/.config/sessiontree/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("sessiontree"))
}

/// Config files in merge order: the user file (explicit or default), then
/// the project file in `cwd`.
pub fn config_layers(explicit: Option<&str>, cwd: &Path) -> Result<Vec<PathBuf>> {
    let env_value = std::env::var(CONFIG_ENV).ok();
    let user = match explicit.or(env_value.as_deref()) {
        Some(path) if !path.trim().is_empty() => {
            PathBuf::from(shellexpand::tilde(path.trim()).to_string())
        }
        _ => config_dir()?.join(CONFIG_FILE_NAME),
    };
    Ok(vec![user, cwd.join(CONFIG_FILE_NAME)])
}

/// Load the effective config. An explicitly named file must exist.
pub fn load_config(explicit: Option<&str>) -> Result<(ViewerConfig, Vec<PathBuf>)> {
    let cwd = std::env::current_dir().context("read current directory")?;
    let layers = config_layers(explicit, &cwd)?;
    if explicit.is_some() && !layers[0].exists() {
        anyhow::bail!("config file not found: {}", layers[0].display());
    }
    let config = load_layered(&layers).context("Failed to load config")?;
    tracing::debug!("Loaded config from {:?}", layers);
    Ok((config, layers))
}

/// Print the effective config as TOML, preceded by the files it came from.
pub fn show_config(explicit: Option<&str>) -> Result<()> {
    let (config, layers) = load_config(explicit)?;
    for path in &layers {
        let state = if path.exists() { "loaded" } else { "missing" };
        println!("# {} ({state})", path.display());
    }
    println!();
    print!("{}", config.to_toml_string()?);
    Ok(())
}
