use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::Path;
use writmacs_core::{Config, Session};
use writmacs_types::Target;

pub struct ExpandOptions {
    pub target: Option<String>,
    pub metadata: bool,
    pub tree: bool,
    pub seed: Option<u64>,
    pub strict: bool,
}

/// Load the config file if there is one, defaults otherwise
fn load_config(config_path: &Path) -> Result<Config> {
    if config_path.is_file() {
        Config::from_file(config_path).context("Failed to load configuration")
    } else {
        tracing::debug!("No config at {:?}, using defaults", config_path);
        Ok(Config::default())
    }
}

fn resolve_target(requested: Option<&str>, fallback: Target) -> Target {
    match requested.map(str::parse::<Target>) {
        Some(Ok(target)) => target,
        Some(Err(e)) => {
            tracing::warn!("{}, using {}", e, fallback);
            fallback
        }
        None => fallback,
    }
}

pub fn expand_stdin(config_path: &Path, opts: ExpandOptions) -> Result<()> {
    let mut config = load_config(config_path)?;
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    config.strict |= opts.strict;

    let target = resolve_target(opts.target.as_deref(), config.default_target);

    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("Failed to read stdin")?;

    let mut session = Session::new(config).context("Failed to load keymaps")?;

    if opts.tree {
        let tree = session.tree(&source)?;
        println!("{}", tree);
        return Ok(());
    }

    let expansion = session
        .expand(&source, target)
        .with_context(|| format!("Failed to expand for {}", target))?;
    println!("{}", expansion.text);

    if opts.metadata {
        eprintln!("{}", serde_json::to_string_pretty(&expansion.metadata)?);
    }

    Ok(())
}
