//! Expansion sessions: one registry, one asset cache, one randomness source.

use crate::assets::{AssetCache, AssetProvider, DirectoryProvider};
use crate::config::Config;
use crate::error::Result;
use crate::eval::Evaluator;
use crate::macros::{MacroEnv, MacroRegistry};
use crate::parser::parse_bounded;
use crate::tree;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use writmacs_types::{Context, Metadata, Node, Target};

/// A fully expanded document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    pub metadata: Metadata,
}

pub struct Session {
    config: Config,
    registry: MacroRegistry,
    assets: Arc<AssetCache>,
    rng: StdRng,
}

impl Session {
    /// Session over the configured data directory and the bundled tables
    pub fn new(config: Config) -> Result<Self> {
        let provider = match config.data_dir() {
            Some(dir) => DirectoryProvider::new(dir),
            None => DirectoryProvider::bundled(),
        };
        Self::with_provider(config, provider)
    }

    pub fn with_provider(config: Config, provider: impl AssetProvider + 'static) -> Result<Self> {
        Self::with_shared_assets(config, Arc::new(AssetCache::new(provider)))
    }

    /// Session reusing a cache another session may also be reading
    pub fn with_shared_assets(config: Config, assets: Arc<AssetCache>) -> Result<Self> {
        let registry = MacroRegistry::builder()
            .builtins()
            .keymaps(assets.table_names()?)
            .build();
        Ok(Self::with_parts(config, registry, assets))
    }

    pub fn with_parts(config: Config, registry: MacroRegistry, assets: Arc<AssetCache>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        tracing::info!(
            "Session ready with {} macros",
            registry.expander_names().len()
        );
        Self {
            config,
            registry,
            assets,
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    /// Restart the randomness source from a fixed seed
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Parse and build the node tree without evaluating it
    pub fn tree(&self, text: &str) -> Result<Node> {
        let record = parse_bounded(text, self.config.max_depth)?;
        Ok(tree::build(record, &self.registry))
    }

    pub fn expand(&mut self, text: &str, target: Target) -> Result<Expansion> {
        self.expand_in(text, &Context::new(target))
    }

    /// Expand under an arbitrary starting context
    pub fn expand_in(&mut self, text: &str, context: &Context) -> Result<Expansion> {
        let tree = self.tree(text)?;
        let env = MacroEnv {
            assets: &self.assets,
            rng: &mut self.rng,
            strict: self.config.strict,
        };
        let (builder, metadata) = Evaluator::new(&self.registry, env).evaluate(&tree, context)?;
        Ok(Expansion {
            text: builder.text(),
            metadata,
        })
    }
}
