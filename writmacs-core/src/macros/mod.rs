//! Macro rules and the registry that names them.
//!
//! A macro name may carry up to three rules:
//! - an [`Organizer`] that gives its raw bracket groups named roles,
//! - a [`Contextualizer`] that derives context for its own subtree,
//! - an [`Expander`] that turns its resolved groups into output.
//!
//! Names without any rule pass their content through unchanged.

pub mod builtins;
pub mod combinators;

use crate::assets::AssetCache;
use crate::error::Result;
use crate::parser::SyntaxChunk;
use crate::tree::{Organized, Organizer};
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use writmacs_types::{Builder, Context, Forest, Metadata, PartialContext, Target};

pub use combinators::{KeymapRule, Tag, TargetDispatch, Wrap};

static NO_FIELDS: BTreeMap<String, usize> = BTreeMap::new();

/// One invocation of an expander
pub struct MacroCall<'a> {
    pub name: &'a str,
    /// Resolved output of each bracket group, in source order
    pub groups: Vec<Builder>,
    pub fields: &'a BTreeMap<String, usize>,
    /// The context the macro was invoked under
    pub context: &'a Context,
}

impl<'a> MacroCall<'a> {
    pub fn new(name: &'a str, groups: Vec<Builder>, context: &'a Context) -> Self {
        Self {
            name,
            groups,
            fields: &NO_FIELDS,
            context,
        }
    }

    pub fn target(&self) -> Target {
        self.context.target()
    }

    pub fn group(&self, index: usize) -> Option<&Builder> {
        self.groups.get(index)
    }

    /// Move a group out, leaving it empty; missing groups are empty
    pub fn take(&mut self, index: usize) -> Builder {
        self.groups
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Move the innermost (last) group out
    pub fn take_last(&mut self) -> Builder {
        self.groups.pop().unwrap_or_default()
    }

    /// Move out the group an organizer named `field`
    pub fn take_field(&mut self, field: &str) -> Option<Builder> {
        let index = *self.fields.get(field)?;
        self.groups.get_mut(index).map(std::mem::take)
    }

    /// The same invocation over different groups, with no field names
    pub fn with_groups(&self, groups: Vec<Builder>) -> MacroCall<'a> {
        MacroCall::new(self.name, groups, self.context)
    }
}

/// Session resources available to expanders
pub struct MacroEnv<'a> {
    pub assets: &'a AssetCache,
    pub rng: &'a mut StdRng,
    /// Raise on unresolved names instead of degrading
    pub strict: bool,
}

/// What an expander produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutput {
    pub builder: Builder,
    /// Overrides metadata collected from the macro's descendants
    pub metadata: Option<Metadata>,
}

impl RuleOutput {
    pub fn with_metadata(builder: Builder, metadata: Metadata) -> Self {
        Self {
            builder,
            metadata: Some(metadata),
        }
    }
}

impl From<Builder> for RuleOutput {
    fn from(builder: Builder) -> Self {
        Self {
            builder,
            metadata: None,
        }
    }
}

/// Produces a macro's output from its resolved bracket groups
pub trait Expander: Send + Sync {
    fn expand(&self, call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput>;
}

/// Derives context overrides for a macro's own children
pub trait Contextualizer: Send + Sync {
    fn contextualize(&self, children: &[Forest]) -> PartialContext;
}

struct FnExpander<F>(F);

impl<F> Expander for FnExpander<F>
where
    F: Fn(MacroCall<'_>, &mut MacroEnv<'_>) -> Result<RuleOutput> + Send + Sync,
{
    fn expand(&self, call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        (self.0)(call, env)
    }
}

struct FnContextualizer<F>(F);

impl<F> Contextualizer for FnContextualizer<F>
where
    F: Fn(&[Forest]) -> PartialContext + Send + Sync,
{
    fn contextualize(&self, children: &[Forest]) -> PartialContext {
        (self.0)(children)
    }
}

struct FnOrganizer<F>(F);

impl<F> Organizer for FnOrganizer<F>
where
    F: Fn(Vec<Vec<SyntaxChunk>>) -> Organized + Send + Sync,
{
    fn organize(&self, groups: Vec<Vec<SyntaxChunk>>) -> Organized {
        (self.0)(groups)
    }
}

/// Immutable name-to-rule tables, built once per session
#[derive(Clone, Default)]
pub struct MacroRegistry {
    expanders: HashMap<String, Arc<dyn Expander>>,
    contextualizers: HashMap<String, Arc<dyn Contextualizer>>,
    organizers: HashMap<String, Arc<dyn Organizer>>,
}

impl MacroRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Just the built-in rules, with no keymap names
    pub fn builtin() -> Self {
        Self::builder().builtins().build()
    }

    pub fn expander(&self, name: &str) -> Option<&dyn Expander> {
        self.expanders.get(name).map(|rule| rule.as_ref())
    }

    pub fn contextualizer(&self, name: &str) -> Option<&dyn Contextualizer> {
        self.contextualizers.get(name).map(|rule| rule.as_ref())
    }

    pub fn organizer(&self, name: &str) -> Option<&dyn Organizer> {
        self.organizers.get(name).map(|rule| rule.as_ref())
    }

    /// Whether any rule is registered under `name`
    pub fn knows(&self, name: &str) -> bool {
        self.expanders.contains_key(name)
            || self.contextualizers.contains_key(name)
            || self.organizers.contains_key(name)
    }

    /// Sorted names that have an expander
    pub fn expander_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.expanders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut contextualizers: Vec<&String> = self.contextualizers.keys().collect();
        let mut organizers: Vec<&String> = self.organizers.keys().collect();
        contextualizers.sort();
        organizers.sort();
        f.debug_struct("MacroRegistry")
            .field("expanders", &self.expander_names())
            .field("contextualizers", &contextualizers)
            .field("organizers", &organizers)
            .finish()
    }
}

/// Collects rules before freezing them into a [`MacroRegistry`]
#[derive(Default)]
pub struct RegistryBuilder {
    registry: MacroRegistry,
}

impl RegistryBuilder {
    /// Register every built-in rule and alias
    pub fn builtins(self) -> Self {
        builtins::register(self)
    }

    /// Register each table name as a macro applying that table
    ///
    /// A table never shadows a rule already registered under its name.
    pub fn keymaps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            self.registry
                .expanders
                .entry(name.clone())
                .or_insert_with(|| Arc::new(KeymapRule::new(name)));
        }
        self
    }

    pub fn expander(self, name: &str, rule: impl Expander + 'static) -> Self {
        self.aliases(&[name], Arc::new(rule))
    }

    /// Register one shared rule under several names
    pub fn aliases(mut self, names: &[&str], rule: Arc<dyn Expander>) -> Self {
        for name in names {
            self.registry
                .expanders
                .insert(name.to_string(), rule.clone());
        }
        self
    }

    pub fn expander_fn<F>(self, name: &str, rule: F) -> Self
    where
        F: Fn(MacroCall<'_>, &mut MacroEnv<'_>) -> Result<RuleOutput> + Send + Sync + 'static,
    {
        self.expander(name, FnExpander(rule))
    }

    pub fn contextualizer(mut self, name: &str, rule: impl Contextualizer + 'static) -> Self {
        self.registry
            .contextualizers
            .insert(name.to_string(), Arc::new(rule));
        self
    }

    pub fn contextualizer_fn<F>(self, name: &str, rule: F) -> Self
    where
        F: Fn(&[Forest]) -> PartialContext + Send + Sync + 'static,
    {
        self.contextualizer(name, FnContextualizer(rule))
    }

    pub fn organizer(mut self, name: &str, rule: impl Organizer + 'static) -> Self {
        self.registry
            .organizers
            .insert(name.to_string(), Arc::new(rule));
        self
    }

    pub fn organizer_fn<F>(self, name: &str, rule: F) -> Self
    where
        F: Fn(Vec<Vec<SyntaxChunk>>) -> Organized + Send + Sync + 'static,
    {
        self.organizer(name, FnOrganizer(rule))
    }

    pub fn build(self) -> MacroRegistry {
        self.registry
    }
}
