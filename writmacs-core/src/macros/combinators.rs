//! Building blocks the built-in rules are assembled from.

use super::{Expander, MacroCall, MacroEnv, RuleOutput};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use writmacs_types::{Builder, Target};

/// Surrounds the first group with fixed markup
#[derive(Debug, Clone)]
pub struct Wrap {
    prefix: String,
    suffix: String,
}

impl Wrap {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Same marker on both sides
    pub fn symmetric(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        Self::new(marker.clone(), marker)
    }
}

impl Expander for Wrap {
    fn expand(&self, mut call: MacroCall<'_>, _env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let mut out = Builder::markup(self.prefix.as_str());
        out.append(call.take(0));
        out.push_markup(self.suffix.as_str());
        Ok(out.into())
    }
}

/// Surrounds the first group with an HTML element
#[derive(Debug, Clone)]
pub struct Tag {
    name: String,
    class: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
        }
    }

    pub fn with_class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: Some(class.into()),
        }
    }

    pub fn wrap(&self, body: Builder) -> Builder {
        let open = match &self.class {
            Some(class) => format!("<{} class=\"{}\">", self.name, class),
            None => format!("<{}>", self.name),
        };
        let mut out = Builder::markup(open);
        out.append(body);
        out.push_markup(format!("</{}>", self.name));
        out
    }
}

impl Expander for Tag {
    fn expand(&self, mut call: MacroCall<'_>, _env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        Ok(self.wrap(call.take(0)).into())
    }
}

/// Chooses a rule by the current target
///
/// The chosen rule sees only the last bracket group. On a target with no
/// rule, that group passes through unchanged.
#[derive(Clone, Default)]
pub struct TargetDispatch {
    rules: BTreeMap<Target, Arc<dyn Expander>>,
}

impl TargetDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, targets: &[Target], rule: impl Expander + 'static) -> Self {
        let rule: Arc<dyn Expander> = Arc::new(rule);
        for target in targets {
            self.rules.insert(*target, rule.clone());
        }
        self
    }

    pub fn covers(&self, target: Target) -> bool {
        self.rules.contains_key(&target)
    }
}

impl Expander for TargetDispatch {
    fn expand(&self, mut call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let content = call.take_last();
        match self.rules.get(&call.target()) {
            Some(rule) => rule.expand(call.with_groups(vec![content]), env),
            None => Ok(content.into()),
        }
    }
}

/// Routes the first group through a named replacement table
#[derive(Debug, Clone)]
pub struct KeymapRule {
    table: String,
}

impl KeymapRule {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Expander for KeymapRule {
    fn expand(&self, mut call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let keymap = env.assets.require_table(&self.table)?;
        Ok(keymap.apply_builder(call.take(0)).into())
    }
}
