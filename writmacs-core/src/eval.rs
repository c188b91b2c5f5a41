//! Tree evaluation.
//!
//! Context flows down: a node's contextualizer shapes the context its
//! children see, while its own expander sees the context it was invoked
//! under. Metadata flows up: later siblings override earlier ones, and an
//! expander's own metadata overrides everything from below it.

use crate::error::{Result, WritError};
use crate::macros::{MacroCall, MacroEnv, MacroRegistry};
use crate::parser::ROOT_NAME;
use writmacs_types::{Builder, Chunk, Context, Forest, Metadata, Node};

pub struct Evaluator<'a> {
    registry: &'a MacroRegistry,
    env: MacroEnv<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a MacroRegistry, env: MacroEnv<'a>) -> Self {
        Self { registry, env }
    }

    /// Resolve a node into output fragments and the metadata it extracted
    pub fn evaluate(&mut self, node: &Node, context: &Context) -> Result<(Builder, Metadata)> {
        let registry = self.registry;
        let name = node.name();

        let local;
        let child_context = match registry.contextualizer(name) {
            Some(rule) => {
                local = context.overlay(&rule.contextualize(node.children()));
                &local
            }
            None => context,
        };

        let mut groups = Vec::with_capacity(node.children().len());
        let mut metadata = Metadata::new();
        for forest in node.children() {
            let (builder, found) = self.evaluate_forest(forest, child_context)?;
            groups.push(builder);
            metadata.extend(found);
        }

        let Some(rule) = registry.expander(name) else {
            if name != ROOT_NAME && !registry.knows(name) {
                if self.env.strict {
                    return Err(WritError::UnknownMacro {
                        name: name.to_string(),
                    });
                }
                tracing::warn!("No rule for %{}, passing content through", name);
            }
            return Ok((groups.into_iter().flatten().collect(), metadata));
        };

        let call = MacroCall {
            name,
            groups,
            fields: node.fields(),
            context,
        };
        let output = rule.expand(call, &mut self.env)?;
        if let Some(own) = output.metadata {
            metadata.extend(own);
        }
        Ok((output.builder, metadata))
    }

    fn evaluate_forest(&mut self, forest: &Forest, context: &Context) -> Result<(Builder, Metadata)> {
        let mut builder = Builder::new();
        let mut metadata = Metadata::new();

        for chunk in forest {
            match chunk {
                Chunk::Literal(text) => builder.push_literal(text.as_str()),
                Chunk::Markup(text) => builder.push_markup(text.as_str()),
                Chunk::Tree(node) => {
                    let (inner, found) = self.evaluate(node, context)?;
                    builder.append(inner);
                    metadata.extend(found);
                }
            }
        }

        Ok((builder, metadata))
    }
}
