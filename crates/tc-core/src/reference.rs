//! Token value references: `{layer.name}`.
//!
//! Connecting two nodes rewrites the target token's value into a reference
//! to the source token. This module parses and formats those strings,
//! resolves a token down to its literal value, and builds the reference
//! graph used to detect cycles.

use crate::id::TokenId;
use crate::model::{Layer, Scene};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::fmt;
use winnow::combinator::{delimited, separated_pair};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// A parsed `{layer.name}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenRef {
    pub layer: Layer,
    pub name: String,
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}.{}}}", self.layer, self.name)
    }
}

/// Format the reference string for a token.
pub fn format_reference(layer: Layer, name: &str) -> String {
    format!("{{{layer}.{name}}}")
}

fn layer_segment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

/// Everything up to the closing brace; names may contain dots.
fn name_segment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., |c: char| c == '}' || c == '{').parse_next(input)
}

fn reference<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    delimited('{', separated_pair(layer_segment, '.', name_segment), '}').parse_next(input)
}

/// Parse a whole value as a reference. Literals and references to layers
/// that do not exist return `None`.
pub fn parse_reference(value: &str) -> Option<TokenRef> {
    let (layer, name) = reference.parse(value.trim()).ok()?;
    Some(TokenRef {
        layer: Layer::parse(layer)?,
        name: name.to_string(),
    })
}

/// Why a token's value could not be resolved to a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    UnknownToken(TokenId),
    /// A reference names no token.
    Dangling(TokenRef),
    /// The chain loops back through this token.
    Cycle(TokenId),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnknownToken(id) => write!(f, "unknown token `{id}`"),
            ResolveError::Dangling(r) => write!(f, "reference {r} does not name a token"),
            ResolveError::Cycle(id) => write!(f, "reference cycle through `{id}`"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Follow a token's reference chain down to a literal value.
///
/// # Errors
/// Fails on unknown start tokens, dangling references, and cycles.
pub fn resolve_value(scene: &Scene, id: TokenId) -> Result<String, ResolveError> {
    let mut current = scene.token(id).ok_or(ResolveError::UnknownToken(id))?;
    let mut seen = HashSet::new();
    loop {
        if !seen.insert(current.id) {
            return Err(ResolveError::Cycle(current.id));
        }
        match parse_reference(&current.value) {
            None => return Ok(current.value.clone()),
            Some(r) => {
                current = scene
                    .find_token(r.layer, &r.name)
                    .ok_or(ResolveError::Dangling(r))?;
            }
        }
    }
}

/// Directed graph of token references: an edge `a → b` means `a`'s value
/// references `b`.
pub struct ReferenceGraph {
    pub graph: DiGraph<TokenId, ()>,
    index: HashMap<TokenId, NodeIndex>,
}

impl ReferenceGraph {
    pub fn build(scene: &Scene) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for token in scene.all_tokens() {
            index.insert(token.id, graph.add_node(token.id));
        }
        for token in scene.all_tokens() {
            let target = parse_reference(&token.value)
                .and_then(|r| scene.find_token(r.layer, &r.name));
            if let Some(target) = target {
                graph.add_edge(index[&token.id], index[&target.id], ());
            }
        }
        Self { graph, index }
    }

    /// Direct reference target of a token, if it references one.
    pub fn target_of(&self, id: TokenId) -> Option<TokenId> {
        let idx = *self.index.get(&id)?;
        self.graph.neighbors(idx).next().map(|n| self.graph[n])
    }

    /// Every set of tokens that reference each other in a loop,
    /// self-references included.
    pub fn cycles(&self) -> Vec<Vec<TokenId>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
            })
            .map(|scc| scc.into_iter().map(|n| self.graph[n]).collect())
            .collect()
    }
}
