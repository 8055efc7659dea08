//! Background knowledge: causal edges known to be forbidden or required.
//!
//! Knowledge is expressed over variable names, independent of any particular graph. A forbidden
//! edge `from → to` says that `from` is not a cause of `to`; a required edge says that it is.

use std::collections::BTreeSet;
use std::fmt;

/// A directed edge `from → to` between two variables, by name.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct KnowledgeEdge {
    from: String,
    to: String,
}

impl KnowledgeEdge {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }
}

impl fmt::Display for KnowledgeEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}", self.from, self.to)
    }
}

/// Source of forbidden and required causal edges.
pub trait Knowledge {
    fn is_forbidden(&self, from: &str, to: &str) -> bool;

    fn is_required(&self, from: &str, to: &str) -> bool;

    fn forbidden_edges(&self) -> Box<dyn Iterator<Item = &KnowledgeEdge> + '_>;

    fn required_edges(&self) -> Box<dyn Iterator<Item = &KnowledgeEdge> + '_>;

    fn is_empty(&self) -> bool {
        self.forbidden_edges().next().is_none() && self.required_edges().next().is_none()
    }

    /// Every variable name mentioned by some forbidden or required edge.
    fn variables(&self) -> BTreeSet<&str> {
        self.forbidden_edges()
            .chain(self.required_edges())
            .flat_map(|e| [e.from(), e.to()])
            .collect()
    }
}

/// Explicit lists of forbidden and required edges.
#[derive(Debug, Clone, Default)]
pub struct BackgroundKnowledge {
    forbidden: BTreeSet<KnowledgeEdge>,
    required: BTreeSet<KnowledgeEdge>,
}

impl BackgroundKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_forbidden(&mut self, from: &str, to: &str) -> bool {
        self.forbidden.insert(KnowledgeEdge::new(from, to))
    }

    pub fn set_required(&mut self, from: &str, to: &str) -> bool {
        self.required.insert(KnowledgeEdge::new(from, to))
    }

    pub fn remove_forbidden(&mut self, from: &str, to: &str) -> bool {
        self.forbidden.remove(&KnowledgeEdge::new(from, to))
    }

    pub fn remove_required(&mut self, from: &str, to: &str) -> bool {
        self.required.remove(&KnowledgeEdge::new(from, to))
    }
}

impl Knowledge for BackgroundKnowledge {
    fn is_forbidden(&self, from: &str, to: &str) -> bool {
        self.forbidden.iter().any(|e| e.from == from && e.to == to)
    }

    fn is_required(&self, from: &str, to: &str) -> bool {
        self.required.iter().any(|e| e.from == from && e.to == to)
    }

    fn forbidden_edges(&self) -> Box<dyn Iterator<Item = &KnowledgeEdge> + '_> {
        Box::new(self.forbidden.iter())
    }

    fn required_edges(&self) -> Box<dyn Iterator<Item = &KnowledgeEdge> + '_> {
        Box::new(self.required.iter())
    }
}
