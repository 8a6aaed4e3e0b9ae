//! Recognition engine: classify every node of a DOM subtree and build the
//! typed component tree.
//!
//! # Selection model
//!
//! Each node is classified on its own. Every registered pattern, across all
//! component types, is evaluated against the node; every pattern that matches
//! becomes a candidate. The winner is the candidate with the highest
//! confidence, then the highest priority, then the earliest registration.
//! The ordering is total, so equal inputs always give equal trees.
//!
//! Nodes with no candidate are dropped; their recognized descendants attach
//! directly to the nearest recognized ancestor, in document order.
//!
//! # Faults
//!
//! A predicate that cannot be evaluated makes its pattern non-matching for
//! that node and is recorded as a [`Diagnostic`]. A node the accessor cannot
//! read is excluded with its subtree and marks the outcome `partial`. Only a
//! failure to read the root itself is an error.

use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use tracing::{debug, info, warn};

use crate::accessor::{ElementView, PageAccessor};
use crate::config::RecognizerConfig;
use crate::patterns::{default_registry, registry_for};
use crate::registry::PatternRegistry;
use crate::types::{ComponentType, NodeId, PageliftError, PageliftResult, RecognizedComponent};

// ── Outcome types ────────────────────────────────────────────────────────────

/// A matched pattern competing for a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub component_type: ComponentType,
    pub confidence: u8,
    pub priority: i32,
    /// Registration index of the owning pattern.
    pub order: usize,
    pub reason: String,
}

impl Candidate {
    fn rank(&self) -> (u8, i32, Reverse<usize>) {
        (self.confidence, self.priority, Reverse(self.order))
    }
}

/// What went wrong at one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A pattern predicate could not be evaluated; the pattern was skipped.
    #[serde(rename_all = "camelCase")]
    PredicateFault {
        component_type: ComponentType,
        pattern: String,
        predicate: String,
        message: String,
    },
    /// The accessor could not read the node; its subtree was excluded.
    AccessorFault { message: String },
    /// A depth or node-count ceiling cut the walk short here.
    Truncated { limit: String },
}

/// Non-fatal event recorded during a recognition pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub node: NodeId,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::PredicateFault {
                component_type,
                pattern,
                predicate,
                message,
            } => write!(
                f,
                "node {}: {component_type} pattern '{pattern}' skipped ({predicate}: {message})",
                self.node
            ),
            DiagnosticKind::AccessorFault { message } => {
                write!(f, "node {}: subtree excluded ({message})", self.node)
            }
            DiagnosticKind::Truncated { limit } => {
                write!(f, "node {}: truncated at {limit} limit", self.node)
            }
        }
    }
}

/// Result of one recognition pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recognition {
    pub root: RecognizedComponent,
    /// Some subtree was excluded because the accessor could not read it.
    pub partial: bool,
    /// A depth or node-count ceiling was hit.
    pub truncated: bool,
    pub nodes_visited: usize,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Evaluates a [`PatternRegistry`] over DOM subtrees.
///
/// Holds no per-page state; one engine can serve any number of pages, from
/// any number of threads, each with its own accessor.
#[derive(Debug, Clone)]
pub struct RecognitionEngine {
    registry: PatternRegistry,
    config: RecognizerConfig,
}

impl Default for RecognitionEngine {
    fn default() -> Self {
        Self::new(default_registry(), RecognizerConfig::default())
    }
}

impl RecognitionEngine {
    pub fn new(registry: PatternRegistry, config: RecognizerConfig) -> Self {
        Self { registry, config }
    }

    /// Built-in catalogue tuned by `config`.
    pub fn with_config(config: RecognizerConfig) -> Self {
        Self::new(registry_for(&config), config)
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PatternRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Recognize the subtree rooted at `root`.
    ///
    /// The returned tree is never empty: an unrecognized root becomes a
    /// synthesized `container` (confidence 0, no reason) holding whatever was
    /// recognized below it.
    pub fn recognize(&self, page: &dyn PageAccessor, root: NodeId) -> PageliftResult<Recognition> {
        let view = ElementView::read(page, root).map_err(PageliftError::RootUnavailable)?;

        let mut pass = Pass {
            engine: self,
            page,
            diagnostics: Vec::new(),
            visited: 0,
            partial: false,
            truncated: false,
            node_limit_reported: false,
        };
        pass.visited = 1;
        let (winner, children) = pass.visit_view(view, 0);

        let root_component = match winner {
            Some(candidate) => build_component(candidate, root, children),
            None => {
                let mut synthesized = RecognizedComponent::new(ComponentType::Container, 0, root);
                synthesized.children = children;
                synthesized
            }
        };

        info!(
            components = root_component.count(),
            nodes = pass.visited,
            partial = pass.partial,
            truncated = pass.truncated,
            "recognition pass complete"
        );

        Ok(Recognition {
            root: root_component,
            partial: pass.partial,
            truncated: pass.truncated,
            nodes_visited: pass.visited,
            diagnostics: pass.diagnostics,
        })
    }

    /// Every pattern matching `view`, in registration order. Faults are
    /// appended to `diagnostics`.
    pub fn candidates(
        &self,
        view: &ElementView,
        page: &dyn PageAccessor,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Candidate> {
        let mut out = Vec::new();
        for registered in self.registry.all_patterns() {
            match registered.pattern.evaluate(view, page) {
                Ok(true) => out.push(Candidate {
                    component_type: registered.component_type.clone(),
                    confidence: registered.pattern.confidence,
                    priority: registered.pattern.priority,
                    order: registered.order,
                    reason: registered.pattern.reason.clone(),
                }),
                Ok(false) => {}
                Err(fault) => {
                    warn!(
                        node = %view.node,
                        component = %registered.component_type,
                        pattern = %registered.pattern.reason,
                        "predicate fault: {fault}"
                    );
                    diagnostics.push(Diagnostic {
                        node: view.node,
                        kind: DiagnosticKind::PredicateFault {
                            component_type: registered.component_type.clone(),
                            pattern: registered.pattern.reason.clone(),
                            predicate: fault.predicate.to_string(),
                            message: fault.message,
                        },
                    });
                }
            }
        }
        out
    }

    /// Classify a single node without descending into the tree.
    pub fn classify(
        &self,
        view: &ElementView,
        page: &dyn PageAccessor,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Candidate> {
        select_winner(self.candidates(view, page, diagnostics))
    }
}

/// Highest confidence, then highest priority, then earliest registration.
pub fn select_winner(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().max_by_key(|c| c.rank())
}

fn build_component(
    candidate: Candidate,
    element: NodeId,
    children: Vec<RecognizedComponent>,
) -> RecognizedComponent {
    RecognizedComponent {
        component_type: candidate.component_type,
        confidence: candidate.confidence,
        element,
        reason: Some(candidate.reason),
        children,
        analyzer_output: None,
    }
}

// ── Walk ─────────────────────────────────────────────────────────────────────

/// Mutable state of one pass; dropped when the pass returns.
struct Pass<'a> {
    engine: &'a RecognitionEngine,
    page: &'a dyn PageAccessor,
    diagnostics: Vec<Diagnostic>,
    visited: usize,
    partial: bool,
    truncated: bool,
    node_limit_reported: bool,
}

impl Pass<'_> {
    /// Classify an already-read node and recurse into its children.
    fn visit_view(
        &mut self,
        mut view: ElementView,
        depth: usize,
    ) -> (Option<Candidate>, Vec<RecognizedComponent>) {
        let winner = self
            .engine
            .classify(&view, self.page, &mut self.diagnostics);
        if let Some(c) = &winner {
            debug!(
                node = %view.node,
                tag = %view.tag,
                component = %c.component_type,
                confidence = c.confidence,
                "node recognized"
            );
        }

        let child_ids = std::mem::take(&mut view.children);
        drop(view);

        let mut children = Vec::new();
        for child in child_ids {
            children.extend(self.visit(child, depth + 1));
        }
        (winner, children)
    }

    /// Recognized components contributed by `node`: itself when recognized,
    /// otherwise its recognized descendants, flattened.
    fn visit(&mut self, node: NodeId, depth: usize) -> Vec<RecognizedComponent> {
        if depth > self.engine.config.max_depth {
            self.truncated = true;
            warn!(node = %node, depth, "depth limit reached, subtree truncated");
            self.diagnostics.push(Diagnostic {
                node,
                kind: DiagnosticKind::Truncated {
                    limit: "depth".into(),
                },
            });
            return Vec::new();
        }
        if self.visited >= self.engine.config.max_nodes {
            self.truncated = true;
            if !self.node_limit_reported {
                self.node_limit_reported = true;
                warn!(node = %node, "node limit reached, remaining nodes truncated");
                self.diagnostics.push(Diagnostic {
                    node,
                    kind: DiagnosticKind::Truncated {
                        limit: "nodes".into(),
                    },
                });
            }
            return Vec::new();
        }
        self.visited += 1;

        let view = match ElementView::read(self.page, node) {
            Ok(view) => view,
            Err(e) => {
                self.partial = true;
                warn!(node = %node, "accessor fault, subtree excluded: {e}");
                self.diagnostics.push(Diagnostic {
                    node,
                    kind: DiagnosticKind::AccessorFault {
                        message: e.to_string(),
                    },
                });
                return Vec::new();
            }
        };

        let (winner, children) = self.visit_view(view, depth);
        match winner {
            Some(candidate) => vec![build_component(candidate, node, children)],
            None => children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::RecognitionPattern;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::Viewport;

    fn candidate(t: ComponentType, confidence: u8, priority: i32, order: usize) -> Candidate {
        Candidate {
            component_type: t,
            confidence,
            priority,
            order,
            reason: String::new(),
        }
    }

    #[test]
    fn test_select_winner_ordering() {
        let winner = select_winner(vec![
            candidate(ComponentType::Text, 70, 9, 0),
            candidate(ComponentType::Alert, 90, 1, 1),
            candidate(ComponentType::Footer, 90, 5, 2),
            candidate(ComponentType::Header, 90, 5, 3),
        ])
        .unwrap();
        assert_eq!(winner.component_type, ComponentType::Footer);
        assert!(select_winner(Vec::new()).is_none());
    }

    fn paragraph_registry() -> PatternRegistry {
        let mut reg = PatternRegistry::new();
        reg.register(
            ComponentType::Paragraph,
            vec![RecognitionPattern::new("p tag").tags(&["p"]).confidence(90)],
        )
        .unwrap();
        reg.register(
            ComponentType::Section,
            vec![RecognitionPattern::new("section tag").tags(&["section"]).confidence(80)],
        )
        .unwrap();
        reg
    }

    #[test]
    fn test_unrecognized_root_is_synthesized_container() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("body");
        let div = b.child(body, "div");
        b.child(div, "p");
        let snap = b.build();

        let engine = RecognitionEngine::new(paragraph_registry(), RecognizerConfig::default());
        let out = engine.recognize(&snap, body).unwrap();
        assert_eq!(out.root.component_type, ComponentType::Container);
        assert_eq!(out.root.confidence, 0);
        assert!(out.root.reason.is_none());
        assert_eq!(out.root.children.len(), 1);
        assert_eq!(out.root.children[0].component_type, ComponentType::Paragraph);
        assert!(!out.partial);
        assert_eq!(out.nodes_visited, 3);
    }

    #[test]
    fn test_depth_limit_truncates() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("body");
        let mut parent = body;
        for _ in 0..6 {
            parent = b.child(parent, "section");
        }
        b.child(parent, "p");
        let snap = b.build();

        let config = RecognizerConfig {
            max_depth: 3,
            ..RecognizerConfig::default()
        };
        let engine = RecognitionEngine::new(paragraph_registry(), config);
        let out = engine.recognize(&snap, body).unwrap();
        assert!(out.truncated);
        assert!(out.root.find(&ComponentType::Paragraph).is_none());
        assert!(out
            .diagnostics
            .iter()
            .any(|d| matches!(&d.kind, DiagnosticKind::Truncated { limit } if limit == "depth")));
    }

    #[test]
    fn test_node_limit_truncates_once() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("body");
        for _ in 0..10 {
            b.child(body, "p");
        }
        let snap = b.build();

        let config = RecognizerConfig {
            max_nodes: 4,
            ..RecognizerConfig::default()
        };
        let engine = RecognitionEngine::new(paragraph_registry(), config);
        let out = engine.recognize(&snap, body).unwrap();
        assert!(out.truncated);
        assert_eq!(out.nodes_visited, 4);
        assert_eq!(out.root.children.len(), 3);
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn test_detached_root_is_an_error() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("body");
        b.detach(body);
        let snap = b.build();
        let engine = RecognitionEngine::new(paragraph_registry(), RecognizerConfig::default());
        assert!(matches!(
            engine.recognize(&snap, body),
            Err(PageliftError::RootUnavailable(_))
        ));
    }
}
