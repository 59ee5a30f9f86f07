//! Lint diagnostics for token scenes.
//!
//! Reports structural issues without modifying the scene. Nothing here is
//! enforced at mutation time; the sidebar shows these as hints.

use crate::id::TokenId;
use crate::model::Scene;
use crate::reference::{ReferenceGraph, parse_reference};

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Should be fixed — likely a mistake.
    Warning,
    /// Informational.
    Info,
}

/// What a diagnostic is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintTarget {
    Token(TokenId),
    Group(crate::id::GroupId),
    Connection(crate::id::ConnectionId),
}

/// A single lint diagnostic.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    pub target: LintTarget,
    /// Human-readable message.
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "layer-order", "dangling-reference").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over the scene and return diagnostics.
#[must_use]
pub fn lint_scene(scene: &Scene) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_references(scene, &mut diags);
    lint_cycles(scene, &mut diags);
    lint_groups(scene, &mut diags);
    lint_connections(scene, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Warn on references to higher layers and on references to nothing.
fn lint_references(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    for token in scene.all_tokens() {
        let Some(r) = parse_reference(&token.value) else {
            continue;
        };
        match scene.find_token(r.layer, &r.name) {
            None => diags.push(LintDiagnostic {
                target: LintTarget::Token(token.id),
                message: format!("`{}` references {r}, which does not exist.", token.name),
                severity: LintSeverity::Warning,
                rule: "dangling-reference",
            }),
            Some(_) if r.layer > token.layer => diags.push(LintDiagnostic {
                target: LintTarget::Token(token.id),
                message: format!(
                    "`{}` in layer `{}` references the higher layer `{}`.",
                    token.name, token.layer, r.layer
                ),
                severity: LintSeverity::Warning,
                rule: "layer-order",
            }),
            Some(_) => {}
        }
    }
}

fn lint_cycles(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    let graph = ReferenceGraph::build(scene);
    for cycle in graph.cycles() {
        let names: Vec<&str> = cycle
            .iter()
            .filter_map(|id| scene.token(*id).map(|t| t.name.as_str()))
            .collect();
        for id in &cycle {
            diags.push(LintDiagnostic {
                target: LintTarget::Token(*id),
                message: format!("Reference cycle: {}.", names.join(" → ")),
                severity: LintSeverity::Warning,
                rule: "reference-cycle",
            });
        }
    }
}

/// Info when a group has no member on the canvas; it draws nothing.
fn lint_groups(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    for group in &scene.groups {
        if !group.token_ids.iter().any(|id| scene.positions.contains(*id)) {
            diags.push(LintDiagnostic {
                target: LintTarget::Group(group.id),
                message: format!("Group `{}` has no members on the canvas.", group.name),
                severity: LintSeverity::Info,
                rule: "unplaced-group",
            });
        }
    }
}

fn lint_connections(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    for c in &scene.connections {
        if !scene.positions.contains(c.from) || !scene.positions.contains(c.to) {
            diags.push(LintDiagnostic {
                target: LintTarget::Connection(c.id),
                message: format!("Connection `{}` has an endpoint that is not on the canvas.", c.id),
                severity: LintSeverity::Warning,
                rule: "dangling-connection",
            });
        }
    }
}
