//! Integration tests: loading a saved scene and working with it through
//! the public tc-core API (restore, resolve, lint, geometry, encodings).

use pretty_assertions::assert_eq;
use tc_core::geometry::{Point, Rect, bounding_box, to_content_space, to_screen_space};
use tc_core::{
    CanvasConfig, GroupId, LintSeverity, Scene, SceneExport, TokenId, lint_scene, resolve_value,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn brand() -> Scene {
    init_logs();
    let export = SceneExport::from_json(include_str!("fixtures/brand.json")).unwrap();
    Scene::from_export(export)
}

#[test]
fn restore_drops_what_would_break_invariants() {
    let scene = brand();
    assert_eq!(scene.all_tokens().count(), 6);
    assert_eq!(scene.positions.len(), 4, "ghost position dropped");
    assert!(!scene.positions.contains(TokenId::intern("ghost")));

    let ids: Vec<&str> = scene.connections.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"], "connection to unplaced node dropped");

    assert_eq!(scene.groups.len(), 1, "group of unknown tokens pruned");
    assert_eq!(scene.groups[0].id, GroupId::intern("g-brand"));
}

#[test]
fn socket_sides_default_when_missing() {
    let scene = brand();
    let c2 = &scene.connections[1];
    assert_eq!(c2.from_socket, None);
    assert_eq!(c2.start_side().as_str(), "right");
    assert_eq!(c2.end_side().as_str(), "left");
    assert_eq!(scene.connections[2].start_side().as_str(), "bottom");
}

#[test]
fn positions_keep_file_order() {
    let scene = brand();
    let order: Vec<&str> = scene.positions.ids().iter().map(|id| id.as_str()).collect();
    assert_eq!(order, vec!["blue-500", "brand", "action", "button-bg"]);
}

#[test]
fn references_resolve_across_layers() {
    let scene = brand();
    assert_eq!(resolve_value(&scene, TokenId::intern("button-bg")).unwrap(), "#4A90E2");
    assert_eq!(resolve_value(&scene, TokenId::intern("gutter")).unwrap(), "16px");
}

#[test]
fn fixture_lints_clean() {
    let mut scene = brand();
    assert!(lint_scene(&scene).is_empty());

    scene.token_mut(TokenId::intern("brand")).unwrap().value = "{specific.button-bg}".into();
    let diags = lint_scene(&scene);
    assert!(diags.iter().all(|d| d.severity == LintSeverity::Warning));
    let mut rules: Vec<&str> = diags.iter().map(|d| d.rule).collect();
    rules.sort();
    rules.dedup();
    assert_eq!(rules, vec!["layer-order", "reference-cycle"]);
}

#[test]
fn export_roundtrips_through_json_and_msgpack() {
    let scene = brand();
    let json = scene.capture().to_json();
    assert_eq!(Scene::from_export(SceneExport::from_json(&json).unwrap()), scene);

    let bytes = scene.capture().to_msgpack().unwrap();
    assert_eq!(Scene::from_export(SceneExport::from_msgpack(&bytes).unwrap()), scene);
}

#[test]
fn malformed_json_is_an_error_not_a_panic() {
    assert!(SceneExport::from_json("{\"tokens\": 3}").is_err());
    assert!(SceneExport::from_json("").is_err());
    assert_eq!(SceneExport::from_json("{}").unwrap(), SceneExport::default());
}

// ─── Geometry properties ────────────────────────────────────────────────

#[test]
fn screen_content_roundtrip_over_a_grid() {
    for sx in (-3..=3).map(|i| i as f32 * 137.5) {
        for sy in (-3..=3).map(|i| i as f32 * 91.25) {
            for scale in [0.1_f32, 0.33, 1.0, 2.5, 4.0] {
                let pan = Point::new(sy * 0.5, -sx);
                let p = Point::new(sx, sy);
                let back = to_screen_space(to_content_space(p, pan, scale), pan, scale);
                assert!((back.x - p.x).abs() < 1e-2 && (back.y - p.y).abs() < 1e-2);
            }
        }
    }
}

#[test]
fn group_bounds_contain_every_member() {
    let scene = brand();
    let size = CanvasConfig::default().node_size();
    let group = &scene.groups[0];
    let rects: Vec<Rect> = scene.member_rects(group, size).collect();
    let b = scene.group_bounds(group, size).unwrap();
    assert_eq!(Some(b), bounding_box(rects.iter().copied()));
    assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (40.0, 80.0, 440.0, 140.0));
    for r in &rects {
        assert!(b.contains_rect(r));
    }
}
