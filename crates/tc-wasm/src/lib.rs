//! WASM bridge for Token Canvas — exposes the node-graph editor to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the token
//! editor page. The host owns the `<canvas>` element, the sidebar and the
//! animation loop; everything else goes through [`TokenCanvas`].

mod render2d;

use serde::Serialize;
use tc_core::geometry::Point;
use tc_core::id::{ConnectionId, GroupId, TokenId};
use tc_core::lint::{LintDiagnostic, LintSeverity, LintTarget};
use tc_core::model::{CollapseScope, Layer, Scene, SceneExport, Token};
use tc_core::{CanvasConfig, lint_scene};
use tc_editor::{CanvasController, InteractionState, Modifiers, PointerButton, SceneMutation};
use tc_render::CanvasTheme;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// Browser handle for one token canvas.
///
/// Owns the editor controller plus the surface size and theme.
#[wasm_bindgen]
pub struct TokenCanvas {
    controller: CanvasController,
    width: f64,
    height: f64,
    /// Light theme unless set.
    dark_mode: bool,
}

#[wasm_bindgen]
impl TokenCanvas {
    /// New empty canvas of `width` × `height` CSS pixels.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        Self::with_controller(CanvasController::default(), width, height)
    }

    /// Create a canvas with tuned constants. Falls back to the defaults
    /// when the JSON does not parse or holds out-of-range values.
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Self {
        console_error_panic_hook_setup();
        let config = CanvasConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("ignoring canvas config: {e}");
            CanvasConfig::default()
        });
        Self::with_controller(CanvasController::new(config), width, height)
    }

    // ─── Scene I/O ───────────────────────────────────────────────────────

    /// Replace the scene with a saved export. History starts fresh.
    /// Returns `false` (and keeps the current scene) on malformed JSON.
    pub fn set_scene_json(&mut self, json: &str) -> bool {
        match self.controller.load_json(json) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("scene load rejected: {e}");
                false
            }
        }
    }

    /// Replace the scene with an export as one undoable step.
    pub fn import_json(&mut self, json: &str) -> bool {
        match self.controller.import_json(json) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("scene import rejected: {e}");
                false
            }
        }
    }

    /// Current scene as export JSON.
    pub fn get_scene_json(&self) -> String {
        self.controller.export_json()
    }

    /// Current scene as MessagePack, for compact local storage.
    /// Empty on encoding failure.
    pub fn get_scene_msgpack(&self) -> Vec<u8> {
        self.controller.scene().capture().to_msgpack().unwrap_or_else(|e| {
            log::error!("msgpack encode failed: {e}");
            Vec::new()
        })
    }

    /// Load a MessagePack export written by [`Self::get_scene_msgpack`].
    pub fn set_scene_msgpack(&mut self, bytes: &[u8]) -> bool {
        match SceneExport::from_msgpack(bytes) {
            Ok(export) => {
                self.controller.load_export(export);
                true
            }
            Err(e) => {
                log::warn!("msgpack load rejected: {e}");
                false
            }
        }
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Flush coalesced drags and paint. Returns `true` if anything
    /// changed since the previous frame.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) -> bool {
        let changed = self.controller.frame();
        let theme = if self.dark_mode {
            CanvasTheme::dark()
        } else {
            CanvasTheme::light()
        };
        let list = self.controller.render_list();
        if let Err(e) = render2d::render_list(
            ctx,
            &list,
            &self.controller.view,
            self.controller.config(),
            self.width,
            self.height,
            &theme,
        ) {
            log::error!("canvas render failed: {e:?}");
        }
        changed
    }

    /// Apply pending drag motion without painting.
    pub fn frame(&mut self) -> bool {
        self.controller.frame()
    }

    /// Set the canvas theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    /// Resize the canvas.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.controller.set_viewport(width as f32, height as f32);
    }

    /// Screen offset of the canvas inside the host page.
    pub fn set_origin(&mut self, x: f32, y: f32) {
        self.controller.view.origin = Point::new(x, y);
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// Handle pointer down. `modifiers` packs shift=1, ctrl=2, alt=4, meta=8.
    /// Returns `true` if a redraw is needed.
    pub fn handle_pointer_down(&mut self, x: f32, y: f32, button: i16, modifiers: u8) -> bool {
        self.controller.pointer_down(
            x,
            y,
            PointerButton::from_index(button),
            Modifiers::from_bits(modifiers),
        )
    }

    /// Handle pointer move. Returns `true` if a redraw is needed.
    pub fn handle_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.controller.pointer_move(x, y)
    }

    /// Handle pointer up. Returns `true` if a redraw is needed.
    pub fn handle_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.controller.pointer_up(x, y)
    }

    /// Zoom around the pointer.
    pub fn handle_wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        self.controller.wheel(x, y, delta_y)
    }

    /// Handle a key press. Returns `true` if a redraw is needed.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        self.controller.key_down(
            key,
            Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        )
    }

    pub fn handle_key_up(&mut self, key: &str) -> bool {
        self.controller.key_up(key)
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Place a token dragged in from the sidebar, centred on `(x, y)` in
    /// screen space. Returns the token id, or an empty string on a bad
    /// payload.
    pub fn drop_token(&mut self, payload_json: &str, x: f32, y: f32) -> String {
        match self.controller.drop_token(payload_json, x, y) {
            Ok(id) => id.as_str().to_string(),
            Err(e) => {
                log::warn!("drop rejected: {e}");
                String::new()
            }
        }
    }

    /// Add a token to the store (JSON `{id, name, value, type, layer}`).
    /// A token with the same id is replaced. Returns `false` on a bad
    /// payload or a name already taken in the layer.
    pub fn add_token(&mut self, token_json: &str) -> bool {
        match serde_json::from_str::<Token>(token_json) {
            Ok(token) => self.edit(SceneMutation::AddToken(token)),
            Err(e) => {
                log::warn!("token rejected: {e}");
                false
            }
        }
    }

    /// Replace an existing token's name, value, type or layer.
    pub fn update_token(&mut self, token_json: &str) -> bool {
        match serde_json::from_str::<Token>(token_json) {
            Ok(token) => self.edit(SceneMutation::UpdateToken(token)),
            Err(e) => {
                log::warn!("token update rejected: {e}");
                false
            }
        }
    }

    /// Remove a token with its node, connections and group membership.
    pub fn delete_token(&mut self, token_id: &str) -> bool {
        self.edit(SceneMutation::DeleteToken(TokenId::intern(token_id)))
    }

    /// Put a stored token on the canvas with its top-left corner at
    /// `(x, y)` in content space, or move it there.
    pub fn place_node(&mut self, token_id: &str, x: f32, y: f32) -> bool {
        self.edit(SceneMutation::PlaceNode {
            id: TokenId::intern(token_id),
            position: Point::new(x, y),
        })
    }

    pub fn disconnect(&mut self, connection_id: &str) -> bool {
        self.edit(SceneMutation::Disconnect(ConnectionId::intern(connection_id)))
    }

    /// Remove every connection touching a node.
    pub fn disconnect_node(&mut self, token_id: &str) -> bool {
        self.edit(SceneMutation::DisconnectNode(TokenId::intern(token_id)))
    }

    /// Remove a group together with its members' nodes and connections.
    pub fn delete_group(&mut self, group_id: &str) -> bool {
        self.edit(SceneMutation::DeleteGroup(GroupId::intern(group_id)))
    }

    /// Toggle a sidebar layer section. `layer` is one of `primitive`,
    /// `base`, `semantic`, `specific`.
    pub fn toggle_layer_collapse(&mut self, layer: &str) -> bool {
        match Layer::parse(layer) {
            Some(layer) => self.edit(SceneMutation::ToggleLayerCollapse(layer)),
            None => {
                log::warn!("unknown layer {layer:?}");
                false
            }
        }
    }

    /// Group the current selection. Returns the group id, or an empty
    /// string when fewer than two tokens are selected or the name is blank.
    pub fn create_group(&mut self, name: &str) -> String {
        match self.controller.create_group_from_selection(name) {
            Ok(id) => id.as_str().to_string(),
            Err(e) => {
                log::debug!("group not created: {e}");
                String::new()
            }
        }
    }

    /// Ungroup whatever group the selection belongs to.
    pub fn ungroup_selected(&mut self) -> bool {
        self.controller.ungroup_selection()
    }

    /// Toggle a group's collapsed flag. `on_canvas` picks the canvas flag
    /// over the sidebar one.
    pub fn toggle_group_collapse(&mut self, group_id: &str, on_canvas: bool) -> bool {
        let scope = if on_canvas {
            CollapseScope::Canvas
        } else {
            CollapseScope::Sidebar
        };
        self.controller
            .toggle_group_collapse(GroupId::intern(group_id), scope)
    }

    pub fn undo(&mut self) -> bool {
        self.controller.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.controller.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.controller.workspace().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.controller.workspace().can_redo()
    }

    /// Delete the selected nodes. Their tokens stay in the token list.
    pub fn delete_selected(&mut self) -> bool {
        self.controller.delete_selected()
    }

    pub fn select_all(&mut self) {
        self.controller.select_all();
    }

    /// Get the selected token ids as a JSON array.
    pub fn get_selected_ids(&self) -> String {
        let ids: Vec<&str> = self.controller.selection().iter().map(|id| id.as_str()).collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    /// Current interaction state, for cursor styling.
    pub fn get_state_name(&self) -> String {
        state_name(self.controller.state(), self.controller.pan_mode()).to_string()
    }

    /// Lint diagnostics for the current scene as a JSON array.
    pub fn get_lint_json(&self) -> String {
        lint_json(self.controller.scene())
    }
}

impl TokenCanvas {
    /// One undoable edit; refusals are logged and reported as `false`.
    fn edit(&mut self, mutation: SceneMutation) -> bool {
        let what = mutation.describe();
        match self.controller.apply(mutation) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("{what} refused: {e}");
                false
            }
        }
    }

    fn with_controller(mut controller: CanvasController, width: f64, height: f64) -> Self {
        controller.set_viewport(width as f32, height as f32);
        Self {
            controller,
            width,
            height,
            dark_mode: false,
        }
    }
}

fn state_name(state: InteractionState, pan_mode: bool) -> &'static str {
    match state {
        InteractionState::Idle if pan_mode => "pan-ready",
        InteractionState::Idle => "idle",
        InteractionState::DraggingNode { .. } => "dragging-node",
        InteractionState::DraggingGroup { .. } => "dragging-group",
        InteractionState::Panning { .. } => "panning",
        InteractionState::Connecting => "connecting",
        InteractionState::Selecting { .. } => "selecting",
    }
}

// ─── Lint serialization ──────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LintEntry<'a> {
    target_kind: &'static str,
    target_id: &'a str,
    rule: &'static str,
    severity: &'static str,
    message: &'a str,
}

impl<'a> From<&'a LintDiagnostic> for LintEntry<'a> {
    fn from(d: &'a LintDiagnostic) -> Self {
        let (target_kind, target_id) = match &d.target {
            LintTarget::Token(id) => ("token", id.as_str()),
            LintTarget::Group(id) => ("group", id.as_str()),
            LintTarget::Connection(id) => ("connection", id.as_str()),
        };
        LintEntry {
            target_kind,
            target_id,
            rule: d.rule,
            severity: match d.severity {
                LintSeverity::Warning => "warning",
                LintSeverity::Info => "info",
            },
            message: &d.message,
        }
    }
}

fn lint_json(scene: &Scene) -> String {
    let diags = lint_scene(scene);
    let entries: Vec<LintEntry<'_>> = diags.iter().map(LintEntry::from).collect();
    serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
}

// ─── Panic reporting ─────────────────────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Token Canvas panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Validate a saved scene. Returns JSON: `{"ok":true,"lint":[...]}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match SceneExport::from_json(json) {
        Ok(export) => {
            let scene = Scene::from_export(export);
            format!(r#"{{"ok":true,"lint":{}}}"#, lint_json(&scene))
        }
        Err(e) => serde_json::json!({ "ok": false, "error": e }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCENE: &str = r##"{
        "tokens": {
            "base": [{"id":"w-brand","name":"brand","value":"{semantic.action}","type":"color","layer":"base"}],
            "semantic": [{"id":"w-action","name":"action","value":"#007AFF","type":"color","layer":"semantic"}]
        },
        "nodePositions": {"w-brand": {"x": 0, "y": 0}}
    }"##;

    #[test]
    fn validate_reports_lint_for_good_json() {
        let out: serde_json::Value = serde_json::from_str(&validate(SCENE)).unwrap();
        assert_eq!(out["ok"], true);
        let lint = out["lint"].as_array().unwrap();
        assert_eq!(lint.len(), 1);
        assert_eq!(lint[0]["rule"], "layer-order");
        assert_eq!(lint[0]["targetKind"], "token");
        assert_eq!(lint[0]["targetId"], "w-brand");
    }

    #[test]
    fn validate_reports_parse_errors() {
        let out: serde_json::Value = serde_json::from_str(&validate("{not json")).unwrap();
        assert_eq!(out["ok"], false);
        assert!(out["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn scene_survives_msgpack_storage() {
        let mut canvas = TokenCanvas::new(800.0, 600.0);
        assert!(canvas.set_scene_json(SCENE));
        let bytes = canvas.get_scene_msgpack();

        let mut other = TokenCanvas::new(800.0, 600.0);
        assert!(other.set_scene_msgpack(&bytes));
        assert_eq!(other.get_scene_json(), canvas.get_scene_json());
        assert!(!other.can_undo());
        assert!(!other.set_scene_msgpack(&[0xc1]));
    }

    #[test]
    fn state_names_follow_interaction() {
        let mut canvas = TokenCanvas::new(800.0, 600.0);
        assert!(canvas.set_scene_json(SCENE));
        assert_eq!(canvas.get_state_name(), "idle");
        canvas.handle_key(" ", false, false, false, false);
        assert_eq!(canvas.get_state_name(), "pan-ready");
        canvas.handle_pointer_down(10.0, 10.0, 0, 0);
        assert_eq!(canvas.get_state_name(), "panning");
    }

    #[test]
    fn malformed_scene_keeps_the_old_one() {
        let mut canvas = TokenCanvas::new(800.0, 600.0);
        assert!(canvas.set_scene_json(SCENE));
        let before = canvas.get_scene_json();
        assert!(!canvas.set_scene_json(r#"{"tokens": 3}"#));
        assert_eq!(canvas.get_scene_json(), before);
    }

    #[test]
    fn token_edits_round_trip_through_json() {
        let mut canvas = TokenCanvas::new(800.0, 600.0);
        assert!(canvas.set_scene_json(SCENE));

        let gray = r##"{"id":"w-gray","name":"gray","value":"#888888","type":"color","layer":"primitive"}"##;
        assert!(canvas.add_token(gray));
        assert!(!canvas.add_token(r##"{"id":"w-twin","name":"gray","value":"#000","type":"color","layer":"primitive"}"##));
        assert!(!canvas.add_token("{nope"));

        let renamed = r##"{"id":"w-gray","name":"gray-500","value":"#808080","type":"color","layer":"primitive"}"##;
        assert!(canvas.update_token(renamed));
        assert!(!canvas.update_token(r#"{"id":"w-ghost","name":"x","value":"","type":"string","layer":"base"}"#));
        let scene: serde_json::Value = serde_json::from_str(&canvas.get_scene_json()).unwrap();
        assert_eq!(scene["tokens"]["primitive"][0]["name"], "gray-500");

        assert!(canvas.place_node("w-gray", 40.0, 200.0));
        assert!(!canvas.place_node("w-ghost", 0.0, 0.0));
        let scene: serde_json::Value = serde_json::from_str(&canvas.get_scene_json()).unwrap();
        assert_eq!(scene["nodePositions"]["w-gray"]["x"], 40.0);

        assert!(canvas.delete_token("w-gray"));
        assert!(!canvas.delete_token("w-gray"));
        assert!(canvas.undo());
        assert!(canvas.get_scene_json().contains("gray-500"));
    }

    #[test]
    fn connections_and_groups_by_id() {
        const LINKED: &str = r##"{
            "tokens": {
                "base": [{"id":"w-blue","name":"blue","value":"#00f","type":"color","layer":"base"}],
                "semantic": [
                    {"id":"w-primary","name":"primary","value":"{base.blue}","type":"color","layer":"semantic"},
                    {"id":"w-accent","name":"accent","value":"{base.blue}","type":"color","layer":"semantic"}
                ]
            },
            "nodePositions": {
                "w-blue": {"x": 0, "y": 0},
                "w-primary": {"x": 300, "y": 0},
                "w-accent": {"x": 300, "y": 200}
            },
            "connections": [
                {"id":"w-c1","from":"w-blue","to":"w-primary"},
                {"id":"w-c2","from":"w-blue","to":"w-accent"}
            ],
            "tokenGroups": [
                {"id":"w-g","name":"Semantic","tokenIds":["w-primary","w-accent"]}
            ]
        }"##;
        let mut canvas = TokenCanvas::new(800.0, 600.0);
        assert!(canvas.set_scene_json(LINKED));

        assert!(canvas.disconnect("w-c1"));
        assert!(!canvas.disconnect("w-c1"));
        assert!(canvas.disconnect_node("w-blue"));
        let scene: serde_json::Value = serde_json::from_str(&canvas.get_scene_json()).unwrap();
        assert!(scene["connections"].as_array().is_none_or(|c| c.is_empty()));

        assert!(canvas.delete_group("w-g"));
        assert!(!canvas.delete_group("w-g"));
        let scene: serde_json::Value = serde_json::from_str(&canvas.get_scene_json()).unwrap();
        assert!(scene["nodePositions"].get("w-primary").is_none());
        assert!(scene["tokens"]["semantic"].as_array().is_some_and(|t| t.len() == 2));

        assert!(canvas.toggle_layer_collapse("semantic"));
        assert!(!canvas.toggle_layer_collapse("tertiary"));
    }
}
