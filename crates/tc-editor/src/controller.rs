//! Canvas controller: pointer, wheel and keyboard input → scene edits.
//!
//! One interaction state machine over one workspace. Every pointer
//! position is converted to content space through the view transform
//! before it reaches hit-testing, drags, previews or drops.
//!
//! ## Pointer-down priority
//!
//! | Hit | Idle | Connecting |
//! |-----|------|------------|
//! | output socket | start connection | cancel |
//! | input socket | drag its node | complete, then idle |
//! | node | drag (⌘/Ctrl: toggle selection) | cancel |
//! | group | drag group | cancel |
//! | empty | pan (⇧: box select) | cancel |
//!
//! Middle/secondary buttons and space-held pan mode always pan. A pan
//! press cancels a pending connection and commits a drag in progress.

use crate::connections::ConnectionEngine;
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::workspace::{EditError, SceneMutation, Workspace};
use serde::Deserialize;
use tc_core::geometry::{Point, Rect, Size, ViewTransform};
use tc_core::id::{GroupId, TokenId};
use tc_core::model::{CollapseScope, Layer, Scene, SceneExport, Token, TokenType};
use tc_core::socket::Socket;
use tc_core::CanvasConfig;
use tc_render::{
    HitTarget, RenderList, RenderState, build_render_list, hit_test, hit_test_node, hit_test_rect,
};

/// What the pointer is doing right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    /// `grab` is the pointer offset from the node's top-left corner.
    DraggingNode { node: TokenId, grab: Point },
    /// `grab` is the pointer offset from the group's bounding-box corner.
    DraggingGroup { group: GroupId, grab: Point },
    /// `last` is the previous screen-space pointer position.
    Panning { last: Point },
    Connecting,
    /// Box selection between two content-space corners.
    Selecting { start: Point, current: Point },
}

/// Token descriptor carried by a drag-and-drop from the token list.
#[derive(Debug, Clone, Deserialize)]
pub struct DropPayload {
    pub id: TokenId,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default)]
    pub token_type: TokenType,
    pub layer: Layer,
}

impl DropPayload {
    /// # Errors
    /// Returns the serde error message on malformed payloads.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    pub fn into_token(self) -> Token {
        Token::new(self.id, self.name, self.value, self.token_type, self.layer)
    }
}

pub struct CanvasController {
    workspace: Workspace,
    pub view: ViewTransform,
    /// Size of the drawing surface in screen pixels.
    pub viewport: Size,
    selection: Vec<TokenId>,
    hovered: Option<TokenId>,
    state: InteractionState,
    connections: ConnectionEngine,
    /// Latest drag pointer (screen space), applied on the next frame.
    pending_pointer: Option<Point>,
    /// Space held: any press pans.
    pan_mode: bool,
    dirty: bool,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasController {
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_workspace(Workspace::new(config))
    }

    pub fn with_workspace(workspace: Workspace) -> Self {
        Self {
            workspace,
            view: ViewTransform::default(),
            viewport: Size {
                width: 800.0,
                height: 600.0,
            },
            selection: Vec::new(),
            hovered: None,
            state: InteractionState::Idle,
            connections: ConnectionEngine::new(),
            pending_pointer: None,
            pan_mode: false,
            dirty: true,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        self.workspace.scene()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.workspace.config
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn selection(&self) -> &[TokenId] {
        &self.selection
    }

    pub fn hovered(&self) -> Option<TokenId> {
        self.hovered
    }

    pub fn is_connecting(&self) -> bool {
        self.connections.is_connecting()
    }

    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Size { width, height };
        self.dirty = true;
    }

    // ─── Scene edits ─────────────────────────────────────────────────────

    /// Apply a mutation through the workspace (one history entry).
    ///
    /// # Errors
    /// Propagates the workspace's refusal.
    pub fn apply(&mut self, mutation: SceneMutation) -> Result<(), EditError> {
        self.workspace.apply(mutation)?;
        self.after_structural_change();
        Ok(())
    }

    fn after_structural_change(&mut self) {
        let scene = self.workspace.scene();
        self.selection
            .retain(|id| scene.positions.contains(*id) && !scene.is_hidden(*id));
        if self.hovered.is_some_and(|id| !scene.positions.contains(id)) {
            self.hovered = None;
        }
        if let Some(p) = self.connections.pending()
            && !scene.positions.contains(p.node)
        {
            self.connections.cancel_connection();
            self.state = InteractionState::Idle;
        }
        self.dirty = true;
    }

    fn busy(&self) -> bool {
        matches!(
            self.state,
            InteractionState::DraggingNode { .. } | InteractionState::DraggingGroup { .. }
        )
    }

    pub fn undo(&mut self) -> bool {
        if self.busy() || !self.workspace.undo() {
            return false;
        }
        self.after_structural_change();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.busy() || !self.workspace.redo() {
            return false;
        }
        self.after_structural_change();
        true
    }

    /// Replace the scene without recording history (initial load).
    ///
    /// # Errors
    /// Returns the JSON error message; the current scene is kept.
    pub fn load_json(&mut self, json: &str) -> Result<(), String> {
        let export = SceneExport::from_json(json)?;
        self.load_export(export);
        Ok(())
    }

    /// Replace the scene with an already decoded export, resetting history.
    pub fn load_export(&mut self, export: SceneExport) {
        let config = self.workspace.config.clone();
        self.workspace = Workspace::with_scene(Scene::from_export(export), config);
        self.selection.clear();
        self.hovered = None;
        self.connections.cancel_connection();
        self.state = InteractionState::Idle;
        self.dirty = true;
    }

    /// Replace the scene as one undoable step.
    ///
    /// # Errors
    /// Returns the JSON error message; nothing changes.
    pub fn import_json(&mut self, json: &str) -> Result<(), String> {
        let export = SceneExport::from_json(json)?;
        self.apply(SceneMutation::Import(export)).map_err(|e| e.to_string())
    }

    pub fn export_json(&self) -> String {
        self.scene().capture().to_json()
    }

    /// Create a node for a dropped token, centred on the screen point.
    ///
    /// # Errors
    /// Returns a message for malformed payloads.
    pub fn drop_token(&mut self, payload: &str, x: f32, y: f32) -> Result<TokenId, String> {
        let token = DropPayload::from_json(payload)?.into_token();
        let id = token.id;
        let size = self.config().node_size();
        let center = self.view.to_content_space(Point::new(x, y));
        let position = center - Point::new(size.width / 2.0, size.height / 2.0);
        self.apply(SceneMutation::DropToken { token, position })
            .map_err(|e| e.to_string())?;
        self.selection = vec![id];
        Ok(id)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: TokenId) {
        self.selection = vec![id];
        self.dirty = true;
    }

    pub fn toggle_selection(&mut self, id: TokenId) {
        match self.selection.iter().position(|s| *s == id) {
            Some(i) => {
                self.selection.remove(i);
            }
            None => self.selection.push(id),
        }
        self.dirty = true;
    }

    pub fn select_all(&mut self) {
        let scene = self.workspace.scene();
        self.selection = scene
            .positions
            .ids()
            .iter()
            .copied()
            .filter(|id| !scene.is_hidden(*id))
            .collect();
        self.dirty = true;
    }

    pub fn clear_selection(&mut self) -> bool {
        let had = !self.selection.is_empty();
        self.selection.clear();
        self.dirty |= had;
        had
    }

    /// Take the selected nodes off the canvas in one step.
    pub fn delete_selected(&mut self) -> bool {
        let ids = self.selection.clone();
        self.apply(SceneMutation::RemoveNodes(ids)).is_ok()
    }

    /// Group the current selection.
    ///
    /// # Errors
    /// `GroupError` via [`EditError::Group`] for bad names or too few nodes.
    pub fn create_group_from_selection(&mut self, name: &str) -> Result<GroupId, EditError> {
        let id = GroupId::generate();
        self.apply(SceneMutation::CreateGroup {
            id,
            name: name.to_string(),
            members: self.selection.clone(),
        })?;
        Ok(id)
    }

    /// Dissolve the group of the first selected node.
    pub fn ungroup_selection(&mut self) -> bool {
        let Some(group) = self
            .selection
            .iter()
            .find_map(|id| self.workspace.scene().group_of(*id))
            .map(|g| g.id)
        else {
            return false;
        };
        self.apply(SceneMutation::Ungroup(group)).is_ok()
    }

    pub fn toggle_group_collapse(&mut self, id: GroupId, scope: CollapseScope) -> bool {
        self.apply(SceneMutation::ToggleGroupCollapse { id, scope }).is_ok()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Dispatch a normalized input event. Returns whether a redraw is due.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, button, modifiers } => self.pointer_down(*x, *y, *button, *modifiers),
            InputEvent::PointerMove { x, y } => self.pointer_move(*x, *y),
            InputEvent::PointerUp { x, y } => self.pointer_up(*x, *y),
            InputEvent::Wheel { x, y, delta_y } => self.wheel(*x, *y, *delta_y),
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, *modifiers),
            InputEvent::KeyUp { key } => self.key_up(key),
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton, modifiers: Modifiers) -> bool {
        let screen = Point::new(x, y);
        let content = self.view.to_content_space(screen);

        if button != PointerButton::Primary || self.pan_mode {
            let redraw = self.interrupt();
            self.state = InteractionState::Panning { last: screen };
            return redraw;
        }

        let hit = hit_test(content, self.workspace.scene(), &self.workspace.config);

        if self.state == InteractionState::Connecting {
            match hit {
                HitTarget::Socket { node, socket } if socket.is_input() => {
                    self.finish_connection(node, socket);
                }
                _ => {
                    log::debug!("connection cancelled by press on {hit:?}");
                    self.connections.cancel_connection();
                    self.state = InteractionState::Idle;
                }
            }
            self.dirty = true;
            return true;
        }

        match hit {
            HitTarget::Socket { node, socket } if socket.is_output() => {
                if self.connections.start_connection(node, socket, content) {
                    self.state = InteractionState::Connecting;
                }
            }
            HitTarget::Socket { node, .. } | HitTarget::Node(node) => {
                if modifiers.command() {
                    self.toggle_selection(node);
                } else {
                    self.grab_node(node, content);
                }
            }
            HitTarget::Group(group) => self.grab_group(group, content),
            HitTarget::Empty if modifiers.shift => {
                self.state = InteractionState::Selecting {
                    start: content,
                    current: content,
                };
            }
            HitTarget::Empty => {
                if !modifiers.command() {
                    self.clear_selection();
                }
                self.state = InteractionState::Panning { last: screen };
            }
        }
        self.dirty = true;
        true
    }

    /// Leave a connection, drag or box selection so a pan can take the
    /// pointer. A drag keeps what it moved as one undo step.
    fn interrupt(&mut self) -> bool {
        match self.state {
            InteractionState::Connecting => {
                log::debug!("connection cancelled by pan");
                self.connections.cancel_connection();
            }
            InteractionState::DraggingNode { .. } | InteractionState::DraggingGroup { .. } => {
                self.flush_drag();
                if self.workspace.end_gesture() {
                    log::debug!("drag committed by pan");
                }
            }
            InteractionState::Selecting { .. } => {}
            InteractionState::Idle | InteractionState::Panning { .. } => return false,
        }
        self.state = InteractionState::Idle;
        self.dirty = true;
        true
    }

    fn grab_node(&mut self, node: TokenId, content: Point) {
        let Some(pos) = self.workspace.scene().position(node) else {
            return;
        };
        if !self.selection.contains(&node) {
            self.selection = vec![node];
        }
        self.workspace.begin_gesture();
        self.state = InteractionState::DraggingNode {
            node,
            grab: content - pos,
        };
    }

    fn grab_group(&mut self, group: GroupId, content: Point) {
        let scene = self.workspace.scene();
        let Some(bounds) = scene
            .group(group)
            .and_then(|g| scene.group_bounds(g, self.workspace.config.node_size()))
        else {
            return;
        };
        self.workspace.begin_gesture();
        self.state = InteractionState::DraggingGroup {
            group,
            grab: content - bounds.min(),
        };
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let screen = Point::new(x, y);
        let content = self.view.to_content_space(screen);
        match self.state {
            InteractionState::DraggingNode { .. } | InteractionState::DraggingGroup { .. } => {
                self.pending_pointer = Some(screen);
                true
            }
            InteractionState::Panning { last } => {
                self.view.pan_by(screen - last);
                self.state = InteractionState::Panning { last: screen };
                self.dirty = true;
                true
            }
            InteractionState::Connecting => {
                self.connections.update_preview(content);
                self.dirty = true;
                true
            }
            InteractionState::Selecting { start, .. } => {
                self.state = InteractionState::Selecting { start, current: content };
                self.dirty = true;
                true
            }
            InteractionState::Idle => {
                let hovered = hit_test_node(content, self.workspace.scene(), &self.workspace.config);
                if hovered != self.hovered {
                    self.hovered = hovered;
                    self.dirty = true;
                }
                self.dirty
            }
        }
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) -> bool {
        let screen = Point::new(x, y);
        match self.state {
            InteractionState::DraggingNode { .. } | InteractionState::DraggingGroup { .. } => {
                self.pending_pointer = Some(screen);
                self.flush_drag();
                if self.workspace.end_gesture() {
                    log::debug!("drag committed");
                }
                self.state = InteractionState::Idle;
                self.dirty = true;
                true
            }
            InteractionState::Panning { .. } => {
                self.state = InteractionState::Idle;
                false
            }
            InteractionState::Connecting => {
                let content = self.view.to_content_space(screen);
                let origin = self.connections.pending().map(|p| (p.node, p.socket));
                match hit_test(content, self.workspace.scene(), &self.workspace.config) {
                    HitTarget::Socket { node, socket } if socket.is_input() => {
                        self.finish_connection(node, socket);
                    }
                    // Released where it started: keep connecting (click-to-start).
                    HitTarget::Socket { node, socket } if origin == Some((node, socket)) => {}
                    _ => {
                        self.connections.cancel_connection();
                        self.state = InteractionState::Idle;
                    }
                }
                self.dirty = true;
                true
            }
            InteractionState::Selecting { start, .. } => {
                let area = Rect::from_corners(start, self.view.to_content_space(screen));
                self.selection = hit_test_rect(area, self.workspace.scene(), &self.workspace.config);
                log::debug!("box selected {} nodes", self.selection.len());
                self.state = InteractionState::Idle;
                self.dirty = true;
                true
            }
            InteractionState::Idle => false,
        }
    }

    /// Box-selection rectangle while one is being dragged.
    pub fn marquee(&self) -> Option<Rect> {
        match self.state {
            InteractionState::Selecting { start, current } => Some(Rect::from_corners(start, current)),
            _ => None,
        }
    }

    fn finish_connection(&mut self, node: TokenId, socket: Socket) {
        if let Ok(connection) = self
            .connections
            .complete_connection(self.workspace.scene(), node, socket)
            && let Err(e) = self.apply(SceneMutation::Connect(connection))
        {
            log::debug!("connection not applied: {e}");
        }
        self.state = InteractionState::Idle;
    }

    /// Apply the latest coalesced drag position.
    fn flush_drag(&mut self) {
        let Some(screen) = self.pending_pointer.take() else {
            return;
        };
        let content = self.view.to_content_space(screen);
        let moved = match self.state {
            InteractionState::DraggingNode { node, grab } => {
                let scene = self.workspace.scene();
                let Some(current) = scene.position(node) else {
                    return;
                };
                let delta = (content - grab) - current;
                let moves: Vec<(TokenId, Point)> = self
                    .selection
                    .iter()
                    .filter(|id| !scene.is_hidden(**id))
                    .filter_map(|id| scene.position(*id).map(|p| (*id, p + delta)))
                    .collect();
                self.workspace.drag_nodes(&moves)
            }
            InteractionState::DraggingGroup { group, grab } => self.workspace.drag_group(group, content - grab),
            _ => false,
        };
        self.dirty |= moved;
    }

    /// Per-frame tick: applies coalesced drag input and reports whether
    /// anything changed since the previous frame.
    pub fn frame(&mut self) -> bool {
        self.flush_drag();
        std::mem::take(&mut self.dirty)
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Wheel zoom around the pointer; negative `delta_y` zooms in.
    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        let step = self.workspace.config.zoom_step;
        let factor = if delta_y < 0.0 {
            step
        } else if delta_y > 0.0 {
            1.0 / step
        } else {
            return false;
        };
        self.zoom_at(Point::new(x, y), factor)
    }

    fn zoom_at(&mut self, anchor: Point, factor: f32) -> bool {
        let before = self.view.scale;
        let cfg = &self.workspace.config;
        self.view.zoom_at(anchor, factor, cfg.min_zoom, cfg.max_zoom);
        let changed = self.view.scale != before;
        self.dirty |= changed;
        changed
    }

    /// Keyboard zoom around the viewport centre.
    pub fn zoom_by(&mut self, factor: f32) -> bool {
        let center = self.view.origin + Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.zoom_at(center, factor)
    }

    pub fn reset_view(&mut self) -> bool {
        self.view.reset();
        self.dirty = true;
        true
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        match ShortcutMap::resolve(key, modifiers.ctrl, modifiers.shift, modifiers.alt, modifiers.meta) {
            Some(action) => self.run_shortcut(action),
            None => false,
        }
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        match ShortcutMap::resolve_release(key) {
            Some(action) => self.run_shortcut(action),
            None => false,
        }
    }

    pub fn run_shortcut(&mut self, action: ShortcutAction) -> bool {
        let step = self.workspace.config.zoom_step;
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::SelectAll => {
                self.select_all();
                true
            }
            ShortcutAction::Deselect => {
                if self.connections.is_connecting() {
                    self.connections.cancel_connection();
                    self.state = InteractionState::Idle;
                    self.dirty = true;
                    true
                } else {
                    self.clear_selection()
                }
            }
            ShortcutAction::Group => {
                let name = format!("Group {}", self.scene().groups.len() + 1);
                self.create_group_from_selection(&name).is_ok()
            }
            ShortcutAction::Ungroup => self.ungroup_selection(),
            ShortcutAction::ZoomIn => self.zoom_by(step),
            ShortcutAction::ZoomOut => self.zoom_by(1.0 / step),
            ShortcutAction::ZoomReset => self.reset_view(),
            ShortcutAction::PanStart => {
                self.pan_mode = true;
                false
            }
            ShortcutAction::PanEnd => {
                self.pan_mode = false;
                false
            }
        }
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Everything the current frame draws, in content space.
    pub fn render_list(&self) -> RenderList {
        let scene = self.workspace.scene();
        let config = &self.workspace.config;
        build_render_list(
            scene,
            config,
            RenderState {
                selected: &self.selection,
                hovered: self.hovered,
                preview: self.connections.preview(scene, config),
                marquee: self.marquee(),
            },
        )
    }
}
