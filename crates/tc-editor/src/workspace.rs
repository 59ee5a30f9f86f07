//! Workspace: the live scene, its history, and the single mutation path.
//!
//! Every structural edit is a `SceneMutation` applied through
//! [`Workspace::apply`], which checks the mutation against the scene,
//! marks history exactly once, then applies it. A mutation whose target
//! does not exist is refused and leaves history untouched.
//!
//! Drags are the exception: they write positions continuously inside a
//! gesture and record one undo point when the gesture ends.

use crate::connections::{ConnectError, propagate_reference};
use crate::groups::{self, GroupError};
use crate::history::History;
use std::fmt;
use tc_core::geometry::Point;
use tc_core::id::{ConnectionId, GroupId, TokenId};
use tc_core::model::{CollapseScope, Connection, Layer, Scene, SceneExport, Token};
use tc_core::CanvasConfig;

/// A structural change to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneMutation {
    /// Add a token to the store, replacing one with the same id.
    AddToken(Token),
    /// Replace an existing token's name, value, type or layer.
    UpdateToken(Token),
    /// Remove a token with its node, connections and group membership.
    DeleteToken(TokenId),
    /// Put a stored token on the canvas, or move it if already there.
    PlaceNode { id: TokenId, position: Point },
    /// Take a node off the canvas with its connections.
    RemoveNode(TokenId),
    RemoveNodes(Vec<TokenId>),
    MoveNode { id: TokenId, position: Point },
    /// Add a connection and rewrite the target's value into a reference.
    Connect(Connection),
    Disconnect(ConnectionId),
    /// Remove every connection touching a node.
    DisconnectNode(TokenId),
    CreateGroup {
        id: GroupId,
        name: String,
        members: Vec<TokenId>,
    },
    Ungroup(GroupId),
    /// Remove a group with its members' nodes and connections.
    DeleteGroup(GroupId),
    ToggleGroupCollapse { id: GroupId, scope: CollapseScope },
    MoveGroup { id: GroupId, delta: Point },
    ToggleLayerCollapse(Layer),
    /// Replace the scene contents from an export.
    Import(SceneExport),
    /// Drop a token descriptor onto the canvas. Unknown tokens are added to
    /// the store in the same transition.
    DropToken { token: Token, position: Point },
}

impl SceneMutation {
    /// Short label for logs.
    pub fn describe(&self) -> &'static str {
        match self {
            SceneMutation::AddToken(_) => "add token",
            SceneMutation::UpdateToken(_) => "update token",
            SceneMutation::DeleteToken(_) => "delete token",
            SceneMutation::PlaceNode { .. } => "place node",
            SceneMutation::RemoveNode(_) => "remove node",
            SceneMutation::RemoveNodes(_) => "remove nodes",
            SceneMutation::MoveNode { .. } => "move node",
            SceneMutation::Connect(_) => "connect",
            SceneMutation::Disconnect(_) => "disconnect",
            SceneMutation::DisconnectNode(_) => "disconnect node",
            SceneMutation::CreateGroup { .. } => "create group",
            SceneMutation::Ungroup(_) => "ungroup",
            SceneMutation::DeleteGroup(_) => "delete group",
            SceneMutation::ToggleGroupCollapse { .. } => "toggle group collapse",
            SceneMutation::MoveGroup { .. } => "move group",
            SceneMutation::ToggleLayerCollapse(_) => "toggle layer collapse",
            SceneMutation::Import(_) => "import",
            SceneMutation::DropToken { .. } => "drop token",
        }
    }
}

/// Why a mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    UnknownToken(TokenId),
    UnknownConnection(ConnectionId),
    UnknownGroup(GroupId),
    /// The token exists but has no node on the canvas.
    NotPlaced(TokenId),
    Connect(ConnectError),
    Group(GroupError),
    /// Another token in the layer already has this name.
    DuplicateName { layer: Layer, name: String },
    /// Nothing to do, e.g. removing an empty node list.
    Empty,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::UnknownToken(id) => write!(f, "unknown token `{id}`"),
            EditError::UnknownConnection(id) => write!(f, "unknown connection `{id}`"),
            EditError::UnknownGroup(id) => write!(f, "unknown group `{id}`"),
            EditError::NotPlaced(id) => write!(f, "token `{id}` is not on the canvas"),
            EditError::Connect(e) => write!(f, "{e}"),
            EditError::Group(e) => write!(f, "{e}"),
            EditError::DuplicateName { layer, name } => {
                write!(f, "`{}.{name}` already exists", layer.as_str())
            }
            EditError::Empty => f.write_str("nothing to change"),
        }
    }
}

impl std::error::Error for EditError {}

impl From<ConnectError> for EditError {
    fn from(e: ConnectError) -> Self {
        EditError::Connect(e)
    }
}

impl From<GroupError> for EditError {
    fn from(e: GroupError) -> Self {
        EditError::Group(e)
    }
}

/// Scene + history + config.
#[derive(Debug, Clone)]
pub struct Workspace {
    scene: Scene,
    history: History,
    pub config: CanvasConfig,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Workspace {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            scene: Scene::new(),
            history: History::new(config.history_depth),
            config,
        }
    }

    pub fn with_scene(scene: Scene, config: CanvasConfig) -> Self {
        Self {
            scene,
            ..Self::new(config)
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Check, mark, apply.
    ///
    /// # Errors
    /// Returns the reason a mutation was refused; the scene and history are
    /// unchanged in that case.
    pub fn apply(&mut self, mutation: SceneMutation) -> Result<(), EditError> {
        if let Err(e) = self.check(&mutation) {
            log::debug!("refused {}: {e}", mutation.describe());
            return Err(e);
        }
        self.history.mark(&self.scene);
        log::debug!("apply {}", mutation.describe());
        self.perform(mutation);
        Ok(())
    }

    fn require_token(&self, id: TokenId) -> Result<(), EditError> {
        match self.scene.token(id) {
            Some(_) => Ok(()),
            None => Err(EditError::UnknownToken(id)),
        }
    }

    fn require_placed(&self, id: TokenId) -> Result<(), EditError> {
        self.require_token(id)?;
        if self.scene.positions.contains(id) {
            Ok(())
        } else {
            Err(EditError::NotPlaced(id))
        }
    }

    fn require_group(&self, id: GroupId) -> Result<(), EditError> {
        match self.scene.group(id) {
            Some(_) => Ok(()),
            None => Err(EditError::UnknownGroup(id)),
        }
    }

    /// Names are unique per layer; `token` may keep its own name.
    fn require_unique_name(&self, token: &Token) -> Result<(), EditError> {
        match self.scene.find_token(token.layer, &token.name) {
            Some(other) if other.id != token.id => Err(EditError::DuplicateName {
                layer: token.layer,
                name: token.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn check(&self, mutation: &SceneMutation) -> Result<(), EditError> {
        match mutation {
            SceneMutation::ToggleLayerCollapse(_) | SceneMutation::Import(_) => Ok(()),
            SceneMutation::AddToken(t) => self.require_unique_name(t),
            SceneMutation::UpdateToken(t) => {
                self.require_token(t.id)?;
                self.require_unique_name(t)
            }
            // An existing id only gets a node; its stored record is kept.
            SceneMutation::DropToken { token, .. } if self.scene.token(token.id).is_some() => Ok(()),
            SceneMutation::DropToken { token, .. } => self.require_unique_name(token),
            SceneMutation::DeleteToken(id) | SceneMutation::PlaceNode { id, .. } => self.require_token(*id),
            SceneMutation::RemoveNode(id)
            | SceneMutation::MoveNode { id, .. }
            | SceneMutation::DisconnectNode(id) => self.require_placed(*id),
            SceneMutation::RemoveNodes(ids) => {
                if !ids.iter().any(|id| self.scene.positions.contains(*id)) {
                    return Err(EditError::Empty);
                }
                Ok(())
            }
            SceneMutation::Connect(c) => {
                if c.from == c.to {
                    return Err(ConnectError::SelfLoop.into());
                }
                if !c.start_side().socket().is_output() {
                    return Err(ConnectError::NotAnOutput.into());
                }
                if !c.end_side().socket().is_input() {
                    return Err(ConnectError::NotAnInput.into());
                }
                self.require_placed(c.from)?;
                self.require_placed(c.to)
            }
            SceneMutation::Disconnect(id) => match self.scene.connection(*id) {
                Some(_) => Ok(()),
                None => Err(EditError::UnknownConnection(*id)),
            },
            SceneMutation::CreateGroup { name, members, .. } => {
                groups::validate_group(&self.scene, members, name)?;
                Ok(())
            }
            SceneMutation::Ungroup(id)
            | SceneMutation::DeleteGroup(id)
            | SceneMutation::ToggleGroupCollapse { id, .. }
            | SceneMutation::MoveGroup { id, .. } => self.require_group(*id),
        }
    }

    /// Apply an already-checked mutation.
    fn perform(&mut self, mutation: SceneMutation) {
        let scene = &mut self.scene;
        match mutation {
            SceneMutation::AddToken(token) | SceneMutation::UpdateToken(token) => scene.add_token(token),
            SceneMutation::DeleteToken(id) => {
                scene.remove_token(id);
            }
            SceneMutation::PlaceNode { id, position } | SceneMutation::MoveNode { id, position } => {
                scene.set_position(id, position);
            }
            SceneMutation::RemoveNode(id) => {
                scene.remove_node(id);
            }
            SceneMutation::RemoveNodes(ids) => {
                for id in ids {
                    scene.remove_node(id);
                }
            }
            SceneMutation::Connect(connection) => {
                propagate_reference(scene, &connection);
                scene.add_connection(connection);
            }
            SceneMutation::Disconnect(id) => {
                scene.remove_connection(id);
            }
            SceneMutation::DisconnectNode(id) => {
                scene.delete_connections_for_node(id);
            }
            SceneMutation::CreateGroup { id, name, members } => {
                if let Err(e) = groups::create_group(scene, id, &members, &name) {
                    log::warn!("group creation failed after check: {e}");
                }
            }
            SceneMutation::Ungroup(id) => {
                groups::ungroup(scene, id);
            }
            SceneMutation::DeleteGroup(id) => {
                groups::delete_group(scene, id);
            }
            SceneMutation::ToggleGroupCollapse { id, scope } => {
                groups::toggle_collapse(scene, id, scope);
            }
            SceneMutation::MoveGroup { id, delta } => {
                groups::move_group_by(scene, id, delta);
            }
            SceneMutation::ToggleLayerCollapse(layer) => {
                scene.toggle_layer_collapsed(layer);
            }
            SceneMutation::Import(export) => {
                scene.restore(export);
                log::info!(
                    "imported {} tokens, {} nodes, {} connections, {} groups",
                    scene.all_tokens().count(),
                    scene.positions.len(),
                    scene.connections.len(),
                    scene.groups.len()
                );
            }
            SceneMutation::DropToken { token, position } => {
                let id = token.id;
                if scene.token(id).is_none() {
                    scene.add_token(token);
                }
                scene.set_position(id, position);
            }
        }
    }

    // ─── Undo / redo ─────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let done = self.history.undo(&mut self.scene);
        if done {
            log::info!("undo ({} left)", self.history.undo_len());
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.history.redo(&mut self.scene);
        if done {
            log::info!("redo ({} left)", self.history.redo_len());
        }
        done
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    pub fn begin_gesture(&mut self) {
        self.history.begin_gesture(&self.scene);
    }

    /// Write node positions during a gesture. Unplaced ids are skipped.
    pub fn drag_nodes(&mut self, moves: &[(TokenId, Point)]) -> bool {
        let mut moved = false;
        for (id, pos) in moves {
            if self.scene.position(*id).is_some_and(|p| p != *pos) {
                self.scene.set_position(*id, *pos);
                moved = true;
            }
        }
        moved
    }

    /// Move a group during a gesture so its bounding box starts at
    /// `target_min`.
    pub fn drag_group(&mut self, id: GroupId, target_min: Point) -> bool {
        groups::drag_group_to(&mut self.scene, id, target_min, self.config.node_size())
    }

    /// Close the gesture; returns whether an undo point was recorded.
    pub fn end_gesture(&mut self) -> bool {
        self.history.end_gesture(&self.scene)
    }
}
