//! Connection engine: pending-connection state and directional validation.
//!
//! A connection always runs from an output socket (right, bottom) to an
//! input socket (top, left) of a different node. Completing one hands back
//! a `Connection` value; the workspace applies it and rewrites the target
//! token's value into a reference to the source.

use std::fmt;
use tc_core::geometry::Point;
use tc_core::id::{ConnectionId, TokenId};
use tc_core::model::{Connection, Scene};
use tc_core::reference::format_reference;
use tc_core::socket::{Socket, socket_position};
use tc_core::CanvasConfig;
use tc_render::Preview;

/// Why a connection attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    NoPendingConnection,
    SelfLoop,
    NotAnOutput,
    NotAnInput,
    UnknownToken(TokenId),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::NoPendingConnection => f.write_str("no connection in progress"),
            ConnectError::SelfLoop => f.write_str("a node cannot connect to itself"),
            ConnectError::NotAnOutput => f.write_str("connections must start at an output socket"),
            ConnectError::NotAnInput => f.write_str("connections must end at an input socket"),
            ConnectError::UnknownToken(id) => write!(f, "token `{id}` is not in the store"),
        }
    }
}

impl std::error::Error for ConnectError {}

/// Origin of an in-flight connection plus the pointer it follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingConnection {
    pub node: TokenId,
    pub socket: Socket,
    /// Content-space pointer position.
    pub cursor: Point,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionEngine {
    pending: Option<PendingConnection>,
}

impl ConnectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    pub fn is_connecting(&self) -> bool {
        self.pending.is_some()
    }

    /// Begin a connection from an output socket. Input sockets are ignored.
    pub fn start_connection(&mut self, node: TokenId, socket: Socket, cursor: Point) -> bool {
        if !socket.is_output() {
            log::debug!("ignoring connection start from input socket {}", socket.side.as_str());
            return false;
        }
        self.pending = Some(PendingConnection { node, socket, cursor });
        true
    }

    /// Finish the pending connection at `node`'s `socket`.
    ///
    /// The pending state is cleared whatever the outcome.
    ///
    /// # Errors
    /// See [`ConnectError`]; rejections are also logged at debug level.
    pub fn complete_connection(
        &mut self,
        scene: &Scene,
        node: TokenId,
        socket: Socket,
    ) -> Result<Connection, ConnectError> {
        let result = self.validate(scene, node, socket);
        self.pending = None;
        if let Err(e) = &result {
            log::debug!("connection rejected: {e}");
        }
        result
    }

    fn validate(&self, scene: &Scene, node: TokenId, socket: Socket) -> Result<Connection, ConnectError> {
        let from = self.pending.ok_or(ConnectError::NoPendingConnection)?;
        if from.node == node {
            return Err(ConnectError::SelfLoop);
        }
        if !from.socket.is_output() {
            return Err(ConnectError::NotAnOutput);
        }
        if !socket.is_input() {
            return Err(ConnectError::NotAnInput);
        }
        for id in [from.node, node] {
            if scene.token(id).is_none() {
                return Err(ConnectError::UnknownToken(id));
            }
        }
        Ok(Connection {
            id: ConnectionId::generate(),
            from: from.node,
            to: node,
            from_socket: Some(from.socket.side),
            to_socket: Some(socket.side),
        })
    }

    pub fn cancel_connection(&mut self) {
        self.pending = None;
    }

    /// Move the loose end of the preview.
    pub fn update_preview(&mut self, cursor: Point) {
        if let Some(p) = &mut self.pending {
            p.cursor = cursor;
        }
    }

    /// Preview from the origin socket anchor to the pointer. `None` when
    /// idle or when the origin node lost its position.
    pub fn preview(&self, scene: &Scene, config: &CanvasConfig) -> Option<Preview> {
        let p = self.pending?;
        let node = scene.position(p.node)?;
        Some(Preview {
            start: socket_position(node, p.socket.side, config.node_size()),
            end: p.cursor,
        })
    }
}

/// Rewrite the target token's value into a reference to the source.
///
/// One-shot: later renames of the source do not follow.
pub fn propagate_reference(scene: &mut Scene, connection: &Connection) -> bool {
    let Some(source) = scene.token(connection.from) else {
        return false;
    };
    let reference = format_reference(source.layer, &source.name);
    match scene.token_mut(connection.to) {
        Some(target) => {
            target.value = reference;
            true
        }
        None => false,
    }
}
