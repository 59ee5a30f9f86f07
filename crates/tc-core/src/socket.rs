//! Node sockets: the four fixed anchor points of every node.
//!
//! Each socket carries an explicit [`SocketRole`]. Connections start at an
//! `Output` socket and end at an `Input` socket.

use crate::geometry::{Point, Size};
use serde::{Deserialize, Serialize};

/// Which edge of the node rectangle a socket sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketSide {
    Top,
    Left,
    Right,
    Bottom,
}

/// Direction a socket accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketRole {
    Input,
    Output,
}

/// A socket descriptor: side plus role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Socket {
    pub side: SocketSide,
    pub role: SocketRole,
}

/// All sockets of a node in hit-test order. Earlier entries win ties.
pub const SOCKETS: [Socket; 4] = [
    Socket {
        side: SocketSide::Top,
        role: SocketRole::Input,
    },
    Socket {
        side: SocketSide::Left,
        role: SocketRole::Input,
    },
    Socket {
        side: SocketSide::Right,
        role: SocketRole::Output,
    },
    Socket {
        side: SocketSide::Bottom,
        role: SocketRole::Output,
    },
];

impl SocketSide {
    /// The descriptor for this side.
    pub fn socket(self) -> Socket {
        match self {
            SocketSide::Top => SOCKETS[0],
            SocketSide::Left => SOCKETS[1],
            SocketSide::Right => SOCKETS[2],
            SocketSide::Bottom => SOCKETS[3],
        }
    }

    pub fn role(self) -> SocketRole {
        self.socket().role
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SocketSide::Top => "top",
            SocketSide::Left => "left",
            SocketSide::Right => "right",
            SocketSide::Bottom => "bottom",
        }
    }
}

impl Socket {
    pub fn is_output(&self) -> bool {
        self.role == SocketRole::Output
    }

    pub fn is_input(&self) -> bool {
        self.role == SocketRole::Input
    }
}

/// Anchor point of `side` on a node whose top-left corner is `node`.
pub fn socket_position(node: Point, side: SocketSide, size: Size) -> Point {
    let (w, h) = (size.width, size.height);
    match side {
        SocketSide::Top => Point::new(node.x + w / 2.0, node.y),
        SocketSide::Bottom => Point::new(node.x + w / 2.0, node.y + h),
        SocketSide::Left => Point::new(node.x, node.y + h / 2.0),
        SocketSide::Right => Point::new(node.x + w, node.y + h / 2.0),
    }
}
