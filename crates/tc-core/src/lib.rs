pub mod config;
pub mod geometry;
pub mod id;
pub mod lint;
pub mod model;
pub mod reference;
pub mod socket;

pub use config::CanvasConfig;
pub use geometry::{Bounds, Point, Rect, Size, ViewTransform, to_content_space, to_screen_space};
pub use id::{ConnectionId, GroupId, TokenId};
pub use lint::{LintDiagnostic, LintSeverity, LintTarget, lint_scene};
pub use model::*;
pub use reference::{TokenRef, format_reference, parse_reference, resolve_value};
pub use socket::{SOCKETS, Socket, SocketRole, SocketSide, socket_position};
