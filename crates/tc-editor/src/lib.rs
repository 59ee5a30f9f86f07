pub mod connections;
pub mod controller;
pub mod groups;
pub mod history;
pub mod input;
pub mod shortcuts;
pub mod workspace;

pub use connections::{ConnectError, ConnectionEngine, PendingConnection, propagate_reference};
pub use controller::{CanvasController, DropPayload, InteractionState};
pub use groups::{
    GroupError, create_group, delete_group, drag_group_to, move_group_by, toggle_collapse, ungroup,
};
pub use history::History;
pub use input::{InputEvent, Modifiers, PointerButton};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use workspace::{EditError, SceneMutation, Workspace};
