//! Key bindings for the canvas.
//!
//! `ctrl` and `meta` are interchangeable (⌘ on macOS, Ctrl elsewhere), so
//! hosts can forward raw `KeyboardEvent` flags.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    /// Take the selected nodes off the canvas; tokens survive.
    Delete,
    SelectAll,
    /// Cancel a pending connection, otherwise clear the selection.
    Deselect,
    Group,
    Ungroup,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    /// Space pressed: presses pan until released.
    PanStart,
    PanEnd,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Binding for a key press, if any. Letter keys match either case.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, _alt: bool, meta: bool) -> Option<ShortcutAction> {
        use ShortcutAction::*;

        let letter = match key.len() {
            1 => key.chars().next().map(|c| c.to_ascii_lowercase()),
            _ => None,
        };
        match (ctrl || meta, shift) {
            (true, true) => match letter? {
                'z' => Some(Redo),
                'g' => Some(Ungroup),
                // `+` needs shift on most layouts.
                '=' | '+' => Some(ZoomIn),
                _ => None,
            },
            (true, false) => match letter? {
                'z' => Some(Undo),
                'y' => Some(Redo),
                'a' => Some(SelectAll),
                'g' => Some(Group),
                '=' | '+' => Some(ZoomIn),
                '-' => Some(ZoomOut),
                '0' => Some(ZoomReset),
                _ => None,
            },
            (false, true) => None,
            (false, false) => match key {
                "Delete" | "Backspace" => Some(Delete),
                "Escape" => Some(Deselect),
                " " => Some(PanStart),
                _ => None,
            },
        }
    }

    /// Binding for a key release. Only space has one.
    pub fn resolve_release(key: &str) -> Option<ShortcutAction> {
        (key == " ").then_some(ShortcutAction::PanEnd)
    }
}
