//! Canvas color themes shared by every backend.

use tc_core::model::{Color, Layer};

/// Theme-dependent colors, as CSS color strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_fill: &'static str,
    pub node_border: &'static str,
    pub node_selected: &'static str,
    pub node_hovered: &'static str,
    pub text: &'static str,
    pub subtext: &'static str,
    pub group_fill: &'static str,
    pub group_border: &'static str,
    pub group_header: &'static str,
    pub connection: &'static str,
    pub preview: &'static str,
    pub socket_input: &'static str,
    pub socket_output: &'static str,
}

impl CanvasTheme {
    /// Light theme — warm white canvas.
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "#E5E5EA",
            node_fill: "#FFFFFF",
            node_border: "#D1D1D6",
            node_selected: "#007AFF",
            node_hovered: "#8E8E93",
            text: "#1D1D1F",
            subtext: "#86868B",
            group_fill: "#8E8E930F",
            group_border: "#AEAEB2",
            group_header: "#E5E5EA",
            connection: "#8E8E93",
            preview: "#007AFF",
            socket_input: "#34C759",
            socket_output: "#FF9500",
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            grid: "#2C2C2E",
            node_fill: "#2C2C2E",
            node_border: "#48484A",
            node_selected: "#0A84FF",
            node_hovered: "#98989D",
            text: "#F5F5F7",
            subtext: "#98989D",
            group_fill: "#63636614",
            group_border: "#636366",
            group_header: "#3A3A3C",
            connection: "#98989D",
            preview: "#0A84FF",
            socket_input: "#30D158",
            socket_output: "#FF9F0A",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }
}

/// Accent strip color per layer.
pub fn layer_accent(layer: Layer) -> &'static str {
    match layer {
        Layer::Primitive => "#8E8E93",
        Layer::Base => "#5856D6",
        Layer::Semantic => "#007AFF",
        Layer::Specific => "#AF52DE",
    }
}

/// Parse a theme string; themes only hold hex literals.
pub fn theme_color(css: &str) -> Color {
    Color::from_hex(css).unwrap_or(Color::rgba(0.0, 0.0, 0.0, 1.0))
}
