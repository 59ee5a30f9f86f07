//! Render list → Vello drawing commands.
//!
//! Emits fills and strokes for one frame in [`RenderList::draw_order`]:
//! connections, group frames, nodes, the in-flight connection preview,
//! then the selection box. Labels are logged at trace level; text shaping
//! needs a font context the host owns.

use crate::theme::{CanvasTheme, layer_accent, theme_color};
use crate::visible::{DrawItem, GroupShape, NodeShape, RenderList};
use kurbo::{Affine, Circle, CubicBez, Rect as KurboRect, RoundedRect, Stroke};
use peniko::{Color, Fill};
use tc_core::geometry::{Point, Rect, ViewTransform};
use tc_core::model::Color as TokenColor;
use tc_core::socket::{SOCKETS, socket_position};
use tc_core::CanvasConfig;
use vello::Scene;

const NODE_RADIUS: f64 = 8.0;
const GROUP_RADIUS: f64 = 12.0;
const SWATCH_SIZE: f64 = 20.0;
const ACCENT_WIDTH: f64 = 4.0;

/// Affine that maps content space to surface pixels. `origin` places the
/// surface among pointer coordinates and is not part of it.
pub fn view_affine(view: &ViewTransform) -> Affine {
    Affine::translate((view.pan.x as f64, view.pan.y as f64)) * Affine::scale(view.scale as f64)
}

/// Paint a render list into a Vello scene.
///
/// Call once per frame with a freshly-cleared `Scene`.
/// The caller presents the scene.
pub fn paint_render_list(
    scene: &mut Scene,
    list: &RenderList,
    view: &ViewTransform,
    config: &CanvasConfig,
    theme: &CanvasTheme,
) {
    let transform = view_affine(view);

    let edge = Stroke::new(2.0);
    let edge_color = to_peniko(theme_color(theme.connection));

    for item in list.draw_order() {
        match item {
            DrawItem::Connection(c) => scene.stroke(&edge, transform, edge_color, None, &c.curve),
            DrawItem::Group(g) => paint_group(scene, transform, g, config, theme),
            DrawItem::Node(n) => paint_node(scene, transform, n, config, theme),
            DrawItem::Preview(curve) => paint_preview(scene, transform, curve, theme),
            DrawItem::Marquee(area) => paint_marquee(scene, transform, *area, theme),
        }
    }
}

fn paint_group(
    scene: &mut Scene,
    transform: Affine,
    g: &GroupShape,
    config: &CanvasConfig,
    theme: &CanvasTheme,
) {
    let frame = rounded(g.frame, GROUP_RADIUS);
    scene.fill(Fill::NonZero, transform, to_peniko(theme_color(theme.group_fill)), None, &frame);
    scene.stroke(&Stroke::new(1.0), transform, to_peniko(theme_color(theme.group_border)), None, &frame);

    let header = Rect {
        height: config.group_header.min(g.frame.height),
        ..g.frame
    };
    scene.fill(
        Fill::NonZero,
        transform,
        to_peniko(theme_color(theme.group_header)),
        None,
        &rounded(header, GROUP_RADIUS),
    );
    log::trace!(
        "GROUP {} {:?} ({} members{}) at ({}, {})",
        g.id,
        g.name,
        g.member_count,
        if g.collapsed { ", collapsed" } else { "" },
        g.frame.x,
        g.frame.y
    );
}

fn paint_node(
    scene: &mut Scene,
    transform: Affine,
    n: &NodeShape,
    config: &CanvasConfig,
    theme: &CanvasTheme,
) {
    let body = rounded(n.rect, NODE_RADIUS);
    scene.fill(Fill::NonZero, transform, to_peniko(theme_color(theme.node_fill)), None, &body);

    let accent = KurboRect::new(
        n.rect.x as f64,
        n.rect.y as f64,
        n.rect.x as f64 + ACCENT_WIDTH,
        (n.rect.y + n.rect.height) as f64,
    );
    scene.fill(Fill::NonZero, transform, to_peniko(theme_color(layer_accent(n.layer))), None, &accent);

    if let Some(swatch) = n.swatch {
        let x = (n.rect.x + n.rect.width) as f64 - SWATCH_SIZE - 10.0;
        let y = n.rect.center().y as f64 - SWATCH_SIZE / 2.0;
        let shape = KurboRect::new(x, y, x + SWATCH_SIZE, y + SWATCH_SIZE).to_rounded_rect(4.0);
        scene.fill(Fill::NonZero, transform, to_peniko(swatch), None, &shape);
    }

    let (border, width) = if n.selected {
        (theme.node_selected, 2.0)
    } else if n.hovered {
        (theme.node_hovered, 1.5)
    } else {
        (theme.node_border, 1.0)
    };
    scene.stroke(&Stroke::new(width), transform, to_peniko(theme_color(border)), None, &body);

    for socket in SOCKETS {
        let at = socket_position(Point::new(n.rect.x, n.rect.y), socket.side, config.node_size());
        let color = if socket.is_output() {
            theme.socket_output
        } else {
            theme.socket_input
        };
        let dot = Circle::new((at.x as f64, at.y as f64), config.socket_radius as f64 / 2.0);
        scene.fill(Fill::NonZero, transform, to_peniko(theme_color(color)), None, &dot);
    }

    log::trace!(
        "NODE {} {:?} = {:?} at ({}, {})",
        n.id,
        n.name,
        n.value,
        n.rect.x,
        n.rect.y
    );
}

fn paint_preview(scene: &mut Scene, transform: Affine, curve: &CubicBez, theme: &CanvasTheme) {
    let dashed = Stroke::new(2.0).with_dashes(0.0, [6.0, 4.0]);
    scene.stroke(&dashed, transform, to_peniko(theme_color(theme.preview)), None, curve);
}

fn paint_marquee(scene: &mut Scene, transform: Affine, area: Rect, theme: &CanvasTheme) {
    let shape = rounded(area, 0.0);
    let tint = to_peniko(theme_color(theme.node_selected)).with_alpha(0.12);
    scene.fill(Fill::NonZero, transform, tint, None, &shape);
    scene.stroke(
        &Stroke::new(1.0).with_dashes(0.0, [4.0, 3.0]),
        transform,
        to_peniko(theme_color(theme.node_selected)),
        None,
        &shape,
    );
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn rounded(r: Rect, radius: f64) -> RoundedRect {
    KurboRect::new(
        r.x as f64,
        r.y as f64,
        (r.x + r.width) as f64,
        (r.y + r.height) as f64,
    )
    .to_rounded_rect(radius)
}

fn to_peniko(c: TokenColor) -> Color {
    let [r, g, b, a] = c.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}
