//! Canvas2D software renderer.
//!
//! Draws a [`RenderList`] to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`. The grid is painted in surface pixels, every
//! shape after it in content space under the view transform, in
//! [`RenderList::draw_order`]. The canvas bitmap starts at the view's
//! `origin`, so only pan and scale apply here.

use tc_core::geometry::{Point, Rect, ViewTransform};
use tc_core::CanvasConfig;
use tc_core::socket::{SOCKETS, socket_position};
use tc_render::kurbo::CubicBez;
use tc_render::{
    CanvasTheme, ConnectionShape, DrawItem, GroupShape, NodeShape, RenderList, curve_midpoint,
    layer_accent,
};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const FONT: &str = "Inter, system-ui, sans-serif";
const GRID_SPACING: f64 = 20.0;
const CORNER: f64 = 8.0;

/// Render the whole list. Returns an error only if the context rejects a
/// transform.
pub fn render_list(
    ctx: &CanvasRenderingContext2d,
    list: &RenderList,
    view: &ViewTransform,
    config: &CanvasConfig,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
) -> Result<(), JsValue> {
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    draw_grid(ctx, view, canvas_width, canvas_height, theme);

    ctx.save();
    ctx.translate(view.pan.x as f64, view.pan.y as f64)?;
    ctx.scale(view.scale as f64, view.scale as f64)?;

    for item in list.draw_order() {
        match item {
            DrawItem::Connection(conn) => draw_connection(ctx, conn, theme),
            DrawItem::Group(group) => draw_group(ctx, group, config, theme),
            DrawItem::Node(node) => draw_node(ctx, node, config, theme),
            DrawItem::Preview(curve) => draw_preview(ctx, curve, theme),
            DrawItem::Marquee(area) => draw_marquee(ctx, area, view.scale as f64, theme),
        }
    }

    ctx.restore();
    Ok(())
}

/// Dot grid that follows pan and zoom.
fn draw_grid(
    ctx: &CanvasRenderingContext2d,
    view: &ViewTransform,
    width: f64,
    height: f64,
    theme: &CanvasTheme,
) {
    let spacing = GRID_SPACING * view.scale as f64;
    if spacing < 4.0 {
        return;
    }
    let off_x = (view.pan.x as f64).rem_euclid(spacing);
    let off_y = (view.pan.y as f64).rem_euclid(spacing);

    ctx.set_fill_style_str(theme.grid);
    let mut x = off_x;
    while x < width {
        let mut y = off_y;
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, r: &Rect, radius: f64) {
    let (x, y, w, h) = (r.x as f64, r.y as f64, r.width as f64, r.height as f64);
    let rad = radius.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + rad, y);
    ctx.line_to(x + w - rad, y);
    ctx.quadratic_curve_to(x + w, y, x + w, y + rad);
    ctx.line_to(x + w, y + h - rad);
    ctx.quadratic_curve_to(x + w, y + h, x + w - rad, y + h);
    ctx.line_to(x + rad, y + h);
    ctx.quadratic_curve_to(x, y + h, x, y + h - rad);
    ctx.line_to(x, y + rad);
    ctx.quadratic_curve_to(x, y, x + rad, y);
    ctx.close_path();
}

fn draw_group(
    ctx: &CanvasRenderingContext2d,
    group: &GroupShape,
    config: &CanvasConfig,
    theme: &CanvasTheme,
) {
    let frame = &group.frame;
    ctx.save();

    rounded_rect_path(ctx, frame, CORNER);
    ctx.set_fill_style_str(theme.group_fill);
    ctx.fill();
    ctx.set_stroke_style_str(theme.group_border);
    ctx.set_line_width(1.0);
    ctx.stroke();

    let header = Rect {
        x: frame.x,
        y: frame.y,
        width: frame.width,
        height: config.group_header.min(frame.height),
    };
    rounded_rect_path(ctx, &header, CORNER);
    ctx.set_fill_style_str(theme.group_header);
    ctx.fill();

    let label = if group.collapsed {
        format!("▸ {} ({})", group.name, group.member_count)
    } else {
        format!("▾ {}", group.name)
    };
    ctx.set_fill_style_str(theme.text);
    ctx.set_font(&format!("600 12px {FONT}"));
    ctx.set_text_baseline("middle");
    ctx.set_text_align("left");
    let _ = ctx.fill_text(
        &label,
        header.x as f64 + 10.0,
        (header.y + header.height / 2.0) as f64,
    );

    ctx.restore();
}

fn trace_curve(ctx: &CanvasRenderingContext2d, c: &CubicBez) {
    ctx.begin_path();
    ctx.move_to(c.p0.x, c.p0.y);
    ctx.bezier_curve_to(c.p1.x, c.p1.y, c.p2.x, c.p2.y, c.p3.x, c.p3.y);
}

fn draw_connection(ctx: &CanvasRenderingContext2d, conn: &ConnectionShape, theme: &CanvasTheme) {
    ctx.save();
    ctx.set_stroke_style_str(theme.connection);
    ctx.set_line_width(2.0);
    trace_curve(ctx, &conn.curve);
    ctx.stroke();

    // Direction marker halfway along the wire.
    let mid = curve_midpoint(&conn.curve);
    ctx.set_fill_style_str(theme.connection);
    ctx.begin_path();
    let _ = ctx.arc(mid.x as f64, mid.y as f64, 3.0, 0.0, std::f64::consts::TAU);
    ctx.fill();
    ctx.restore();
}

fn draw_preview(ctx: &CanvasRenderingContext2d, curve: &CubicBez, theme: &CanvasTheme) {
    ctx.save();
    ctx.set_stroke_style_str(theme.preview);
    ctx.set_line_width(2.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(4.0)));
    trace_curve(ctx, curve);
    ctx.stroke();
    ctx.restore();
}

/// Box-selection rectangle. Line width is divided by `scale` so the
/// outline stays one pixel wide at any zoom.
fn draw_marquee(ctx: &CanvasRenderingContext2d, area: &Rect, scale: f64, theme: &CanvasTheme) {
    let (x, y, w, h) = (area.x as f64, area.y as f64, area.width as f64, area.height as f64);
    ctx.save();
    ctx.set_global_alpha(0.12);
    ctx.set_fill_style_str(theme.node_selected);
    ctx.fill_rect(x, y, w, h);
    ctx.set_global_alpha(1.0);
    ctx.set_stroke_style_str(theme.node_selected);
    ctx.set_line_width(1.0 / scale);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &JsValue::from_f64(4.0 / scale),
        &JsValue::from_f64(3.0 / scale),
    ));
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    node: &NodeShape,
    config: &CanvasConfig,
    theme: &CanvasTheme,
) {
    let r = &node.rect;
    let (x, y, h) = (r.x as f64, r.y as f64, r.height as f64);
    ctx.save();

    rounded_rect_path(ctx, r, CORNER);
    ctx.set_fill_style_str(theme.node_fill);
    ctx.fill();

    // Layer accent strip on the left edge.
    ctx.set_fill_style_str(layer_accent(node.layer));
    ctx.fill_rect(x, y + CORNER, 3.0, h - CORNER * 2.0);

    let text_x = if let Some(swatch) = node.swatch {
        let size = 18.0;
        let sy = y + (h - size) / 2.0;
        ctx.set_fill_style_str(&swatch.to_hex());
        ctx.fill_rect(x + 12.0, sy, size, size);
        ctx.set_stroke_style_str(theme.node_border);
        ctx.set_line_width(1.0);
        ctx.stroke_rect(x + 12.0, sy, size, size);
        x + 12.0 + size + 8.0
    } else {
        x + 12.0
    };

    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str(theme.text);
    ctx.set_font(&format!("600 13px {FONT}"));
    let _ = ctx.fill_text(&node.name, text_x, y + h * 0.38);
    ctx.set_fill_style_str(theme.subtext);
    ctx.set_font(&format!("11px {FONT}"));
    let value = if node.value.is_empty() {
        "—".to_string()
    } else {
        node.value.clone()
    };
    let _ = ctx.fill_text(&value, text_x, y + h * 0.68);

    let (border, width) = if node.selected {
        (theme.node_selected, 2.0)
    } else if node.hovered {
        (theme.node_hovered, 1.5)
    } else {
        (theme.node_border, 1.0)
    };
    rounded_rect_path(ctx, r, CORNER);
    ctx.set_stroke_style_str(border);
    ctx.set_line_width(width);
    ctx.stroke();

    let origin = Point::new(r.x, r.y);
    for socket in SOCKETS {
        let p = socket_position(origin, socket.side, config.node_size());
        ctx.begin_path();
        let _ = ctx.arc(
            p.x as f64,
            p.y as f64,
            (config.socket_radius * 0.6) as f64,
            0.0,
            std::f64::consts::TAU,
        );
        ctx.set_fill_style_str(if socket.is_output() {
            theme.socket_output
        } else {
            theme.socket_input
        });
        ctx.fill();
        ctx.set_stroke_style_str(theme.node_fill);
        ctx.stroke();
    }

    ctx.restore();
}
