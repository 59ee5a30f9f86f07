pub mod curve;
pub mod hit;
pub mod paint;
pub mod theme;
pub mod visible;

pub use curve::{connection_curve, curve_midpoint};
pub use hit::{HitTarget, hit_test, hit_test_group, hit_test_node, hit_test_rect, hit_test_socket};
pub use paint::{paint_render_list, view_affine};
pub use theme::{CanvasTheme, layer_accent};
pub use visible::{
    ConnectionShape, DrawItem, GroupShape, NodeShape, Preview, RenderList, RenderState, build_render_list,
    group_frame, visible_nodes,
};

// Re-export kurbo so backends can walk curves without a direct dependency
pub use kurbo;
