//! Hit testing: content-space point → socket / node / group.
//!
//! All tests run in content space; callers convert pointer coordinates with
//! `ViewTransform::to_content_space` first. Nodes hidden by a
//! canvas-collapsed group and groups without placed members never match.

use crate::visible::{group_frame, visible_nodes};
use tc_core::geometry::{Point, Rect};
use tc_core::id::{GroupId, TokenId};
use tc_core::model::{Scene, TokenGroup};
use tc_core::socket::{SOCKETS, Socket, socket_position};
use tc_core::CanvasConfig;

/// What a pointer landed on, in priority order socket > node > group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Socket { node: TokenId, socket: Socket },
    Node(TokenId),
    Group(GroupId),
    Empty,
}

/// Find the topmost visible node containing `point`.
/// Later-placed nodes are on top, so the list is walked in reverse.
pub fn hit_test_node(point: Point, scene: &Scene, config: &CanvasConfig) -> Option<TokenId> {
    let size = config.node_size();
    visible_nodes(scene)
        .rev()
        .find(|(_, pos)| Rect::from_origin(*pos, size).contains(point))
        .map(|(id, _)| id)
}

/// Find the first socket of a node (in top, left, right, bottom order)
/// whose hit circle contains `point`.
pub fn hit_test_socket(point: Point, node: Point, config: &CanvasConfig) -> Option<Socket> {
    let r2 = config.socket_radius * config.socket_radius;
    SOCKETS
        .into_iter()
        .find(|s| socket_position(node, s.side, config.node_size()).distance_squared(point) <= r2)
}

/// Whether `point` falls inside the group's padded frame.
pub fn hit_test_group(
    point: Point,
    group: &TokenGroup,
    scene: &Scene,
    config: &CanvasConfig,
) -> bool {
    group_frame(group, scene, config).is_some_and(|f| f.contains(point))
}

/// Resolve the full hit target for a pointer position.
pub fn hit_test(point: Point, scene: &Scene, config: &CanvasConfig) -> HitTarget {
    for (id, pos) in visible_nodes(scene).rev() {
        if let Some(socket) = hit_test_socket(point, pos, config) {
            return HitTarget::Socket { node: id, socket };
        }
    }

    if let Some(id) = hit_test_node(point, scene, config) {
        return HitTarget::Node(id);
    }

    // Later groups are drawn over earlier ones.
    scene
        .groups
        .iter()
        .rev()
        .find(|g| hit_test_group(point, g, scene, config))
        .map_or(HitTarget::Empty, |g| HitTarget::Group(g.id))
}

/// Visible nodes whose rectangle intersects `area`. Used for box selection.
pub fn hit_test_rect(area: Rect, scene: &Scene, config: &CanvasConfig) -> Vec<TokenId> {
    let size = config.node_size();
    visible_nodes(scene)
        .filter(|(_, pos)| Rect::from_origin(*pos, size).intersects(&area))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::model::{Layer, Token, TokenType};
    use tc_core::socket::SocketSide;

    fn placed(scene: &mut Scene, name: &str, at: Point) -> TokenId {
        let id = TokenId::intern(&format!("hit-{name}"));
        scene.add_token(Token::new(id, name, "#fff", TokenType::Color, Layer::Base));
        scene.set_position(id, at);
        id
    }

    fn group(scene: &mut Scene, name: &str, members: &[TokenId]) -> GroupId {
        let id = GroupId::intern(&format!("hit-{name}"));
        scene.add_group(TokenGroup {
            id,
            name: name.into(),
            token_ids: members.iter().copied().collect(),
            collapsed: false,
            canvas_collapsed: false,
            position: None,
        });
        id
    }

    #[test]
    fn topmost_node_wins() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let _under = placed(&mut scene, "under", Point::new(0.0, 0.0));
        let over = placed(&mut scene, "over", Point::new(50.0, 20.0));
        assert_eq!(hit_test_node(Point::new(60.0, 30.0), &scene, &cfg), Some(over));
    }

    #[test]
    fn moving_a_node_keeps_its_z_order() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let first = placed(&mut scene, "first", Point::new(0.0, 0.0));
        let second = placed(&mut scene, "second", Point::new(500.0, 0.0));
        scene.set_position(first, Point::new(500.0, 0.0));
        assert_eq!(hit_test_node(Point::new(510.0, 10.0), &scene, &cfg), Some(second));
    }

    #[test]
    fn node_miss_returns_none() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        placed(&mut scene, "alone", Point::new(0.0, 0.0));
        assert_eq!(hit_test_node(Point::new(-1.0, 0.0), &scene, &cfg), None);
        assert_eq!(hit_test_node(Point::new(0.0, cfg.node_height + 0.5), &scene, &cfg), None);
    }

    #[test]
    fn socket_circle_radius() {
        let cfg = CanvasConfig::default();
        let node = Point::new(100.0, 100.0);
        let right = Point::new(100.0 + cfg.node_width, 100.0 + cfg.node_height / 2.0);
        let hit = hit_test_socket(Point::new(right.x + 5.0, right.y), node, &cfg).unwrap();
        assert_eq!(hit.side, SocketSide::Right);
        assert!(hit.is_output());
        assert!(hit_test_socket(Point::new(right.x + cfg.socket_radius + 1.0, right.y), node, &cfg).is_none());
    }

    #[test]
    fn socket_ties_resolve_in_declaration_order() {
        // A tiny node puts every anchor inside one radius.
        let cfg = CanvasConfig {
            node_width: 2.0,
            node_height: 2.0,
            ..CanvasConfig::default()
        };
        let hit = hit_test_socket(Point::new(1.0, 1.0), Point::ZERO, &cfg).unwrap();
        assert_eq!(hit.side, SocketSide::Top);
    }

    #[test]
    fn priority_socket_then_node_then_group() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = placed(&mut scene, "pa", Point::new(0.0, 0.0));
        let b = placed(&mut scene, "pb", Point::new(300.0, 0.0));
        let g = group(&mut scene, "pg", &[a, b]);

        let left_socket = Point::new(0.0, cfg.node_height / 2.0);
        assert!(matches!(
            hit_test(left_socket, &scene, &cfg),
            HitTarget::Socket { node, socket } if node == a && socket.side == SocketSide::Left
        ));
        assert_eq!(hit_test(Point::new(60.0, 10.0), &scene, &cfg), HitTarget::Node(a));
        // Between the two nodes but inside the group frame.
        assert_eq!(hit_test(Point::new(230.0, 10.0), &scene, &cfg), HitTarget::Group(g));
        // Header strip above the nodes.
        assert_eq!(hit_test(Point::new(230.0, -cfg.group_header + 2.0), &scene, &cfg), HitTarget::Group(g));
        assert_eq!(hit_test(Point::new(2000.0, 2000.0), &scene, &cfg), HitTarget::Empty);
    }

    #[test]
    fn empty_group_never_hits() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = placed(&mut scene, "ea", Point::new(0.0, 0.0));
        let b = placed(&mut scene, "eb", Point::new(10.0, 0.0));
        let g = group(&mut scene, "eg", &[a, b]);
        scene.positions.remove(a);
        scene.positions.remove(b);
        let grp = scene.group(g).unwrap();
        assert!(!hit_test_group(Point::new(5.0, 5.0), grp, &scene, &cfg));
    }

    #[test]
    fn collapsed_group_hides_member_nodes_from_hits() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = placed(&mut scene, "ca", Point::new(0.0, 0.0));
        let b = placed(&mut scene, "cb", Point::new(300.0, 0.0));
        let g = group(&mut scene, "cg", &[a, b]);
        scene.group_mut(g).unwrap().canvas_collapsed = true;
        assert_eq!(hit_test_node(Point::new(10.0, 10.0), &scene, &cfg), None);
        // The collapsed header strip is still grabbable.
        assert_eq!(hit_test(Point::new(10.0, -10.0), &scene, &cfg), HitTarget::Group(g));
    }

    #[test]
    fn rect_selection() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = placed(&mut scene, "ra", Point::new(0.0, 0.0));
        let _b = placed(&mut scene, "rb", Point::new(1000.0, 0.0));
        let area = Rect { x: -10.0, y: -10.0, width: 50.0, height: 50.0 };
        assert_eq!(hit_test_rect(area, &scene, &cfg), vec![a]);
    }
}
