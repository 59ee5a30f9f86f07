//! Render list: what a frame draws, in draw order.
//!
//! Rendering is a pure function of scene + view state. Backends (Vello,
//! Canvas2D) walk the list without touching the scene again.

use crate::curve::connection_curve;
use kurbo::CubicBez;
use tc_core::geometry::{Point, Rect};
use tc_core::id::{ConnectionId, GroupId, TokenId};
use tc_core::model::{Color, Layer, Scene, TokenGroup, TokenType};
use tc_core::reference::resolve_value;
use tc_core::socket::{SocketSide, socket_position};
use tc_core::CanvasConfig;

/// Placed nodes not hidden by a canvas-collapsed group, bottom to top.
pub fn visible_nodes(scene: &Scene) -> impl DoubleEndedIterator<Item = (TokenId, Point)> + '_ {
    scene
        .positions
        .iter()
        .filter(move |(id, _)| !scene.is_hidden(*id) && scene.token(*id).is_some())
}

/// Padded frame of a group. A canvas-collapsed group keeps only its header
/// strip. `None` when no member is placed.
pub fn group_frame(group: &TokenGroup, scene: &Scene, config: &CanvasConfig) -> Option<Rect> {
    let bounds = scene.group_bounds(group, config.node_size())?;
    let mut frame = bounds.padded(config.group_padding, config.group_header);
    if group.canvas_collapsed {
        frame.height = config.group_header;
    }
    Some(frame)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub id: TokenId,
    pub rect: Rect,
    pub name: String,
    /// Raw value as stored; may be a reference.
    pub value: String,
    pub layer: Layer,
    pub token_type: TokenType,
    /// Resolved color for color tokens whose chain ends in a hex literal.
    pub swatch: Option<Color>,
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionShape {
    pub id: ConnectionId,
    pub from: TokenId,
    pub to: TokenId,
    pub curve: CubicBez,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupShape {
    pub id: GroupId,
    pub name: String,
    pub frame: Rect,
    pub collapsed: bool,
    pub member_count: usize,
}

/// In-flight connection: from a socket anchor to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    pub start: Point,
    pub end: Point,
}

/// View state a render list depends on besides the scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderState<'a> {
    pub selected: &'a [TokenId],
    pub hovered: Option<TokenId>,
    pub preview: Option<Preview>,
    /// Box-selection rectangle in content space.
    pub marquee: Option<Rect>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderList {
    pub connections: Vec<ConnectionShape>,
    pub groups: Vec<GroupShape>,
    pub nodes: Vec<NodeShape>,
    pub preview: Option<CubicBez>,
    pub marquee: Option<Rect>,
}

/// One shape of a render list, as handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawItem<'a> {
    Connection(&'a ConnectionShape),
    Group(&'a GroupShape),
    Node(&'a NodeShape),
    Preview(&'a CubicBez),
    Marquee(&'a Rect),
}

impl RenderList {
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
            && self.groups.is_empty()
            && self.nodes.is_empty()
            && self.preview.is_none()
            && self.marquee.is_none()
    }

    /// Every shape bottom to top: connections, group frames, nodes, the
    /// connection preview, then the selection box.
    pub fn draw_order(&self) -> impl Iterator<Item = DrawItem<'_>> + '_ {
        self.connections
            .iter()
            .map(DrawItem::Connection)
            .chain(self.groups.iter().map(DrawItem::Group))
            .chain(self.nodes.iter().map(DrawItem::Node))
            .chain(self.preview.iter().map(DrawItem::Preview))
            .chain(self.marquee.iter().map(DrawItem::Marquee))
    }
}

/// Build the draw list for one frame.
///
/// Connections touching a hidden or unplaced node are skipped, as are
/// groups with no placed member.
pub fn build_render_list(scene: &Scene, config: &CanvasConfig, state: RenderState<'_>) -> RenderList {
    let size = config.node_size();
    let mut list = RenderList::default();

    let anchor = |id: TokenId, side: SocketSide| -> Option<Point> {
        if scene.is_hidden(id) {
            return None;
        }
        scene.position(id).map(|p| socket_position(p, side, size))
    };

    for c in &scene.connections {
        let (Some(start), Some(end)) = (anchor(c.from, c.start_side()), anchor(c.to, c.end_side())) else {
            continue;
        };
        list.connections.push(ConnectionShape {
            id: c.id,
            from: c.from,
            to: c.to,
            curve: connection_curve(start, end, config.min_curve_bow),
        });
    }

    for group in &scene.groups {
        let Some(frame) = group_frame(group, scene, config) else {
            continue;
        };
        list.groups.push(GroupShape {
            id: group.id,
            name: group.name.clone(),
            frame,
            collapsed: group.canvas_collapsed,
            member_count: group.token_ids.len(),
        });
    }

    for (id, pos) in visible_nodes(scene) {
        let Some(token) = scene.token(id) else {
            continue;
        };
        let swatch = match token.token_type {
            TokenType::Color => resolve_value(scene, id)
                .ok()
                .and_then(|v| Color::from_hex(&v)),
            _ => None,
        };
        list.nodes.push(NodeShape {
            id,
            rect: Rect::from_origin(pos, size),
            name: token.name.clone(),
            value: token.value.clone(),
            layer: token.layer,
            token_type: token.token_type,
            swatch,
            selected: state.selected.contains(&id),
            hovered: state.hovered == Some(id),
        });
    }

    list.preview = state
        .preview
        .map(|p| connection_curve(p.start, p.end, config.min_curve_bow));
    list.marquee = state.marquee;

    log::trace!(
        "render list: {} connections, {} groups, {} nodes",
        list.connections.len(),
        list.groups.len(),
        list.nodes.len()
    );
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tc_core::model::{Connection, Token};

    fn token(scene: &mut Scene, name: &str, value: &str, layer: Layer, at: Option<Point>) -> TokenId {
        let id = TokenId::intern(&format!("vis-{name}"));
        scene.add_token(Token::new(id, name, value, TokenType::Color, layer));
        if let Some(p) = at {
            scene.set_position(id, p);
        }
        id
    }

    fn connect(scene: &mut Scene, from: TokenId, to: TokenId) -> ConnectionId {
        let id = ConnectionId::generate();
        scene.add_connection(Connection {
            id,
            from,
            to,
            from_socket: Some(SocketSide::Right),
            to_socket: Some(SocketSide::Left),
        });
        id
    }

    fn group(scene: &mut Scene, name: &str, members: &[TokenId]) -> GroupId {
        let id = GroupId::intern(&format!("vis-{name}"));
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
    fn curves_start_and_end_on_socket_anchors() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = token(&mut scene, "ca", "#fff", Layer::Base, Some(Point::new(0.0, 0.0)));
        let b = token(&mut scene, "cb", "{base.ca}", Layer::Semantic, Some(Point::new(400.0, 200.0)));
        connect(&mut scene, a, b);

        let list = build_render_list(&scene, &cfg, RenderState::default());
        let curve = list.connections[0].curve;
        assert_eq!((curve.p0.x, curve.p0.y), (160.0, 30.0));
        assert_eq!((curve.p3.x, curve.p3.y), (400.0, 230.0));
    }

    #[test]
    fn swatch_follows_reference_chain() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        token(&mut scene, "sw-blue", "#0000FF", Layer::Base, None);
        let primary = token(&mut scene, "sw-primary", "{base.sw-blue}", Layer::Semantic, Some(Point::ZERO));
        let lost = token(&mut scene, "sw-lost", "{base.none}", Layer::Semantic, Some(Point::new(0.0, 200.0)));

        let list = build_render_list(&scene, &cfg, RenderState::default());
        let by_id = |id| list.nodes.iter().find(|n| n.id == id).unwrap();
        assert_eq!(by_id(primary).swatch.map(|c| c.to_hex()), Some("#0000FF".into()));
        assert_eq!(by_id(lost).swatch, None);
        assert_eq!(list.nodes.len(), 2, "unplaced tokens are not drawn");
    }

    #[test]
    fn selection_and_hover_flags() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = token(&mut scene, "sa", "#fff", Layer::Base, Some(Point::ZERO));
        let b = token(&mut scene, "sb", "#000", Layer::Base, Some(Point::new(300.0, 0.0)));
        let selected = [a];
        let list = build_render_list(
            &scene,
            &cfg,
            RenderState {
                selected: &selected,
                hovered: Some(b),
                preview: None,
                marquee: None,
            },
        );
        assert!(list.nodes[0].selected && !list.nodes[0].hovered);
        assert!(!list.nodes[1].selected && list.nodes[1].hovered);
    }

    #[test]
    fn collapsed_group_hides_members_and_their_connections() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = token(&mut scene, "ga", "#fff", Layer::Base, Some(Point::new(0.0, 0.0)));
        let b = token(&mut scene, "gb", "#000", Layer::Base, Some(Point::new(300.0, 0.0)));
        let outside = token(&mut scene, "gout", "#111", Layer::Base, Some(Point::new(0.0, 400.0)));
        let g = group(&mut scene, "gg", &[a, b]);
        connect(&mut scene, a, b);
        connect(&mut scene, outside, a);

        let open = build_render_list(&scene, &cfg, RenderState::default());
        assert_eq!(open.nodes.len(), 3);
        assert_eq!(open.connections.len(), 2);
        let expanded = open.groups[0].frame;

        scene.group_mut(g).unwrap().canvas_collapsed = true;
        let closed = build_render_list(&scene, &cfg, RenderState::default());
        assert_eq!(closed.nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![outside]);
        assert!(closed.connections.is_empty());
        let header = closed.groups[0].frame;
        assert!(closed.groups[0].collapsed);
        assert_eq!((header.x, header.y, header.width), (expanded.x, expanded.y, expanded.width));
        assert_eq!(header.height, cfg.group_header);
    }

    #[test]
    fn group_frame_pads_member_bounds() {
        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = token(&mut scene, "fa", "#fff", Layer::Base, Some(Point::new(100.0, 100.0)));
        let b = token(&mut scene, "fb", "#fff", Layer::Base, Some(Point::new(400.0, 200.0)));
        let g = group(&mut scene, "fg", &[a, b]);
        let frame = group_frame(scene.group(g).unwrap(), &scene, &cfg).unwrap();
        assert_eq!(frame, Rect { x: 84.0, y: 68.0, width: 492.0, height: 208.0 });
    }

    #[test]
    fn preview_curve_is_built() {
        let cfg = CanvasConfig::default();
        let scene = Scene::new();
        let list = build_render_list(
            &scene,
            &cfg,
            RenderState {
                preview: Some(Preview {
                    start: Point::new(10.0, 10.0),
                    end: Point::new(50.0, 90.0),
                }),
                ..RenderState::default()
            },
        );
        let curve = list.preview.unwrap();
        assert_eq!((curve.p3.x, curve.p3.y), (50.0, 90.0));
        assert!(!list.is_empty());
    }

    #[test]
    fn draw_order_puts_connections_under_groups() {
        #[derive(Debug, PartialEq)]
        enum Kind {
            Connection,
            Group,
            Node,
            Preview,
            Marquee,
        }

        let cfg = CanvasConfig::default();
        let mut scene = Scene::new();
        let a = token(&mut scene, "oa", "#fff", Layer::Base, Some(Point::new(0.0, 0.0)));
        let b = token(&mut scene, "ob", "{base.oa}", Layer::Semantic, Some(Point::new(300.0, 0.0)));
        // Groups are pushed into the scene before the connection on purpose.
        group(&mut scene, "og", &[a, b]);
        connect(&mut scene, a, b);
        let list = build_render_list(
            &scene,
            &cfg,
            RenderState {
                preview: Some(Preview {
                    start: Point::ZERO,
                    end: Point::new(10.0, 10.0),
                }),
                marquee: Some(Rect { x: 0.0, y: 0.0, width: 5.0, height: 5.0 }),
                ..RenderState::default()
            },
        );

        let kinds: Vec<Kind> = list
            .draw_order()
            .map(|item| match item {
                DrawItem::Connection(_) => Kind::Connection,
                DrawItem::Group(_) => Kind::Group,
                DrawItem::Node(_) => Kind::Node,
                DrawItem::Preview(_) => Kind::Preview,
                DrawItem::Marquee(_) => Kind::Marquee,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![Kind::Connection, Kind::Group, Kind::Node, Kind::Node, Kind::Preview, Kind::Marquee]
        );
    }
}
