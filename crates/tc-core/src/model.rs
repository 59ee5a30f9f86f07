//! Core data model for token scenes.
//!
//! A scene is a token store (tokens by layer) plus the canvas placement of
//! those tokens: node positions, directed connections between nodes, and
//! named groups of nodes. A token is on the canvas exactly when it has an
//! entry in [`NodePositions`].

use crate::geometry::{Bounds, Point, Rect, Size, bounding_box};
use crate::id::{ConnectionId, GroupId, TokenId};
use crate::socket::SocketSide;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// Swatch color, channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Value of one ASCII hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| {
            Some(((hex_val(bytes[i])? << 4) | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Channels as 8-bit values.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

// ─── Tokens ──────────────────────────────────────────────────────────────

/// Reference tier of a token. Ordered from most primitive to most specific;
/// a token should only reference tokens in its own or a lower layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Primitive,
    Base,
    Semantic,
    Specific,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Primitive, Layer::Base, Layer::Semantic, Layer::Specific];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Primitive => "primitive",
            Layer::Base => "base",
            Layer::Semantic => "semantic",
            Layer::Specific => "specific",
        }
    }

    pub fn parse(s: &str) -> Option<Layer> {
        Layer::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of value a token holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Color,
    Number,
    Text,
    Spacing,
    Boolean,
    #[default]
    String,
}

/// A named design value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    /// Literal value, or a `{layer.name}` reference.
    pub value: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub layer: Layer,
}

impl Token {
    pub fn new(
        id: TokenId,
        name: impl Into<String>,
        value: impl Into<String>,
        token_type: TokenType,
        layer: Layer,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            value: value.into(),
            token_type,
            layer,
        }
    }
}

// ─── Node positions ──────────────────────────────────────────────────────

/// Insertion-ordered map from token id to node position.
///
/// Order is z-order: later entries are drawn on top and win hit-tests.
/// Moving an existing node keeps its slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePositions {
    order: Vec<TokenId>,
    map: HashMap<TokenId, Point>,
}

impl NodePositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TokenId) -> Option<Point> {
        self.map.get(&id).copied()
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.map.contains_key(&id)
    }

    /// Insert or move a node. New ids go on top.
    pub fn insert(&mut self, id: TokenId, pos: Point) {
        if self.map.insert(id, pos).is_none() {
            self.order.push(id);
        }
    }

    pub fn remove(&mut self, id: TokenId) -> Option<Point> {
        let removed = self.map.remove(&id);
        if removed.is_some() {
            self.order.retain(|o| *o != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate bottom-to-top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (TokenId, Point)> + '_ {
        self.order.iter().map(|id| (*id, self.map[id]))
    }

    pub fn ids(&self) -> &[TokenId] {
        &self.order
    }

    pub fn retain(&mut self, mut keep: impl FnMut(TokenId) -> bool) {
        let map = &mut self.map;
        self.order.retain(|id| {
            let k = keep(*id);
            if !k {
                map.remove(id);
            }
            k
        });
    }
}

impl Serialize for NodePositions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(self.order.len()))?;
        for (id, pos) in self.iter() {
            m.serialize_entry(&id, &pos)?;
        }
        m.end()
    }
}

impl<'de> Deserialize<'de> for NodePositions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionsVisitor;

        impl<'de> Visitor<'de> for PositionsVisitor {
            type Value = NodePositions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of token id to {x, y}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut positions = NodePositions::new();
                while let Some((id, pos)) = access.next_entry::<TokenId, Point>()? {
                    positions.insert(id, pos);
                }
                Ok(positions)
            }
        }

        deserializer.deserialize_map(PositionsVisitor)
    }
}

// ─── Connections & groups ────────────────────────────────────────────────

/// Directed edge from an output socket of `from` to an input socket of `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from: TokenId,
    pub to: TokenId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_socket: Option<SocketSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_socket: Option<SocketSide>,
}

impl Connection {
    pub fn touches(&self, id: TokenId) -> bool {
        self.from == id || self.to == id
    }

    /// Socket the curve leaves from; right edge when unspecified.
    pub fn start_side(&self) -> SocketSide {
        self.from_socket.unwrap_or(SocketSide::Right)
    }

    /// Socket the curve arrives at; left edge when unspecified.
    pub fn end_side(&self) -> SocketSide {
        self.to_socket.unwrap_or(SocketSide::Left)
    }
}

/// Which collapse flag of a group to toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseScope {
    /// Member list in the side panel.
    Sidebar,
    /// Member nodes (and their connections) on the canvas.
    Canvas,
}

/// A named set of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGroup {
    pub id: GroupId,
    pub name: String,
    pub token_ids: SmallVec<[TokenId; 4]>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub canvas_collapsed: bool,
    /// Centroid hint from creation time. Never authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

impl TokenGroup {
    pub fn contains(&self, id: TokenId) -> bool {
        self.token_ids.contains(&id)
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// Interchange shape consumed by save/load and import/export collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneExport {
    #[serde(default)]
    pub tokens: BTreeMap<Layer, Vec<Token>>,
    #[serde(default)]
    pub node_positions: NodePositions,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub token_groups: Vec<TokenGroup>,
}

impl SceneExport {
    /// # Errors
    /// Returns the serde error message on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    pub fn to_json(&self) -> String {
        // Every key is a string and every value is plain data.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Compact MessagePack encoding for save slots.
    ///
    /// # Errors
    /// Returns the encoder error message.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, String> {
        rmp_serde::to_vec_named(self).map_err(|e| e.to_string())
    }

    /// # Errors
    /// Returns the decoder error message on truncated or foreign bytes.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, String> {
        rmp_serde::from_slice(bytes).map_err(|e| e.to_string())
    }
}

/// The live scene: token store plus canvas placement.
///
/// `Clone` is a deep copy; history snapshots rely on that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub tokens: BTreeMap<Layer, Vec<Token>>,
    pub positions: NodePositions,
    pub connections: Vec<Connection>,
    pub groups: Vec<TokenGroup>,
    /// Sidebar collapse state per layer.
    pub layer_collapsed: BTreeMap<Layer, bool>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Tokens ──────────────────────────────────────────────────────────

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.values().flatten().find(|t| t.id == id)
    }

    pub fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.values_mut().flatten().find(|t| t.id == id)
    }

    /// All tokens, layer by layer in layer order.
    pub fn all_tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values().flatten()
    }

    pub fn find_token(&self, layer: Layer, name: &str) -> Option<&Token> {
        self.tokens.get(&layer)?.iter().find(|t| t.name == name)
    }

    /// Append a token to its layer, replacing any token with the same id.
    pub fn add_token(&mut self, token: Token) {
        if let Some(existing) = self.token_mut(token.id) {
            if existing.layer == token.layer {
                *existing = token;
                return;
            }
            let id = token.id;
            for list in self.tokens.values_mut() {
                list.retain(|t| t.id != id);
            }
        }
        self.tokens.entry(token.layer).or_default().push(token);
    }

    /// Remove a token and everything that depends on it: its node, its
    /// connections, and its group membership.
    pub fn remove_token(&mut self, id: TokenId) -> Option<Token> {
        let mut removed = None;
        for list in self.tokens.values_mut() {
            if let Some(i) = list.iter().position(|t| t.id == id) {
                removed = Some(list.remove(i));
                break;
            }
        }
        removed.as_ref()?;
        self.remove_node(id);
        for group in &mut self.groups {
            group.token_ids.retain(|t| *t != id);
        }
        self.prune_groups();
        removed
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    pub fn position(&self, id: TokenId) -> Option<Point> {
        self.positions.get(id)
    }

    /// Place or move a node. The single position-update path for both
    /// single-node and group drags.
    pub fn set_position(&mut self, id: TokenId, pos: Point) {
        self.positions.insert(id, pos);
    }

    /// Node rectangle, if the token is on the canvas.
    pub fn node_rect(&self, id: TokenId, size: Size) -> Option<Rect> {
        self.position(id).map(|p| Rect::from_origin(p, size))
    }

    /// Take a node off the canvas along with its connections. The token
    /// stays in the store.
    pub fn remove_node(&mut self, id: TokenId) -> bool {
        let had_position = self.positions.remove(id).is_some();
        let removed = self.delete_connections_for_node(id);
        had_position || removed > 0
    }

    // ─── Connections ─────────────────────────────────────────────────────

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let i = self.connections.iter().position(|c| c.id == id)?;
        Some(self.connections.remove(i))
    }

    /// Remove every connection that starts or ends at `id`. Returns how
    /// many were removed.
    pub fn delete_connections_for_node(&mut self, id: TokenId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        before - self.connections.len()
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    pub fn group(&self, id: GroupId) -> Option<&TokenGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut TokenGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// The group a token belongs to, if any.
    pub fn group_of(&self, token: TokenId) -> Option<&TokenGroup> {
        self.groups.iter().find(|g| g.contains(token))
    }

    /// Add a group. Its members leave whatever group they were in; groups
    /// left without members are dropped.
    pub fn add_group(&mut self, group: TokenGroup) {
        for other in &mut self.groups {
            other.token_ids.retain(|t| !group.token_ids.contains(t));
        }
        self.prune_groups();
        self.groups.push(group);
    }

    pub fn remove_group(&mut self, id: GroupId) -> Option<TokenGroup> {
        let i = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(i))
    }

    /// Rectangles of a group's members that are on the canvas.
    pub fn member_rects<'a>(
        &'a self,
        group: &'a TokenGroup,
        size: Size,
    ) -> impl Iterator<Item = Rect> + 'a {
        group
            .token_ids
            .iter()
            .filter_map(move |id| self.node_rect(*id, size))
    }

    /// Bounding box over placed members. `None` makes the group inert.
    pub fn group_bounds(&self, group: &TokenGroup, size: Size) -> Option<Bounds> {
        bounding_box(self.member_rects(group, size))
    }

    /// True when the token's node is hidden by a canvas-collapsed group.
    pub fn is_hidden(&self, token: TokenId) -> bool {
        self.groups
            .iter()
            .any(|g| g.canvas_collapsed && g.contains(token))
    }

    /// Drop groups with no members left.
    pub fn prune_groups(&mut self) {
        self.groups.retain(|g| !g.token_ids.is_empty());
    }

    pub fn toggle_layer_collapsed(&mut self, layer: Layer) -> bool {
        let flag = self.layer_collapsed.entry(layer).or_insert(false);
        *flag = !*flag;
        *flag
    }

    // ─── Capture / restore ───────────────────────────────────────────────

    /// Capture the interchange shape of this scene.
    pub fn capture(&self) -> SceneExport {
        SceneExport {
            tokens: self.tokens.clone(),
            node_positions: self.positions.clone(),
            connections: self.connections.clone(),
            token_groups: self.groups.clone(),
        }
    }

    /// Replace tokens, positions, connections and groups from an export.
    ///
    /// Entries that would break the scene invariants are dropped: positions
    /// of unknown tokens, connections whose endpoints are not both placed,
    /// group members that are not tokens, and groups left empty.
    /// Layer-collapse flags are UI state and survive a restore.
    pub fn restore(&mut self, export: SceneExport) {
        self.tokens = export.tokens;
        self.positions = export.node_positions;
        self.connections = export.connections;
        self.groups = export.token_groups;

        let known: HashSet<TokenId> = self.all_tokens().map(|t| t.id).collect();
        let positions_before = self.positions.len();
        self.positions.retain(|id| known.contains(&id));

        let connections_before = self.connections.len();
        let positions = &self.positions;
        self.connections
            .retain(|c| c.from != c.to && positions.contains(c.from) && positions.contains(c.to));

        let mut claimed: HashSet<TokenId> = HashSet::new();
        for group in &mut self.groups {
            group
                .token_ids
                .retain(|t| known.contains(t) && claimed.insert(*t));
        }
        self.prune_groups();

        let dropped_positions = positions_before - self.positions.len();
        let dropped_connections = connections_before - self.connections.len();
        if dropped_positions > 0 || dropped_connections > 0 {
            log::debug!(
                "restore dropped {dropped_positions} orphan positions and {dropped_connections} dangling connections"
            );
        }
    }

    /// Build a scene from an export.
    pub fn from_export(export: SceneExport) -> Self {
        let mut scene = Scene::new();
        scene.restore(export);
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SIZE: Size = Size {
        width: 160.0,
        height: 60.0,
    };

    fn token(id: &str, layer: Layer, value: &str) -> Token {
        Token::new(TokenId::intern(id), id, value, TokenType::Color, layer)
    }

    fn connection(from: &str, to: &str) -> Connection {
        Connection {
            id: ConnectionId::generate(),
            from: TokenId::intern(from),
            to: TokenId::intern(to),
            from_socket: Some(SocketSide::Right),
            to_socket: Some(SocketSide::Left),
        }
    }

    fn sample() -> Scene {
        let mut scene = Scene::new();
        scene.add_token(token("m-blue", Layer::Base, "#4a90e2"));
        scene.add_token(token("m-primary", Layer::Semantic, "{base.m-blue}"));
        scene.add_token(token("m-button", Layer::Specific, "{semantic.m-primary}"));
        scene.set_position(TokenId::intern("m-blue"), Point::new(100.0, 100.0));
        scene.set_position(TokenId::intern("m-primary"), Point::new(400.0, 100.0));
        scene.set_position(TokenId::intern("m-button"), Point::new(700.0, 100.0));
        scene.add_connection(connection("m-blue", "m-primary"));
        scene.add_connection(connection("m-primary", "m-button"));
        scene
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#4A90E2").unwrap();
        assert_eq!(c.to_hex(), "#4A90E2");
        let short = Color::from_hex("#fff").unwrap();
        assert_eq!(short.to_hex(), "#FFFFFF");
        let alpha = Color::from_hex("FF000080").unwrap();
        assert!((alpha.a - 128.0 / 255.0).abs() < 0.01);
        assert!(Color::from_hex("#12").is_none());
        assert!(Color::from_hex("#GGGGGG").is_none());
    }

    #[test]
    fn layers_are_ordered() {
        assert!(Layer::Primitive < Layer::Base);
        assert!(Layer::Base < Layer::Semantic);
        assert!(Layer::Semantic < Layer::Specific);
        assert_eq!(Layer::parse("semantic"), Some(Layer::Semantic));
        assert_eq!(Layer::parse("nope"), None);
    }

    #[test]
    fn positions_keep_insertion_order_on_move() {
        let mut p = NodePositions::new();
        let a = TokenId::intern("order-a");
        let b = TokenId::intern("order-b");
        p.insert(a, Point::new(0.0, 0.0));
        p.insert(b, Point::new(1.0, 1.0));
        p.insert(a, Point::new(5.0, 5.0));
        assert_eq!(p.ids(), &[a, b]);
        assert_eq!(p.get(a), Some(Point::new(5.0, 5.0)));
        p.remove(a);
        assert_eq!(p.ids(), &[b]);
    }

    #[test]
    fn remove_node_cascades_connections() {
        let mut scene = sample();
        let blue = TokenId::intern("m-blue");
        assert!(scene.remove_node(blue));
        assert!(scene.position(blue).is_none());
        assert!(scene.connections.iter().all(|c| !c.touches(blue)));
        assert!(scene.token(blue).is_some(), "token stays in the store");
        assert_eq!(scene.connections.len(), 1);
    }

    #[test]
    fn remove_token_cascades_everything() {
        let mut scene = sample();
        let primary = TokenId::intern("m-primary");
        scene.add_group(TokenGroup {
            id: GroupId::intern("m-group"),
            name: "G".into(),
            token_ids: SmallVec::from_slice(&[primary, TokenId::intern("m-blue")]),
            collapsed: false,
            canvas_collapsed: false,
            position: None,
        });
        let removed = scene.remove_token(primary).unwrap();
        assert_eq!(removed.name, "m-primary");
        assert!(scene.token(primary).is_none());
        assert!(scene.position(primary).is_none());
        assert!(scene.connections.is_empty());
        assert_eq!(scene.groups[0].token_ids.as_slice(), &[TokenId::intern("m-blue")]);
    }

    #[test]
    fn add_token_replaces_same_id() {
        let mut scene = sample();
        scene.add_token(token("m-blue", Layer::Primitive, "#000"));
        assert_eq!(scene.all_tokens().filter(|t| t.name == "m-blue").count(), 1);
        assert_eq!(scene.token(TokenId::intern("m-blue")).unwrap().layer, Layer::Primitive);
    }

    #[test]
    fn group_membership_is_exclusive() {
        let mut scene = sample();
        let ids = |names: &[&str]| -> SmallVec<[TokenId; 4]> {
            names.iter().map(|n| TokenId::intern(n)).collect()
        };
        let g1 = TokenGroup {
            id: GroupId::intern("ex-g1"),
            name: "one".into(),
            token_ids: ids(&["m-blue", "m-primary"]),
            collapsed: false,
            canvas_collapsed: false,
            position: None,
        };
        let g2 = TokenGroup {
            id: GroupId::intern("ex-g2"),
            name: "two".into(),
            token_ids: ids(&["m-blue", "m-primary", "m-button"]),
            ..g1.clone()
        };
        scene.add_group(g1);
        scene.add_group(g2);
        assert_eq!(scene.groups.len(), 1, "emptied group is pruned");
        assert_eq!(scene.groups[0].id, GroupId::intern("ex-g2"));
    }

    #[test]
    fn group_bounds_from_members() {
        let scene = sample();
        let group = TokenGroup {
            id: GroupId::intern("gb"),
            name: "gb".into(),
            token_ids: [TokenId::intern("m-blue"), TokenId::intern("m-primary"), TokenId::intern("unplaced")]
                .into_iter()
                .collect(),
            collapsed: false,
            canvas_collapsed: false,
            position: None,
        };
        let b = scene.group_bounds(&group, SIZE).unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (100.0, 100.0, 560.0, 160.0));

        let empty = TokenGroup {
            token_ids: [TokenId::intern("unplaced")].into_iter().collect(),
            ..group
        };
        assert!(scene.group_bounds(&empty, SIZE).is_none());
    }

    #[test]
    fn export_shape_json() {
        let mut scene = Scene::new();
        scene.add_token(token("shape-a", Layer::Base, "#fff"));
        scene.set_position(TokenId::intern("shape-a"), Point::new(1.0, 2.0));
        let json: serde_json::Value = serde_json::from_str(&scene.capture().to_json()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "tokens": {
                    "base": [{
                        "id": "shape-a",
                        "name": "shape-a",
                        "value": "#fff",
                        "type": "color",
                        "layer": "base"
                    }]
                },
                "nodePositions": { "shape-a": { "x": 1.0, "y": 2.0 } },
                "connections": [],
                "tokenGroups": []
            })
        );
    }

    #[test]
    fn capture_restore_roundtrip() {
        let scene = sample();
        let restored = Scene::from_export(SceneExport::from_json(&scene.capture().to_json()).unwrap());
        assert_eq!(restored, scene);
    }

    #[test]
    fn msgpack_roundtrip() {
        let scene = sample();
        let bytes = scene.capture().to_msgpack().unwrap();
        let back = SceneExport::from_msgpack(&bytes).unwrap();
        assert_eq!(back, scene.capture());
        assert!(SceneExport::from_msgpack(&[0xc1]).is_err());
    }

    #[test]
    fn restore_prunes_dangling_entries() {
        let mut export = sample().capture();
        export
            .node_positions
            .insert(TokenId::intern("ghost"), Point::new(0.0, 0.0));
        export.node_positions.remove(TokenId::intern("m-button"));
        let scene = Scene::from_export(export);
        assert!(scene.position(TokenId::intern("ghost")).is_none());
        assert_eq!(scene.connections.len(), 1, "connection into unplaced node dropped");
    }
}
