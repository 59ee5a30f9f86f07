//! Group aggregation: create, collapse, move, ungroup, delete.
//!
//! A group has no geometry of its own. Its frame is the padded bounding box
//! of its placed members and every move goes through the member positions.

use std::fmt;
use tc_core::geometry::{Point, Size, centroid};
use tc_core::id::{GroupId, TokenId};
use tc_core::model::{CollapseScope, Scene, TokenGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupError {
    /// Fewer than two distinct known tokens.
    TooFewMembers,
    BlankName,
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::TooFewMembers => f.write_str("a group needs at least two tokens"),
            GroupError::BlankName => f.write_str("a group needs a name"),
        }
    }
}

impl std::error::Error for GroupError {}

/// Deduplicated known members in first-seen order.
///
/// # Errors
/// `BlankName` for an empty or whitespace name, `TooFewMembers` when fewer
/// than two distinct tokens remain.
pub fn validate_group(scene: &Scene, members: &[TokenId], name: &str) -> Result<Vec<TokenId>, GroupError> {
    if name.trim().is_empty() {
        return Err(GroupError::BlankName);
    }
    let mut distinct: Vec<TokenId> = Vec::with_capacity(members.len());
    for id in members {
        if scene.token(*id).is_some() && !distinct.contains(id) {
            distinct.push(*id);
        }
    }
    if distinct.len() < 2 {
        return Err(GroupError::TooFewMembers);
    }
    Ok(distinct)
}

/// Create a group of `members` named `name` with the given id.
///
/// Members leave any group they already belonged to. The position hint is
/// the centroid of the placed members.
///
/// # Errors
/// See [`validate_group`].
pub fn create_group(
    scene: &mut Scene,
    id: GroupId,
    members: &[TokenId],
    name: &str,
) -> Result<TokenGroup, GroupError> {
    let members = validate_group(scene, members, name)?;
    let group = TokenGroup {
        id,
        name: name.trim().to_string(),
        position: centroid(members.iter().filter_map(|m| scene.position(*m))),
        token_ids: members.into_iter().collect(),
        collapsed: false,
        canvas_collapsed: false,
    };
    scene.add_group(group.clone());
    log::debug!("created group {} with {} members", group.id, group.token_ids.len());
    Ok(group)
}

/// Flip one collapse flag. Returns the new value, or `None` for an
/// unknown group.
pub fn toggle_collapse(scene: &mut Scene, id: GroupId, scope: CollapseScope) -> Option<bool> {
    let group = scene.group_mut(id)?;
    let flag = match scope {
        CollapseScope::Sidebar => &mut group.collapsed,
        CollapseScope::Canvas => &mut group.canvas_collapsed,
    };
    *flag = !*flag;
    Some(*flag)
}

/// Move every placed member by `delta`.
pub fn move_group_by(scene: &mut Scene, id: GroupId, delta: Point) -> bool {
    let Some(group) = scene.group(id) else {
        return false;
    };
    let moves: Vec<(TokenId, Point)> = group
        .token_ids
        .iter()
        .filter_map(|m| scene.position(*m).map(|p| (*m, p + delta)))
        .collect();
    if moves.is_empty() {
        return false;
    }
    for (member, pos) in moves {
        scene.set_position(member, pos);
    }
    true
}

/// Move the group so its member bounding box starts at `target_min`.
pub fn drag_group_to(scene: &mut Scene, id: GroupId, target_min: Point, size: Size) -> bool {
    let Some(bounds) = scene.group(id).and_then(|g| scene.group_bounds(g, size)) else {
        return false;
    };
    move_group_by(scene, id, target_min - bounds.min())
}

/// Dissolve the group record. Members stay where they are.
pub fn ungroup(scene: &mut Scene, id: GroupId) -> Option<TokenGroup> {
    scene.remove_group(id)
}

/// Remove the group, its members' nodes, and every connection touching a
/// member. Tokens stay in the store.
pub fn delete_group(scene: &mut Scene, id: GroupId) -> Option<TokenGroup> {
    let group = scene.remove_group(id)?;
    for member in &group.token_ids {
        scene.remove_node(*member);
    }
    Some(group)
}
