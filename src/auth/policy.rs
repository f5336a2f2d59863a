//! Ownership rules for user-owned resources.

use uuid::Uuid;

use crate::scripts::repo_types::Script;

/// A mutation is allowed only when the requester owns the resource.
/// Resources without an owner can't be modified through the API.
pub fn can_modify(resource_owner_id: Option<Uuid>, requester_id: Uuid) -> bool {
    resource_owner_id == Some(requester_id)
}

/// Public scripts are visible to everyone, private ones only to their owner.
pub fn can_view(script: &Script, requester_id: Option<Uuid>) -> bool {
    script.is_public || requester_id.is_some_and(|id| can_modify(script.user_id, id))
}
