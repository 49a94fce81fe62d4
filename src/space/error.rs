//! Space Errors

use super::hitbox::HitboxId;
use super::object::ObjectId;

/// Recoverable misuse of the space API.
///
/// Precondition violations that indicate a programming error (non-positive
/// cell sizes, inverted query rectangles, leader cycles found mid-move)
/// panic instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpaceError {
    /// Object id is stale or was never issued.
    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectId),

    /// Hitbox id is stale or was never issued.
    #[error("Unknown hitbox {0:?}")]
    UnknownHitbox(HitboxId),

    /// Hitbox already has a parent.
    #[error("Hitbox {0:?} already has a parent")]
    HitboxHasParent(HitboxId),

    /// Hitbox has no parent to detach from.
    #[error("Hitbox {0:?} has no parent")]
    HitboxHasNoParent(HitboxId),

    /// Hitbox is held by an object and cannot be reused or restructured.
    #[error("Hitbox {0:?} is owned by an object")]
    HitboxOwned(HitboxId),

    /// Hitbox is a component of a composite.
    #[error("Hitbox {0:?} is a composite component")]
    HitboxIsComponent(HitboxId),

    /// Components cannot hold roles of their own.
    #[error("Hitbox {0:?} holds grid roles and cannot become a component")]
    ComponentCannotHoldRoles(HitboxId),

    /// Operation needs a composite hitbox.
    #[error("Hitbox {0:?} is not a composite")]
    NotComposite(HitboxId),

    /// Operation needs a primitive hitbox.
    #[error("Hitbox {0:?} is a composite")]
    NotPrimitive(HitboxId),

    /// Component name already taken.
    #[error("Duplicate component: {0}")]
    DuplicateComponent(String),

    /// Component name not present.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Link would make a hitbox its own ancestor, or a leader its own follower.
    #[error("Link would create a cycle")]
    WouldCreateCycle,

    /// Operation needs a mobile object.
    #[error("Object {0:?} is not mobile")]
    NotMobile(ObjectId),

    /// Operation needs a solid hitbox.
    #[error("Object {0:?} has no solid hitbox")]
    NoSolidHitbox(ObjectId),

    /// Operation needs a detached object.
    #[error("Object {0:?} is attached to the space")]
    ObjectAttached(ObjectId),
}
