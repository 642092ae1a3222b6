//! Identifiers for animators, keyframes and scene nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Allocate a fresh random id.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[inline]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identifies an animator inside one animation.
    AnimatorId
);
uuid_id!(
    /// Identifies a keyframe; also keys particle emitters and sound cooldowns.
    KeyframeId
);
uuid_id!(
    /// Identifies a scene-graph node (bone, null object, locator).
    NodeId
);

impl From<NodeId> for AnimatorId {
    /// Bone and null-object animators share the id of the node they drive.
    fn from(node: NodeId) -> Self {
        Self(node.0)
    }
}
