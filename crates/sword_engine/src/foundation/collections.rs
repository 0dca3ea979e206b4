//! Specialized collection types

use slotmap::SlotMap;

use super::math::Transform;

slotmap::new_key_type! {
    /// Generation-checked handle to a transform owned by gameplay code.
    ///
    /// Colliders hold one of these instead of a reference, so a transform that
    /// has been removed simply stops resolving.
    pub struct TransformHandle;
}

/// Arena of externally owned transforms
pub type TransformArena = SlotMap<TransformHandle, Transform>;

/// Read access to transforms by handle.
///
/// The collision engine only ever needs to resolve handles, so anything that
/// owns a [`TransformArena`] (or wraps one) can drive it.
pub trait TransformSource {
    /// Resolve a handle, returning `None` once the transform has been removed
    fn transform(&self, handle: TransformHandle) -> Option<&Transform>;
}

impl TransformSource for TransformArena {
    fn transform(&self, handle: TransformHandle) -> Option<&Transform> {
        self.get(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_removed_transform_stops_resolving() {
        let mut arena = TransformArena::with_key();
        let handle = arena.insert(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        assert!(TransformSource::transform(&arena, handle).is_some());

        arena.remove(handle);
        let reused = arena.insert(Transform::identity());
        assert!(TransformSource::transform(&arena, handle).is_none());
        assert!(TransformSource::transform(&arena, reused).is_some());
    }
}
