//! Conversion of positions and rotations between world space and the local
//! space of an entity's parent.

use bevy::prelude::*;
use thiserror::Error;

use crate::math::sanitize_rotation;
use crate::store::EntityStore;

/// Determinant magnitude below which a parent matrix is treated as singular.
const MIN_DETERMINANT: f32 = 1e-9;

/// Failure to build a parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FrameError {
    /// The parent's world matrix has a zero scale (or is not finite) and
    /// cannot be inverted.
    #[error("parent {parent:?} has a non-invertible world matrix")]
    DegenerateParent {
        /// The offending parent.
        parent: Entity,
    },
}

#[derive(Debug, Clone, Copy)]
struct ParentFrame {
    matrix: Mat4,
    inverse: Mat4,
    rotation: Quat,
}

/// World⇄local converter for one entity, resolved against its current parent.
///
/// Build a fresh converter for every write; parents may move between
/// updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameConverter {
    parent: Option<ParentFrame>,
}

impl FrameConverter {
    /// Converter for an entity without a parent: local space is world space.
    pub fn root() -> Self {
        Self { parent: None }
    }

    /// Converter for a child of `parent`, whose world matrix and rotation are given.
    pub fn with_parent(parent: Entity, matrix: Mat4, rotation: Quat) -> Result<Self, FrameError> {
        let determinant = matrix.determinant();
        if !matrix.is_finite() || !determinant.is_finite() || determinant.abs() < MIN_DETERMINANT {
            return Err(FrameError::DegenerateParent { parent });
        }
        Ok(Self {
            parent: Some(ParentFrame {
                matrix,
                inverse: matrix.inverse(),
                rotation: sanitize_rotation(rotation),
            }),
        })
    }

    /// Resolves the converter for `entity` from the store's current state.
    pub fn resolve<S>(store: &S, entity: Entity) -> Result<Self, FrameError>
    where
        S: EntityStore + ?Sized,
    {
        match store.parent(entity) {
            Some(parent) => Self::with_parent(
                parent,
                store.world_matrix(parent),
                store.world_rotation(parent),
            ),
            None => Ok(Self::root()),
        }
    }

    /// Like [`FrameConverter::resolve`], but a degenerate parent degrades to
    /// world space for this conversion and is logged.
    pub fn resolve_or_root<S>(store: &S, entity: Entity) -> Self
    where
        S: EntityStore + ?Sized,
    {
        Self::resolve(store, entity).unwrap_or_else(|err| {
            warn!("{err}; writing {entity:?} in world space for this update");
            Self::root()
        })
    }

    /// Whether this converter has a parent frame.
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// World position to parent-local position.
    pub fn to_local_position(&self, world: Vec3) -> Vec3 {
        match &self.parent {
            Some(parent) => parent.inverse.transform_point3(world),
            None => world,
        }
    }

    /// Parent-local position to world position.
    pub fn to_world_position(&self, local: Vec3) -> Vec3 {
        match &self.parent {
            Some(parent) => parent.matrix.transform_point3(local),
            None => local,
        }
    }

    /// World rotation to parent-local rotation, normalized.
    pub fn to_local_rotation(&self, world: Quat) -> Quat {
        let world = sanitize_rotation(world);
        match &self.parent {
            Some(parent) => sanitize_rotation(parent.rotation.inverse() * world),
            None => world,
        }
    }

    /// Parent-local rotation to world rotation, normalized.
    pub fn to_world_rotation(&self, local: Quat) -> Quat {
        let local = sanitize_rotation(local);
        match &self.parent {
            Some(parent) => sanitize_rotation(parent.rotation * local),
            None => local,
        }
    }
}
