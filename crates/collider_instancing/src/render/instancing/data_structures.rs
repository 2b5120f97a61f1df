//! Instance Data Structures
//!
//! GPU-facing layout of one instance plus the CPU-side records the registry
//! keeps per collider.
//!
//! # GPU Memory Layout
//!
//! [`InstanceData`] is a single column-major model matrix (64 bytes). Color is
//! a per-pool uniform, so it is not repeated per instance.

use super::palette::PaletteBucket;
use super::shape_kind::ShapeKind;
use crate::foundation::math::{to_column_major, Transform, Vec3};
use bytemuck::{Pod, Zeroable};
use slotmap::new_key_type;

new_key_type! {
    /// Stable identity of an instance pool inside the registry
    pub struct PoolId;
}

/// GPU-optimized instance data structure
///
/// Must match the vertex shader's per-instance attribute layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Model transformation matrix (world space), column-major
    pub model_matrix: [[f32; 4]; 4],
}

impl InstanceData {
    /// Instance data for a transform
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            model_matrix: to_column_major(&transform.to_matrix()),
        }
    }

    /// World-space translation stored in the matrix
    pub fn translation(&self) -> Vec3 {
        let column = self.model_matrix[3];
        Vec3::new(column[0], column[1], column[2])
    }
}

/// Identifies one instance pool: a shape template drawn in one color
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolKey {
    /// Template mesh
    pub shape_kind: ShapeKind,
    /// Color bucket
    pub bucket: PaletteBucket,
}

impl PoolKey {
    /// Create a pool key
    pub const fn new(shape_kind: ShapeKind, bucket: PaletteBucket) -> Self {
        Self { shape_kind, bucket }
    }
}

impl std::fmt::Display for PoolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.shape_kind, self.bucket)
    }
}

/// Per-collider record held by the registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceDescriptor {
    /// Template mesh
    pub shape_kind: ShapeKind,
    /// Color bucket
    pub bucket: PaletteBucket,
    /// Owning pool
    pub pool: PoolId,
    /// Current slot in the owning pool; moves when other colliders are removed
    pub slot: usize,
    /// Template scale fixed at registration
    pub scale: Vec3,
    /// Mirrored into the highlight slot
    pub highlighted: bool,
}

impl InstanceDescriptor {
    /// Key of the owning pool
    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(self.shape_kind, self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;

    #[test]
    fn test_instance_data_is_one_matrix() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 64);
    }

    #[test]
    fn test_instance_data_translation() {
        let transform = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::identity(), Vec3::new(2.0, 2.0, 2.0));
        let data = InstanceData::from_transform(&transform);
        assert_eq!(data.translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(data.model_matrix[0][0], 2.0);

        let bytes: &[u8] = bytemuck::bytes_of(&data);
        assert_eq!(bytes.len(), 64);
    }
}
