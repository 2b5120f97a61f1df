//! Complex-shape fallback store
//!
//! Tri-meshes, height fields, hulls and polylines have no fixed template, so
//! each one gets a dedicated renderable built once at registration. There is
//! exactly one renderable per handle, so transforms are written directly.

use super::data_structures::InstanceData;
use super::error::{InstancingError, InstancingResult};
use super::palette::{Color, PaletteBucket};
use crate::foundation::math::{Point3, Quat, Transform, Vec3};
use crate::physics::{ColliderHandle, ColliderShape};
use std::collections::HashMap;

/// Primitive topology of a fallback mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Every three indices form a triangle
    TriangleList,
    /// Every two indices form a line segment
    LineList,
}

/// Geometry of a dedicated renderable
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackGeometry {
    /// Vertex positions in collider space
    pub vertices: Vec<[f32; 3]>,
    /// Index buffer
    pub indices: Vec<u32>,
    /// How the index buffer is read
    pub topology: Topology,
}

impl FallbackGeometry {
    /// Build geometry for a complex shape
    ///
    /// Returns `None` for shapes drawn from an instance template or with no
    /// renderable representation, and for malformed height fields.
    pub fn build(shape: &ColliderShape) -> Option<Self> {
        match shape {
            ColliderShape::TriMesh { vertices, indices }
            | ColliderShape::ConvexPolyhedron { vertices, indices }
            | ColliderShape::RoundConvexPolyhedron { vertices, indices, .. } => Some(Self {
                vertices: flatten_points(vertices),
                indices: indices.iter().flatten().copied().collect(),
                topology: Topology::TriangleList,
            }),
            ColliderShape::Polyline { vertices, indices } => Some(Self {
                vertices: flatten_points(vertices),
                indices: indices.iter().flatten().copied().collect(),
                topology: Topology::LineList,
            }),
            ColliderShape::HeightField { heights, nrows, ncols, scale } => {
                height_field_mesh(heights, *nrows, *ncols, *scale)
            }
            _ => None,
        }
    }

    /// Number of primitives
    pub fn primitive_count(&self) -> usize {
        match self.topology {
            Topology::TriangleList => self.indices.len() / 3,
            Topology::LineList => self.indices.len() / 2,
        }
    }

    /// Vertex buffer as raw bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

fn flatten_points(points: &[Point3]) -> Vec<[f32; 3]> {
    points.iter().map(|p| [p.x, p.y, p.z]).collect()
}

/// Grid over the XZ plane centred on the origin, two triangles per cell
fn height_field_mesh(heights: &[f32], nrows: usize, ncols: usize, scale: Vec3) -> Option<FallbackGeometry> {
    if nrows < 2 || ncols < 2 || nrows.checked_mul(ncols) != Some(heights.len()) {
        return None;
    }

    let last_row = (nrows - 1) as f32;
    let last_col = (ncols - 1) as f32;
    let mut vertices = Vec::with_capacity(nrows * ncols);
    for row in 0..nrows {
        for col in 0..ncols {
            let x = (col as f32 / last_col - 0.5) * scale.x;
            let z = (row as f32 / last_row - 0.5) * scale.z;
            vertices.push([x, heights[row * ncols + col] * scale.y, z]);
        }
    }

    let mut indices = Vec::with_capacity((nrows - 1) * (ncols - 1) * 6);
    for row in 0..nrows - 1 {
        for col in 0..ncols - 1 {
            let i = u32::try_from(row * ncols + col).ok()?;
            let right = i.checked_add(1)?;
            let below = i.checked_add(u32::try_from(ncols).ok()?)?;
            let below_right = below.checked_add(1)?;
            indices.extend_from_slice(&[i, below, right, right, below, below_right]);
        }
    }

    Some(FallbackGeometry {
        vertices,
        indices,
        topology: Topology::TriangleList,
    })
}

/// Standalone renderable for one complex collider
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackRenderable {
    /// Owning collider
    pub handle: ColliderHandle,
    /// Mesh built at registration
    pub geometry: FallbackGeometry,
    /// Palette bucket drawn at registration
    pub bucket: PaletteBucket,
    /// Resolved color
    pub color: Color,
    /// Current pose
    pub transform: Transform,
    /// Model matrix for the current pose
    pub instance: InstanceData,
    /// Drawn with the highlight color while set
    pub highlighted: bool,
}

/// Map from collider handle to its dedicated renderable
#[derive(Debug, Default)]
pub struct FallbackStore {
    renderables: HashMap<ColliderHandle, FallbackRenderable>,
}

impl FallbackStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and store the renderable for a complex collider
    pub fn add_complex(
        &mut self,
        handle: ColliderHandle,
        shape: &ColliderShape,
        bucket: PaletteBucket,
        color: Color,
        transform: Transform,
    ) -> InstancingResult<()> {
        if self.renderables.contains_key(&handle) {
            return Err(InstancingError::DuplicateHandle(handle));
        }

        let geometry = FallbackGeometry::build(shape).ok_or(InstancingError::UnsupportedShape {
            handle,
            shape_type: shape.shape_type(),
        })?;

        log::trace!(
            "Built fallback renderable for {} ({} primitives, color {})",
            handle,
            geometry.primitive_count(),
            color
        );

        self.renderables.insert(
            handle,
            FallbackRenderable {
                handle,
                geometry,
                bucket,
                color,
                transform,
                instance: InstanceData::from_transform(&transform),
                highlighted: false,
            },
        );
        Ok(())
    }

    /// Detach and return the renderable of a collider
    pub fn remove(&mut self, handle: ColliderHandle) -> InstancingResult<FallbackRenderable> {
        self.renderables
            .remove(&handle)
            .ok_or(InstancingError::UnknownHandle(handle))
    }

    /// Move a renderable
    pub fn update_transform(&mut self, handle: ColliderHandle, position: Vec3, rotation: Quat) -> InstancingResult<()> {
        let renderable = self
            .renderables
            .get_mut(&handle)
            .ok_or(InstancingError::UnknownHandle(handle))?;

        renderable.transform.position = position;
        renderable.transform.rotation = rotation;
        renderable.instance = InstanceData::from_transform(&renderable.transform);
        Ok(())
    }

    /// Set or clear the highlight flag of a renderable
    pub fn set_highlighted(&mut self, handle: ColliderHandle, highlighted: bool) -> InstancingResult<()> {
        let renderable = self
            .renderables
            .get_mut(&handle)
            .ok_or(InstancingError::UnknownHandle(handle))?;
        renderable.highlighted = highlighted;
        Ok(())
    }

    /// Whether a collider has a renderable here
    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.renderables.contains_key(&handle)
    }

    /// Renderable of a collider
    pub fn get(&self, handle: ColliderHandle) -> Option<&FallbackRenderable> {
        self.renderables.get(&handle)
    }

    /// Every renderable, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &FallbackRenderable> {
        self.renderables.values()
    }

    /// Number of renderables
    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    /// No renderables
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }

    /// Drop every renderable
    pub fn clear(&mut self) {
        self.renderables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::instancing::palette::BodyCategory;
    use approx::assert_relative_eq;

    fn bucket() -> PaletteBucket {
        PaletteBucket::new(BodyCategory::Fixed, 0)
    }

    fn tetrahedron() -> ColliderShape {
        ColliderShape::TriMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            indices: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        }
    }

    #[test]
    fn test_trimesh_geometry() {
        let geometry = FallbackGeometry::build(&tetrahedron()).expect("Should build trimesh");
        assert_eq!(geometry.vertices.len(), 4);
        assert_eq!(geometry.indices.len(), 12);
        assert_eq!(geometry.primitive_count(), 4);
        assert_eq!(geometry.vertex_bytes().len(), 4 * 12);
    }

    #[test]
    fn test_height_field_grid() {
        let shape = ColliderShape::HeightField {
            heights: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            nrows: 2,
            ncols: 3,
            scale: Vec3::new(4.0, 2.0, 10.0),
        };
        let geometry = FallbackGeometry::build(&shape).expect("Should build height field");

        assert_eq!(geometry.vertices.len(), 6);
        // (nrows - 1) * (ncols - 1) cells, two triangles each
        assert_eq!(geometry.primitive_count(), 4);
        assert_eq!(geometry.vertices[0], [-2.0, 0.0, -5.0]);
        assert_relative_eq!(geometry.vertices[5][0], 2.0);
        assert_relative_eq!(geometry.vertices[5][1], 10.0);
        assert_relative_eq!(geometry.vertices[5][2], 5.0);
        assert!(geometry.indices.iter().all(|&i| (i as usize) < geometry.vertices.len()));
    }

    #[test]
    fn test_malformed_height_field_is_rejected() {
        let shape = ColliderShape::HeightField {
            heights: vec![0.0; 3],
            nrows: 2,
            ncols: 2,
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        assert!(FallbackGeometry::build(&shape).is_none());

        let overflowing = ColliderShape::HeightField {
            heights: vec![0.0; 4],
            nrows: usize::MAX,
            ncols: 2,
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        assert!(FallbackGeometry::build(&overflowing).is_none());
    }

    #[test]
    fn test_polyline_uses_lines() {
        let shape = ColliderShape::Polyline {
            vertices: vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            indices: vec![[0, 1], [1, 2]],
        };
        let geometry = FallbackGeometry::build(&shape).expect("Should build polyline");
        assert_eq!(geometry.topology, Topology::LineList);
        assert_eq!(geometry.primitive_count(), 2);
    }

    #[test]
    fn test_store_lifecycle() {
        let mut store = FallbackStore::new();
        let handle = ColliderHandle::from_raw(3);

        store
            .add_complex(handle, &tetrahedron(), bucket(), Color(0x123456), Transform::identity())
            .expect("Should add");
        assert_eq!(
            store.add_complex(handle, &tetrahedron(), bucket(), Color(0x123456), Transform::identity()),
            Err(InstancingError::DuplicateHandle(handle))
        );

        store
            .update_transform(handle, Vec3::new(0.0, 3.0, 0.0), Quat::identity())
            .expect("Should update");
        let renderable = store.get(handle).expect("Should exist");
        assert_eq!(renderable.instance.translation(), Vec3::new(0.0, 3.0, 0.0));

        let removed = store.remove(handle).expect("Should remove");
        assert_eq!(removed.color, Color(0x123456));
        assert!(store.is_empty());
        assert_eq!(store.remove(handle), Err(InstancingError::UnknownHandle(handle)));
    }

    #[test]
    fn test_primitive_shape_is_not_a_fallback() {
        let mut store = FallbackStore::new();
        let handle = ColliderHandle::from_raw(1);
        let result = store.add_complex(handle, &ColliderShape::ball(1.0), bucket(), Color(0), Transform::identity());
        assert!(matches!(result, Err(InstancingError::UnsupportedShape { .. })));
        assert!(!store.contains(handle));
    }
}
