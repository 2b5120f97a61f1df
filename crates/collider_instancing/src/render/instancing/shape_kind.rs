//! Shape Kind Definitions
//!
//! Each renderable shape kind owns one instanced template mesh and therefore
//! one pool per palette bucket. Shapes that cannot be expressed as a scaled
//! template fall into [`ShapeKind::Complex`] and get a dedicated renderable.

use crate::foundation::math::Vec3;
use crate::physics::{ColliderShape, ShapeType};

/// Renderable category of a collider shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeKind {
    /// Unit cube template
    Box,
    /// Unit sphere template
    Sphere,
    /// Unit cylinder template
    Cylinder,
    /// Unit cone template
    Cone,
    /// Unit capsule template
    Capsule,
    /// Meshes, height fields and hulls, rendered without instancing
    Complex,
}

impl ShapeKind {
    /// Whether this kind is drawn from an instance pool
    pub fn is_instanced(self) -> bool {
        self != ShapeKind::Complex
    }

    /// Get the human-readable name for this shape kind
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Box => "Box",
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::Cone => "Cone",
            ShapeKind::Capsule => "Capsule",
            ShapeKind::Complex => "Complex",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Map a shape type to its renderable kind
///
/// Returns the shape type back as the error for shapes with no renderable
/// representation (segments, triangles, half-spaces, compounds, custom
/// shapes). Callers log and skip those.
pub fn classify(shape_type: ShapeType) -> Result<ShapeKind, ShapeType> {
    match shape_type {
        ShapeType::Cuboid | ShapeType::RoundCuboid => Ok(ShapeKind::Box),
        ShapeType::Ball => Ok(ShapeKind::Sphere),
        ShapeType::Cylinder | ShapeType::RoundCylinder => Ok(ShapeKind::Cylinder),
        ShapeType::Cone | ShapeType::RoundCone => Ok(ShapeKind::Cone),
        ShapeType::Capsule => Ok(ShapeKind::Capsule),
        ShapeType::TriMesh
        | ShapeType::HeightField
        | ShapeType::ConvexPolyhedron
        | ShapeType::RoundConvexPolyhedron
        | ShapeType::Polyline => Ok(ShapeKind::Complex),
        ShapeType::Segment
        | ShapeType::Triangle
        | ShapeType::RoundTriangle
        | ShapeType::HalfSpace
        | ShapeType::Compound
        | ShapeType::Custom(_) => Err(shape_type),
    }
}

/// Scale applied to the unit template of an instanced shape
///
/// `None` for shapes that are not drawn from a template.
pub fn instance_scale(shape: &ColliderShape) -> Option<Vec3> {
    let scale = match *shape {
        ColliderShape::Cuboid { half_extents } => half_extents * 2.0,
        ColliderShape::RoundCuboid { half_extents, border_radius } => {
            (half_extents + Vec3::repeat(border_radius)) * 2.0
        }
        ColliderShape::Ball { radius } => Vec3::repeat(radius),
        ColliderShape::Cylinder { half_height, radius } | ColliderShape::Cone { half_height, radius } => {
            Vec3::new(radius, half_height * 2.0, radius)
        }
        ColliderShape::RoundCylinder { half_height, radius, border_radius }
        | ColliderShape::RoundCone { half_height, radius, border_radius } => {
            Vec3::new(radius + border_radius, (half_height + border_radius) * 2.0, radius + border_radius)
        }
        ColliderShape::Capsule { half_height, radius } => Vec3::new(radius, half_height, radius),
        _ => return None,
    };
    Some(scale)
}
