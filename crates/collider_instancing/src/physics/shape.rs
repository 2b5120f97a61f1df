//! Collider shape definitions
//!
//! Mirrors the shape catalogue of the physics engine: primitive shapes carry
//! their dimensions, complex shapes carry the geometry needed to build a
//! dedicated renderable.

use crate::foundation::math::{Point3, Vec3};
use std::fmt;

/// Shape discriminant as reported by the physics engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    /// Sphere
    Ball,
    /// Box
    Cuboid,
    /// Y-aligned capsule
    Capsule,
    /// Line segment
    Segment,
    /// Single triangle
    Triangle,
    /// Triangle mesh
    TriMesh,
    /// Connected line segments
    Polyline,
    /// Infinite half-space
    HalfSpace,
    /// Grid of heights
    HeightField,
    /// Several shapes attached to one collider
    Compound,
    /// Convex hull
    ConvexPolyhedron,
    /// Y-aligned cylinder
    Cylinder,
    /// Y-aligned cone
    Cone,
    /// Box with rounded edges
    RoundCuboid,
    /// Triangle with rounded edges
    RoundTriangle,
    /// Cylinder with rounded edges
    RoundCylinder,
    /// Cone with rounded edges
    RoundCone,
    /// Convex hull with rounded edges
    RoundConvexPolyhedron,
    /// Engine extension shape with an engine-specific id
    Custom(u32),
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(id) => write!(f, "Custom({id})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Collider shape with its dimensions or geometry
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    /// Sphere of the given radius
    Ball {
        /// Radius
        radius: f32,
    },
    /// Box with the given half-extents
    Cuboid {
        /// Half-extents along each axis
        half_extents: Vec3,
    },
    /// Box with rounded edges
    RoundCuboid {
        /// Half-extents of the inner box
        half_extents: Vec3,
        /// Rounding radius
        border_radius: f32,
    },
    /// Y-aligned capsule
    Capsule {
        /// Half the length of the inner segment
        half_height: f32,
        /// Radius
        radius: f32,
    },
    /// Y-aligned cylinder
    Cylinder {
        /// Half height
        half_height: f32,
        /// Radius
        radius: f32,
    },
    /// Y-aligned cylinder with rounded edges
    RoundCylinder {
        /// Half height of the inner cylinder
        half_height: f32,
        /// Radius of the inner cylinder
        radius: f32,
        /// Rounding radius
        border_radius: f32,
    },
    /// Y-aligned cone
    Cone {
        /// Half height
        half_height: f32,
        /// Base radius
        radius: f32,
    },
    /// Y-aligned cone with rounded edges
    RoundCone {
        /// Half height of the inner cone
        half_height: f32,
        /// Base radius of the inner cone
        radius: f32,
        /// Rounding radius
        border_radius: f32,
    },
    /// Triangle mesh
    TriMesh {
        /// Vertex positions
        vertices: Vec<Point3>,
        /// Triangle vertex indices
        indices: Vec<[u32; 3]>,
    },
    /// Convex hull, already triangulated by the engine
    ConvexPolyhedron {
        /// Hull vertices
        vertices: Vec<Point3>,
        /// Hull faces
        indices: Vec<[u32; 3]>,
    },
    /// Convex hull with rounded edges (rendered without the rounding)
    RoundConvexPolyhedron {
        /// Hull vertices
        vertices: Vec<Point3>,
        /// Hull faces
        indices: Vec<[u32; 3]>,
        /// Rounding radius
        border_radius: f32,
    },
    /// Height field over the XZ plane
    HeightField {
        /// Row-major heights, `nrows * ncols` entries
        heights: Vec<f32>,
        /// Number of rows (along Z)
        nrows: usize,
        /// Number of columns (along X)
        ncols: usize,
        /// Extent along X, height multiplier, extent along Z
        scale: Vec3,
    },
    /// Connected line segments
    Polyline {
        /// Vertex positions
        vertices: Vec<Point3>,
        /// Segment vertex indices
        indices: Vec<[u32; 2]>,
    },
    /// Line segment
    Segment {
        /// First endpoint
        a: Point3,
        /// Second endpoint
        b: Point3,
    },
    /// Single triangle
    Triangle {
        /// Corners
        points: [Point3; 3],
    },
    /// Infinite half-space
    HalfSpace {
        /// Outward normal
        normal: Vec3,
    },
    /// Compound of several sub-shapes
    Compound {
        /// Number of sub-shapes
        parts: usize,
    },
    /// Engine-specific shape
    Custom {
        /// Engine shape id
        id: u32,
    },
}

impl ColliderShape {
    /// Discriminant of this shape
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Ball { .. } => ShapeType::Ball,
            Self::Cuboid { .. } => ShapeType::Cuboid,
            Self::RoundCuboid { .. } => ShapeType::RoundCuboid,
            Self::Capsule { .. } => ShapeType::Capsule,
            Self::Cylinder { .. } => ShapeType::Cylinder,
            Self::RoundCylinder { .. } => ShapeType::RoundCylinder,
            Self::Cone { .. } => ShapeType::Cone,
            Self::RoundCone { .. } => ShapeType::RoundCone,
            Self::TriMesh { .. } => ShapeType::TriMesh,
            Self::ConvexPolyhedron { .. } => ShapeType::ConvexPolyhedron,
            Self::RoundConvexPolyhedron { .. } => ShapeType::RoundConvexPolyhedron,
            Self::HeightField { .. } => ShapeType::HeightField,
            Self::Polyline { .. } => ShapeType::Polyline,
            Self::Segment { .. } => ShapeType::Segment,
            Self::Triangle { .. } => ShapeType::Triangle,
            Self::HalfSpace { .. } => ShapeType::HalfSpace,
            Self::Compound { .. } => ShapeType::Compound,
            Self::Custom { id } => ShapeType::Custom(*id),
        }
    }

    /// Convenience constructor for a box
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Cuboid { half_extents: Vec3::new(hx, hy, hz) }
    }

    /// Convenience constructor for a sphere
    pub fn ball(radius: f32) -> Self {
        Self::Ball { radius }
    }
}
