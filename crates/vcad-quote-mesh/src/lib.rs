#![warn(missing_docs)]

//! Triangle meshes for vcad print quoting.
//!
//! Decodes binary and ASCII STL into an immutable [`TriangleMesh`] and
//! provides the measurements the quoting engine is built on: enclosed
//! volume, surface area, bounding box and center of mass.
//!
//! # Example
//!
//! ```ignore
//! use vcad_quote_mesh::{parse_stl, geometry};
//!
//! let bytes = std::fs::read("part.stl")?;
//! let mesh = parse_stl(&bytes)?;
//! println!("volume: {:.1} mm³", geometry::volume(&mesh));
//! ```

pub mod error;
pub mod geometry;
pub mod mesh;
pub mod primitives;
pub mod stl;

pub use error::{ParseError, Result};
pub use geometry::{
    bounding_box, center_of_mass, horizontal_area, surface_area, volume, BoundingBox, Dimensions,
};
pub use mesh::{Triangle, TriangleMesh};
pub use stl::{parse_stl, write_binary_stl};

/// A point in 3D space (mm).
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;
