//! Aorta Core - Part catalog, geometry, scene graph and interaction model
//!
//! This crate holds everything the viewer does that does not need a renderer:
//! - Part catalog (which STL files make up the model, their names and colors)
//! - STL decoding into triangle geometry
//! - The model group, its meshes and ray picking against them
//! - One-time normalization of the loaded group
//! - Pointer grab/release/squeeze gestures and hover reporting
//! - The `Session` context that ties them together

pub use glam;

pub mod bounds;
pub mod hover;
pub mod interaction;
pub mod load;
pub mod normalize;
pub mod parts;
pub mod raycast;
pub mod scene;
pub mod session;
pub mod stl;
pub mod transform;

pub use bounds::Aabb;
pub use hover::HoverReporter;
pub use interaction::{Grip, Hand, InteractionController, InteractionSettings, PointerEvent, SqueezeAction};
pub use load::{LoadCause, LoadError};
pub use normalize::{NormalizeError, Normalizer, DEFAULT_ANCHOR};
pub use parts::{CatalogError, PartCatalog, PartSpec, Rgb};
pub use raycast::Ray;
pub use scene::{Frame, Group, Hit, Material, Mesh, SceneError};
pub use session::{LoadOutcome, Session, SessionError, SessionSettings};
pub use stl::{Geometry, StlError};
pub use transform::{Pose, Transform};
