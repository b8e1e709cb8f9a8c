/// V3D Core Library - View3D geometry ingestion and scene construction
///
/// This library reads the View3D vertex/surface input format into an
/// [`InputModel`] and turns its surfaces into renderable faces and edge
/// outlines for a render host.

pub mod control;
pub mod error;
pub mod model;
pub mod parser;
pub mod primitive;
pub mod scene;

// Re-export commonly used types
pub use control::ControlParams;
pub use error::{ControlError, Field, IndexKind, ModelError, ParseError};
pub use model::{ControlBlock, GeometryFormat, InputModel, InputModelBuilder, Surface, SurfaceKind, Vertex};
pub use parser::{parse_file, parse_input, parse_input_with_diagnostics, Diagnostic, ParseOutput};
pub use primitive::{create_edge_outline, create_face, EdgeOutline, Face, Primitive};
pub use scene::{build_primitives, PrimitiveId, RenderHost, Scene, SceneBuilder};
