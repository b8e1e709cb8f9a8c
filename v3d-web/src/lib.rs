/// V3D Web - WASM bindings for a browser-side viewer
///
/// Parses View3D input text and exposes each surface's face triangles and
/// edge outline as flat `Float32Array`s, ready to be uploaded to a WebGL
/// scene by the page.

use log::warn;
use v3d_core::{parse_input_with_diagnostics, EdgeOutline, Face, InputModel, Scene, SceneBuilder};
use wasm_bindgen::prelude::*;

/// Faces and outlines for one loaded input file, indexed by surface order
#[wasm_bindgen]
#[derive(Default)]
pub struct WebScene {
    model: InputModel,
    scene: Scene,
    builder: SceneBuilder,
    faces: Vec<Face>,
    outlines: Vec<EdgeOutline>,
}

#[wasm_bindgen]
impl WebScene {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebScene {
        WebScene::default()
    }

    /// Replace the current scene with the surfaces of `text`.
    ///
    /// Returns the number of surfaces loaded. On error the previous scene is
    /// left in place.
    pub fn load(&mut self, text: &str) -> Result<usize, JsValue> {
        let output = parse_input_with_diagnostics(text).map_err(to_js)?;
        for diagnostic in &output.diagnostics {
            let message = format!("line {}: {}", diagnostic.line, diagnostic.message);
            warn!("{}", message);
            web_sys::console::warn_1(&JsValue::from_str(&message));
        }
        let model = output.model;
        model.validate().map_err(to_js)?;

        self.clear();
        self.builder.add_model(&mut self.scene, &model).map_err(to_js)?;
        for primitive in self.scene.primitives() {
            if let Some(face) = primitive.as_face() {
                self.faces.push(face.clone());
            } else if let Some(outline) = primitive.as_outline() {
                self.outlines.push(outline.clone());
            }
        }
        self.model = model;
        Ok(self.faces.len())
    }

    /// Release every primitive of the current model
    pub fn clear(&mut self) {
        self.builder.clear(&mut self.scene);
        self.faces.clear();
        self.outlines.clear();
        self.model = InputModel::default();
    }

    pub fn title(&self) -> Option<String> {
        self.model.title().map(str::to_string)
    }

    pub fn surface_count(&self) -> usize {
        self.faces.len()
    }

    pub fn surface_key(&self, index: usize) -> Option<u32> {
        self.faces.get(index).map(|f| f.surface)
    }

    pub fn surface_name(&self, index: usize) -> Option<String> {
        let key = self.surface_key(index)?;
        self.model.surface(key).map(|s| s.name.clone())
    }

    pub fn emissivity(&self, index: usize) -> Option<f64> {
        self.faces.get(index).map(|f| f.emissivity)
    }

    /// Triangle corners as x, y, z triples, 9 floats per triangle
    pub fn face_positions(&self, index: usize) -> Vec<f32> {
        self.faces
            .get(index)
            .map(|face| {
                face.triangle_positions()
                    .flat_map(|tri| tri.into_iter())
                    .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Face normal as x, y, z
    pub fn face_normal(&self, index: usize) -> Vec<f32> {
        self.faces
            .get(index)
            .map(|face| vec![face.normal.x as f32, face.normal.y as f32, face.normal.z as f32])
            .unwrap_or_default()
    }

    /// Line segment endpoints as x, y, z triples, 6 floats per segment
    pub fn edge_positions(&self, index: usize) -> Vec<f32> {
        self.outlines
            .get(index)
            .map(|outline| {
                outline
                    .segments()
                    .flat_map(|(a, b)| [a, b])
                    .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "T Example\nV 1 0 0 0\nV 2 1 0 0\nV 3 1 1 0\nV 4 0 1 0\nS 1 1 2 3 4 0 0 0.9 floor\nE\n";

    #[test]
    fn test_load_exposes_buffers() {
        let mut scene = WebScene::new();
        assert_eq!(scene.load(EXAMPLE).unwrap(), 1);
        assert_eq!(scene.title().as_deref(), Some("Example"));
        assert_eq!(scene.surface_name(0).as_deref(), Some("floor"));
        assert_eq!(scene.face_positions(0).len(), 2 * 9);
        assert_eq!(scene.edge_positions(0).len(), 4 * 6);
        assert_eq!(scene.face_normal(0), vec![0.0, 0.0, 1.0]);
        assert!(scene.face_positions(1).is_empty());
    }

    #[test]
    fn test_reload_replaces_scene() {
        let mut scene = WebScene::new();
        scene.load(EXAMPLE).unwrap();
        scene.load(EXAMPLE).unwrap();
        assert_eq!(scene.surface_count(), 1);
        assert_eq!(scene.scene.len(), 2);
        scene.clear();
        assert_eq!(scene.surface_count(), 0);
        assert!(scene.scene.is_empty());
    }
}
