/// Scene construction: one face and one edge outline per surface
use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::ModelError;
use crate::model::{InputModel, Surface};
use crate::primitive::{create_edge_outline, create_face, Face, Primitive};

/// Identifier a render host uses to track a primitive it was given
pub type PrimitiveId = u64;

/// The consumer side of scene construction
pub trait RenderHost {
    fn add_to_scene(&mut self, id: PrimitiveId, primitive: &Primitive);
    fn remove_from_scene(&mut self, id: PrimitiveId);
}

/// In-memory render host, iterated in the order primitives were added
#[derive(Debug, Clone, Default)]
pub struct Scene {
    primitives: BTreeMap<PrimitiveId, Primitive>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.values()
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.primitives.values().filter_map(Primitive::as_face)
    }
}

impl RenderHost for Scene {
    fn add_to_scene(&mut self, id: PrimitiveId, primitive: &Primitive) {
        self.primitives.insert(id, primitive.clone());
    }

    fn remove_from_scene(&mut self, id: PrimitiveId) {
        self.primitives.remove(&id);
    }
}

/// Build the face and outline for a single surface
pub fn surface_primitives(model: &InputModel, surface: &Surface) -> Result<[Primitive; 2], ModelError> {
    let positions = model.resolve(surface)?;
    let face = create_face(surface, positions);
    if face.is_degenerate() {
        warn!("surface {} ('{}') has zero area", surface.key, surface.name);
    }
    let outline = create_edge_outline(&face);
    Ok([Primitive::Face(face), Primitive::Outline(outline)])
}

/// Build every primitive for a model, in surface input order.
///
/// Fails on the first surface that references a missing vertex.
pub fn build_primitives(model: &InputModel) -> Result<Vec<Primitive>, ModelError> {
    let mut primitives = Vec::with_capacity(model.surfaces().len() * 2);
    for surface in model.surfaces() {
        primitives.extend(surface_primitives(model, surface)?);
    }
    Ok(primitives)
}

/// Tracks the primitives handed to a render host so they can be released together
#[derive(Debug, Default)]
pub struct SceneBuilder {
    added: Vec<(PrimitiveId, Primitive)>,
    next_id: PrimitiveId,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the primitives of every surface in `model` to `host`.
    ///
    /// All primitives are built before any is added, so a model with a
    /// dangling vertex reference leaves the host untouched. Returns the
    /// number of primitives added.
    pub fn add_model<H: RenderHost>(&mut self, host: &mut H, model: &InputModel) -> Result<usize, ModelError> {
        let primitives = build_primitives(model)?;
        let count = primitives.len();
        for primitive in primitives {
            self.push(host, primitive);
        }
        debug!("added {} primitives for {} surfaces", count, model.surfaces().len());
        Ok(count)
    }

    /// Add the face and outline of one surface to `host`.
    pub fn add_surface<H: RenderHost>(
        &mut self,
        host: &mut H,
        model: &InputModel,
        surface: &Surface,
    ) -> Result<(), ModelError> {
        for primitive in surface_primitives(model, surface)? {
            self.push(host, primitive);
        }
        Ok(())
    }

    fn push<H: RenderHost>(&mut self, host: &mut H, primitive: Primitive) {
        let id = self.next_id;
        self.next_id += 1;
        host.add_to_scene(id, &primitive);
        self.added.push((id, primitive));
    }

    /// Remove everything this builder added from `host`.
    pub fn clear<H: RenderHost>(&mut self, host: &mut H) {
        for (id, _) in self.added.drain(..) {
            host.remove_from_scene(id);
        }
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.added.iter().map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_input;

    const TWO_SURFACES: &str = "\
V 1 0 0 0
V 2 1 0 0
V 3 1 1 0
V 4 0 1 0
S 1 1 2 3 4 0 0 0.9 quad
S 2 1 2 3 0 0 0 0.5 tri
E
";

    #[test]
    fn test_one_face_and_outline_per_surface() {
        let model = parse_input(TWO_SURFACES).unwrap();
        let primitives = build_primitives(&model).unwrap();
        assert_eq!(primitives.len(), 4);
        let faces: Vec<&Face> = primitives.iter().filter_map(Primitive::as_face).collect();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].triangles.len(), 2);
        assert_eq!(faces[1].triangles.len(), 1);
        assert_eq!(primitives.iter().filter_map(Primitive::as_outline).count(), 2);
    }

    #[test]
    fn test_unresolved_vertex_leaves_host_untouched() {
        let model = parse_input("V 1 0 0 0\nV 2 1 0 0\nV 3 1 1 0\nS 1 1 2 3 0 0 0 0.5 a\nS 2 1 2 3 9 0 0 0.5 b").unwrap();
        let mut scene = Scene::new();
        let mut builder = SceneBuilder::new();
        let err = builder.add_model(&mut scene, &model).unwrap_err();
        assert_eq!(err, ModelError::UnresolvedVertex { surface: 2, vertex: 9 });
        assert!(scene.is_empty());
        assert!(builder.is_empty());
    }

    #[test]
    fn test_clear_releases_everything() {
        let model = parse_input(TWO_SURFACES).unwrap();
        let mut scene = Scene::new();
        let mut builder = SceneBuilder::new();
        assert_eq!(builder.add_model(&mut scene, &model).unwrap(), 4);
        assert_eq!(scene.len(), 4);
        builder.clear(&mut scene);
        assert!(scene.is_empty());
        assert!(builder.is_empty());
        builder.add_model(&mut scene, &model).unwrap();
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn test_add_single_surface() {
        let model = parse_input(TWO_SURFACES).unwrap();
        let mut scene = Scene::new();
        let mut builder = SceneBuilder::new();
        builder
            .add_surface(&mut scene, &model, model.surface(2).unwrap())
            .unwrap();
        assert_eq!(scene.len(), 2);
        assert_eq!(builder.len(), 2);
        assert!(scene.primitives().all(|p| p.surface() == 2));

        let dangling = Surface { v3: 7, ..model.surface(1).unwrap().clone() };
        let err = builder.add_surface(&mut scene, &model, &dangling).unwrap_err();
        assert_eq!(err, ModelError::UnresolvedVertex { surface: 1, vertex: 7 });
        assert_eq!(scene.len(), 2);

        builder.clear(&mut scene);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_scene_order_follows_surface_order() {
        let model = parse_input(TWO_SURFACES).unwrap();
        let mut scene = Scene::new();
        SceneBuilder::new().add_model(&mut scene, &model).unwrap();
        let surfaces: Vec<u32> = scene.faces().map(|f| f.surface).collect();
        assert_eq!(surfaces, vec![1, 2]);
    }
}
