/// Input model: vertices, surfaces and header records of a View3D file
use std::collections::HashMap;

use log::warn;
use nalgebra::Point3;

use crate::error::{Field, IndexKind, ModelError};

/// A numbered point shared between surfaces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub key: u32,
    pub position: Point3<f64>,
}

impl Vertex {
    pub fn new(key: u32, x: f64, y: f64, z: f64) -> Self {
        Self {
            key,
            position: Point3::new(x, y, z),
        }
    }
}

/// Role a surface plays in the radiation exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// `S` records: participates in the exchange
    Radiating,
    /// `O` records: only blocks view between other surfaces
    Obstruction,
    /// `M` records
    Mask,
    /// `N` records
    Null,
}

impl SurfaceKind {
    pub fn code(self) -> char {
        match self {
            SurfaceKind::Radiating => 'S',
            SurfaceKind::Obstruction => 'O',
            SurfaceKind::Mask => 'M',
            SurfaceKind::Null => 'N',
        }
    }
}

/// A planar triangle or quadrilateral facet
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub key: u32,
    pub kind: SurfaceKind,
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
    /// `None` for triangles
    pub v4: Option<u32>,
    /// Obstructing parent surface, 0 for none
    pub base: u32,
    /// Surface this one is combined with, 0 for none
    pub combine: u32,
    pub emissivity: f64,
    pub name: String,
}

impl Surface {
    pub fn is_quad(&self) -> bool {
        self.v4.is_some()
    }

    /// Vertex references in winding order
    pub fn vertex_keys(&self) -> impl Iterator<Item = u32> + '_ {
        [self.v1, self.v2, self.v3].into_iter().chain(self.v4)
    }
}

/// Ordered option-name to option-value pairs from a `C` record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlBlock {
    entries: Vec<(String, String)>,
}

impl ControlBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an entry. A repeated name keeps its original position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ControlBlock {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut block = Self::new();
        for (k, v) in iter {
            block.insert(k, v);
        }
        block
    }
}

/// Interpretation of the `F` record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    Planar,
    ThreeD,
    Axisymmetric,
}

impl GeometryFormat {
    /// Unknown tags fall back to 3D with a warning.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "2" => GeometryFormat::Planar,
            "3" => GeometryFormat::ThreeD,
            t if t.eq_ignore_ascii_case("3a") => GeometryFormat::Axisymmetric,
            other => {
                warn!("unknown geometry format '{}', assuming 3D", other);
                GeometryFormat::ThreeD
            }
        }
    }
}

/// The validated contents of one input file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputModel {
    title: Option<String>,
    control: Option<ControlBlock>,
    format: Option<String>,
    vertices: HashMap<u32, Vertex>,
    surfaces: Vec<Surface>,
    surface_index: HashMap<u32, usize>,
}

impl InputModel {
    pub fn builder() -> InputModelBuilder {
        InputModelBuilder::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn control(&self) -> Option<&ControlBlock> {
        self.control.as_ref()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Interpreted format tag; files without an `F` record are 3D.
    pub fn geometry_format(&self) -> GeometryFormat {
        self.format
            .as_deref()
            .map(GeometryFormat::from_tag)
            .unwrap_or(GeometryFormat::ThreeD)
    }

    pub fn vertex(&self, key: u32) -> Option<&Vertex> {
        self.vertices.get(&key)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertices in no particular order
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn surface(&self, key: u32) -> Option<&Surface> {
        self.surface_index.get(&key).map(|&i| &self.surfaces[i])
    }

    /// Surfaces in the order they appeared in the input
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// Look up the positions of a surface's vertices in winding order.
    pub fn resolve(&self, surface: &Surface) -> Result<Vec<Point3<f64>>, ModelError> {
        surface
            .vertex_keys()
            .map(|key| {
                self.vertices
                    .get(&key)
                    .map(|v| v.position)
                    .ok_or(ModelError::UnresolvedVertex {
                        surface: surface.key,
                        vertex: key,
                    })
            })
            .collect()
    }

    /// Check every surface's vertex references, failing on the first dangling one.
    pub fn validate(&self) -> Result<(), ModelError> {
        for surface in &self.surfaces {
            for key in surface.vertex_keys() {
                if !self.vertices.contains_key(&key) {
                    return Err(ModelError::UnresolvedVertex {
                        surface: surface.key,
                        vertex: key,
                    });
                }
            }
        }
        Ok(())
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty model
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = self.vertices.values().map(|v| v.position);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }
}

/// Incrementally assembles an [`InputModel`], enforcing set-once headers and unique keys
#[derive(Debug, Default)]
pub struct InputModelBuilder {
    model: InputModel,
}

impl InputModelBuilder {
    pub fn title(&mut self, title: impl Into<String>) -> Result<&mut Self, ModelError> {
        set_once(&mut self.model.title, title.into(), Field::Title)?;
        Ok(self)
    }

    pub fn control(&mut self, control: ControlBlock) -> Result<&mut Self, ModelError> {
        set_once(&mut self.model.control, control, Field::Control)?;
        Ok(self)
    }

    pub fn format(&mut self, format: impl Into<String>) -> Result<&mut Self, ModelError> {
        set_once(&mut self.model.format, format.into(), Field::Format)?;
        Ok(self)
    }

    pub fn vertex(&mut self, vertex: Vertex) -> Result<&mut Self, ModelError> {
        if self.model.vertices.contains_key(&vertex.key) {
            return Err(ModelError::DuplicateIndex {
                kind: IndexKind::Vertex,
                index: vertex.key,
            });
        }
        self.model.vertices.insert(vertex.key, vertex);
        Ok(self)
    }

    pub fn surface(&mut self, surface: Surface) -> Result<&mut Self, ModelError> {
        if self.model.surface_index.contains_key(&surface.key) {
            return Err(ModelError::DuplicateIndex {
                kind: IndexKind::Surface,
                index: surface.key,
            });
        }
        self.model
            .surface_index
            .insert(surface.key, self.model.surfaces.len());
        self.model.surfaces.push(surface);
        Ok(self)
    }

    pub fn build(self) -> InputModel {
        self.model
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: Field) -> Result<(), ModelError> {
    if slot.is_some() {
        return Err(ModelError::AlreadySet(field));
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(key: u32, v: [u32; 4]) -> Surface {
        Surface {
            key,
            kind: SurfaceKind::Radiating,
            v1: v[0],
            v2: v[1],
            v3: v[2],
            v4: (v[3] != 0).then_some(v[3]),
            base: 0,
            combine: 0,
            emissivity: 0.9,
            name: format!("s{}", key),
        }
    }

    #[test]
    fn test_title_set_once() {
        let mut builder = InputModel::builder();
        builder.title("first").unwrap();
        let err = builder.title("second").unwrap_err();
        assert_eq!(err, ModelError::AlreadySet(Field::Title));
        assert_eq!(builder.build().title(), Some("first"));
    }

    #[test]
    fn test_duplicate_vertex_is_not_overwritten() {
        let mut builder = InputModel::builder();
        builder.vertex(Vertex::new(3, 1.0, 2.0, 3.0)).unwrap();
        let err = builder.vertex(Vertex::new(3, 9.0, 9.0, 9.0)).unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateIndex {
                kind: IndexKind::Vertex,
                index: 3
            }
        );
        let model = builder.build();
        assert_eq!(model.vertex(3).unwrap().position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_surfaces_keep_insertion_order() {
        let mut builder = InputModel::builder();
        for key in [7, 2, 9, 1] {
            builder.surface(surface(key, [1, 2, 3, 0])).unwrap();
        }
        let model = builder.build();
        let keys: Vec<u32> = model.surfaces().iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![7, 2, 9, 1]);
        assert_eq!(model.surface(9).unwrap().key, 9);
    }

    #[test]
    fn test_validate_reports_missing_vertex() {
        let mut builder = InputModel::builder();
        builder
            .vertex(Vertex::new(1, 0.0, 0.0, 0.0))
            .unwrap()
            .vertex(Vertex::new(2, 1.0, 0.0, 0.0))
            .unwrap()
            .vertex(Vertex::new(3, 1.0, 1.0, 0.0))
            .unwrap()
            .surface(surface(1, [1, 2, 3, 4]))
            .unwrap();
        let model = builder.build();
        assert_eq!(
            model.validate(),
            Err(ModelError::UnresolvedVertex {
                surface: 1,
                vertex: 4
            })
        );
    }

    #[test]
    fn test_bounds() {
        let mut builder = InputModel::builder();
        builder.vertex(Vertex::new(1, -1.0, 2.0, 0.5)).unwrap();
        builder.vertex(Vertex::new(2, 3.0, -4.0, 0.0)).unwrap();
        let (min, max) = builder.build().bounds().unwrap();
        assert_eq!(min, Point3::new(-1.0, -4.0, 0.0));
        assert_eq!(max, Point3::new(3.0, 2.0, 0.5));
        assert!(InputModel::default().bounds().is_none());
    }

    #[test]
    fn test_control_block_lookup() {
        let block: ControlBlock = [("eps", "1e-4"), ("encl", "1")].into_iter().collect();
        assert_eq!(block.get("encl"), Some("1"));
        assert_eq!(block.get("missing"), None);
        let keys: Vec<&str> = block.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["eps", "encl"]);
    }

    #[test]
    fn test_control_block_repeated_word_overwrites_in_place() {
        let block: ControlBlock = [("eps", "1e-3"), ("encl", "1"), ("eps", "1e-4")]
            .into_iter()
            .collect();
        assert_eq!(block.len(), 2);
        let entries: Vec<(&str, &str)> = block.iter().collect();
        assert_eq!(entries, vec![("eps", "1e-4"), ("encl", "1")]);
    }

    #[test]
    fn test_geometry_format_tags() {
        assert_eq!(GeometryFormat::from_tag("2"), GeometryFormat::Planar);
        assert_eq!(GeometryFormat::from_tag("3A"), GeometryFormat::Axisymmetric);
        assert_eq!(GeometryFormat::from_tag("rect"), GeometryFormat::ThreeD);
    }
}
