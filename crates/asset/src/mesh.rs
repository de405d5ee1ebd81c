//! CPU-side mesh representation used by loaders.

use std::collections::HashMap;
use std::path::PathBuf;

/// Bucket for faces that appear before any `usemtl`, or whose material is unknown.
pub const DEFAULT_MATERIAL: &str = "default";

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    /// Square of side `size` in the local XZ plane, facing -Y, centered on the
    /// origin. `uv (0,0)` is the bottom-left corner.
    pub fn quad_xz(size: f32) -> Self {
        let h = size * 0.5;
        let n = [0.0, -1.0, 0.0];
        let vertices = vec![
            MeshVertex::new([-h, 0.0, -h], n, [0.0, 0.0]),
            MeshVertex::new([h, 0.0, -h], n, [1.0, 0.0]),
            MeshVertex::new([h, 0.0, h], n, [1.0, 1.0]),
            MeshVertex::new([-h, 0.0, h], n, [0.0, 1.0]),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }
}

/// One face corner: 0-based indices into the attribute arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Corner {
    pub position: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

impl Corner {
    pub const fn new(position: usize, texcoord: Option<usize>, normal: Option<usize>) -> Self {
        Self {
            position,
            texcoord,
            normal,
        }
    }
}

/// Always a triangle; polygons are fan-split at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
    pub corners: [Corner; 3],
}

impl Face {
    pub const fn new(a: Corner, b: Corner, c: Corner) -> Self {
        Self { corners: [a, b, c] }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: [f32; 3],
    /// Joined with the material file's directory; may not exist on disk.
    pub diffuse_texture: Option<PathBuf>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse: [1.0, 1.0, 1.0],
            diffuse_texture: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialCatalog {
    materials: HashMap<String, Material>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces by name. Returns the previous record, if any.
    pub fn insert(&mut self, material: Material) -> Option<Material> {
        self.materials.insert(material.name.clone(), material)
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }
}

/// Faces drawn with one material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGroup {
    pub material: String,
    pub faces: Vec<Face>,
}

/// Parsed OBJ + MTL pair. Built once at load time and never mutated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshAsset {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    /// In order of first `usemtl`.
    pub groups: Vec<MeshGroup>,
    pub materials: MaterialCatalog,
}

impl MeshAsset {
    pub fn group(&self, material: &str) -> Option<&MeshGroup> {
        self.groups.iter().find(|g| g.material == material)
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.faces.len()).sum()
    }

    /// Material record for a group; `None` for the synthetic default bucket.
    pub fn material_for(&self, group: &MeshGroup) -> Option<&Material> {
        self.materials.get(&group.material)
    }

    /// Unifies the per-corner attribute streams of one group into an indexed
    /// mesh. Corners sharing all three indices share a vertex. A missing
    /// texcoord becomes `(0, 0)`; a missing normal becomes `+Z`.
    pub fn group_mesh_data(&self, group: &MeshGroup) -> MeshData {
        let mut unique: HashMap<Corner, u32> = HashMap::new();
        let mut vertices: Vec<MeshVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::with_capacity(group.faces.len() * 3);

        for face in &group.faces {
            for corner in face.corners {
                let index = *unique.entry(corner).or_insert_with(|| {
                    let position = self.positions[corner.position];
                    let uv = corner
                        .texcoord
                        .and_then(|i| self.texcoords.get(i).copied())
                        .unwrap_or([0.0, 0.0]);
                    let normal = corner
                        .normal
                        .and_then(|i| self.normals.get(i).copied())
                        .unwrap_or([0.0, 0.0, 1.0]);
                    vertices.push(MeshVertex::new(position, normal, uv));
                    (vertices.len() - 1) as u32
                });
                indices.push(index);
            }
        }

        MeshData::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn quad_is_two_triangles_in_xz() {
        let quad = MeshData::quad_xz(2.5);
        assert_eq!(quad.indices.len(), 6);
        assert!(quad.vertices.iter().all(|v| v.position[1] == 0.0));
        assert_eq!(quad.vertices[2].position, [1.25, 0.0, 1.25]);
    }

    #[test]
    fn group_mesh_data_shares_identical_corners() {
        let c = |p| Corner::new(p, None, None);
        let asset = MeshAsset {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            groups: vec![MeshGroup {
                material: DEFAULT_MATERIAL.to_string(),
                faces: vec![Face::new(c(0), c(1), c(2)), Face::new(c(0), c(2), c(3))],
            }],
            ..MeshAsset::default()
        };
        let data = asset.group_mesh_data(&asset.groups[0]);
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(data.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn catalog_replaces_by_name() {
        let mut catalog = MaterialCatalog::new();
        assert!(catalog.insert(Material::new("Skin")).is_none());
        let mut red = Material::new("Skin");
        red.diffuse = [1.0, 0.0, 0.0];
        assert!(catalog.insert(red).is_some());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Skin").map(|m| m.diffuse), Some([1.0, 0.0, 0.0]));
    }
}
