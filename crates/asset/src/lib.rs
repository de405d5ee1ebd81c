//! Asset loading: OBJ meshes with MTL material libraries, texture decoding
//! and the path-keyed texture cache.

pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod texture;
pub mod texture_cache;

pub use mesh::{
    Corner, DEFAULT_MATERIAL, Face, Material, MaterialCatalog, MeshAsset, MeshData, MeshGroup,
    MeshVertex,
};
pub use texture::TextureData;
pub use texture_cache::{TextureCache, TextureLoader};
