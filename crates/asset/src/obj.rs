//! OBJ parser: positions, normals, texture coordinates, material groups and
//! the companion MTL library.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use corelib::{CoreError, CoreResult};

use crate::mesh::{Corner, DEFAULT_MATERIAL, Face, MaterialCatalog, MeshAsset, MeshGroup};
use crate::mtl::load_mtl_or_empty;

/// Result of the text pass, before the material library is attached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjDocument {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub groups: Vec<MeshGroup>,
    /// First `mtllib` reference, as written in the file.
    pub material_lib: Option<String>,
}

impl ObjDocument {
    /// Attach a catalog and produce the final asset. Faces whose material is not
    /// in the catalog are moved into the default bucket.
    pub fn into_asset(self, materials: MaterialCatalog) -> MeshAsset {
        let mut groups: Vec<MeshGroup> = Vec::with_capacity(self.groups.len());
        let mut fallback: Vec<Face> = Vec::new();

        for group in self.groups {
            if group.material == DEFAULT_MATERIAL || materials.contains(&group.material) {
                groups.push(group);
            } else {
                log::warn!(
                    "Material '{}' is not defined; {} face(s) fall back to '{}'",
                    group.material,
                    group.faces.len(),
                    DEFAULT_MATERIAL
                );
                fallback.extend(group.faces);
            }
        }

        if !fallback.is_empty() {
            match groups.iter_mut().find(|g| g.material == DEFAULT_MATERIAL) {
                Some(default) => default.faces.extend(fallback),
                None => groups.push(MeshGroup {
                    material: DEFAULT_MATERIAL.to_string(),
                    faces: fallback,
                }),
            }
        }

        MeshAsset {
            positions: self.positions,
            normals: self.normals,
            texcoords: self.texcoords,
            groups,
            materials,
        }
    }
}

/// Load an OBJ mesh and its material library from a file path.
///
/// The library is looked up next to the OBJ file. If it is missing or broken
/// the mesh still loads and every face renders flat white.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> CoreResult<MeshAsset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CoreError::from_io(path, e))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    log::info!("Loading OBJ {}", path.display());
    load_obj_from_reader(BufReader::new(file), base_dir, &path.display().to_string())
}

/// Load from any [`BufRead`]; `base_dir` resolves the `mtllib` reference.
pub fn load_obj_from_reader<R: BufRead>(
    reader: R,
    base_dir: &Path,
    source_name: &str,
) -> CoreResult<MeshAsset> {
    let doc = parse_obj(reader, source_name)?;
    let materials = match &doc.material_lib {
        Some(lib) => load_mtl_or_empty(base_dir.join(lib), base_dir),
        None => {
            log::warn!("{source_name}: no mtllib declared, rendering flat white");
            MaterialCatalog::new()
        }
    };
    let asset = doc.into_asset(materials);
    log::info!(
        "{source_name}: {} positions, {} triangles in {} group(s), {} material(s)",
        asset.positions.len(),
        asset.triangle_count(),
        asset.groups.len(),
        asset.materials.len()
    );
    Ok(asset)
}

/// Convenience helper to parse an OBJ string literal. No library is loaded.
pub fn load_obj_from_str(contents: &str) -> CoreResult<MeshAsset> {
    Ok(parse_obj(io::Cursor::new(contents), "<obj>")?.into_asset(MaterialCatalog::new()))
}

pub fn parse_obj<R: BufRead>(reader: R, source_name: &str) -> CoreResult<ObjDocument> {
    let mut doc = ObjDocument::default();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;
    // Faces keep their line number until bounds can be checked.
    let mut pending: Vec<(usize, usize, Face)> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| CoreError::parse(source_name, line_no, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        let err = |message: String| CoreError::parse(source_name, line_no, message);

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), "x coordinate").map_err(err)?;
                let y = parse_f32(parts.next(), "y coordinate").map_err(err)?;
                let z = parse_f32(parts.next(), "z coordinate").map_err(err)?;
                doc.positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), "u coordinate").map_err(err)?;
                // 1D texture coordinates are legal; v defaults to 0.
                let v = match parts.next() {
                    Some(token) => parse_f32(Some(token), "v coordinate").map_err(err)?,
                    None => 0.0,
                };
                doc.texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), "nx coordinate").map_err(err)?;
                let ny = parse_f32(parts.next(), "ny coordinate").map_err(err)?;
                let nz = parse_f32(parts.next(), "nz coordinate").map_err(err)?;
                doc.normals.push([nx, ny, nz]);
            }
            "mtllib" => {
                let lib = parts
                    .next()
                    .ok_or_else(|| err("mtllib without a file name".to_string()))?;
                if doc.material_lib.is_none() {
                    doc.material_lib = Some(lib.to_string());
                } else {
                    log::debug!("{source_name}:{line_no}: ignoring extra mtllib '{lib}'");
                }
            }
            "usemtl" => {
                let name = parts
                    .next()
                    .ok_or_else(|| err("usemtl without a material name".to_string()))?;
                current = Some(group_slot(&mut doc.groups, &mut group_index, name));
            }
            "f" => {
                let corners = parts
                    .map(parse_corner)
                    .collect::<Result<Vec<Corner>, String>>()
                    .map_err(err)?;
                let triangles = triangulate(&corners).map_err(err)?;
                let slot = match current {
                    Some(slot) => slot,
                    None => {
                        let slot = group_slot(&mut doc.groups, &mut group_index, DEFAULT_MATERIAL);
                        current = Some(slot);
                        slot
                    }
                };
                pending.extend(triangles.into_iter().map(|face| (line_no, slot, face)));
            }
            _ => {
                // Ignore other directives (o/g/s/l/etc.)
            }
        }
    }

    for (line_no, slot, face) in pending {
        check_bounds(&doc, &face).map_err(|m| CoreError::parse(source_name, line_no, m))?;
        doc.groups[slot].faces.push(face);
    }
    doc.groups.retain(|g| !g.faces.is_empty());

    Ok(doc)
}

/// Fan-triangulate a polygon around corner 0: `k` corners yield `k - 2` faces.
pub fn triangulate(corners: &[Corner]) -> Result<Vec<Face>, String> {
    if corners.len() < 3 {
        return Err(format!(
            "face needs at least 3 corners, found {}",
            corners.len()
        ));
    }
    Ok((1..corners.len() - 1)
        .map(|i| Face::new(corners[0], corners[i], corners[i + 1]))
        .collect())
}

fn group_slot(groups: &mut Vec<MeshGroup>, index: &mut HashMap<String, usize>, name: &str) -> usize {
    *index.entry(name.to_string()).or_insert_with(|| {
        groups.push(MeshGroup {
            material: name.to_string(),
            faces: Vec::new(),
        });
        groups.len() - 1
    })
}

fn parse_f32(value: Option<&str>, what: &str) -> Result<f32, String> {
    let token = value.ok_or_else(|| format!("missing {what}"))?;
    token
        .parse::<f32>()
        .map_err(|_| format!("invalid {what} '{token}'"))
}

/// `p`, `p/t`, `p//n` or `p/t/n`, 1-based in the file.
fn parse_corner(token: &str) -> Result<Corner, String> {
    let mut split = token.split('/');
    let position = match split.next() {
        Some(p) if !p.is_empty() => parse_index(p, "position")?,
        _ => return Err(format!("malformed face element '{token}'")),
    };
    let texcoord = match split.next() {
        Some(t) if !t.is_empty() => Some(parse_index(t, "texcoord")?),
        _ => None,
    };
    let normal = match split.next() {
        Some(n) if !n.is_empty() => Some(parse_index(n, "normal")?),
        _ => None,
    };
    if split.next().is_some() {
        return Err(format!("malformed face element '{token}'"));
    }
    Ok(Corner::new(position, texcoord, normal))
}

fn parse_index(token: &str, what: &str) -> Result<usize, String> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| format!("invalid {what} index '{token}'"))?;
    if raw <= 0 {
        return Err(format!("{what} index must be 1-based and positive, found {raw}"));
    }
    Ok((raw - 1) as usize)
}

fn check_bounds(doc: &ObjDocument, face: &Face) -> Result<(), String> {
    for c in face.corners {
        if c.position >= doc.positions.len() {
            return Err(format!(
                "position index {} out of bounds (len={})",
                c.position + 1,
                doc.positions.len()
            ));
        }
        if let Some(t) = c.texcoord.filter(|&t| t >= doc.texcoords.len()) {
            return Err(format!(
                "texcoord index {} out of bounds (len={})",
                t + 1,
                doc.texcoords.len()
            ));
        }
        if let Some(n) = c.normal.filter(|&n| n >= doc.normals.len()) {
            return Err(format!(
                "normal index {} out of bounds (len={})",
                n + 1,
                doc.normals.len()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let mesh = load_obj_from_str(src).expect("parse triangle");
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        let face = mesh.groups[0].faces[0];
        assert_eq!(face.corners[1], Corner::new(1, Some(1), Some(0)));
    }

    #[test]
    fn quad_without_materials_goes_to_default() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = load_obj_from_str(src).expect("parse quad");
        assert_eq!(mesh.groups.len(), 1);
        let group = mesh.group(DEFAULT_MATERIAL).expect("default group");
        assert_eq!(group.faces.len(), 2);

        let mut reached: Vec<usize> = group
            .faces
            .iter()
            .flat_map(|f| f.corners.iter().map(|c| c.position))
            .collect();
        reached.sort_unstable();
        reached.dedup();
        assert_eq!(reached, vec![0, 1, 2, 3]);
    }

    #[test]
    fn ngon_fans_around_first_corner() {
        for k in 3..=9usize {
            let corners: Vec<Corner> = (0..k).map(|p| Corner::new(p, None, None)).collect();
            let faces = triangulate(&corners).expect("triangulate");
            assert_eq!(faces.len(), k - 2, "k = {k}");
            for (i, face) in faces.iter().enumerate() {
                assert_eq!(face.corners[0].position, 0);
                assert_eq!(face.corners[1].position, i + 1);
                assert_eq!(face.corners[2].position, i + 2);
            }
        }
    }

    #[test]
    fn degenerate_faces_are_rejected() {
        for src in ["v 0 0 0\nv 1 0 0\nf 1 2\n", "v 0 0 0\nf 1\n", "f\n"] {
            let err = load_obj_from_str(src).unwrap_err();
            assert!(matches!(err, CoreError::Parse { .. }), "{src:?}: {err}");
        }
    }

    #[test]
    fn corner_forms() {
        assert_eq!(parse_corner("3"), Ok(Corner::new(2, None, None)));
        assert_eq!(parse_corner("3/4"), Ok(Corner::new(2, Some(3), None)));
        assert_eq!(parse_corner("3//5"), Ok(Corner::new(2, None, Some(4))));
        assert_eq!(parse_corner("3/4/5"), Ok(Corner::new(2, Some(3), Some(4))));
        assert!(parse_corner("/4/5").is_err());
        assert!(parse_corner("1/2/3/4").is_err());
        assert!(parse_corner("x/1").is_err());
    }

    #[test]
    fn zero_and_negative_indices_are_rejected() {
        let base = "v 0 0 0\nv 1 0 0\nv 1 1 0\n";
        for face in ["f 0 1 2\n", "f -1 -2 -3\n", "f 1/0 2 3\n"] {
            let src = format!("{base}{face}");
            let err = load_obj_from_str(&src).unwrap_err();
            match err {
                CoreError::Parse { line, .. } => assert_eq!(line, 4),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn out_of_range_index_reports_face_line() {
        let src = "v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\nf 1 2 9\n";
        match load_obj_from_str(src).unwrap_err() {
            CoreError::Parse { line, message, .. } => {
                assert_eq!(line, 5);
                assert!(message.contains("position index 9"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_texcoord_and_normal_are_rejected() {
        let base = "v 0 0 0\nv 1 0 0\nv 1 1 0\nvt 0 0\nvn 0 0 1\n";
        for (face, what) in [
            ("f 1/9 2/1 3/1\n", "texcoord index 9"),
            ("f 1//9 2//1 3//1\n", "normal index 9"),
            ("f 1/1/1 2/1/1 3/2/1\n", "texcoord index 2"),
        ] {
            match load_obj_from_str(&format!("{base}{face}")).unwrap_err() {
                CoreError::Parse { line, message, .. } => {
                    assert_eq!(line, 6, "{face}");
                    assert!(message.contains(what), "{face}: {message}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn malformed_number_is_parse_error() {
        let err = load_obj_from_str("v 0 zero 0\n").unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 1, .. }));
    }

    #[test]
    fn faces_follow_latest_usemtl() {
        let src = "\
            mtllib apple.mtl\n\
            v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
            o Apple\ns 1\n\
            f 1 2 3\n\
            usemtl Skin\nf 1 2 3 4\n\
            usemtl Stem\nf 2 3 4\n\
            usemtl Skin\nf 1 3 4\n";
        let doc = parse_obj(io::Cursor::new(src), "t.obj").expect("parse");
        assert_eq!(doc.material_lib.as_deref(), Some("apple.mtl"));
        let names: Vec<&str> = doc.groups.iter().map(|g| g.material.as_str()).collect();
        assert_eq!(names, vec![DEFAULT_MATERIAL, "Skin", "Stem"]);
        assert_eq!(doc.groups[1].faces.len(), 3);
        assert_eq!(doc.groups[2].faces.len(), 1);
    }

    #[test]
    fn unknown_materials_fall_back_to_default() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nusemtl Ghost\nf 1 2 3\n";
        let mesh = load_obj_from_str(src).expect("parse");
        assert_eq!(mesh.groups.len(), 1);
        assert_eq!(mesh.groups[0].material, DEFAULT_MATERIAL);
    }

    #[test]
    fn missing_obj_is_not_found() {
        let err = load_obj_from_path("no/such/apple.obj").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn load_with_material_library_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("apple.obj"),
            "mtllib apple.mtl\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nusemtl Skin\nf 1/1 2/1 3/1 4/1\n",
        )
        .expect("write obj");
        fs::write(
            dir.path().join("apple.mtl"),
            "newmtl Skin\nKd 0.8 0.6 0.5\nmap_Kd tex.png\n",
        )
        .expect("write mtl");

        let mesh = load_obj_from_path(dir.path().join("apple.obj")).expect("load");
        let skin = mesh.materials.get("Skin").expect("Skin material");
        assert_eq!(skin.diffuse, [0.8, 0.6, 0.5]);
        // Recorded even though tex.png was never written.
        assert_eq!(skin.diffuse_texture, Some(dir.path().join("tex.png")));
        assert_eq!(mesh.group("Skin").map(|g| g.faces.len()), Some(2));
    }

    #[test]
    fn missing_material_library_degrades_to_white() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("apple.obj"),
            "mtllib gone.mtl\nv 0 0 0\nv 1 0 0\nv 1 1 0\nusemtl Skin\nf 1 2 3\n",
        )
        .expect("write obj");

        let mesh = load_obj_from_path(dir.path().join("apple.obj")).expect("load");
        assert!(mesh.materials.is_empty());
        assert_eq!(mesh.groups.len(), 1);
        assert_eq!(mesh.groups[0].material, DEFAULT_MATERIAL);
    }

    #[test]
    fn malformed_material_library_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("apple.obj"),
            "mtllib apple.mtl\nv 0 0 0\nv 1 0 0\nv 1 1 0\nusemtl Skin\nf 1 2 3\n",
        )
        .expect("write obj");
        fs::write(dir.path().join("apple.mtl"), "newmtl Skin\nKd 0.1 abc 0.3\n")
            .expect("write mtl");

        let mesh = load_obj_from_path(dir.path().join("apple.obj")).expect("load");
        assert!(mesh.materials.is_empty());
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.groups[0].material, DEFAULT_MATERIAL);
    }
}
