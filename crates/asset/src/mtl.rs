//! MTL material library parser: `newmtl`, `Kd` and `map_Kd`.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use corelib::{CoreError, CoreResult};

use crate::mesh::{Material, MaterialCatalog};

/// Load a material library. `base_dir` is where relative texture paths live.
pub fn load_mtl_from_path(path: impl AsRef<Path>, base_dir: &Path) -> CoreResult<MaterialCatalog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CoreError::from_io(path, e))?;
    log::debug!("Loading MTL {}", path.display());
    parse_mtl(BufReader::new(file), base_dir, &path.display().to_string())
}

/// Like [`load_mtl_from_path`], but any failure yields an empty catalog and a warning.
pub fn load_mtl_or_empty(path: impl AsRef<Path>, base_dir: &Path) -> MaterialCatalog {
    let path = path.as_ref();
    match load_mtl_from_path(path, base_dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            log::warn!("Material library unavailable, rendering flat white: {e}");
            MaterialCatalog::new()
        }
    }
}

/// Convenience helper to parse an MTL string literal.
pub fn load_mtl_from_str(contents: &str, base_dir: &Path) -> CoreResult<MaterialCatalog> {
    parse_mtl(io::Cursor::new(contents), base_dir, "<mtl>")
}

pub fn parse_mtl<R: BufRead>(
    reader: R,
    base_dir: &Path,
    source_name: &str,
) -> CoreResult<MaterialCatalog> {
    let mut catalog = MaterialCatalog::new();
    let mut current: Option<Material> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| CoreError::parse(source_name, line_no, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (tag, rest) = trimmed
            .split_once(char::is_whitespace)
            .map(|(t, r)| (t, r.trim()))
            .unwrap_or((trimmed, ""));

        match tag {
            "newmtl" => {
                let name = rest.split_whitespace().next().ok_or_else(|| {
                    CoreError::parse(source_name, line_no, "newmtl without a name")
                })?;
                if let Some(done) = current.replace(Material::new(name)) {
                    catalog.insert(done);
                }
            }
            "Kd" => {
                let Some(material) = current.as_mut() else {
                    log::debug!("{source_name}:{line_no}: Kd outside of a material block");
                    continue;
                };
                let mut parts = rest.split_whitespace();
                let mut rgb = [0.0f32; 3];
                for (channel, what) in rgb.iter_mut().zip(["red", "green", "blue"]) {
                    let token = parts.next().ok_or_else(|| {
                        CoreError::parse(source_name, line_no, format!("missing {what} in Kd"))
                    })?;
                    *channel = token.parse().map_err(|_| {
                        CoreError::parse(
                            source_name,
                            line_no,
                            format!("invalid {what} value '{token}' in Kd"),
                        )
                    })?;
                }
                material.diffuse = rgb;
            }
            "map_Kd" => {
                let Some(material) = current.as_mut() else {
                    log::debug!("{source_name}:{line_no}: map_Kd outside of a material block");
                    continue;
                };
                let file = strip_map_options(rest);
                if file.is_empty() {
                    return Err(CoreError::parse(source_name, line_no, "map_Kd without a path"));
                }
                // Exporters on Windows write backslashes.
                let file = file.replace('\\', "/");
                material.diffuse_texture = Some(base_dir.join(file));
            }
            _ => {
                // Ka/Ks/Ns/d/illum and other maps are not rendered.
            }
        }
    }

    if let Some(done) = current {
        catalog.insert(done);
    }

    log::debug!("{source_name}: {} material(s)", catalog.len());
    Ok(catalog)
}

/// Skips leading texture-map options (`-o 0.5 0.5`, `-clamp on`, ...) and
/// returns the remaining file name, which may contain spaces.
fn strip_map_options(mut rest: &str) -> &str {
    loop {
        rest = rest.trim_start();
        if !rest.starts_with('-') {
            return rest.trim_end();
        }
        let (option, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let (min_args, max_args) = match option {
            "-o" | "-s" | "-t" => (1, 3),
            "-mm" => (2, 2),
            "-blendu" | "-blendv" | "-boost" | "-clamp" | "-bm" | "-texres" | "-imfchan"
            | "-type" | "-cc" => (1, 1),
            // Unknown option: treat the whole thing as the file name.
            _ => return rest.trim_end(),
        };

        rest = tail;
        for i in 0..max_args {
            let trimmed = rest.trim_start();
            let (arg, after) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
            let numeric = arg.parse::<f32>().is_ok();
            if arg.is_empty() || (i >= min_args && !numeric) {
                break;
            }
            rest = after;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_skin_material() {
        let src = "newmtl Skin\nKd 0.8 0.6 0.5\nmap_Kd tex.png\n";
        let catalog = load_mtl_from_str(src, Path::new("models")).expect("parse mtl");
        let skin = catalog.get("Skin").expect("Skin present");
        assert_eq!(skin.diffuse, [0.8, 0.6, 0.5]);
        assert_eq!(skin.diffuse_texture, Some(PathBuf::from("models/tex.png")));
    }

    #[test]
    fn defaults_to_white_without_texture() {
        let src = "# exported\nnewmtl Stem\nNs 96.0\nKa 0 0 0\n\nnewmtl Leaf\nKd 0 1 0\n";
        let catalog = load_mtl_from_str(src, Path::new(".")).expect("parse mtl");
        assert_eq!(catalog.len(), 2);
        let stem = catalog.get("Stem").expect("Stem");
        assert_eq!(stem.diffuse, [1.0, 1.0, 1.0]);
        assert!(stem.diffuse_texture.is_none());
        assert_eq!(catalog.get("Leaf").map(|m| m.diffuse), Some([0.0, 1.0, 0.0]));
    }

    #[test]
    fn map_kd_options_and_spaces() {
        let src = "newmtl A\nmap_Kd -o 0.5 0.5 -clamp on my skin.png\n";
        let catalog = load_mtl_from_str(src, Path::new("assets")).expect("parse mtl");
        assert_eq!(
            catalog.get("A").and_then(|m| m.diffuse_texture.clone()),
            Some(PathBuf::from("assets/my skin.png"))
        );
    }

    #[test]
    fn backslash_paths_are_normalized() {
        let src = "newmtl A\nmap_Kd textures\\apple.png\n";
        let catalog = load_mtl_from_str(src, Path::new("m")).expect("parse mtl");
        assert_eq!(
            catalog.get("A").and_then(|m| m.diffuse_texture.clone()),
            Some(PathBuf::from("m/textures/apple.png"))
        );
    }

    #[test]
    fn malformed_kd_is_parse_error() {
        let err = load_mtl_from_str("newmtl A\nKd 0.1 abc 0.3\n", Path::new(".")).unwrap_err();
        match err {
            CoreError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn properties_outside_block_are_ignored() {
        let catalog =
            load_mtl_from_str("Kd 1 0 0\nmap_Kd a.png\nnewmtl B\n", Path::new(".")).expect("mtl");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("B").map(|m| m.diffuse), Some([1.0, 1.0, 1.0]));
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let catalog = load_mtl_or_empty("definitely/not/here.mtl", Path::new("."));
        assert!(catalog.is_empty());
        let err = load_mtl_from_path("definitely/not/here.mtl", Path::new(".")).unwrap_err();
        assert!(err.is_not_found());
    }
}
