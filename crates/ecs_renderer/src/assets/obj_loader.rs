//! OBJ file loader for mesh library entries

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::render::resources::MeshData;

/// OBJ parsing errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A number or index failed to parse
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
    /// Structurally invalid file
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Wavefront OBJ reader producing de-indexed-per-corner mesh data
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file from disk
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, ObjError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse OBJ text from any reader
    ///
    /// Every face corner becomes its own vertex; polygons are fan-triangulated.
    pub fn parse<R: BufRead>(reader: R) -> Result<MeshData, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut mesh = MeshData::default();

        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = line_index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" if parts.len() >= 4 => positions.push(parse_floats::<3>(&parts[1..4], line_number)?),
                "vn" if parts.len() >= 4 => normals.push(parse_floats::<3>(&parts[1..4], line_number)?),
                "vt" if parts.len() >= 3 => tex_coords.push(parse_floats::<2>(&parts[1..3], line_number)?),
                "f" if parts.len() >= 4 => {
                    let mut corners = Vec::with_capacity(parts.len() - 1);
                    for corner in &parts[1..] {
                        let mut fields = corner.split('/');
                        let position = parse_index(fields.next(), positions.len(), line_number)?
                            .and_then(|index| positions.get(index))
                            .ok_or_else(|| ObjError::InvalidFormat(format!("face on line {line_number} has no position")))?;
                        let tex_coord = parse_index(fields.next(), tex_coords.len(), line_number)?
                            .and_then(|index| tex_coords.get(index))
                            .unwrap_or(&[0.0, 0.0]);
                        let normal = parse_index(fields.next(), normals.len(), line_number)?
                            .and_then(|index| normals.get(index))
                            .unwrap_or(&[0.0, 1.0, 0.0]);

                        mesh.positions.push(*position);
                        mesh.tex_coords.push(*tex_coord);
                        mesh.normals.push(*normal);
                        corners.push((mesh.positions.len() - 1) as u32);
                    }
                    for i in 1..corners.len() - 1 {
                        mesh.indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        if mesh.positions.is_empty() {
            return Err(ObjError::InvalidFormat("No vertices found in OBJ file".to_string()));
        }
        Ok(mesh)
    }
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize) -> Result<[f32; N], ObjError> {
    let mut values = [0.0; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part.parse().map_err(|_| ObjError::ParseError {
            line,
            message: format!("invalid number '{part}'"),
        })?;
    }
    Ok(values)
}

/// 1-based (or negative, relative) OBJ index to a 0-based index
fn parse_index(field: Option<&str>, count: usize, line: usize) -> Result<Option<usize>, ObjError> {
    let Some(field) = field.filter(|field| !field.is_empty()) else {
        return Ok(None);
    };
    let index: i64 = field.parse().map_err(|_| ObjError::ParseError {
        line,
        message: format!("invalid index '{field}'"),
    })?;
    let resolved = match index {
        i if i > 0 => Some((i - 1) as usize),
        i if i < 0 => (count as i64 + i).try_into().ok(),
        _ => None,
    };
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjLoader::parse(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.tex_coords[2], [1.0, 1.0]);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let mesh = ObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n".as_bytes()).unwrap();
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.normals[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let error = ObjLoader::parse("v 0 0 0\nv x 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(error, ObjError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        assert!(matches!(ObjLoader::parse("# nothing\n".as_bytes()), Err(ObjError::InvalidFormat(_))));
    }
}
