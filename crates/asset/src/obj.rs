//! OBJ geometry parser: positions, texture coordinates, normals, polygonal faces,
//! plus the `mtllib`/`usemtl` directives that tie faces to materials.
//!
//! Faces come out unresolved: each carries the name of the material active when
//! it was declared. Resolution happens in [`crate::model`].

use std::{
    io::{self, BufRead},
    sync::Arc,
};

use corelib::{Aabb, Vec3, vec3};

use crate::{
    error::{AssetError, AssetResult},
    resource::SourceLines,
};

/// Position with optional homogeneous weight (`1.0` when omitted).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub w: f32,
}

/// Texture coordinate; `w` is `0.0` when omitted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

/// One vertex reference of a face, 0-based. `None` marks an unspecified
/// texture coordinate or normal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Corner {
    pub position: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

/// Face as declared in the file, before material resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFace {
    pub corners: Vec<Corner>,
    pub material: Option<Arc<str>>,
    /// 1-based source line.
    pub line: usize,
}

/// `mtllib` reference and the line it appeared on.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryRef {
    pub name: String,
    pub line: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ObjData {
    pub vertices: Vec<Vertex>,
    pub texcoords: Vec<TexCoord>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<RawFace>,
    pub libraries: Vec<LibraryRef>,
    /// Accumulated while reading `v` lines.
    pub bounds: Aabb,
}

/// Parse an OBJ stream. `file` is only used in error messages.
pub fn parse_obj<R: BufRead>(reader: R, file: &str) -> AssetResult<ObjData> {
    let mut parser = ObjParser::new(file);
    for line in SourceLines::new(reader, file) {
        let (line_no, line) = line?;
        parser.line = line_no;
        parser.parse_line(&line)?;
    }
    log::debug!(
        "{}: {} vertices, {} texcoords, {} normals, {} faces",
        file,
        parser.data.vertices.len(),
        parser.data.texcoords.len(),
        parser.data.normals.len(),
        parser.data.faces.len()
    );
    Ok(parser.data)
}

/// Convenience helper to parse an OBJ string literal.
pub fn parse_obj_str(contents: &str, file: &str) -> AssetResult<ObjData> {
    parse_obj(io::Cursor::new(contents), file)
}

struct ObjParser<'a> {
    file: &'a str,
    line: usize,
    active_material: Option<Arc<str>>,
    data: ObjData,
}

impl<'a> ObjParser<'a> {
    fn new(file: &'a str) -> Self {
        Self {
            file,
            line: 0,
            active_material: None,
            data: ObjData::default(),
        }
    }

    fn error(&self, message: impl Into<String>) -> AssetError {
        AssetError::format(self.file, self.line, message)
    }

    fn parse_line(&mut self, raw: &str) -> AssetResult<()> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(());
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            return Ok(());
        };
        let args: Vec<&str> = parts.collect();

        match tag {
            "v" => {
                let c = self.components(&args, 3, 4, "vertex")?;
                let vertex = Vertex {
                    position: vec3(c[0], c[1], c[2]),
                    w: c.get(3).copied().unwrap_or(1.0),
                };
                self.data.bounds.include(vertex.position);
                self.data.vertices.push(vertex);
            }
            "vt" => {
                let c = self.components(&args, 2, 3, "texture coordinate")?;
                self.data.texcoords.push(TexCoord {
                    u: c[0],
                    v: c[1],
                    w: c.get(2).copied().unwrap_or(0.0),
                });
            }
            "vn" => {
                let c = self.components(&args, 3, 3, "normal")?;
                self.data.normals.push(vec3(c[0], c[1], c[2]));
            }
            "f" => {
                if args.len() < 3 {
                    return Err(self.error(format!(
                        "face requires at least 3 vertices, found {}",
                        args.len()
                    )));
                }
                let corners = args
                    .iter()
                    .map(|token| self.corner(token))
                    .collect::<AssetResult<Vec<_>>>()?;
                self.data.faces.push(RawFace {
                    corners,
                    material: self.active_material.clone(),
                    line: self.line,
                });
            }
            "mtllib" => {
                let name = self.directive_value(trimmed, tag)?;
                self.data.libraries.push(LibraryRef {
                    name: name.to_string(),
                    line: self.line,
                });
            }
            "usemtl" => {
                let name = self.directive_value(trimmed, tag)?;
                self.active_material = Some(Arc::from(name));
            }
            _ => {
                // Grouping, smoothing and free-form directives carry nothing we draw.
            }
        }
        Ok(())
    }

    fn components(&self, args: &[&str], min: usize, max: usize, what: &str) -> AssetResult<Vec<f32>> {
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            return Err(self.error(format!(
                "{} requires {} components, found {}",
                what,
                expected,
                args.len()
            )));
        }
        args.iter()
            .map(|token| {
                token
                    .parse::<f32>()
                    .map_err(|e| self.error(format!("invalid {} component '{}': {}", what, token, e)))
            })
            .collect()
    }

    fn corner(&self, token: &str) -> AssetResult<Corner> {
        let fields: Vec<&str> = token.split('/').collect();
        if fields.len() > 3 {
            return Err(self.error(format!("invalid face vertex '{}'", token)));
        }
        if fields[0].is_empty() {
            return Err(self.error(format!(
                "missing vertex position index in face vertex '{}'",
                token
            )));
        }

        let position = self
            .resolve_index(fields[0], self.data.vertices.len(), "position")?
            .ok_or_else(|| self.error("position index 0 is invalid; OBJ indices are 1-based"))?;

        let texcoord = match fields.get(1) {
            Some(value) if !value.is_empty() => {
                self.resolve_index(value, self.data.texcoords.len(), "texcoord")?
            }
            _ => None,
        };
        let normal = match fields.get(2) {
            Some(value) if !value.is_empty() => {
                self.resolve_index(value, self.data.normals.len(), "normal")?
            }
            _ => None,
        };

        Ok(Corner {
            position,
            texcoord,
            normal,
        })
    }

    /// 1-based or negative (relative) index to 0-based. `0` maps to `None`.
    fn resolve_index(&self, token: &str, len: usize, label: &str) -> AssetResult<Option<usize>> {
        let raw = token
            .parse::<i64>()
            .map_err(|e| self.error(format!("invalid {} index '{}': {}", label, token, e)))?;
        if raw == 0 {
            return Ok(None);
        }

        let resolved = if raw > 0 { raw - 1 } else { len as i64 + raw };
        if resolved < 0 || resolved as usize >= len {
            return Err(self.error(format!(
                "{} index {} is out of bounds (count={})",
                label, raw, len
            )));
        }
        Ok(Some(resolved as usize))
    }

    fn directive_value<'l>(&self, line: &'l str, directive: &str) -> AssetResult<&'l str> {
        line.strip_prefix(directive)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| self.error(format!("directive '{}' is missing a value", directive)))
    }
}
