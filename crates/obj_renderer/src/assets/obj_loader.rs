//! OBJ file loader for 3D models
//!
//! Parses Wavefront `.obj` geometry into an [`ObjDocument`]: the raw
//! attribute arrays plus triangles that reference them by index. Material
//! libraries named by `mtllib` are loaded through the same resource provider.

use crate::assets::mtl_parser::{MaterialLibrary, MtlParser};
use crate::assets::resource_provider::{read_text, ResourceProvider};
use crate::assets::{logical_lines, ParseError, ParseErrorKind};
use crate::config::ParseOptions;
use crate::error::MeshResult;
use crate::foundation::math::{Vec2, Vec3};

/// Index triple of one face corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceVertex {
    /// Index into [`ObjDocument::positions`]
    pub position: usize,
    /// Index into [`ObjDocument::tex_coords`]
    pub tex_coord: Option<usize>,
    /// Index into [`ObjDocument::normals`]
    pub normal: Option<usize>,
}

/// Triangle referencing the document's attribute arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    /// The three corners, in winding order
    pub vertices: [FaceVertex; 3],
}

impl Face {
    /// Whether every corner has a texture coordinate index
    pub fn has_tex_coords(&self) -> bool {
        self.vertices.iter().all(|v| v.tex_coord.is_some())
    }

    /// Whether every corner has a normal index
    pub fn has_normals(&self) -> bool {
        self.vertices.iter().all(|v| v.normal.is_some())
    }
}

/// Parsed OBJ geometry
///
/// All face indices are validated against the attribute arrays while parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjDocument {
    /// Vertex positions (`v`)
    pub positions: Vec<Vec3>,
    /// Texture coordinates (`vt`)
    pub tex_coords: Vec<Vec2>,
    /// Vertex normals (`vn`)
    pub normals: Vec<Vec3>,
    /// Triangles
    pub faces: Vec<Face>,
    /// Material of each face, as an index into `material_names`
    pub face_materials: Vec<Option<usize>>,
    /// Distinct material names in order of first `usemtl`
    pub material_names: Vec<String>,
    /// Material library files in order of first `mtllib`
    pub material_libraries: Vec<String>,
}

impl ObjDocument {
    /// Material name assigned to face `face`, if any
    pub fn face_material(&self, face: usize) -> Option<&str> {
        self.face_materials
            .get(face)
            .copied()
            .flatten()
            .and_then(|index| self.material_names.get(index))
            .map(String::as_str)
    }

    fn use_material(&mut self, name: &str) -> usize {
        if let Some(index) = self.material_names.iter().position(|n| n == name) {
            return index;
        }
        self.material_names.push(name.to_string());
        self.material_names.len() - 1
    }
}

/// OBJ parser
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and every material library it names
    pub fn load(
        name: &str,
        provider: &dyn ResourceProvider,
        options: &ParseOptions,
    ) -> MeshResult<(ObjDocument, MaterialLibrary)> {
        let contents = read_text(provider, name)?;
        let document = Self::parse(name, &contents, options)?;

        let mut materials = MaterialLibrary::new();
        for library in &document.material_libraries {
            let contents = read_text(provider, library)?;
            let parsed = MtlParser::parse(library, &contents)?;
            let skipped = materials.extend(parsed);
            if skipped > 0 {
                log::debug!("{}: {} duplicate material(s) ignored", library, skipped);
            }
        }

        log::debug!(
            "Loaded OBJ '{}': {} positions, {} tex coords, {} normals, {} faces, {} materials",
            name,
            document.positions.len(),
            document.tex_coords.len(),
            document.normals.len(),
            document.faces.len(),
            materials.len()
        );

        Ok((document, materials))
    }

    /// Parse OBJ text
    ///
    /// `file` is only used for error locations.
    pub fn parse(file: &str, contents: &str, options: &ParseOptions) -> Result<ObjDocument, ParseError> {
        let mut document = ObjDocument::default();
        let mut current_material: Option<usize> = None;
        let mut face_lines = Vec::new();

        for (line_num, line) in logical_lines(contents) {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let Some(command) = tokens.next() else {
                continue;
            };
            let error = |kind| ParseError::new(file, line_num, kind);

            match command {
                "v" => {
                    let position = parse_vec3(&mut tokens, command).map_err(error)?;
                    document.positions.push(position);
                }

                "vn" => {
                    let normal = parse_vec3(&mut tokens, command).map_err(error)?;
                    document.normals.push(normal);
                }

                "vt" => {
                    let u = parse_f32(&mut tokens, command).map_err(error)?;
                    let v = match tokens.next() {
                        Some(token) => parse_number(token, command).map_err(error)?,
                        None => 0.0,
                    };
                    document.tex_coords.push(Vec2::new(u, v));
                }

                "f" => {
                    let corners = tokens
                        .map(|token| parse_face_vertex(token, &document))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(error)?;

                    let triangles = triangles(&corners, options).map_err(error)?;
                    for face in triangles {
                        document.faces.push(face);
                        document.face_materials.push(current_material);
                        face_lines.push(line_num);
                    }
                }

                "usemtl" => {
                    let name = rest_of_line(line, command);
                    if name.is_empty() {
                        return Err(error(ParseErrorKind::MissingValue(command.to_string())));
                    }
                    current_material = Some(document.use_material(name));
                }

                "mtllib" => {
                    let mut any = false;
                    for library in tokens {
                        any = true;
                        if !document.material_libraries.iter().any(|l| l == library) {
                            document.material_libraries.push(library.to_string());
                        }
                    }
                    if !any {
                        return Err(error(ParseErrorKind::MissingValue(command.to_string())));
                    }
                }

                // Grouping, smoothing and element types we do not render
                "o" | "g" | "s" | "l" | "p" | "mg" => {}

                _ => {
                    log::trace!("{}:{}: ignoring '{}'", file, line_num, command);
                }
            }
        }

        check_indices(file, &document, &face_lines)?;
        Ok(document)
    }
}

/// Bounds-check face indices against the complete attribute arrays
///
/// Positive indices may reference attributes defined further down the file.
fn check_indices(file: &str, document: &ObjDocument, face_lines: &[usize]) -> Result<(), ParseError> {
    let check = |index: usize, count: usize, attribute: &'static str| {
        if index < count {
            Ok(())
        } else {
            Err(ParseErrorKind::IndexOutOfRange {
                attribute,
                index: i64::try_from(index).map_or(i64::MAX, |i| i.saturating_add(1)),
                count,
            })
        }
    };

    for (face, &line) in document.faces.iter().zip(face_lines) {
        for corner in &face.vertices {
            check(corner.position, document.positions.len(), "position")
                .and_then(|()| match corner.tex_coord {
                    Some(t) => check(t, document.tex_coords.len(), "texture coordinate"),
                    None => Ok(()),
                })
                .and_then(|()| match corner.normal {
                    Some(n) => check(n, document.normals.len(), "normal"),
                    None => Ok(()),
                })
                .map_err(|kind| ParseError::new(file, line, kind))?;
        }
    }
    Ok(())
}

/// Turn a face's corners into triangles
fn triangles(corners: &[FaceVertex], options: &ParseOptions) -> Result<Vec<Face>, ParseErrorKind> {
    match corners.len() {
        0..=2 => Err(ParseErrorKind::DegenerateFace(corners.len())),
        3 => Ok(vec![Face {
            vertices: [corners[0], corners[1], corners[2]],
        }]),
        n if options.triangulate => Ok((1..n - 1)
            .map(|i| Face {
                vertices: [corners[0], corners[i], corners[i + 1]],
            })
            .collect()),
        n => Err(ParseErrorKind::NonTriangularFace(n)),
    }
}

/// Parse `p`, `p/t`, `p//n` or `p/t/n`
fn parse_face_vertex(token: &str, document: &ObjDocument) -> Result<FaceVertex, ParseErrorKind> {
    let invalid = || ParseErrorKind::InvalidFaceVertex(token.to_string());
    let mut parts = token.split('/');

    let position = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
    let tex_coord = parts.next().filter(|p| !p.is_empty());
    let normal = parts.next().filter(|p| !p.is_empty());
    if parts.next().is_some() {
        return Err(invalid());
    }

    let parse_index = |raw: &str, attribute: &'static str, count: usize| {
        let value: i64 = raw.parse().map_err(|_| invalid())?;
        resolve_index(value, count, attribute)
    };

    Ok(FaceVertex {
        position: parse_index(position, "position", document.positions.len())?,
        tex_coord: tex_coord
            .map(|t| parse_index(t, "texture coordinate", document.tex_coords.len()))
            .transpose()?,
        normal: normal
            .map(|n| parse_index(n, "normal", document.normals.len()))
            .transpose()?,
    })
}

/// Resolve a 1-based or negative (relative) OBJ index to a 0-based one
///
/// Negative indices are bounded by `count`, the attributes read so far.
/// Positive ones are bounded later by [`check_indices`].
fn resolve_index(raw: i64, count: usize, attribute: &'static str) -> Result<usize, ParseErrorKind> {
    let resolved = if raw > 0 {
        usize::try_from(raw - 1).ok()
    } else if raw < 0 {
        usize::try_from(raw.unsigned_abs())
            .ok()
            .and_then(|back| count.checked_sub(back))
            .filter(|&index| index < count)
    } else {
        None
    };

    resolved.ok_or(ParseErrorKind::IndexOutOfRange {
            attribute,
            index: raw,
            count,
        })
}

/// Everything after the statement keyword, trimmed
pub(crate) fn rest_of_line<'a>(line: &'a str, command: &str) -> &'a str {
    line.strip_prefix(command).unwrap_or(line).trim()
}

pub(crate) fn parse_vec3<'a, I>(tokens: &mut I, command: &str) -> Result<Vec3, ParseErrorKind>
where
    I: Iterator<Item = &'a str>,
{
    let x = parse_f32(tokens, command)?;
    let y = parse_f32(tokens, command)?;
    let z = parse_f32(tokens, command)?;
    Ok(Vec3::new(x, y, z))
}

pub(crate) fn parse_f32<'a, I>(tokens: &mut I, command: &str) -> Result<f32, ParseErrorKind>
where
    I: Iterator<Item = &'a str>,
{
    let token = tokens
        .next()
        .ok_or_else(|| ParseErrorKind::MissingValue(command.to_string()))?;
    parse_number(token, command)
}

fn parse_number(token: &str, command: &str) -> Result<f32, ParseErrorKind> {
    token.parse::<f32>().map_err(|_| ParseErrorKind::InvalidNumber {
        statement: command.to_string(),
        token: token.to_string(),
    })
}
