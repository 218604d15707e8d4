//! MTL (Material Template Library) file parser
//!
//! Only the diffuse part of the Wavefront material model is kept: the `Kd`
//! color and the `map_Kd` texture. Other statements are accepted and skipped.

use std::collections::HashMap;

use crate::assets::obj_loader::{parse_vec3, rest_of_line};
use crate::assets::{logical_lines, ParseError, ParseErrorKind};
use crate::foundation::math::Vec3;

/// Parsed MTL material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Diffuse color (Kd), if the file gives one
    pub diffuse: Option<Vec3>,
    /// Diffuse texture map (map_Kd)
    pub diffuse_map: Option<String>,
}

impl Material {
    /// Create a material with no color and no texture
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse: None,
            diffuse_map: None,
        }
    }

    /// Per-vertex color: the diffuse color, or white when none is set
    pub fn vertex_color(&self) -> [f32; 4] {
        self.diffuse.map_or([1.0, 1.0, 1.0, 1.0], |kd| [kd.x, kd.y, kd.z, 1.0])
    }

    /// Whether this material carries a diffuse texture
    pub fn has_texture(&self) -> bool {
        self.diffuse_map.is_some()
    }
}

/// Materials keyed by name
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: HashMap<String, Material>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add materials, keeping the first definition of each name.
    ///
    /// Returns how many duplicates were ignored.
    pub fn extend(&mut self, materials: impl IntoIterator<Item = Material>) -> usize {
        let mut skipped = 0;
        for material in materials {
            if self.materials.contains_key(&material.name) {
                skipped += 1;
            } else {
                self.materials.insert(material.name.clone(), material);
            }
        }
        skipped
    }

    /// Look up a material by name
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Remove every material
    pub fn clear(&mut self) {
        self.materials.clear();
    }
}

/// MTL file parser
pub struct MtlParser;

impl MtlParser {
    /// Parse MTL file contents into materials, in file order
    ///
    /// `file` is only used for error locations.
    pub fn parse(file: &str, contents: &str) -> Result<Vec<Material>, ParseError> {
        let mut materials = Vec::new();
        let mut current: Option<Material> = None;

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
                "newmtl" => {
                    if let Some(material) = current.take() {
                        materials.push(material);
                    }

                    let name = rest_of_line(line, command);
                    if name.is_empty() {
                        return Err(error(ParseErrorKind::MissingValue(command.to_string())));
                    }
                    current = Some(Material::new(name));
                }

                "Kd" => {
                    let diffuse = parse_vec3(&mut tokens, command).map_err(error)?;
                    match current.as_mut() {
                        Some(material) => material.diffuse = Some(diffuse),
                        None => log::trace!("{}:{}: Kd outside of a material", file, line_num),
                    }
                }

                "map_Kd" => {
                    let path = Self::parse_texture_path(tokens)
                        .ok_or_else(|| error(ParseErrorKind::MissingValue(command.to_string())))?;
                    match current.as_mut() {
                        Some(material) => material.diffuse_map = Some(path),
                        None => log::trace!("{}:{}: map_Kd outside of a material", file, line_num),
                    }
                }

                // Ignore the rest of the Phong model and other maps
                _ => {}
            }
        }

        if let Some(material) = current {
            materials.push(material);
        }

        Ok(materials)
    }

    /// Texture file of a map statement.
    ///
    /// Option flags (`-s 1 1 1`, `-clamp on`, ...) come before the file name,
    /// so when any are present the last token is the file. Otherwise the whole
    /// remainder is the file name, which may contain spaces.
    fn parse_texture_path<'a, I>(tokens: I) -> Option<String>
    where
        I: Iterator<Item = &'a str>,
    {
        let tokens: Vec<&str> = tokens.collect();
        if tokens.iter().any(|t| t.starts_with('-')) {
            return tokens.last().map(|t| (*t).to_string());
        }
        if tokens.is_empty() {
            None
        } else {
            Some(tokens.join(" "))
        }
    }
}
