//! MTL material library parser.

use std::{collections::HashMap, io::BufRead, sync::Arc};

use corelib::{Vec3, vec3};

use crate::{
    error::{AssetError, AssetResult},
    resource::{ResourceLocator, SourceLines},
};

/// Name of the material used by faces declared before any `usemtl`.
pub const DEFAULT_MATERIAL_NAME: &str = "default";

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// `Ka`
    pub ambient: Vec3,
    /// `Kd`
    pub diffuse: Vec3,
    /// `Ks`
    pub specular: Vec3,
    /// `Ke`
    pub emissive: Vec3,
    /// `d`, 1.0 is fully opaque. `Tr` is stored as `1 - Tr`.
    pub opacity: f32,
    /// `Ns`
    pub shininess: f32,
    /// `Ni`
    pub optical_density: f32,
    pub illum: u32,
    /// `map_Kd`, kept only if it resolved when the library was read.
    pub diffuse_texture: Option<String>,
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient: Vec3::ZERO,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
            opacity: 1.0,
            shininess: 0.0,
            optical_density: 1.0,
            illum: 0,
            diffuse_texture: None,
        }
    }

    /// Light gray, opaque, untextured.
    pub fn fallback() -> Self {
        Self {
            ambient: Vec3::splat(0.8),
            diffuse: Vec3::splat(0.8),
            ..Self::named(DEFAULT_MATERIAL_NAME)
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Materials addressable by exact name. Later definitions of a name replace
/// earlier ones.
#[derive(Clone, Debug, Default)]
pub struct MaterialLibrary {
    materials: Vec<Arc<Material>>,
    by_name: HashMap<String, usize>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `name` through the locator and parse it. `map_Kd` references are
    /// checked against the same locator and base.
    pub fn load(locator: &ResourceLocator, base: &str, name: &str) -> AssetResult<Self> {
        let reader = locator.open(base, name)?;
        Self::load_from(reader, locator, base, name)
    }

    /// Parse an already opened library named `name`. Read errors propagate.
    pub fn load_from<R: BufRead>(
        reader: R,
        locator: &ResourceLocator,
        base: &str,
        name: &str,
    ) -> AssetResult<Self> {
        let library = Self::parse(reader, name, |texture| locator.exists(base, texture))?;
        log::info!("Loaded material library {} ({} materials)", name, library.len());
        Ok(library)
    }

    /// Parse an MTL stream. `texture_exists` decides whether a `map_Kd`
    /// reference is kept.
    pub fn parse<R, F>(reader: R, file: &str, texture_exists: F) -> AssetResult<Self>
    where
        R: BufRead,
        F: Fn(&str) -> bool,
    {
        let mut library = Self::new();
        let mut current: Option<Material> = None;

        for line in SourceLines::new(reader, file) {
            let (line_no, line) = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(tag) = parts.next() else {
                continue;
            };
            let args: Vec<&str> = parts.collect();
            let value = line[tag.len()..].trim();

            if tag == "newmtl" {
                if value.is_empty() {
                    return Err(AssetError::format(file, line_no, "newmtl is missing a name"));
                }
                if let Some(done) = current.replace(Material::named(value)) {
                    library.insert(done);
                }
                continue;
            }

            let Some(mat) = current.as_mut() else {
                log::warn!("{}:{}: '{}' outside of any newmtl, ignored", file, line_no, tag);
                continue;
            };

            match tag {
                "Ka" => mat.ambient = color(&args, file, line_no, tag)?,
                "Kd" => mat.diffuse = color(&args, file, line_no, tag)?,
                "Ks" => mat.specular = color(&args, file, line_no, tag)?,
                "Ke" => mat.emissive = color(&args, file, line_no, tag)?,
                "d" => mat.opacity = scalar(&args, file, line_no, tag)?,
                "Tr" => mat.opacity = 1.0 - scalar(&args, file, line_no, tag)?,
                "Ns" => mat.shininess = scalar(&args, file, line_no, tag)?,
                "Ni" => mat.optical_density = scalar(&args, file, line_no, tag)?,
                "illum" => {
                    let raw = args.first().copied().unwrap_or_default();
                    mat.illum = raw.parse::<u32>().map_err(|e| {
                        AssetError::format(file, line_no, format!("invalid illum '{}': {}", raw, e))
                    })?;
                }
                "map_Kd" => {
                    if value.is_empty() {
                        return Err(AssetError::format(file, line_no, "map_Kd is missing a value"));
                    }
                    if texture_exists(value) {
                        mat.diffuse_texture = Some(value.to_string());
                    } else {
                        log::warn!(
                            "{}:{}: unable to resolve texture '{}' for material '{}', drawing untextured",
                            file,
                            line_no,
                            value,
                            mat.name
                        );
                    }
                }
                _ => {}
            }
        }

        if let Some(done) = current {
            library.insert(done);
        }
        Ok(library)
    }

    /// Add a material, returning `true` if it replaced one with the same name.
    pub fn insert(&mut self, material: Material) -> bool {
        let material = Arc::new(material);
        match self.by_name.get(&material.name) {
            Some(&i) => {
                log::debug!("Material '{}' redefined, keeping the later one", material.name);
                self.materials[i] = material;
                true
            }
            None => {
                self.by_name.insert(material.name.clone(), self.materials.len());
                self.materials.push(material);
                false
            }
        }
    }

    /// Fold another library into this one.
    pub fn merge(&mut self, other: MaterialLibrary) {
        for material in other.materials {
            let material = Arc::unwrap_or_clone(material);
            self.insert(material);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Material>> {
        self.by_name.get(name).map(|&i| &self.materials[i])
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Material>> {
        self.materials.iter()
    }
}

fn scalar(args: &[&str], file: &str, line: usize, tag: &str) -> AssetResult<f32> {
    let raw = args
        .first()
        .ok_or_else(|| AssetError::format(file, line, format!("{} is missing a value", tag)))?;
    raw.parse::<f32>()
        .map_err(|e| AssetError::format(file, line, format!("invalid {} value '{}': {}", tag, raw, e)))
}

fn color(args: &[&str], file: &str, line: usize, tag: &str) -> AssetResult<Vec3> {
    if args.len() < 3 {
        return Err(AssetError::format(
            file,
            line,
            format!("{} requires 3 components, found {}", tag, args.len()),
        ));
    }
    let mut rgb = [0.0f32; 3];
    for (slot, raw) in rgb.iter_mut().zip(args) {
        *slot = raw.parse::<f32>().map_err(|e| {
            AssetError::format(file, line, format!("invalid {} component '{}': {}", tag, raw, e))
        })?;
    }
    Ok(vec3(rgb[0], rgb[1], rgb[2]))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const LIB: &str = "\
# two materials
newmtl glass
Ka 0.1 0.1 0.1
Kd 0.2 0.4 0.6
Ks 1 1 1
d 0.3
Ns 96
illum 4
map_Kd textures/glass.png

newmtl brick
Kd 0.7 0.2 0.1
map_Kd textures/missing.png
";

    fn parse(src: &str) -> AssetResult<MaterialLibrary> {
        MaterialLibrary::parse(Cursor::new(src), "test.mtl", |t| t == "textures/glass.png")
    }

    #[test]
    fn parses_records_and_finalizes_last() {
        let lib = parse(LIB).expect("parse");
        assert_eq!(lib.len(), 2);

        let glass = lib.get("glass").expect("glass");
        assert_eq!(glass.ambient, Vec3::splat(0.1));
        assert_eq!(glass.diffuse, vec3(0.2, 0.4, 0.6));
        assert_eq!(glass.specular, Vec3::ONE);
        assert_eq!(glass.opacity, 0.3);
        assert_eq!(glass.shininess, 96.0);
        assert_eq!(glass.illum, 4);
        assert_eq!(glass.diffuse_texture.as_deref(), Some("textures/glass.png"));
        assert!(glass.is_transparent());

        let brick = lib.get("brick").expect("brick");
        assert_eq!(brick.opacity, 1.0);
        assert!(brick.diffuse_texture.is_none(), "unresolvable map_Kd is dropped");
        assert!(lib.get("Brick").is_none());
    }

    #[test]
    fn non_utf8_comments_are_tolerated() {
        let src: &[u8] = b"# mat\xe9riaux caf\xe9\nnewmtl red\nKd 1 0 0\n";
        let lib = MaterialLibrary::parse(src, "latin.mtl", |_| false).expect("parse");
        assert_eq!(lib.get("red").expect("red").diffuse, vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn tr_is_inverse_of_d() {
        let lib = parse("newmtl a\nTr 0.25\n").expect("parse");
        assert_eq!(lib.get("a").expect("a").opacity, 0.75);
    }

    #[test]
    fn malformed_value_reports_mtl_line() {
        let err = parse("newmtl a\nKd 1 x 1\n").unwrap_err();
        assert!(matches!(err, AssetError::Format { line: 2, .. }), "{err}");
        let err = parse("newmtl a\nd\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn directives_before_newmtl_are_ignored() {
        let lib = parse("Kd 1 1 1\nnewmtl a\n").expect("parse");
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get("a").expect("a").diffuse, Vec3::ZERO);
    }

    #[test]
    fn merge_replaces_redefined_names() {
        let mut lib = parse("newmtl a\nd 0.5\nnewmtl b\n").expect("parse");
        let other = parse("newmtl a\nd 0.9\nnewmtl c\n").expect("parse");
        lib.merge(other);
        assert_eq!(lib.len(), 3);
        assert_eq!(lib.get("a").expect("a").opacity, 0.9);
        let names: Vec<&str> = lib.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn load_resolves_through_locator() {
        let locator = ResourceLocator::new()
            .with_bundled("m/lib.mtl", "newmtl wood\nmap_Kd wood.png\n")
            .with_bundled("m/wood.png", vec![0u8; 4]);
        let lib = MaterialLibrary::load(&locator, "m", "lib.mtl").expect("load");
        assert_eq!(
            lib.get("wood").expect("wood").diffuse_texture.as_deref(),
            Some("wood.png")
        );
        assert!(MaterialLibrary::load(&locator, "m", "nope.mtl").is_err());
    }
}
