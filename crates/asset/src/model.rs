//! Face assembly, draw ordering and the immutable `Model`.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use corelib::{BoundingBox, Extents, Vec3};

use crate::{
    batch::{DrawBatch, Primitive},
    config::LoadOptions,
    error::{AssetError, AssetResult},
    mtl::{Material, MaterialLibrary},
    obj::{Corner, ObjData, RawFace, TexCoord, Vertex},
    texture::{TextureCache, TextureData},
};

/// Face with its material resolved.
#[derive(Clone, Debug)]
pub struct Face {
    pub corners: Vec<Corner>,
    pub material: Arc<Material>,
    /// `None` when the material is untextured or its texture failed to load.
    pub texture: Option<Arc<TextureData>>,
}

impl Face {
    #[inline]
    pub fn arity(&self) -> usize {
        self.corners.len()
    }

    #[inline]
    pub fn primitive(&self) -> Primitive {
        Primitive::for_arity(self.arity())
    }

    /// The material's texture reference, if a texture is actually bound.
    pub fn texture_ref(&self) -> Option<&str> {
        self.texture
            .as_ref()
            .and(self.material.diffuse_texture.as_deref())
    }

    pub fn draw_key(&self) -> DrawKey<'_> {
        DrawKey {
            opacity: self.material.opacity,
            texture: self.texture_ref(),
            material: &self.material.name,
        }
    }
}

/// Everything the draw order looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawKey<'a> {
    pub opacity: f32,
    pub texture: Option<&'a str>,
    pub material: &'a str,
}

impl DrawKey<'_> {
    /// Opaque first, then untextured before textured, then texture name,
    /// then material name.
    pub fn draw_cmp(&self, other: &Self) -> Ordering {
        // `+ 0.0` folds -0.0 into 0.0 so both compare equal
        (other.opacity + 0.0)
            .total_cmp(&(self.opacity + 0.0))
            .then_with(|| self.texture.cmp(&other.texture))
            .then_with(|| self.material.cmp(other.material))
    }
}

/// Stable sort into draw order; equal keys keep parse order.
pub fn sort_draw_order(faces: &mut [Face]) {
    faces.sort_by(|a, b| a.draw_key().draw_cmp(&b.draw_key()));
}

/// Resolve every raw face's material and texture.
///
/// Faces declared before any `usemtl` get [`Material::fallback`]. A name no
/// library defines fails with [`AssetError::MissingMaterial`].
pub fn assemble_faces(
    raw: Vec<RawFace>,
    library: &MaterialLibrary,
    textures: &mut TextureCache<'_>,
    file: &str,
) -> AssetResult<Vec<Face>> {
    let mut fallback: Option<Arc<Material>> = None;
    let mut faces = Vec::with_capacity(raw.len());

    for face in raw {
        let material = match face.material.as_deref() {
            Some(name) => match library.get(name) {
                Some(material) => Arc::clone(material),
                None => {
                    return Err(AssetError::MissingMaterial {
                        file: file.to_string(),
                        line: face.line,
                        name: name.to_string(),
                    });
                }
            },
            None => Arc::clone(fallback.get_or_insert_with(|| Arc::new(Material::fallback()))),
        };

        let texture = material
            .diffuse_texture
            .as_deref()
            .and_then(|reference| textures.get_or_load(reference));

        faces.push(Face {
            corners: face.corners,
            material,
            texture,
        });
    }

    Ok(faces)
}

/// Fully loaded model. Immutable once built.
#[derive(Debug)]
pub struct Model {
    source: String,
    vertices: Vec<Vertex>,
    texcoords: Vec<TexCoord>,
    normals: Vec<Vec3>,
    faces: Vec<Face>,
    textures: HashMap<String, Arc<TextureData>>,
    extents: Extents,
    offset: Vec3,
    bounding_box: BoundingBox,
    batch: DrawBatch,
}

impl Model {
    /// Assemble, sort, bound and batch parsed geometry.
    pub fn build(
        source: &str,
        obj: ObjData,
        library: &MaterialLibrary,
        mut textures: TextureCache<'_>,
        options: &LoadOptions,
    ) -> AssetResult<Self> {
        let ObjData {
            mut vertices,
            texcoords,
            normals,
            faces,
            bounds,
            ..
        } = obj;

        let mut faces = assemble_faces(faces, library, &mut textures, source)?;
        sort_draw_order(&mut faces);

        let mut extents = bounds.extents();
        let mut offset = Vec3::ZERO;
        if options.centered && !bounds.is_empty() {
            offset = extents.recenter_offset();
            for v in &mut vertices {
                v.position += offset;
            }
            extents = extents.translated(offset);
        }

        let batch = DrawBatch::build(
            &faces,
            &vertices,
            &texcoords,
            &normals,
            options.flip_texture_vertically,
            source,
        )?;

        if faces.is_empty() {
            log::warn!("{} contains no faces", source);
        }

        Ok(Self {
            source: source.to_string(),
            vertices,
            texcoords,
            normals,
            faces,
            textures: textures.into_loaded(),
            bounding_box: BoundingBox::from_extents(&extents),
            extents,
            offset,
            batch,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn texcoords(&self) -> &[TexCoord] {
        &self.texcoords
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Faces in draw order.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn polygon_count(&self) -> usize {
        self.faces.len()
    }

    pub fn textures(&self) -> &HashMap<String, Arc<TextureData>> {
        &self.textures
    }

    pub fn texture(&self, reference: &str) -> Option<&Arc<TextureData>> {
        self.textures.get(reference)
    }

    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    /// Translation applied by re-centering, zero otherwise.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn width(&self) -> f32 {
        self.extents.width()
    }

    pub fn height(&self) -> f32 {
        self.extents.height()
    }

    pub fn depth(&self) -> f32 {
        self.extents.depth()
    }

    pub fn ground(&self) -> f32 {
        self.extents.ground()
    }

    pub fn max_dimension(&self) -> f32 {
        self.extents.max_dimension()
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn batch(&self) -> &DrawBatch {
        &self.batch
    }
}
