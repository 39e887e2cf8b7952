//! Draw batch: the sorted faces flattened into buffers plus a command list.
//!
//! Built once per model. The renderer turns it into context-bound GPU
//! resources; nothing here touches a graphics API.

use std::{collections::HashMap, sync::Arc};

use bytemuck::{Pod, Zeroable};
use corelib::Vec3;

use crate::{
    error::{AssetError, AssetResult},
    model::Face,
    mtl::Material,
    obj::{Corner, TexCoord, Vertex},
    texture::TextureData,
};

/// Added to the combined ambient + diffuse color of every command.
const LIGHTEN: f32 = 0.15;

/// Interleaved vertex: position, normal, uv. Missing normals are zero,
/// missing uvs are `[0, 0]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BatchVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl BatchVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// How a command's indices are assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Every 3 indices form a triangle.
    TriangleList,
    /// Every 4 indices form a quad.
    QuadList,
    /// One polygon; the indices are a fan around the first.
    PolygonFan,
}

impl Primitive {
    pub fn for_arity(arity: usize) -> Self {
        match arity {
            3 => Self::TriangleList,
            4 => Self::QuadList,
            _ => Self::PolygonFan,
        }
    }
}

/// A contiguous index range drawn with one material state.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub primitive: Primitive,
    pub first_index: u32,
    pub index_count: u32,
    pub material: Arc<Material>,
    pub texture: Option<Arc<TextureData>>,
    /// RGBA, alpha is the material opacity.
    pub color: [f32; 4],
}

impl DrawCommand {
    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    fn continues(&self, primitive: Primitive, material: &Arc<Material>) -> bool {
        primitive != Primitive::PolygonFan
            && self.primitive == primitive
            && Arc::ptr_eq(&self.material, material)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DrawBatch {
    pub vertices: Vec<BatchVertex>,
    pub indices: Vec<u32>,
    pub commands: Vec<DrawCommand>,
}

impl DrawBatch {
    /// Flatten `faces` (already in draw order). Corners sharing the same
    /// position/texcoord/normal triple share one vertex.
    pub fn build(
        faces: &[Face],
        positions: &[Vertex],
        texcoords: &[TexCoord],
        normals: &[Vec3],
        flip_v: bool,
        file: &str,
    ) -> AssetResult<Self> {
        let mut batch = Self::default();
        let mut unique: HashMap<Corner, u32> = HashMap::new();

        for face in faces {
            let primitive = Primitive::for_arity(face.arity());
            let first_index = to_u32(batch.indices.len(), file)?;

            for corner in &face.corners {
                let index = match unique.get(corner) {
                    Some(&idx) => idx,
                    None => {
                        let position = positions[corner.position].position.to_array();
                        let normal = corner
                            .normal
                            .map(|i| normals[i].to_array())
                            .unwrap_or([0.0, 0.0, 0.0]);
                        let uv = corner
                            .texcoord
                            .map(|i| {
                                let t = texcoords[i];
                                if flip_v { [t.u, 1.0 - t.v] } else { [t.u, t.v] }
                            })
                            .unwrap_or([0.0, 0.0]);

                        let idx = to_u32(batch.vertices.len(), file)?;
                        batch.vertices.push(BatchVertex::new(position, normal, uv));
                        unique.insert(*corner, idx);
                        idx
                    }
                };
                batch.indices.push(index);
            }

            let count = to_u32(face.corners.len(), file)?;
            let merged = match batch.commands.last_mut() {
                Some(cmd) if cmd.continues(primitive, &face.material) => {
                    cmd.index_count += count;
                    true
                }
                _ => false,
            };
            if !merged {
                batch.commands.push(DrawCommand {
                    primitive,
                    first_index,
                    index_count: count,
                    material: Arc::clone(&face.material),
                    texture: face.texture.clone(),
                    color: face_color(&face.material),
                });
            }
        }

        Ok(batch)
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Indices of one command.
    pub fn command_indices(&self, cmd: &DrawCommand) -> &[u32] {
        let start = cmd.first_index as usize;
        &self.indices[start..start + cmd.index_count as usize]
    }
}

/// Ambient + diffuse, clamped, lightened a little, with the material opacity.
pub fn face_color(material: &Material) -> [f32; 4] {
    let base = (material.diffuse + material.ambient).min(Vec3::ONE);
    let rgb = (base + Vec3::splat(LIGHTEN)).min(Vec3::ONE);
    [rgb.x, rgb.y, rgb.z, material.opacity]
}

fn to_u32(n: usize, file: &str) -> AssetResult<u32> {
    u32::try_from(n).map_err(|_| AssetError::TooLarge {
        file: file.to_string(),
        count: n,
    })
}
