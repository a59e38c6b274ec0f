use godot::classes::mesh::PrimitiveType;
use godot::classes::{ArrayMesh, Material, StandardMaterial3D, SurfaceTool};
use godot::prelude::*;

use crate::tile::{HeightTile, TerrainTile, TileCoord, TileIndex};

/// Editor tint per tile so seams stay visible while sculpting
fn tile_color(coord: TileCoord) -> Color {
    match (coord.x + coord.y).rem_euclid(2) * 4 + coord.y.rem_euclid(4) {
        0 => Color::from_rgba(0.55, 0.62, 0.45, 1.0),
        1 => Color::from_rgba(0.50, 0.58, 0.42, 1.0),
        2 => Color::from_rgba(0.58, 0.64, 0.48, 1.0),
        3 => Color::from_rgba(0.52, 0.60, 0.44, 1.0),
        4 => Color::from_rgba(0.62, 0.58, 0.46, 1.0),
        5 => Color::from_rgba(0.58, 0.54, 0.42, 1.0),
        6 => Color::from_rgba(0.64, 0.60, 0.48, 1.0),
        _ => Color::from_rgba(0.60, 0.56, 0.44, 1.0),
    }
}

/// Engine-free triangle list for one tile, in world space.
#[derive(Debug, Default)]
pub struct TileGeometry {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

impl TileGeometry {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Surface normal at a grid sample from central differences, clamped at the
/// tile border.
fn sample_normal(tile: &TerrainTile, x: usize, y: usize) -> [f32; 3] {
    let h = |ix: usize, iy: usize| tile.height_at(TileIndex::new(ix, iy)).unwrap_or(0.0);
    let left = h(x.saturating_sub(1), y);
    let right = h((x + 1).min(tile.width() - 1), y);
    let down = h(x, y.saturating_sub(1));
    let up = h(x, (y + 1).min(tile.height() - 1));

    let n = [left - right, 2.0 * tile.spacing(), down - up];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len < f32::EPSILON {
        return [0.0, 1.0, 0.0];
    }
    [n[0] / len, n[1] / len, n[2] / len]
}

/// Two triangles per grid quad, wound clockwise seen from above.
///
/// Covers the whole surface extent of the tile. Without shared edges that
/// includes one extra row and column of quads holding the last samples.
pub fn build_tile_geometry(tile: &TerrainTile) -> TileGeometry {
    let (w, h) = (tile.width(), tile.height());
    let (origin, max) = tile.bounds();
    let cols = ((max.0 - origin.0) / tile.spacing()).round() as usize;
    let rows = ((max.1 - origin.1) / tile.spacing()).round() as usize;
    let quads = cols * rows;
    let mut geometry = TileGeometry {
        vertices: Vec::with_capacity(quads * 6),
        normals: Vec::with_capacity(quads * 6),
        uvs: Vec::with_capacity(quads * 6),
    };

    for y in 0..rows {
        for x in 0..cols {
            let corners = [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)];
            for &c in &[0, 1, 2, 1, 3, 2] {
                let (gx, gy) = corners[c];
                let wx = origin.0 + gx as f32 * tile.spacing();
                let wz = origin.1 + gy as f32 * tile.spacing();
                geometry.vertices.push([wx, tile.sample_height(wx, wz), wz]);
                geometry
                    .normals
                    .push(sample_normal(tile, gx.min(w - 1), gy.min(h - 1)));
                geometry
                    .uvs
                    .push([gx as f32 / cols as f32, gy as f32 / rows as f32]);
            }
        }
    }
    geometry
}

/// Build the render mesh of one tile using SurfaceTool.
pub fn build_tile_mesh(tile: &TerrainTile) -> Option<Gd<ArrayMesh>> {
    let geometry = build_tile_geometry(tile);
    if geometry.vertices.is_empty() {
        return None;
    }

    let color = tile_color(tile.grid_position());
    let mut st = SurfaceTool::new_gd();
    st.begin(PrimitiveType::TRIANGLES);

    for i in 0..geometry.vertices.len() {
        let [nx, ny, nz] = geometry.normals[i];
        let [u, v] = geometry.uvs[i];
        let [x, y, z] = geometry.vertices[i];
        st.set_normal(Vector3::new(nx, ny, nz));
        st.set_color(color);
        st.set_uv(Vector2::new(u, v));
        st.add_vertex(Vector3::new(x, y, z));
    }

    st.commit()
}

/// Vertex-colored material shared by all tile meshes
pub fn create_default_material() -> Gd<Material> {
    let mut material = StandardMaterial3D::new_gd();
    material.set_flag(godot::classes::base_material_3d::Flags::ALBEDO_FROM_VERTEX_COLOR, true);
    material.upcast()
}
