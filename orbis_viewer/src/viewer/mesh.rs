//! Globe geometry: a UV sphere with equirectangular texture coordinates.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

pub const GLOBE_SEGMENTS: u32 = 32;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct GlobeVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct GlobeUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MarkerUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub time: f32,
    pub _padding: [f32; 3],
}

pub struct GlobeMesh {
    pub vertices: Vec<GlobeVertex>,
    pub indices: Vec<u32>,
}

pub fn matrix_columns(matrix: Mat4) -> [[f32; 4]; 4] {
    let data = matrix.to_cols_array();
    [
        [data[0], data[1], data[2], data[3]],
        [data[4], data[5], data[6], data[7]],
        [data[8], data[9], data[10], data[11]],
        [data[12], data[13], data[14], data[15]],
    ]
}

/// Latitude/longitude sphere of the given radius. UVs wrap the texture once
/// around the equator with v=0 at the north pole.
pub fn build_globe(radius: f32, lat_divisions: u32, lon_divisions: u32) -> GlobeMesh {
    let lat_steps = lat_divisions.max(3);
    let lon_steps = lon_divisions.max(6);
    let mut vertices = Vec::with_capacity(((lat_steps + 1) * (lon_steps + 1)) as usize);
    let mut indices = Vec::with_capacity((lat_steps * lon_steps * 6) as usize);

    for lat in 0..=lat_steps {
        let v = lat as f32 / lat_steps as f32;
        let theta = v * PI;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for lon in 0..=lon_steps {
            let u = lon as f32 / lon_steps as f32;
            let phi = u * PI * 2.0;

            let x = sin_theta * phi.cos();
            let y = cos_theta;
            let z = sin_theta * phi.sin();
            vertices.push(GlobeVertex {
                position: [x * radius, y * radius, z * radius],
                uv: [u, v],
            });
        }
    }

    let ring = lon_steps + 1;
    for lat in 0..lat_steps {
        for lon in 0..lon_steps {
            let current = lat * ring + lon;
            let next = current + ring;
            // Counter-clockwise from outside the sphere.
            indices.push(current);
            indices.push(current + 1);
            indices.push(next);

            indices.push(current + 1);
            indices.push(next + 1);
            indices.push(next);
        }
    }

    GlobeMesh { vertices, indices }
}

#[cfg(test)]
mod globe_mesh_tests {
    use super::*;

    #[test]
    fn every_vertex_sits_on_the_sphere() {
        let mesh = build_globe(5.0, GLOBE_SEGMENTS, GLOBE_SEGMENTS);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            let length = (x * x + y * y + z * z).sqrt();
            assert!(
                (length - 5.0).abs() < 1e-4,
                "vertex at distance {length} from center"
            );
        }
    }

    #[test]
    fn indices_stay_in_vertex_range_and_triangulate_fully() {
        let mesh = build_globe(1.0, 8, 12);
        assert_eq!(mesh.indices.len() % 3, 0);
        let max = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&index| index < max));
        assert_eq!(mesh.indices.len(), (8 * 12 * 6) as usize);
    }

    #[test]
    fn uvs_cover_the_unit_square() {
        let mesh = build_globe(1.0, 8, 12);
        let us: Vec<f32> = mesh.vertices.iter().map(|v| v.uv[0]).collect();
        let vs: Vec<f32> = mesh.vertices.iter().map(|v| v.uv[1]).collect();
        assert!(us.iter().any(|&u| u == 0.0) && us.iter().any(|&u| u == 1.0));
        assert!(vs.iter().any(|&v| v == 0.0) && vs.iter().any(|&v| v == 1.0));
        assert!(us.iter().chain(vs.iter()).all(|&c| (0.0..=1.0).contains(&c)));
    }
}
