use nalgebra::{Point3, Vector3};

use crate::tracer::RenderError;

/// Everything the tracer reads while rendering one frame.
///
/// `light_direction` points from the light toward the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub materials: Vec<Material>,
    pub light_direction: Vector3<f32>,
}

impl Scene {
    pub fn empty() -> Self {
        Self {
            spheres: vec![],
            materials: vec![],
            light_direction: Vector3::new(-1.0, -1.0, -1.0).normalize(),
        }
    }

    /// Checks that every sphere points at an existing material.
    pub fn validate(&self) -> Result<(), RenderError> {
        let available = self.materials.len();
        match self
            .spheres
            .iter()
            .position(|sphere| sphere.material_index >= available)
        {
            Some(sphere) => Err(RenderError::InvalidMaterial {
                sphere,
                material: self.spheres[sphere].material_index,
                available,
            }),
            None => Ok(()),
        }
    }
}

// 분홍 구 하나가 아주 큰 파란 구(바닥) 위에 올라가 있는 장면
impl Default for Scene {
    fn default() -> Self {
        Self {
            spheres: vec![
                Sphere::new(Point3::origin(), 1.0, 0),
                Sphere::new(Point3::new(0.0, -101.0, 0.0), 100.0, 1),
            ],
            materials: vec![
                Material::new(Vector3::new(1.0, 0.0, 1.0), 0.0),
                Material::new(Vector3::new(0.2, 0.3, 1.0), 0.1),
            ],
            light_direction: Vector3::new(-1.0, -1.0, -1.0).normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub position: Point3<f32>,
    pub radius: f32,
    pub material_index: usize,
}

impl Sphere {
    pub fn new(position: Point3<f32>, radius: f32, material_index: usize) -> Self {
        Self {
            position,
            radius,
            material_index,
        }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(Point3::origin(), 1.0, 0)
    }
}

/// `roughness` 0은 완벽한 거울, 1은 반사 방향이 가장 많이 흔들림
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo: Vector3<f32>,
    pub roughness: f32,
}

impl Material {
    pub fn new(albedo: Vector3<f32>, roughness: f32) -> Self {
        Self { albedo, roughness }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            roughness: 1.0,
        }
    }
}
