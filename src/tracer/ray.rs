use nalgebra::{Point3, Vector3};

/// 방향은 정규화되어 있지 않아도 됨. 교차 계산이 `dot(D, D)`를 그대로 씀.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }
}
