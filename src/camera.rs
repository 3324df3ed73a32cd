use log::warn;
use nalgebra::{Isometry3, Perspective3, Point3, Unit, Vector3, Vector4};
use rayon::prelude::*;

struct Lens {
    projection: Perspective3<f32>,
    view: Isometry3<f32>,

    vertical_fov: f32,
    near: f32,
    far: f32,

    forward: Unit<Vector3<f32>>,
}

/// World-space position plus one precomputed ray direction per pixel.
///
/// The renderer never builds rays on its own; it looks up `ray_directions()`
/// with a row-major `x + y * width` index.
pub struct Camera {
    position: Point3<f32>,
    rays: Vec<Vector3<f32>>,
    width: u32,
    height: u32,
    lens: Option<Lens>,
}

impl Camera {
    /// 이미 계산된 방향 테이블을 그대로 사용하는 카메라
    pub fn from_rays(position: Point3<f32>, rays: Vec<Vector3<f32>>, width: u32, height: u32) -> Self {
        Self {
            position,
            rays,
            width,
            height,
            lens: None,
        }
    }

    /// Right-handed perspective camera at `(0, 0, 6)` looking toward `-z`.
    ///
    /// `vertical_fov` is in radians. Zero dimensions are bumped to 1 so the
    /// aspect ratio stays finite.
    pub fn perspective(vertical_fov: f32, near: f32, far: f32, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let position = Point3::new(0.0, 0.0, 6.0);
        let forward = Unit::new_unchecked(Vector3::new(0.0, 0.0, -1.0));
        let aspect = width as f32 / height as f32;

        let mut camera = Self {
            position,
            rays: vec![],
            width,
            height,
            lens: Some(Lens {
                projection: Perspective3::new(aspect, vertical_fov, near, far),
                view: Isometry3::look_at_rh(
                    &position,
                    &(position + forward.into_inner()),
                    &Vector3::y(),
                ),
                vertical_fov,
                near,
                far,
                forward,
            }),
        };

        camera.reevaluate_rays();
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn ray_directions(&self) -> &[Vector3<f32>] {
        &self.rays
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn forward(&self) -> Option<Vector3<f32>> {
        self.lens.as_ref().map(|lens| lens.forward.into_inner())
    }

    /// Moves a perspective camera and points it at `target`.
    pub fn look_at(&mut self, position: Point3<f32>, target: Point3<f32>) {
        let Some(lens) = self.lens.as_mut() else {
            warn!("look_at ignored: camera uses a fixed ray table");
            return;
        };

        self.position = position;
        lens.forward = Unit::new_normalize(target - position);
        lens.view = Isometry3::look_at_rh(&position, &target, &Vector3::y());

        self.reevaluate_rays();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (self.width, self.height) == (width, height) {
            return;
        }

        let Some(lens) = self.lens.as_mut() else {
            warn!("resize ignored: camera uses a fixed ray table");
            return;
        };

        self.width = width.max(1);
        self.height = height.max(1);

        let aspect = self.width as f32 / self.height as f32;
        lens.projection = Perspective3::new(aspect, lens.vertical_fov, lens.near, lens.far);

        self.reevaluate_rays();
    }

    fn reevaluate_rays(&mut self) {
        let Some(lens) = self.lens.as_ref() else {
            return;
        };

        let (width, height) = (self.width, self.height);
        let inverse_projection = lens.projection.inverse();
        let view = lens.view;

        self.rays = (0..width * height)
            .into_par_iter()
            .map(|index| {
                let x = index % width;
                let y = index / width;

                // NDC: x는 왼쪽이 -1, y는 위쪽이 +1 (0번째 줄이 화면 맨 위)
                let ndc_x = (x as f32 / width as f32) * 2.0 - 1.0;
                let ndc_y = 1.0 - (y as f32 / height as f32) * 2.0;

                let target = inverse_projection * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
                let local = (target.xyz() / target.w).normalize();

                view.inverse_transform_vector(&local)
            })
            .collect();
    }
}
