use log::{debug, trace};
use nalgebra::{Point3, Vector3, Vector4};
use rayon::prelude::*;

use crate::camera::Camera;
use crate::tracer::image::Image;
use crate::tracer::ray::Ray;
use crate::tracer::scene::{Material, Scene};
use crate::util::{ThreadRngSampler, VectorSampler};
use crate::vec4_to_rgba;

mod error;
pub mod image;
pub mod ray;
pub mod scene;

pub use error::RenderError;

pub const MAX_BOUNCES: u32 = 5;
pub const SSAA_FACTOR: u32 = 2;
pub const SELF_INTERSECTION_EPSILON: f32 = 1e-4;
pub const SKY_COLOR: [f32; 3] = [0.6, 0.7, 0.9];
pub const BOUNCE_FALLOFF: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Keep adding samples across `render` calls. When off, every call shows a
    /// fresh single-sample frame.
    pub accumulate: bool,
    /// 행 단위로 rayon 병렬 처리
    pub parallel: bool,
    pub max_bounces: u32,
    /// Sub-samples per axis in `render_ssaa`.
    pub ssaa_factor: u32,
    pub self_intersection_epsilon: f32,
    pub sky_color: Vector3<f32>,
    /// Weight multiplier applied after every bounce.
    pub bounce_falloff: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accumulate: true,
            parallel: true,
            max_bounces: MAX_BOUNCES,
            ssaa_factor: SSAA_FACTOR,
            self_intersection_epsilon: SELF_INTERSECTION_EPSILON,
            sky_color: Vector3::from(SKY_COLOR),
            bounce_falloff: BOUNCE_FALLOFF,
        }
    }
}

/// Progressive CPU ray tracer.
///
/// Owns the final packed image, the per-pixel accumulation sums and the frame
/// index. Scene and camera are borrowed for the duration of one call only.
pub struct Renderer {
    final_image: Option<Image>,
    path_acc: Vec<Vector4<f32>>,
    frame_index: u32,
    pub settings: Settings,
    sampler: Box<dyn VectorSampler + Send>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Renderer {
    pub fn new(settings: Settings) -> Self {
        Self::with_sampler(settings, ThreadRngSampler)
    }

    pub fn with_sampler<S: VectorSampler + Send + 'static>(settings: Settings, sampler: S) -> Self {
        Self {
            final_image: None,
            path_acc: vec![],
            frame_index: 1,
            settings,
            sampler: Box::new(sampler),
        }
    }

    /// (Re)allocates both buffers when the size changes.
    ///
    /// A reallocation zeroes the accumulation buffer. The frame index is left
    /// as is; call `reset_frame_index` to start a new sequence.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSize { width, height });
        }

        match self.final_image.as_mut() {
            Some(image) => {
                if !image.resize(width, height) {
                    return Ok(());
                }
            }
            None => self.final_image = Some(Image::new(width, height)),
        }

        self.path_acc = vec![Vector4::zeros(); width as usize * height as usize];
        debug!("renderer resized to {width}x{height}");

        Ok(())
    }

    /// One progressive frame: trace a sample per pixel, add it to the running
    /// sum and display `sum / frame_index`.
    pub fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        let (width, height) = self.prepare(scene, camera)?;

        if self.frame_index == 1 {
            self.path_acc.fill(Vector4::zeros());
            debug!("accumulation reset");
        }

        let Self {
            final_image,
            path_acc,
            frame_index,
            settings,
            sampler,
        } = self;
        let Some(image) = final_image.as_mut() else {
            unreachable!("prepare sizes the image");
        };

        let frame = Frame {
            scene,
            camera,
            settings,
            sampler: &**sampler,
            width,
            height,
        };
        let divisor = *frame_index as f32;
        let row_width = width as usize;

        if settings.parallel {
            image
                .pixels_mut()
                .par_chunks_mut(row_width)
                .zip(path_acc.par_chunks_mut(row_width))
                .enumerate()
                .for_each(|(y, (pixels, sums))| frame.accumulate_row(y as u32, pixels, sums, divisor));
        } else {
            image
                .pixels_mut()
                .chunks_mut(row_width)
                .zip(path_acc.chunks_mut(row_width))
                .enumerate()
                .for_each(|(y, (pixels, sums))| frame.accumulate_row(y as u32, pixels, sums, divisor));
        }

        trace!("frame {} rendered", *frame_index);

        if settings.accumulate {
            *frame_index = frame_index.saturating_add(1);
        } else {
            *frame_index = 1;
        }

        Ok(())
    }

    /// Fixed N x N supersampling, written straight to the image. Leaves the
    /// accumulation buffer and the frame index alone.
    pub fn render_ssaa(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        let (width, height) = self.prepare(scene, camera)?;

        let Self {
            final_image,
            settings,
            sampler,
            ..
        } = self;
        let Some(image) = final_image.as_mut() else {
            unreachable!("prepare sizes the image");
        };

        let frame = Frame {
            scene,
            camera,
            settings,
            sampler: &**sampler,
            width,
            height,
        };
        let row_width = width as usize;

        if settings.parallel {
            image
                .pixels_mut()
                .par_chunks_mut(row_width)
                .enumerate()
                .for_each(|(y, pixels)| frame.supersample_row(y as u32, pixels));
        } else {
            image
                .pixels_mut()
                .chunks_mut(row_width)
                .enumerate()
                .for_each(|(y, pixels)| frame.supersample_row(y as u32, pixels));
        }

        trace!("ssaa frame rendered ({0}x{0})", settings.ssaa_factor.max(1));

        Ok(())
    }

    pub fn reset_frame_index(&mut self) {
        self.frame_index = 1;
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn image(&self) -> Option<&Image> {
        self.final_image.as_ref()
    }

    /// Running per-pixel sums of the current accumulation sequence.
    pub fn accumulation(&self) -> &[Vector4<f32>] {
        &self.path_acc
    }

    /// One sample of the primary ray through pixel `(x, y)` of `camera`.
    pub fn per_pixel(&self, scene: &Scene, camera: &Camera, x: u32, y: u32) -> Vector4<f32> {
        let (width, height) = camera.size();
        self.frame(scene, camera, width, height).per_pixel(x, y)
    }

    /// Follows `ray` through up to `max_bounces` bounces and returns its color.
    pub fn trace_path(&self, scene: &Scene, ray: Ray) -> Vector4<f32> {
        trace_path(scene, &self.settings, &*self.sampler, ray)
    }

    /// Next ray direction after hitting a surface with `normal`.
    pub fn bounce_direction(
        &self,
        incoming: &Vector3<f32>,
        normal: &Vector3<f32>,
        material: &Material,
    ) -> Vector3<f32> {
        bounce_direction(&*self.sampler, incoming, normal, material)
    }

    fn frame<'a>(&'a self, scene: &'a Scene, camera: &'a Camera, width: u32, height: u32) -> Frame<'a> {
        Frame {
            scene,
            camera,
            settings: &self.settings,
            sampler: &*self.sampler,
            width,
            height,
        }
    }

    // 이미지 크기가 없으면 카메라 크기로 할당. 나머지 전제 조건은 픽셀 루프 전에 한 번만 확인.
    fn prepare(&mut self, scene: &Scene, camera: &Camera) -> Result<(u32, u32), RenderError> {
        if self.final_image.is_none() {
            let (width, height) = camera.size();
            self.resize(width, height)?;
        }

        let (width, height) = self
            .final_image
            .as_ref()
            .map(Image::size)
            .ok_or(RenderError::ZeroSize { width: 0, height: 0 })?;

        let expected = width as usize * height as usize;
        let actual = camera.ray_directions().len();
        if expected != actual {
            return Err(RenderError::RayTableMismatch { expected, actual });
        }

        scene.validate()?;

        Ok((width, height))
    }
}

/// Per-call view of everything the pixel loop reads.
struct Frame<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    settings: &'a Settings,
    sampler: &'a dyn VectorSampler,
    width: u32,
    height: u32,
}

impl Frame<'_> {
    fn accumulate_row(&self, y: u32, pixels: &mut [u32], sums: &mut [Vector4<f32>], divisor: f32) {
        for (x, (pixel, sum)) in pixels.iter_mut().zip(sums.iter_mut()).enumerate() {
            *sum += self.per_pixel(x as u32, y);

            let accumulated = *sum / divisor;
            *pixel = vec4_to_rgba(&accumulated);
        }
    }

    fn supersample_row(&self, y: u32, pixels: &mut [u32]) {
        let factor = self.settings.ssaa_factor.max(1);
        let step = factor as f32;

        for (x, pixel) in pixels.iter_mut().enumerate() {
            let mut color = Vector4::zeros();

            for sy in 0..factor {
                for sx in 0..factor {
                    color += self.sub_pixel(x as u32, y, sx as f32 / step, sy as f32 / step);
                }
            }

            color /= (factor * factor) as f32;
            *pixel = vec4_to_rgba(&color);
        }
    }

    // DirectX의 RayGen 쉐이더와 같음
    fn per_pixel(&self, x: u32, y: u32) -> Vector4<f32> {
        let direction = self.camera.ray_directions()[(x + y * self.width) as usize];
        self.trace_path(Ray::new(self.camera.position(), direction))
    }

    fn sub_pixel(&self, x: u32, y: u32, offset_x: f32, offset_y: f32) -> Vector4<f32> {
        let direction = self.sub_pixel_direction(x, y, offset_x, offset_y);
        self.trace_path(Ray::new(self.camera.position(), direction))
    }

    // 카메라는 픽셀마다 방향 하나만 주니까, 오른쪽/아래 이웃 픽셀 방향과 쌍선형 보간
    fn sub_pixel_direction(&self, x: u32, y: u32, offset_x: f32, offset_y: f32) -> Vector3<f32> {
        let rays = self.camera.ray_directions();
        let at = |x: u32, y: u32| rays[(x + y * self.width) as usize];

        let right = (x + 1).min(self.width - 1);
        let below = (y + 1).min(self.height - 1);

        let top = at(x, y).lerp(&at(right, y), offset_x);
        let bottom = at(x, below).lerp(&at(right, below), offset_x);
        top.lerp(&bottom, offset_y)
    }

    fn trace_path(&self, ray: Ray) -> Vector4<f32> {
        trace_path(self.scene, self.settings, self.sampler, ray)
    }
}

fn trace_path(scene: &Scene, settings: &Settings, sampler: &dyn VectorSampler, mut ray: Ray) -> Vector4<f32> {
    let mut color = Vector3::zeros();
    let mut multiplier = 1.0;

    for _ in 0..settings.max_bounces {
        let payload = trace_ray(scene, &ray);
        if payload.is_miss() {
            color += settings.sky_color * multiplier;
            break;
        }

        // 법선과 빛 반대 방향의 cos 값. 뒤쪽을 보는 면은 0
        let light_intensity = payload.world_normal.dot(&-scene.light_direction).max(0.0);

        let sphere = &scene.spheres[payload.object_index];
        let material = &scene.materials[sphere.material_index];

        let shaded = material.albedo * light_intensity;
        color += shaded * multiplier;
        multiplier *= settings.bounce_falloff;

        ray = next_ray(settings, sampler, &ray, &payload, material);
    }

    Vector4::new(color.x, color.y, color.z, 1.0)
}

fn next_ray(
    settings: &Settings,
    sampler: &dyn VectorSampler,
    ray: &Ray,
    payload: &HitPayload,
    material: &Material,
) -> Ray {
    // 교차점이 구 표면 위에 있어서 그대로 쓰면 부동소수점 오차로 같은 구에 다시 맞음.
    // 법선 방향으로 조금 밀어냄
    let origin = payload.world_position + payload.world_normal * settings.self_intersection_epsilon;
    let direction = bounce_direction(sampler, &ray.direction, &payload.world_normal, material);
    Ray::new(origin, direction)
}

fn bounce_direction(
    sampler: &dyn VectorSampler,
    incoming: &Vector3<f32>,
    normal: &Vector3<f32>,
    material: &Material,
) -> Vector3<f32> {
    if material.roughness == 0.0 {
        return reflect(incoming, normal);
    }

    let perturbed = normal + sampler.vec3(-0.5..0.5) * material.roughness;
    reflect(incoming, &perturbed)
}

/// Mirrors `direction` about `normal`: `d - 2 * dot(d, n) * n`.
///
/// `normal` is used as given; a perturbed normal is not renormalized.
pub fn reflect(direction: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Result of a ray-scene query. A negative `hit_distance` means nothing was
/// hit and the other fields carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPayload {
    pub hit_distance: f32,
    pub world_position: Point3<f32>,
    pub world_normal: Vector3<f32>,
    pub object_index: usize,
}

impl HitPayload {
    pub const MISS_DISTANCE: f32 = -1.0;

    pub fn miss() -> Self {
        Self {
            hit_distance: Self::MISS_DISTANCE,
            world_position: Point3::origin(),
            world_normal: Vector3::zeros(),
            object_index: 0,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.hit_distance < 0.0
    }
}

/// Closest sphere hit along `ray`, scanning spheres in storage order.
///
/// Only the near root of the quadratic is considered, so a ray starting
/// inside a sphere does not report the exit point. Candidates must satisfy
/// `0 < t < best`, which keeps the first of several equally close spheres.
pub fn trace_ray(scene: &Scene, ray: &Ray) -> HitPayload {
    let mut closest: Option<usize> = None;
    let mut hit_distance = f32::MAX;

    for (index, sphere) in scene.spheres.iter().enumerate() {
        // 구가 원점에 있다고 보고 빛 시작점을 그만큼 옮겨서 계산
        // (dx^2 + dy^2 + dz^2) t^2 + 2 (ox dx + oy dy + oz dz) t + (ox^2 + oy^2 + oz^2 - r^2) = 0
        let origin = ray.origin - sphere.position;

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * origin.dot(&ray.direction);
        let c = origin.dot(&origin) - sphere.radius * sphere.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            continue;
        }

        let near = (-b - discriminant.sqrt()) / (2.0 * a);
        if near > 0.0 && near < hit_distance {
            hit_distance = near;
            closest = Some(index);
        }
    }

    match closest {
        Some(index) => closest_hit(scene, ray, hit_distance, index),
        None => HitPayload::miss(),
    }
}

fn closest_hit(scene: &Scene, ray: &Ray, hit_distance: f32, object_index: usize) -> HitPayload {
    let sphere = &scene.spheres[object_index];

    let origin = ray.origin - sphere.position;
    let local_position = origin + ray.direction * hit_distance;

    HitPayload {
        hit_distance,
        world_position: sphere.position + local_position,
        world_normal: local_position.normalize(),
        object_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::scene::Sphere;
    use crate::util::ConstantSampler;
    use crate::rgba_to_bytes;
    use approx::assert_relative_eq;

    fn unit_sphere_scene() -> Scene {
        Scene {
            spheres: vec![Sphere::new(Point3::origin(), 1.0, 0)],
            materials: vec![Material::new(Vector3::new(1.0, 0.5, 0.25), 0.0)],
            light_direction: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    fn fixed_camera(direction: Vector3<f32>, width: u32, height: u32) -> Camera {
        Camera::from_rays(
            Point3::new(0.0, 0.0, -5.0),
            vec![direction; (width * height) as usize],
            width,
            height,
        )
    }

    fn deterministic(settings: Settings) -> Renderer {
        Renderer::with_sampler(settings, ConstantSampler(Vector3::zeros()))
    }

    #[test]
    fn hits_near_root_of_unit_sphere() {
        let scene = unit_sphere_scene();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

        let payload = trace_ray(&scene, &ray);

        assert!(!payload.is_miss());
        assert_eq!(payload.hit_distance, 4.0);
        assert_eq!(payload.object_index, 0);
        assert_relative_eq!(payload.world_position, Point3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(payload.world_normal, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn unnormalized_direction_scales_distance() {
        let scene = unit_sphere_scene();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 2.0));

        let payload = trace_ray(&scene, &ray);

        assert_eq!(payload.hit_distance, 2.0);
        assert_relative_eq!(payload.world_position, Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn ray_pointing_away_misses() {
        let scene = unit_sphere_scene();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, -1.0));

        let payload = trace_ray(&scene, &ray);
        assert!(payload.is_miss());
        assert_eq!(payload.hit_distance, -1.0);
    }

    #[test]
    fn ray_starting_inside_sphere_reports_no_exit() {
        let scene = unit_sphere_scene();
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));

        assert!(trace_ray(&scene, &ray).is_miss());
    }

    #[test]
    fn offset_sphere_normal_points_outward() {
        let scene = Scene {
            spheres: vec![Sphere::new(Point3::new(3.0, 0.0, 0.0), 0.5, 0)],
            ..unit_sphere_scene()
        };
        let ray = Ray::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0));

        let payload = trace_ray(&scene, &ray);

        assert_eq!(payload.hit_distance, 2.5);
        assert_relative_eq!(payload.world_position, Point3::new(2.5, 0.0, 0.0));
        assert_relative_eq!(payload.world_normal, Vector3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn closest_sphere_wins_and_ties_keep_first() {
        let mut scene = unit_sphere_scene();
        scene.spheres = vec![
            Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0, 0),
            Sphere::new(Point3::new(0.0, 0.0, 2.0), 1.0, 0),
            Sphere::new(Point3::new(0.0, 0.0, 2.0), 1.0, 0),
        ];
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));

        let payload = trace_ray(&scene, &ray);
        assert_eq!(payload.object_index, 1);
        assert_eq!(payload.hit_distance, 1.0);
    }

    #[test]
    fn reflect_mirrors_about_normal() {
        let incoming = Vector3::new(1.0, -1.0, 0.0);
        let normal = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(reflect(&incoming, &normal), Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn smooth_material_bounces_as_exact_mirror() {
        let renderer = Renderer::with_sampler(Settings::default(), ConstantSampler(Vector3::new(0.4, -0.3, 0.2)));
        let mirror = Material::new(Vector3::new(1.0, 1.0, 1.0), 0.0);
        let incoming = Vector3::new(0.3, -0.8, 0.5);
        let normal = Vector3::new(0.0, 1.0, 0.0);

        assert_eq!(
            renderer.bounce_direction(&incoming, &normal, &mirror),
            reflect(&incoming, &normal)
        );
    }

    #[test]
    fn rough_material_reflects_about_perturbed_normal() {
        let offset = Vector3::new(0.4, -0.3, 0.2);
        let renderer = Renderer::with_sampler(Settings::default(), ConstantSampler(offset));
        let rough = Material::new(Vector3::new(1.0, 1.0, 1.0), 0.5);
        let incoming = Vector3::new(0.3, -0.8, 0.5);
        let normal = Vector3::new(0.0, 1.0, 0.0);

        let bounced = renderer.bounce_direction(&incoming, &normal, &rough);

        assert_eq!(bounced, reflect(&incoming, &(normal + offset * 0.5)));
        assert_ne!(bounced, reflect(&incoming, &normal));
    }

    #[test]
    fn lit_hit_then_sky_is_weighted_by_falloff() {
        // 빛이 +z로 진행하니 -z를 보는 면이 최대로 밝음
        let scene = unit_sphere_scene();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 1, 1);
        let renderer = deterministic(Settings::default());

        let color = renderer.per_pixel(&scene, &camera, 0, 0);

        // 첫 충돌: albedo * 1.0, 반사된 빛은 -z로 나가서 하늘 * 0.5
        let sky = Vector3::from(SKY_COLOR) * 0.5;
        assert_relative_eq!(color, Vector4::new(1.0 + sky.x, 0.5 + sky.y, 0.25 + sky.z, 1.0));
    }

    #[test]
    fn back_facing_light_adds_nothing() {
        let mut scene = unit_sphere_scene();
        scene.light_direction = Vector3::new(0.0, 0.0, -1.0);
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 1, 1);
        let renderer = deterministic(Settings::default());

        let color = renderer.per_pixel(&scene, &camera, 0, 0);
        let sky = Vector3::from(SKY_COLOR) * 0.5;
        assert_relative_eq!(color, Vector4::new(sky.x, sky.y, sky.z, 1.0));
    }

    #[test]
    fn bounce_limit_caps_contributions() {
        // 두 거울 구 사이에 갇힌 빛
        let scene = Scene {
            spheres: vec![
                Sphere::new(Point3::new(0.0, 0.0, 3.0), 1.0, 0),
                Sphere::new(Point3::new(0.0, 0.0, -3.0), 1.0, 0),
            ],
            materials: vec![Material::new(Vector3::new(1.0, 1.0, 1.0), 0.0)],
            light_direction: Vector3::new(0.0, 0.0, 0.0),
        };
        let camera = Camera::from_rays(Point3::origin(), vec![Vector3::new(0.0, 0.0, 1.0)], 1, 1);
        let renderer = deterministic(Settings {
            max_bounces: 3,
            ..Settings::default()
        });

        // 빛이 없어서 모든 충돌이 검정, 하늘에 도달하지 못함
        assert_eq!(renderer.per_pixel(&scene, &camera, 0, 0), Vector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn zero_bounces_is_black() {
        let scene = Scene::empty();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 1, 1);
        let renderer = deterministic(Settings {
            max_bounces: 0,
            ..Settings::default()
        });

        assert_eq!(renderer.per_pixel(&scene, &camera, 0, 0), Vector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn resize_rejects_zero_dimensions() {
        let mut renderer = Renderer::default();
        assert_eq!(
            renderer.resize(0, 4),
            Err(RenderError::ZeroSize { width: 0, height: 4 })
        );
        assert!(renderer.image().is_none());
    }

    #[test]
    fn resize_is_noop_for_same_size() {
        let scene = Scene::empty();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 2, 2);
        let mut renderer = deterministic(Settings::default());

        renderer.resize(2, 2).unwrap();
        renderer.render(&scene, &camera).unwrap();
        renderer.render(&scene, &camera).unwrap();
        assert_eq!(renderer.frame_index(), 3);

        renderer.resize(2, 2).unwrap();
        assert_eq!(renderer.frame_index(), 3);
        assert!(renderer.accumulation().iter().all(|sum| sum.w == 2.0));
    }

    #[test]
    fn resize_zeroes_accumulation() {
        let scene = Scene::empty();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 2, 2);
        let mut renderer = deterministic(Settings::default());

        renderer.resize(2, 2).unwrap();
        renderer.render(&scene, &camera).unwrap();
        renderer.resize(3, 1).unwrap();

        assert_eq!(renderer.frame_index(), 2);
        assert_eq!(renderer.accumulation().len(), 3);
        assert!(renderer.accumulation().iter().all(|sum| *sum == Vector4::zeros()));
        assert_eq!(renderer.image().map(Image::size), Some((3, 1)));
    }

    #[test]
    fn resize_keeps_frame_index_of_running_sequence() {
        let scene = Scene::empty();
        let small = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 2, 2);
        let large = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 3, 3);
        let mut renderer = deterministic(Settings::default());

        renderer.resize(2, 2).unwrap();
        for _ in 0..3 {
            renderer.render(&scene, &small).unwrap();
        }
        renderer.resize(3, 3).unwrap();
        assert_eq!(renderer.frame_index(), 4);

        // 새 버퍼에는 샘플이 하나뿐인데 나누는 값은 이어지던 프레임 번호
        renderer.render(&scene, &large).unwrap();
        let sky = Vector4::new(SKY_COLOR[0], SKY_COLOR[1], SKY_COLOR[2], 1.0);
        let image = renderer.image().unwrap();
        assert_eq!(image.pixel(2, 2), vec4_to_rgba(&(sky / 4.0)));
        assert_eq!(image.pixel_rgba(2, 2), [38, 44, 57, 63]);
        assert_eq!(renderer.frame_index(), 5);
    }

    #[test]
    fn next_ray_starts_just_outside_the_surface() {
        let scene = unit_sphere_scene();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        let payload = trace_ray(&scene, &ray);
        let settings = Settings::default();

        let next = next_ray(&settings, &ConstantSampler(Vector3::zeros()), &ray, &payload, &scene.materials[0]);

        assert_relative_eq!(
            next.origin,
            payload.world_position + payload.world_normal * SELF_INTERSECTION_EPSILON
        );
        assert_relative_eq!(next.origin, Point3::new(0.0, 0.0, -1.0001));
        assert!(next.origin.coords.norm_squared() > 1.0);
        assert_eq!(next.direction, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn zero_epsilon_leaves_origin_on_the_surface() {
        let scene = unit_sphere_scene();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        let payload = trace_ray(&scene, &ray);
        let settings = Settings {
            self_intersection_epsilon: 0.0,
            ..Settings::default()
        };

        let next = next_ray(&settings, &ConstantSampler(Vector3::zeros()), &ray, &payload, &scene.materials[0]);
        assert_eq!(next.origin, payload.world_position);
    }

    #[test]
    fn first_render_sizes_from_camera() {
        let scene = Scene::empty();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 3, 2);
        let mut renderer = deterministic(Settings::default());

        renderer.render(&scene, &camera).unwrap();

        assert_eq!(renderer.image().map(Image::size), Some((3, 2)));
        assert_eq!(renderer.accumulation().len(), 6);
    }

    #[test]
    fn mismatched_ray_table_is_rejected() {
        let scene = Scene::empty();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 2, 2);
        let mut renderer = deterministic(Settings::default());
        renderer.resize(3, 3).unwrap();

        assert_eq!(
            renderer.render(&scene, &camera),
            Err(RenderError::RayTableMismatch { expected: 9, actual: 4 })
        );
        assert_eq!(
            renderer.render_ssaa(&scene, &camera),
            Err(RenderError::RayTableMismatch { expected: 9, actual: 4 })
        );
        assert_eq!(renderer.frame_index(), 1);
    }

    #[test]
    fn dangling_material_is_rejected_before_tracing() {
        let mut scene = unit_sphere_scene();
        scene.materials.clear();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 1, 1);
        let mut renderer = deterministic(Settings::default());

        assert_eq!(
            renderer.render(&scene, &camera),
            Err(RenderError::InvalidMaterial {
                sphere: 0,
                material: 0,
                available: 0,
            })
        );
    }

    #[test]
    fn frame_one_shows_the_single_sample() {
        let scene = unit_sphere_scene();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 1, 1);
        let mut renderer = deterministic(Settings::default());

        renderer.render(&scene, &camera).unwrap();

        let sample = renderer.per_pixel(&scene, &camera, 0, 0);
        assert_eq!(renderer.accumulation()[0], sample);
        assert_eq!(renderer.image().unwrap().pixel(0, 0), vec4_to_rgba(&sample));
        assert_eq!(renderer.frame_index(), 2);
    }

    #[test]
    fn disabled_accumulation_restarts_every_frame() {
        let scene = unit_sphere_scene();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 1, 1);
        let mut renderer = deterministic(Settings {
            accumulate: false,
            ..Settings::default()
        });

        for _ in 0..3 {
            renderer.render(&scene, &camera).unwrap();
            assert_eq!(renderer.frame_index(), 1);
            assert_eq!(renderer.accumulation()[0].w, 1.0);
        }
    }

    #[test]
    fn reset_frame_index_clears_on_next_render() {
        let scene = Scene::empty();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 1, 1);
        let mut renderer = deterministic(Settings::default());

        renderer.render(&scene, &camera).unwrap();
        renderer.render(&scene, &camera).unwrap();
        assert_eq!(renderer.accumulation()[0].w, 2.0);

        renderer.reset_frame_index();
        renderer.render(&scene, &camera).unwrap();
        assert_eq!(renderer.accumulation()[0].w, 1.0);
        assert_eq!(renderer.frame_index(), 2);
    }

    #[test]
    fn ssaa_leaves_accumulation_state_alone() {
        let scene = Scene::empty();
        let camera = fixed_camera(Vector3::new(0.0, 0.0, 1.0), 2, 2);
        let mut renderer = deterministic(Settings::default());

        renderer.render(&scene, &camera).unwrap();
        renderer.render_ssaa(&scene, &camera).unwrap();

        assert_eq!(renderer.frame_index(), 2);
        assert!(renderer.accumulation().iter().all(|sum| sum.w == 1.0));
        assert_eq!(rgba_to_bytes(renderer.image().unwrap().pixel(1, 1)), [153, 178, 229, 255]);
    }

    #[test]
    fn sub_pixel_directions_interpolate_neighbours() {
        let scene = Scene::empty();
        let rays = vec![
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
        ];
        let camera = Camera::from_rays(Point3::origin(), rays, 2, 2);
        let settings = Settings::default();
        let frame = Frame {
            scene: &scene,
            camera: &camera,
            settings: &settings,
            sampler: &ConstantSampler(Vector3::zeros()),
            width: 2,
            height: 2,
        };

        assert_eq!(frame.sub_pixel_direction(0, 0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(frame.sub_pixel_direction(0, 0, 0.5, 0.5), Vector3::new(0.5, 0.5, 1.0));
        // 가장자리에서는 이웃이 자기 자신
        assert_eq!(frame.sub_pixel_direction(1, 1, 0.5, 0.5), Vector3::new(1.0, 1.0, 1.0));
    }
}
