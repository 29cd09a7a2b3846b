//! Rays, bounding proxies, surfaces and the small numeric helpers shared
//! by every component.

use glam::{Vec2, Vec3};

/// A ray in world space. The direction is always normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// A ray with a zero-length direction can't hit anything.
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }
}

/// Bounding proxy used for picking, centred on the station position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl Bounds {
    /// Distance along `ray` to the first hit, or None. A ray starting
    /// inside the proxy hits at 0.
    pub fn intersect(&self, ray: &Ray, center: Vec3) -> Option<f32> {
        if ray.is_degenerate() {
            return None;
        }
        match *self {
            Bounds::Sphere { radius } => ray_sphere(ray, center, radius),
            Bounds::Box { half_extents } => {
                ray_aabb(ray, center - half_extents, center + half_extents)
            }
        }
    }
}

fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    if t < 0.0 { None } else { Some(t) }
}

// slab test, same shape as the renderer's picking
fn ray_aabb(ray: &Ray, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = ray.direction.recip();
    let t1 = (min - ray.origin) * inv;
    let t2 = (max - ray.origin) * inv;
    let tmin = t1.min(t2);
    let tmax = t1.max(t2);
    let enter = tmin.max_element();
    let exit = tmax.min_element();
    if exit >= enter.max(0.0) {
        Some(enter.max(0.0))
    } else {
        None
    }
}

/// Intersect a ray with the horizontal plane `y = height`.
/// None when the ray is parallel to the plane or points away from it.
pub fn ray_plane_y(ray: &Ray, height: f32) -> Option<Vec3> {
    if ray.direction.y.abs() < 1e-6 {
        return None;
    }
    let t = (height - ray.origin.y) / ray.direction.y;
    if t < 0.0 {
        return None;
    }
    Some(ray.at(t))
}

/// Keep a point inside a circle of `radius` around the origin on the
/// horizontal plane. Height is left untouched and the direction from the
/// origin is preserved.
pub fn clamp_to_radius(point: Vec3, radius: f32) -> Vec3 {
    let flat = Vec2::new(point.x, point.z);
    let dist = flat.length();
    if dist <= radius || dist == 0.0 {
        return point;
    }
    let scaled = flat / dist * radius;
    Vec3::new(scaled.x, point.y, scaled.y)
}

/// Round the horizontal coordinates to the nearest grid cell.
pub fn snap_to_grid(point: Vec3, grid: f32) -> Vec3 {
    if grid <= 0.0 {
        return point;
    }
    Vec3::new(
        (point.x / grid).round() * grid,
        point.y,
        (point.z / grid).round() * grid,
    )
}

/// Clamp to the circle, then snap to the grid. Snapping can round a point
/// back out past the circle, so the larger horizontal coordinate is stepped
/// one cell toward the origin until the point is inside again.
pub fn snap_within_radius(point: Vec3, grid: f32, radius: f32) -> Vec3 {
    let clamped = clamp_to_radius(point, radius);
    if grid <= 0.0 {
        return clamped;
    }

    let mut snapped = snap_to_grid(clamped, grid);
    while Vec2::new(snapped.x, snapped.z).length() > radius {
        let axis = if snapped.x.abs() >= snapped.z.abs() {
            &mut snapped.x
        } else {
            &mut snapped.z
        };
        if *axis == 0.0 {
            break;
        }
        *axis -= grid * axis.signum();
    }
    snapped
}

/// Per-frame retention factor for exponential smoothing, normalized to a
/// 60 Hz reference so the result does not depend on frame rate.
pub fn smoothing_factor(smoothing: f32, dt: f32) -> f32 {
    smoothing.powf(dt * 60.0)
}

pub fn smooth_toward(current: Vec3, target: Vec3, smoothing: f32, dt: f32) -> Vec3 {
    let k = smoothing_factor(smoothing, dt);
    target + (current - target) * k
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Footprint of a teleport surface within its plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceShape {
    Disc { radius: f32 },
    /// Rectangle spanned by `tangent` and `normal x tangent`
    Rect { tangent: Vec3, half_extents: Vec2 },
}

/// A planar piece of scene geometry marked as a valid floor for teleporting.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportSurface {
    pub id: String,
    pub center: Vec3,
    pub normal: Vec3,
    pub shape: SurfaceShape,
}

impl TeleportSurface {
    pub fn disc(id: impl Into<String>, center: Vec3, normal: Vec3, radius: f32) -> Self {
        Self {
            id: id.into(),
            center,
            normal: normal.normalize_or_zero(),
            shape: SurfaceShape::Disc { radius },
        }
    }

    pub fn rect(
        id: impl Into<String>,
        center: Vec3,
        normal: Vec3,
        tangent: Vec3,
        half_extents: Vec2,
    ) -> Self {
        Self {
            id: id.into(),
            center,
            normal: normal.normalize_or_zero(),
            shape: SurfaceShape::Rect {
                tangent: tangent.normalize_or_zero(),
                half_extents,
            },
        }
    }

    /// Intersect the segment `a -> b` with this surface.
    pub fn intersect_segment(&self, a: Vec3, b: Vec3) -> Option<Vec3> {
        let da = (a - self.center).dot(self.normal);
        let db = (b - self.center).dot(self.normal);

        // both ends strictly on the same side
        if (da > 0.0 && db > 0.0) || (da < 0.0 && db < 0.0) {
            return None;
        }
        let denom = da - db;
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let hit = a + (b - a) * (da / denom);
        self.contains(hit).then_some(hit)
    }

    fn contains(&self, point: Vec3) -> bool {
        let local = point - self.center;
        match self.shape {
            SurfaceShape::Disc { radius } => {
                let in_plane = local - self.normal * local.dot(self.normal);
                in_plane.length_squared() <= radius * radius
            }
            SurfaceShape::Rect {
                tangent,
                half_extents,
            } => {
                let bitangent = self.normal.cross(tangent);
                local.dot(tangent).abs() <= half_extents.x
                    && local.dot(bitangent).abs() <= half_extents.y
            }
        }
    }
}
