//! Ray casting against the scene graph

use crate::bounds::Aabb;
use crate::point::*;
use crate::scene::SceneNode;
use crate::traits::Drawable;
use nalgebra::Matrix4;

const EPSILON: f32 = 1e-7;

/// A ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3f,
    pub direction: Vector3f,
}

impl Ray {
    pub fn new(origin: Point3f, direction: Vector3f) -> Self {
        Self {
            origin,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vector3f::z()),
        }
    }

    pub fn at(&self, t: f32) -> Point3f {
        self.origin + self.direction * t
    }

    /// Slab test
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.is_empty() {
            return false;
        }
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let inv = 1.0 / self.direction[axis];
            let mut t0 = (aabb.min[axis] - self.origin[axis]) * inv;
            let mut t1 = (aabb.max[axis] - self.origin[axis]) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // NaN from 0 * inf means the origin lies on the slab plane
            if !t0.is_nan() {
                t_min = t_min.max(t0);
            }
            if !t1.is_nan() {
                t_max = t_max.min(t1);
            }
            if t_max < t_min {
                return false;
            }
        }
        t_max >= 0.0
    }

    /// Möller–Trumbore. Triangles facing away (clockwise as seen from the
    /// ray origin) are skipped unless `double_sided`.
    pub fn intersect_triangle(&self, a: &Point3f, b: &Point3f, c: &Point3f, double_sided: bool) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(&edge2);
        let det = edge1.dot(&p);

        if double_sided {
            if det.abs() < EPSILON {
                return None;
            }
        } else if det < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(&edge1);
        let v = self.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(&q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// A ray hit on a mesh node
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub distance: f32,
    pub point: Point3f,
    pub node_name: String,
}

/// Intersect a ray with every mesh under `nodes`, each treated as a
/// top-level scene node. Hidden nodes are tested like any other. Hits are
/// sorted nearest first.
pub fn intersect_nodes<'a, I>(ray: &Ray, nodes: I) -> Vec<Intersection>
where
    I: IntoIterator<Item = &'a SceneNode>,
{
    let mut hits = Vec::new();
    for root in nodes {
        root.for_each_world(&Matrix4::identity(), &mut |node, world| {
            if let Some(hit) = intersect_mesh_node(ray, node, world) {
                hits.push(hit);
            }
        });
    }
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

fn intersect_mesh_node(ray: &Ray, node: &SceneNode, world: &Matrix4<f32>) -> Option<Intersection> {
    let mesh = node.mesh.as_ref()?;
    if !ray.intersects_aabb(&mesh.geometry.bounding_box().transformed(world)) {
        return None;
    }

    // A mirroring transform flips winding
    let flipped = world.fixed_view::<3, 3>(0, 0).determinant() < 0.0;
    let double_sided = mesh.material.double_sided;

    let nearest = mesh
        .geometry
        .triangles()
        .filter_map(|[a, b, c]| {
            let a = world.transform_point(&a);
            let b = world.transform_point(&b);
            let c = world.transform_point(&c);
            if flipped {
                ray.intersect_triangle(&a, &c, &b, double_sided)
            } else {
                ray.intersect_triangle(&a, &b, &c, double_sided)
            }
        })
        .min_by(|a, b| a.total_cmp(b))?;

    Some(Intersection {
        distance: nearest,
        point: ray.at(nearest),
        node_name: node.name.clone(),
    })
}
