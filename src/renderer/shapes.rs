//! Shape generation for 2D primitives
//!
//! All shapes are triangle lists in viewport pixels (y down).

use glam::{Affine2, Vec2};
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Axis-aligned rectangle with a flat color
pub fn rect(x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) -> Vec<Vertex> {
    rect_gradient(x, y, w, h, [color; 4])
}

/// Rectangle with left-to-right color ramp
pub fn rect_h_gradient(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    left: [f32; 4],
    right: [f32; 4],
) -> Vec<Vertex> {
    rect_gradient(x, y, w, h, [left, right, right, left])
}

/// Rectangle with top-to-bottom color ramp
pub fn rect_v_gradient(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    top: [f32; 4],
    bottom: [f32; 4],
) -> Vec<Vertex> {
    rect_gradient(x, y, w, h, [top, top, bottom, bottom])
}

/// Rectangle with per-corner colors: top-left, top-right, bottom-right, bottom-left
fn rect_gradient(x: f32, y: f32, w: f32, h: f32, corners: [[f32; 4]; 4]) -> Vec<Vertex> {
    let tl = Vertex::new(x, y, corners[0]);
    let tr = Vertex::new(x + w, y, corners[1]);
    let br = Vertex::new(x + w, y + h, corners[2]);
    let bl = Vertex::new(x, y + h, corners[3]);
    vec![tl, tr, bl, bl, tr, br]
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    ellipse(center, radius, radius, 0.0, color, segments)
}

/// Filled ellipse rotated by `rotation` radians around its center
pub fn ellipse(
    center: Vec2,
    rx: f32,
    ry: f32,
    rotation: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 3) as usize);
    let (sin_r, cos_r) = rotation.sin_cos();
    let point = |theta: f32| {
        let local = Vec2::new(rx * theta.cos(), ry * theta.sin());
        center + Vec2::new(local.x * cos_r - local.y * sin_r, local.x * sin_r + local.y * cos_r)
    };

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;
        let p1 = point(theta1);
        let p2 = point(theta2);

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(p1.x, p1.y, color));
        vertices.push(Vertex::new(p2.x, p2.y, color));
    }

    vertices
}

/// Single filled triangle
pub fn triangle(a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
    ]
}

/// Apply an affine transform to vertices in place
pub fn transform(vertices: &mut [Vertex], xf: Affine2) {
    for v in vertices {
        let p = xf.transform_point2(Vec2::from(v.position));
        v.position = p.to_array();
    }
}
