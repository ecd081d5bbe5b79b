//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const SKY_TOP: [f32; 4] = [0.039, 0.039, 0.102, 1.0];
    pub const SKY_BOTTOM: [f32; 4] = [0.102, 0.039, 0.180, 1.0];
    pub const STAR: [f32; 4] = [1.0, 1.0, 1.0, 0.4];

    pub const PIPE_LEFT: [f32; 4] = [0.659, 0.333, 0.969, 1.0];
    pub const PIPE_RIGHT: [f32; 4] = [0.486, 0.227, 0.929, 1.0];
    pub const PIPE_CAP: [f32; 4] = [0.753, 0.149, 0.827, 1.0];

    pub const BIRD_GLOW: [f32; 4] = [0.976, 0.451, 0.086, 0.4];
    pub const BIRD_BODY: [f32; 4] = [0.976, 0.451, 0.086, 1.0];
    pub const BIRD_RIM: [f32; 4] = [0.761, 0.255, 0.047, 1.0];
    pub const BIRD_BELLY: [f32; 4] = [0.996, 0.843, 0.667, 1.0];
    pub const EYE_WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const PUPIL: [f32; 4] = [0.118, 0.161, 0.231, 1.0];
    pub const BEAK: [f32; 4] = [0.984, 0.749, 0.141, 1.0];

    /// Particle palette, indexed by `Particle::color`
    pub const PARTICLES: [[f32; 4]; 4] = [
        [0.957, 0.247, 0.369, 1.0], // rose
        [0.659, 0.333, 0.969, 1.0], // purple
        [0.976, 0.451, 0.086, 1.0], // orange
        [0.980, 0.800, 0.082, 1.0], // yellow
    ];

    pub const IDLE_VEIL: [f32; 4] = [0.0, 0.0, 0.0, 0.45];
    pub const ENDED_VEIL: [f32; 4] = [0.0, 0.0, 0.0, 0.7];

    /// Same color with a different alpha
    #[inline]
    pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
        [color[0], color[1], color[2], alpha]
    }

    /// Palette lookup that wraps out-of-range indices
    #[inline]
    pub fn particle(index: u32) -> [f32; 4] {
        PARTICLES[index as usize % PARTICLES.len()]
    }
}
