//! Instanced additive sprites for the particle state buffer.

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::particles::Particle;
use crate::shader::PARTICLES_SOURCE;
use crate::uniforms::ParticleUniforms;

use super::{uniform_layout, GpuContext, OffscreenTarget};

/// `src·alpha + dst` for color, `src + dst` for alpha.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

const PARTICLE_ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
    // position
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    // age (offset at 12 is not read by the shader)
    wgpu::VertexAttribute {
        offset: 20,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32,
    },
    // lifetime
    wgpu::VertexAttribute {
        offset: 24,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32,
    },
    // size
    wgpu::VertexAttribute {
        offset: 28,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32,
    },
];

pub struct ParticlePass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    instance_count: u32,
}

impl ParticlePass {
    pub fn new(gpu: &GpuContext, target_format: wgpu::TextureFormat) -> Result<Self, GpuError> {
        let device = &gpu.device;
        let shader = gpu.shader_module("Particle Shader", PARTICLES_SOURCE)?;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::bytes_of(&ParticleUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout = uniform_layout(
            device,
            "Particle Uniform Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = gpu.validated("Particle Pipeline", |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Particle Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Particle>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &PARTICLE_ATTRIBUTES,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: Some(ADDITIVE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        let capacity = 1;
        let instance_buffer = create_instance_buffer(device, capacity);

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            capacity,
            instance_count: 0,
        })
    }

    /// Copy the state buffer into the instance buffer, growing it if needed.
    pub fn upload(&mut self, gpu: &GpuContext, particles: &[Particle]) {
        if particles.len() > self.capacity {
            self.capacity = particles.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&gpu.device, self.capacity);
            log::debug!("Particle instance buffer grown to {} slots", self.capacity);
        }
        gpu.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(particles));
        self.instance_count = particles.len() as u32;
    }

    pub fn write_uniforms(&self, gpu: &GpuContext, uniforms: &ParticleUniforms) {
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Clear `target` to `clear` and draw every uploaded particle.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &OffscreenTarget, clear: wgpu::Color) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if self.instance_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..6, 0..self.instance_count);
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Instance Buffer"),
        size: (capacity * std::mem::size_of::<Particle>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_match_particle_layout() {
        assert_eq!(std::mem::size_of::<Particle>(), 32);
        assert_eq!(PARTICLE_ATTRIBUTES[0].offset, std::mem::offset_of!(Particle, position) as u64);
        assert_eq!(PARTICLE_ATTRIBUTES[1].offset, std::mem::offset_of!(Particle, age) as u64);
        assert_eq!(PARTICLE_ATTRIBUTES[2].offset, std::mem::offset_of!(Particle, lifetime) as u64);
        assert_eq!(PARTICLE_ATTRIBUTES[3].offset, std::mem::offset_of!(Particle, size) as u64);
    }
}
