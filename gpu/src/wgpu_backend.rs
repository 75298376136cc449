//! A concrete [`GpuBackend`] over `wgpu` 0.19 (SPEC_FULL.md §4.H, §10.G).
//! Mirrors the teacher's `WgpuImpl`: a lazily-created command encoder that
//! accumulates render passes across a frame's batches and is submitted once
//! by [`WgpuBackend::present`].

use std::mem::size_of;

use crate::{atlas::TextureAtlas, BatchPaint, GpuBackend, GradientVertex, ShaderKind, TexturedVertex};

const TEXTURED_SHADER: &str = include_str!("shaders/textured.wgsl");
const LINEAR_GRADIENT_SHADER: &str = include_str!("shaders/linear_gradient.wgsl");
const RADIAL_GRADIENT_SHADER: &str = include_str!("shaders/radial_gradient.wgsl");

/// Packs [`BatchPaint::Linear`]/[`BatchPaint::Radial`] into the uniform
/// layout the gradient shaders expect. Matches [`crate::LinearGradientUniforms`]
/// and [`crate::RadialGradientUniforms`] field order; stop count is padded
/// to `MAX_GRADIENT_STOPS` entries so the struct has a fixed GPU layout.
#[repr(C)]
#[derive(Clone, Copy, zerocopy::IntoBytes, zerocopy::Immutable)]
struct GradientUniforms {
  p0: [f32; 2],
  p1: [f32; 2],
  scalar_a: f32,
  scalar_b: f32,
  stop_count: u32,
  _pad: u32,
  stop_offsets: [f32; 4],
  stop_colors: [[f32; 4]; 4],
}

impl GradientUniforms {
  fn linear(u: &crate::LinearGradientUniforms) -> Self { Self::pack(u.start, u.dt, u.len_sq, 0.0, &u.stops) }

  fn radial(u: &crate::RadialGradientUniforms) -> Self { Self::pack(u.focal, u.dt, u.r0, u.dr.max(1e-6), &u.stops) }

  fn pack(p0: [f32; 2], p1: [f32; 2], scalar_a: f32, scalar_b: f32, stops: &[crate::PackedStop]) -> Self {
    let mut stop_offsets = [0.0f32; 4];
    let mut stop_colors = [[0.0f32; 4]; 4];
    for (i, stop) in stops.iter().enumerate().take(4) {
      stop_offsets[i] = stop.offset;
      stop_colors[i] = stop.color;
    }
    Self { p0, p1, scalar_a, scalar_b, stop_count: stops.len() as u32, _pad: 0, stop_offsets, stop_colors }
  }
}

#[repr(C)]
#[derive(Clone, Copy, zerocopy::IntoBytes, zerocopy::Immutable)]
struct ViewportUniforms {
  size: [f32; 2],
  /// `maxTextureSize` (GLOSSARY), so the fragment shader can recover the
  /// `pixelWidth`-quantized atlas coordinates textured vertices carry.
  max_texture_size: f32,
  _pad: f32,
}

struct GrowableBuffer {
  buffer: wgpu::Buffer,
  capacity: u64,
  usage: wgpu::BufferUsages,
  label: &'static str,
}

impl GrowableBuffer {
  fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages, capacity: u64) -> Self {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor { label: Some(label), size: capacity.max(16), usage, mapped_at_creation: false });
    Self { buffer, capacity: capacity.max(16), usage, label }
  }

  /// Re-creates the buffer if `bytes` no longer fits, then uploads.
  fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
    if bytes.len() as u64 > self.capacity {
      self.capacity = (bytes.len() as u64).next_power_of_two();
      self.buffer =
        device.create_buffer(&wgpu::BufferDescriptor { label: Some(self.label), size: self.capacity, usage: self.usage, mapped_at_creation: false });
    }
    if !bytes.is_empty() {
      queue.write_buffer(&self.buffer, 0, bytes);
    }
  }
}

/// One atlas-backed texture + the bind group sampling it. Recreated
/// whenever the atlas grows or the caller marks it dirty.
struct AtlasBinding {
  texture: wgpu::Texture,
  bind_group: wgpu::BindGroup,
  size: u32,
}

pub struct WgpuBackend {
  device: wgpu::Device,
  queue: wgpu::Queue,
  surface_format: wgpu::TextureFormat,

  textured_pipeline: wgpu::RenderPipeline,
  linear_pipeline: wgpu::RenderPipeline,
  radial_pipeline: wgpu::RenderPipeline,

  texture_layout: wgpu::BindGroupLayout,
  uniform_layout: wgpu::BindGroupLayout,
  sampler: wgpu::Sampler,

  textured_vbo: GrowableBuffer,
  gradient_vbo: GrowableBuffer,
  ibo: GrowableBuffer,

  viewport_buffer: wgpu::Buffer,
  viewport_bind_group: wgpu::BindGroup,
  gradient_uniform_buffer: wgpu::Buffer,
  gradient_bind_group: wgpu::BindGroup,

  atlas_binding: Option<AtlasBinding>,

  command_encoder: Option<wgpu::CommandEncoder>,
  target_view: Option<wgpu::TextureView>,
  current_shader: ShaderKind,
  max_texture_size: f32,
}

impl WgpuBackend {
  pub async fn headless(surface_format: wgpu::TextureFormat) -> Self {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    Self::new(instance, None, surface_format).await
  }

  pub async fn new(instance: wgpu::Instance, surface: Option<&wgpu::Surface<'_>>, surface_format: wgpu::TextureFormat) -> Self {
    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: surface,
        force_fallback_adapter: false,
      })
      .await
      .expect("no suitable GPU adapter for tunis_gpu's wgpu backend");

    let (device, queue) = adapter
      .request_device(&wgpu::DeviceDescriptor { label: Some("tunis device"), features: wgpu::Features::empty(), limits: wgpu::Limits::default() }, None)
      .await
      .expect("failed to open a device on the selected adapter");

    let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      label: Some("tunis atlas texture layout"),
      entries: &[
        wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 1,
          visibility: wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
          count: None,
        },
      ],
    });

    let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      label: Some("tunis uniform layout"),
      entries: &[wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None },
        count: None,
      }],
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
      label: Some("tunis atlas sampler"),
      address_mode_u: wgpu::AddressMode::ClampToEdge,
      address_mode_v: wgpu::AddressMode::ClampToEdge,
      mag_filter: wgpu::FilterMode::Linear,
      min_filter: wgpu::FilterMode::Linear,
      ..Default::default()
    });

    let viewport_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("tunis viewport uniform"),
      size: size_of::<ViewportUniforms>() as u64,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("tunis viewport bind group"),
      layout: &uniform_layout,
      entries: &[wgpu::BindGroupEntry { binding: 0, resource: viewport_buffer.as_entire_binding() }],
    });

    let gradient_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("tunis gradient uniform"),
      size: size_of::<GradientUniforms>() as u64,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let gradient_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("tunis gradient bind group"),
      layout: &uniform_layout,
      entries: &[wgpu::BindGroupEntry { binding: 0, resource: gradient_uniform_buffer.as_entire_binding() }],
    });

    let textured_pipeline = build_pipeline(
      &device,
      "tunis textured pipeline",
      TEXTURED_SHADER,
      textured_vertex_layout(),
      &[&texture_layout, &uniform_layout],
      surface_format,
    );
    let linear_pipeline = build_pipeline(
      &device,
      "tunis linear gradient pipeline",
      LINEAR_GRADIENT_SHADER,
      gradient_vertex_layout(),
      &[&uniform_layout, &uniform_layout],
      surface_format,
    );
    let radial_pipeline = build_pipeline(
      &device,
      "tunis radial gradient pipeline",
      RADIAL_GRADIENT_SHADER,
      gradient_vertex_layout(),
      &[&uniform_layout, &uniform_layout],
      surface_format,
    );

    Self {
      textured_vbo: GrowableBuffer::new(&device, "textured vertices", wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST, 4096),
      gradient_vbo: GrowableBuffer::new(&device, "gradient vertices", wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST, 4096),
      ibo: GrowableBuffer::new(&device, "shared indices", wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST, 4096),
      device,
      queue,
      surface_format,
      textured_pipeline,
      linear_pipeline,
      radial_pipeline,
      texture_layout,
      uniform_layout,
      sampler,
      viewport_buffer,
      viewport_bind_group,
      gradient_uniform_buffer,
      gradient_bind_group,
      atlas_binding: None,
      command_encoder: None,
      target_view: None,
      current_shader: ShaderKind::Textured,
      max_texture_size: 4096.0,
    }
  }

  pub fn device(&self) -> &wgpu::Device { &self.device }

  pub fn queue(&self) -> &wgpu::Queue { &self.queue }

  /// Must match the `maxTextureSize` the owning `Batcher`/`TextureAtlas`
  /// were constructed with, so `pixelWidth` agrees on both sides.
  pub fn set_max_texture_size(&mut self, max_texture_size: u32) { self.max_texture_size = max_texture_size as f32; }

  /// Opens the command encoder `end_frame`'s trait calls append passes to,
  /// and records where those passes render to.
  pub fn begin_frame(&mut self, target_view: wgpu::TextureView) {
    assert!(self.command_encoder.is_none(), "begin_frame called before the previous frame was presented");
    self.command_encoder = Some(self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("tunis frame encoder") }));
    self.target_view = Some(target_view);
  }

  /// Finishes and submits the frame's command buffer. Call once after
  /// [`crate::Batcher::end_frame`] returns.
  pub fn present(&mut self) {
    if let Some(encoder) = self.command_encoder.take() {
      self.queue.submit(std::iter::once(encoder.finish()));
    }
    self.target_view = None;
  }

  fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
    self.command_encoder.as_mut().expect("begin_frame must be called before submitting draws")
  }

  fn rebind_atlas_if_needed(&mut self, atlas: &mut TextureAtlas) {
    let needs_rebuild = self.atlas_binding.as_ref().map_or(true, |b| b.size != atlas.size());
    if !needs_rebuild && !atlas.take_dirty() {
      return;
    }
    let size = atlas.size();
    let texture = self.device.create_texture(&wgpu::TextureDescriptor {
      label: Some("tunis atlas texture"),
      size: wgpu::Extent3d { width: size, height: size, depth_or_array_layers: 1 },
      mip_level_count: 1,
      sample_count: 1,
      dimension: wgpu::TextureDimension::D2,
      format: wgpu::TextureFormat::Rgba8UnormSrgb,
      usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
      view_formats: &[],
    });
    self.queue.write_texture(
      wgpu::ImageCopyTexture { texture: &texture, mip_level: 0, origin: wgpu::Origin3d::ZERO, aspect: wgpu::TextureAspect::All },
      atlas.pixels(),
      wgpu::ImageDataLayout { offset: 0, bytes_per_row: Some(size * 4), rows_per_image: Some(size) },
      wgpu::Extent3d { width: size, height: size, depth_or_array_layers: 1 },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("tunis atlas bind group"),
      layout: &self.texture_layout,
      entries: &[
        wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
        wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
      ],
    });
    self.atlas_binding = Some(AtlasBinding { texture, bind_group, size });
  }

  fn pipeline_for(&self, shader: ShaderKind) -> &wgpu::RenderPipeline {
    match shader {
      ShaderKind::Textured => &self.textured_pipeline,
      ShaderKind::LinearGradient => &self.linear_pipeline,
      ShaderKind::RadialGradient => &self.radial_pipeline,
    }
  }
}

impl GpuBackend for WgpuBackend {
  fn upload_vertices(&mut self, shader: ShaderKind, bytes: &[u8]) {
    match shader {
      ShaderKind::Textured => self.textured_vbo.upload(&self.device, &self.queue, bytes),
      ShaderKind::LinearGradient | ShaderKind::RadialGradient => self.gradient_vbo.upload(&self.device, &self.queue, bytes),
    }
  }

  fn upload_indices(&mut self, _shader: ShaderKind, indices: &[u16]) {
    self.ibo.upload(&self.device, &self.queue, zerocopy::IntoBytes::as_bytes(indices));
  }

  fn bind_shader(&mut self, shader: ShaderKind) { self.current_shader = shader; }

  fn bind_texture(&mut self, atlas: &mut TextureAtlas) { self.rebind_atlas_if_needed(atlas); }

  fn set_uniforms(&mut self, viewport: (f32, f32), paint: &BatchPaint) {
    let viewport_uniforms = ViewportUniforms { size: [viewport.0, viewport.1], max_texture_size: self.max_texture_size, _pad: 0.0 };
    self.queue.write_buffer(&self.viewport_buffer, 0, zerocopy::IntoBytes::as_bytes(&viewport_uniforms));

    let gradient_uniforms = match paint {
      BatchPaint::Textured { .. } => None,
      BatchPaint::Linear(u) => Some(GradientUniforms::linear(u)),
      BatchPaint::Radial(u) => Some(GradientUniforms::radial(u)),
    };
    if let Some(uniforms) = gradient_uniforms {
      self.queue.write_buffer(&self.gradient_uniform_buffer, 0, zerocopy::IntoBytes::as_bytes(&uniforms));
    }
  }

  fn draw_indexed(&mut self, offset: u32, count: u32) {
    if count == 0 {
      return;
    }
    let shader = self.current_shader;
    let vbo = match shader {
      ShaderKind::Textured => &self.textured_vbo.buffer,
      ShaderKind::LinearGradient | ShaderKind::RadialGradient => &self.gradient_vbo.buffer,
    };
    let pipeline = self.pipeline_for(shader);
    let target = self.target_view.as_ref().expect("begin_frame must be called before submitting draws");

    let mut pass = self.command_encoder.as_mut().expect("begin_frame must be called before submitting draws").begin_render_pass(
      &wgpu::RenderPassDescriptor {
        label: Some("tunis batch pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
          view: target,
          resolve_target: None,
          ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
      },
    );
    pass.set_pipeline(pipeline);
    pass.set_vertex_buffer(0, vbo.slice(..));
    pass.set_index_buffer(self.ibo.buffer.slice(..), wgpu::IndexFormat::Uint16);
    match shader {
      ShaderKind::Textured => {
        let atlas = self.atlas_binding.as_ref().expect("bind_texture must run before a textured draw");
        pass.set_bind_group(0, &atlas.bind_group, &[]);
        pass.set_bind_group(1, &self.viewport_bind_group, &[]);
      }
      ShaderKind::LinearGradient | ShaderKind::RadialGradient => {
        pass.set_bind_group(0, &self.gradient_bind_group, &[]);
        pass.set_bind_group(1, &self.viewport_bind_group, &[]);
      }
    }
    pass.draw_indexed(offset..offset + count, 0, 0..1);
  }
}

fn textured_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
  wgpu::VertexBufferLayout {
    array_stride: size_of::<TexturedVertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![
      0 => Float32x2,
      1 => Uint16x2,
      2 => Uint16x2,
      3 => Uint16x2,
      4 => Unorm8x4,
    ],
  }
}

fn gradient_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
  wgpu::VertexBufferLayout {
    array_stride: size_of::<GradientVertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
  }
}

fn build_pipeline(
  device: &wgpu::Device,
  label: &str,
  shader_src: &str,
  vertex_layout: wgpu::VertexBufferLayout<'static>,
  bind_group_layouts: &[&wgpu::BindGroupLayout],
  surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
  let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor { label: Some(label), source: wgpu::ShaderSource::Wgsl(shader_src.into()) });
  let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor { label: Some(label), bind_group_layouts, push_constant_ranges: &[] });

  device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
    label: Some(label),
    layout: Some(&layout),
    vertex: wgpu::VertexState { module: &shader, entry_point: "vs_main", buffers: &[vertex_layout] },
    fragment: Some(wgpu::FragmentState {
      module: &shader,
      entry_point: "fs_main",
      targets: &[Some(wgpu::ColorTargetState {
        format: surface_format,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        write_mask: wgpu::ColorWrites::ALL,
      })],
    }),
    primitive: wgpu::PrimitiveState {
      topology: wgpu::PrimitiveTopology::TriangleList,
      front_face: wgpu::FrontFace::Ccw,
      cull_mode: Some(wgpu::Face::Back),
      ..Default::default()
    },
    depth_stencil: None,
    multisample: wgpu::MultisampleState::default(),
    multiview: None,
  })
}
