use std::{borrow::Cow, sync::Arc, time::Instant};

use super::ViewerState;
use super::super::markers::{MARKER_QUAD_VERTICES, MarkerInstance, MarkerQuadVertex, build_marker_instances};
use super::super::mesh::{GLOBE_SEGMENTS, GlobeUniforms, GlobeVertex, MarkerUniforms, build_globe, matrix_columns};
use super::super::overlays::{LabelOverlay, OverlayVertex};
use super::super::shaders::{GLOBE_SHADER_SOURCE, MARKER_SHADER_SOURCE, OVERLAY_SHADER_SOURCE};
use anyhow::{Context, Result};
use bytemuck::cast_slice;
use glam::{Mat4, Vec3};
use orbis_scene::{MarkerRegistry, OrbitControls, PopupState, ScenePreset};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::texture::{GlobeTexture, generate_placeholder_texture, prepare_rgba_upload};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Bundles the wgpu objects tied to the viewer window.
struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

/// GPU resources for the globe texture and its bind group.
struct TextureResources {
    texture: wgpu::Texture,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

/// Render pipelines plus the static geometry buffers.
struct RenderResources {
    globe_pipeline: wgpu::RenderPipeline,
    globe_vertex_buffer: wgpu::Buffer,
    globe_index_buffer: wgpu::Buffer,
    globe_index_count: u32,
    globe_uniform_buffer: wgpu::Buffer,
    globe_uniform_bind_group: wgpu::BindGroup,
    marker_pipeline: wgpu::RenderPipeline,
    marker_vertex_buffer: wgpu::Buffer,
    marker_instance_buffer: wgpu::Buffer,
    marker_instance_count: u32,
    marker_uniform_buffer: wgpu::Buffer,
    marker_uniform_bind_group: wgpu::BindGroup,
    overlay_pipeline: wgpu::RenderPipeline,
    overlay_params_layout: wgpu::BindGroupLayout,
}

/// Bootstraps wgpu, uploads the globe texture, builds the sphere and marker
/// batch, and seeds the orbit camera from the preset before handing back a
/// ready-to-render `ViewerState`. Pipelines and bind groups are established
/// here so frame rendering stays lightweight.
pub(super) async fn new(
    window: Arc<Window>,
    preset: ScenePreset,
    registry: MarkerRegistry,
    texture_result: Result<GlobeTexture>,
) -> Result<ViewerState> {
    let size = window.inner_size();
    let wgpu = bootstrap_wgpu(window.clone()).await?;

    let globe_texture = texture_result.unwrap_or_else(|err| {
        log::warn!("falling back to placeholder globe texture: {err:?}");
        generate_placeholder_texture()
    });
    let texture_resources = create_texture_resources(&wgpu.device, &wgpu.queue, &globe_texture)?;

    let render_resources = create_render_resources(
        &wgpu.device,
        &texture_resources.bind_group_layout,
        wgpu.surface_format,
        &preset,
        &registry,
    );

    let label = LabelOverlay::new(
        &wgpu.device,
        &wgpu.queue,
        &texture_resources.bind_group_layout,
        &render_resources.overlay_params_layout,
    )?;

    let orbit = OrbitControls::new(
        Vec3::from_array(preset.eye_direction).normalize() * preset.camera_distance,
        Vec3::ZERO,
        preset.min_distance,
        preset.max_distance,
        preset.auto_rotate_speed,
    );

    let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
    let projection = Mat4::perspective_rh(
        preset.fov_degrees.to_radians(),
        aspect,
        preset.near_clip,
        preset.far_clip,
    );
    let view_proj = projection * orbit.view_matrix();

    let background = wgpu::Color {
        r: preset.background[0] as f64,
        g: preset.background[1] as f64,
        b: preset.background[2] as f64,
        a: 1.0,
    };

    let depth_view = create_depth_view(&wgpu.device, size);
    let now = Instant::now();

    let state = ViewerState {
        window,
        config: wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu.surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu.present_mode,
            alpha_mode: wgpu.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        },
        surface: wgpu.surface,
        device: wgpu.device,
        queue: wgpu.queue,
        size,
        background,
        depth_view,
        globe_pipeline: render_resources.globe_pipeline,
        globe_vertex_buffer: render_resources.globe_vertex_buffer,
        globe_index_buffer: render_resources.globe_index_buffer,
        globe_index_count: render_resources.globe_index_count,
        globe_uniform_buffer: render_resources.globe_uniform_buffer,
        globe_uniform_bind_group: render_resources.globe_uniform_bind_group,
        globe_texture_bind_group: texture_resources.bind_group,
        _globe_texture: texture_resources.texture,
        marker_pipeline: render_resources.marker_pipeline,
        marker_vertex_buffer: render_resources.marker_vertex_buffer,
        marker_instance_buffer: render_resources.marker_instance_buffer,
        marker_instance_count: render_resources.marker_instance_count,
        marker_uniform_buffer: render_resources.marker_uniform_buffer,
        marker_uniform_bind_group: render_resources.marker_uniform_bind_group,
        overlay_pipeline: render_resources.overlay_pipeline,
        label,
        preset,
        registry,
        orbit,
        fly_to: None,
        popup: PopupState::new(),
        started_at: now,
        last_frame: now,
        cursor: None,
        dragging: false,
        view_proj,
    };

    state.surface.configure(&state.device, &state.config);
    log::info!(
        "viewer ready: {} markers, {}x{} surface",
        state.registry.len(),
        state.config.width,
        state.config.height
    );

    Ok(state)
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbis-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .unwrap_or(surface_caps.formats[0]);
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .or(Some(wgpu::PresentMode::Fifo))
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

pub(super) fn create_depth_view(device: &wgpu::Device, size: PhysicalSize<u32>) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("viewer-depth-texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_texture_resources(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    globe_texture: &GlobeTexture,
) -> Result<TextureResources> {
    let texture_extent = wgpu::Extent3d {
        width: globe_texture.width,
        height: globe_texture.height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("globe-texture"),
        size: texture_extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("globe-sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let upload = prepare_rgba_upload(globe_texture.width, globe_texture.height, &globe_texture.data)?;
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        upload.pixels(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(upload.bytes_per_row()),
            rows_per_image: Some(globe_texture.height),
        },
        texture_extent,
    );

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("texture-bind-group-layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
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

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("globe-texture-bind-group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });

    Ok(TextureResources {
        texture,
        bind_group_layout,
        bind_group,
    })
}

fn uniform_layout(device: &wgpu::Device, label: &str, size: usize) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(size as u64),
            },
            count: None,
        }],
    })
}

fn create_render_resources(
    device: &wgpu::Device,
    texture_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
    preset: &ScenePreset,
    registry: &MarkerRegistry,
) -> RenderResources {
    let mesh = build_globe(preset.globe_radius, GLOBE_SEGMENTS, GLOBE_SEGMENTS);
    let globe_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("globe-vertices"),
        contents: cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let globe_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("globe-indices"),
        contents: cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    let globe_uniform_layout =
        uniform_layout(device, "globe-uniform-layout", std::mem::size_of::<GlobeUniforms>());
    let globe_uniforms = GlobeUniforms {
        view_proj: matrix_columns(Mat4::IDENTITY),
        model: matrix_columns(Mat4::IDENTITY),
    };
    let globe_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("globe-uniforms"),
        contents: cast_slice(&[globe_uniforms]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let globe_uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("globe-uniform-bind-group"),
        layout: &globe_uniform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: globe_uniform_buffer.as_entire_binding(),
        }],
    });

    let globe_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("globe-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(GLOBE_SHADER_SOURCE)),
    });
    let globe_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("globe-pipeline-layout"),
        bind_group_layouts: &[&globe_uniform_layout, texture_layout],
        push_constant_ranges: &[],
    });
    let globe_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GlobeVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };
    let globe_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("globe-pipeline"),
        layout: Some(&globe_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &globe_shader,
            entry_point: "vs_main",
            buffers: &[globe_vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &globe_shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let marker_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("marker-quad-vertices"),
        contents: cast_slice(&MARKER_QUAD_VERTICES),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let instances = build_marker_instances(registry);
    let marker_instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("marker-instances"),
        contents: cast_slice(&instances),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let marker_uniform_layout =
        uniform_layout(device, "marker-uniform-layout", std::mem::size_of::<MarkerUniforms>());
    let marker_uniforms = MarkerUniforms {
        view_proj: matrix_columns(Mat4::IDENTITY),
        time: 0.0,
        _padding: [0.0; 3],
    };
    let marker_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("marker-uniforms"),
        contents: cast_slice(&[marker_uniforms]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let marker_uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("marker-uniform-bind-group"),
        layout: &marker_uniform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: marker_uniform_buffer.as_entire_binding(),
        }],
    });

    let marker_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("marker-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(MARKER_SHADER_SOURCE)),
    });
    let marker_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("marker-pipeline-layout"),
        bind_group_layouts: &[&marker_uniform_layout],
        push_constant_ranges: &[],
    });
    let marker_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MarkerQuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
    };
    let marker_instance_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MarkerInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            1 => Float32x4,
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32,
        ],
    };
    let marker_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("marker-pipeline"),
        layout: Some(&marker_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &marker_shader,
            entry_point: "vs_main",
            buffers: &[marker_vertex_layout, marker_instance_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &marker_shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        // Marker quads stay visible from both sides; the depth test against
        // the globe hides the far hemisphere's discs.
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let overlay_params_layout =
        uniform_layout(device, "overlay-params-layout", std::mem::size_of::<[f32; 4]>());
    let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("overlay-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(OVERLAY_SHADER_SOURCE)),
    });
    let overlay_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("overlay-pipeline-layout"),
        bind_group_layouts: &[texture_layout, &overlay_params_layout],
        push_constant_ranges: &[],
    });
    let overlay_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<OverlayVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };
    let overlay_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("overlay-pipeline"),
        layout: Some(&overlay_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &overlay_shader,
            entry_point: "vs_main",
            buffers: &[overlay_vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &overlay_shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    RenderResources {
        globe_pipeline,
        globe_vertex_buffer,
        globe_index_buffer,
        globe_index_count: mesh.indices.len() as u32,
        globe_uniform_buffer,
        globe_uniform_bind_group,
        marker_pipeline,
        marker_vertex_buffer,
        marker_instance_buffer,
        marker_instance_count: instances.len() as u32,
        marker_uniform_buffer,
        marker_uniform_bind_group,
        overlay_pipeline,
        overlay_params_layout,
    }
}
