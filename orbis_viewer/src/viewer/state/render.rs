use std::time::Instant;

use super::ViewerState;
use super::super::mesh::{GlobeUniforms, MarkerUniforms, matrix_columns};
use bytemuck::cast_slice;
use glam::{Mat4, Vec2, Vec3};
use orbis_scene::label_opacity;
use wgpu::SurfaceError;

/// Cap on the frame delta so a stall (window drag, debugger pause) does not
/// slingshot the orbit damping.
const MAX_FRAME_DT: f32 = 0.1;

pub(super) fn render(state: &mut ViewerState) -> Result<(), SurfaceError> {
    let now = Instant::now();
    let dt = now
        .saturating_duration_since(state.last_frame)
        .as_secs_f32()
        .min(MAX_FRAME_DT);
    state.last_frame = now;

    let view = advance_camera(state, now, dt);
    let aspect = state.size.width.max(1) as f32 / state.size.height.max(1) as f32;
    let projection = Mat4::perspective_rh(
        state.preset.fov_degrees.to_radians(),
        aspect,
        state.preset.near_clip,
        state.preset.far_clip,
    );
    state.view_proj = projection * view;

    write_uniforms(state, now);
    update_popup_overlay(state, view, now);

    let frame = state.surface.get_current_texture()?;
    let frame_view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("orbis-viewer-encoder"),
        });

    draw_scene(state, &frame_view, &mut encoder);
    draw_popup(state, &frame_view, &mut encoder);

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();

    if state.popup.poll(now) {
        log::debug!("popup hide deadline expired");
    }

    Ok(())
}

/// Advance either the fly-to animation or the orbit controls and return the
/// view matrix for this frame. Completing a fly-to hands the camera back to
/// the orbit controls at the animation's final eye position.
fn advance_camera(state: &mut ViewerState, now: Instant, dt: f32) -> Mat4 {
    if let Some(fly) = state.fly_to.as_mut() {
        let eye = fly.sample(now);
        if fly.finished(now) {
            if let Some(target) = fly.take_restore(now) {
                state.orbit.set_target(target);
            }
            state.orbit.sync_to_eye(eye);
            state.fly_to = None;
            return state.orbit.view_matrix();
        }
        return Mat4::look_at_rh(eye, state.orbit.target(), Vec3::Y);
    }

    state.orbit.update(dt);
    state.orbit.view_matrix()
}

fn write_uniforms(state: &ViewerState, now: Instant) {
    let globe_uniforms = GlobeUniforms {
        view_proj: matrix_columns(state.view_proj),
        model: matrix_columns(Mat4::IDENTITY),
    };
    state.queue.write_buffer(
        &state.globe_uniform_buffer,
        0,
        cast_slice(&[globe_uniforms]),
    );

    let elapsed = now.saturating_duration_since(state.started_at).as_secs_f32();
    let marker_uniforms = MarkerUniforms {
        view_proj: matrix_columns(state.view_proj),
        time: elapsed,
        _padding: [0.0; 3],
    };
    state.queue.write_buffer(
        &state.marker_uniform_buffer,
        0,
        cast_slice(&[marker_uniforms]),
    );
}

/// Refresh the popup quad for the active marker: anchor at its projected
/// screen position, alpha from the limb fade, scale from the grow
/// transition.
fn update_popup_overlay(state: &mut ViewerState, view: Mat4, now: Instant) {
    if !state.popup.visible() {
        return;
    }
    let Some(marker) = state
        .popup
        .active_id()
        .and_then(|id| state.registry.find_by_id(id))
    else {
        return;
    };

    let clip = state.view_proj * marker.position.extend(1.0);
    if clip.w <= f32::EPSILON {
        return;
    }
    let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);
    let anchor = Vec2::new(
        (ndc.x + 1.0) * 0.5 * state.size.width as f32,
        (1.0 - ndc.y) * 0.5 * state.size.height as f32,
    );

    let opacity = label_opacity(marker.position, Mat4::IDENTITY, view);
    let grow = state.popup.grow_progress(now);
    let marker_position = marker.position;
    state
        .label
        .update_geometry(&state.queue, anchor, grow, opacity, state.size);
    state.label.upload(&state.queue);
    log::trace!(
        "popup anchored at {anchor:?} for marker at {marker_position:?} (opacity {opacity:.2})"
    );
}

fn draw_scene(
    state: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("globe-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(state.background),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &state.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    rpass.set_pipeline(&state.globe_pipeline);
    rpass.set_bind_group(0, &state.globe_uniform_bind_group, &[]);
    rpass.set_bind_group(1, &state.globe_texture_bind_group, &[]);
    rpass.set_vertex_buffer(0, state.globe_vertex_buffer.slice(..));
    rpass.set_index_buffer(state.globe_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    rpass.draw_indexed(0..state.globe_index_count, 0, 0..1);

    if state.marker_instance_count > 0 {
        rpass.set_pipeline(&state.marker_pipeline);
        rpass.set_bind_group(0, &state.marker_uniform_bind_group, &[]);
        rpass.set_vertex_buffer(0, state.marker_vertex_buffer.slice(..));
        rpass.set_vertex_buffer(1, state.marker_instance_buffer.slice(..));
        rpass.draw(0..6, 0..state.marker_instance_count);
    }
}

fn draw_popup(
    state: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    if !state.popup.visible() {
        return;
    }

    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("popup-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    rpass.set_pipeline(&state.overlay_pipeline);
    rpass.set_bind_group(0, state.label.texture_bind_group(), &[]);
    rpass.set_bind_group(1, state.label.params_bind_group(), &[]);
    rpass.set_vertex_buffer(0, state.label.vertex_buffer().slice(..));
    rpass.draw(0..6, 0..1);
}
