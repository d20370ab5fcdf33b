/// GraphicsDevice draw submission
///
/// A draw validates the active shader's samplers, binds their textures,
/// commits the uniforms whose scope version moved, binds the queued vertex
/// and index buffers and issues exactly one native draw call.

use std::cell::Ref;
use std::rc::Weak;

use crate::binding::vertex_array::{bind_attributes, create_vertex_array, fingerprint};
use crate::native::{BufferTarget, IndexFormat, PrimitiveType};
use crate::resource::{
    commit_uniform, IndexBuffer, SamplerSlot, Shader, TextureRef, UniformSlot, UniformValue, VertexBuffer,
    VertexBufferRef,
};

use super::graphics_device::{DeviceStatus, GraphicsDevice, SOURCE};

/// Range of primitives to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    pub kind: PrimitiveType,
    /// First vertex, or first index when `indexed`
    pub base: u32,
    /// Vertex or index count
    pub count: u32,
    pub indexed: bool,
}

impl Primitive {
    pub fn new(kind: PrimitiveType, base: u32, count: u32) -> Self {
        Self { kind, base, count, indexed: false }
    }

    pub fn indexed(kind: PrimitiveType, base: u32, count: u32) -> Self {
        Self { kind, base, count, indexed: true }
    }
}

/// Geometry state resolved for one draw
struct BoundGeometry {
    /// Index format and byte offset of the first index
    indices: Option<(IndexFormat, u32)>,
}

impl GraphicsDevice {
    /// Submit a draw with the active shader and the queued buffers
    ///
    /// `num_instances` > 0 issues an instanced draw. The queued vertex
    /// buffers are released afterwards unless `keep_buffers` is set.
    /// Returns `false` when the draw was skipped (lost context, missing
    /// sampler value, unusable shader or buffers).
    pub fn draw(&mut self, primitive: Primitive, num_instances: u32, keep_buffers: bool) -> bool {
        if self.status != DeviceStatus::Live {
            return false;
        }
        let submitted = self.submit(primitive, num_instances);
        if !keep_buffers {
            self.vertex_buffers.clear();
        }
        submitted
    }

    fn submit(&mut self, primitive: Primitive, instances: u32) -> bool {
        let Some(shader) = self.active_shader.as_ref().and_then(Weak::upgrade) else {
            if cfg!(debug_assertions) {
                crate::gfx_warn!(SOURCE, "draw() without an active shader");
            }
            return false;
        };
        let mut shader = shader.borrow_mut();
        if !shader.is_linked() || !shader.link.is_current(self.id, self.generation) {
            return false;
        }
        if instances > 0 && !self.caps.instancing {
            crate::gfx_warn!(SOURCE, "Instanced draw requested but instancing is not supported");
            return false;
        }

        if !self.samplers_ready(&shader) {
            return false;
        }
        let name = shader.name().to_string();
        let (uniforms, samplers) = shader.slots_mut();
        if !self.commit_samplers(&name, samplers) {
            return false;
        }
        self.commit_uniforms(uniforms);
        drop(shader);

        let Some(geometry) = self.bind_geometry(primitive) else {
            return false;
        };

        let feedback = if self.caps.transform_feedback { self.feedback_buffer.clone() } else { None };
        if let Some(buffer) = &feedback {
            let mut buffer = buffer.borrow_mut();
            if !self.prepare_vertex_buffer(&mut buffer) {
                return false;
            }
            self.native.bind_buffer_base(BufferTarget::TransformFeedback, 0, buffer.native_handle());
            self.native.begin_transform_feedback(primitive.kind.feedback_mode());
        }

        let Primitive { kind, base, count, .. } = primitive;
        match geometry.indices {
            Some((format, offset)) => {
                if instances > 0 {
                    self.native.draw_elements_instanced(kind, count, format, offset, instances);
                } else {
                    self.native.draw_elements(kind, count, format, offset);
                }
            }
            None => {
                if instances > 0 {
                    self.native.draw_arrays_instanced(kind, base, count, instances);
                } else {
                    self.native.draw_arrays(kind, base, count);
                }
            }
        }

        if feedback.is_some() {
            self.native.end_transform_feedback();
            self.native.bind_buffer_base(BufferTarget::TransformFeedback, 0, None);
        }

        self.stats.record_draw(kind, count.saturating_mul(instances.max(1)));
        true
    }

    // ===== SAMPLERS =====

    /// Every sampler of the shader has a texture value; missing ones are
    /// reported once per name
    fn samplers_ready(&mut self, shader: &Shader) -> bool {
        let mut ready = true;
        for sampler in shader.samplers() {
            let bound = matches!(
                self.scope.value(sampler.scope_id),
                Some(UniformValue::Texture(_)) | Some(UniformValue::TextureArray(_))
            );
            if bound {
                continue;
            }
            ready = false;
            if self.reported_samplers.insert(sampler.name.clone()) {
                report_missing_sampler(shader.name(), &sampler.name);
            }
        }
        ready
    }

    /// Bind sampler textures to successive units and upload changed unit indices
    fn commit_samplers(&mut self, shader_name: &str, samplers: &mut [SamplerSlot]) -> bool {
        let mut unit = 0u32;
        for sampler in samplers {
            let textures: Vec<TextureRef> = match self.scope.value(sampler.scope_id) {
                Some(UniformValue::Texture(texture)) => vec![texture.clone()],
                Some(UniformValue::TextureArray(textures)) => textures.clone(),
                _ => return false,
            };

            let mut units = Vec::with_capacity(textures.len());
            for texture in &textures {
                if unit >= self.units.unit_count() {
                    crate::gfx_error!(
                        SOURCE,
                        "Shader '{}' uses more than {} texture units",
                        shader_name,
                        self.units.unit_count()
                    );
                    return false;
                }
                if !self.set_texture(texture, unit) {
                    return false;
                }
                units.push(unit as i32);
                unit += 1;
            }

            if sampler.units != units {
                self.native.uniform_i32(sampler.location, 1, &units);
                sampler.units = units;
            }
        }
        true
    }

    // ===== UNIFORMS =====

    /// Upload the uniforms whose scope version differs from the committed one
    fn commit_uniforms(&mut self, uniforms: &mut [UniformSlot]) {
        for slot in uniforms {
            let version = self.scope.version(slot.scope_id);
            if version == slot.committed_version {
                continue;
            }
            if let Some(value) = self.scope.value(slot.scope_id) {
                commit_uniform(self.native.as_mut(), slot.kind, slot.location, value);
            }
            slot.committed_version = version;
        }
    }

    // ===== GEOMETRY =====

    /// Upload dirty buffers and bind the vertex array and index buffer
    fn bind_geometry(&mut self, primitive: Primitive) -> Option<BoundGeometry> {
        if self.vertex_buffers.is_empty() {
            if cfg!(debug_assertions) {
                crate::gfx_warn!(SOURCE, "draw() without vertex buffers");
            }
            return None;
        }

        let buffers: Vec<VertexBufferRef> = self.vertex_buffers.clone();
        for buffer in &buffers {
            if !self.prepare_vertex_buffer(&mut buffer.borrow_mut()) {
                return None;
            }
        }

        // The index buffer is uploaded outside any vertex array
        let index_buffer = match (primitive.indexed, self.index_buffer.clone()) {
            (false, _) => None,
            (true, Some(buffer)) => Some(buffer),
            (true, None) => {
                if cfg!(debug_assertions) {
                    crate::gfx_warn!(SOURCE, "Indexed draw without an index buffer");
                }
                return None;
            }
        };
        let mut offset = 0;
        if let Some(buffer) = &index_buffer {
            let mut buffer = buffer.borrow_mut();
            let Some(bytes) = primitive.base.checked_mul(buffer.format().size_bytes()) else {
                crate::gfx_warn!(SOURCE, "Index offset of first index {} overflows; draw skipped", primitive.base);
                return None;
            };
            offset = bytes;
            if !self.prepare_index_buffer(&mut buffer) {
                return None;
            }
        }

        if !self.bind_vertex_buffers(&buffers) {
            return None;
        }

        let indices = match &index_buffer {
            Some(buffer) => {
                let buffer = buffer.borrow();
                self.native.bind_buffer(BufferTarget::ElementArray, buffer.native_handle());
                Some((buffer.format(), offset))
            }
            None => None,
        };
        Some(BoundGeometry { indices })
    }

    fn bind_vertex_buffers(&mut self, buffers: &[VertexBufferRef]) -> bool {
        if !self.caps.vertex_arrays {
            let borrowed: Vec<Ref<'_, VertexBuffer>> = buffers.iter().map(|buffer| buffer.borrow()).collect();
            let refs: Vec<&VertexBuffer> = borrowed.iter().map(|buffer| &**buffer).collect();
            bind_attributes(self.native.as_mut(), &self.caps, &refs);
            return true;
        }

        let vertex_array = if let [single] = buffers {
            let mut buffer = single.borrow_mut();
            match buffer.vertex_array() {
                Some(vertex_array) => vertex_array,
                None => {
                    let Ok(vertex_array) = create_vertex_array(self.native.as_mut(), &self.caps, &[&*buffer]) else {
                        return false;
                    };
                    buffer.set_vertex_array(vertex_array);
                    self.bound_vertex_array = None;
                    self.stats.vaos_created += 1;
                    vertex_array
                }
            }
        } else {
            let borrowed: Vec<Ref<'_, VertexBuffer>> = buffers.iter().map(|buffer| buffer.borrow()).collect();
            let refs: Vec<&VertexBuffer> = borrowed.iter().map(|buffer| &**buffer).collect();
            let key = fingerprint(&refs);
            match self.vertex_arrays.get(&key) {
                Some(vertex_array) => vertex_array,
                None => {
                    let Ok(vertex_array) = create_vertex_array(self.native.as_mut(), &self.caps, &refs) else {
                        return false;
                    };
                    self.vertex_arrays.insert(key, vertex_array);
                    self.bound_vertex_array = None;
                    self.stats.vaos_created += 1;
                    vertex_array
                }
            }
        };

        self.bind_vertex_array(Some(vertex_array));
        true
    }

    pub(super) fn prepare_vertex_buffer(&mut self, buffer: &mut VertexBuffer) -> bool {
        if !self.check_owner(buffer.link(), "Vertex buffer", buffer.id()) {
            return false;
        }
        if !buffer.link().is_current(self.id, self.generation) {
            buffer.lose_context();
            if buffer.initialize(self.native.as_mut(), self.id, self.generation).is_err() {
                return false;
            }
        }
        if buffer.is_dirty() {
            buffer.upload(self.native.as_mut());
        }
        true
    }

    fn prepare_index_buffer(&mut self, buffer: &mut IndexBuffer) -> bool {
        if !self.check_owner(buffer.link(), "Index buffer", buffer.id()) {
            return false;
        }
        if buffer.format() == IndexFormat::U32 && !self.caps.uint_indices {
            crate::gfx_warn!(SOURCE, "32-bit indices are not supported by this context");
            return false;
        }
        if !buffer.link().is_current(self.id, self.generation) {
            buffer.lose_context();
            if buffer.initialize(self.native.as_mut(), self.id, self.generation).is_err() {
                return false;
            }
        }
        if buffer.is_dirty() {
            self.unbind_vertex_array_for_upload();
            buffer.upload(self.native.as_mut());
        }
        true
    }
}

fn report_missing_sampler(shader: &str, sampler: &str) {
    match sampler {
        "uSceneDepthMap" | "uDepthMap" => crate::gfx_error!(
            SOURCE,
            "Shader '{}' samples '{}' but no scene depth map is available. \
             A camera or layer must request the scene depth map before it can be sampled; draw skipped",
            shader,
            sampler
        ),
        "uSceneColorMap" | "texture_grabPass" => crate::gfx_error!(
            SOURCE,
            "Shader '{}' samples '{}' but no scene color map is available. \
             A camera or layer must request the scene color map before it can be sampled; draw skipped",
            shader,
            sampler
        ),
        _ => crate::gfx_error!(
            SOURCE,
            "Shader '{}' requires sampler '{}' which has no texture set; draw skipped",
            shader,
            sampler
        ),
    }
}

#[cfg(test)]
#[path = "graphics_device_draw_tests.rs"]
mod tests;
