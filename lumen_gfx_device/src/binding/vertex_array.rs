/// Vertex array objects
///
/// A draw with several vertex buffers looks its vertex array up by a
/// fingerprint of (buffer id, layout hash) pairs. Single-buffer draws keep a
/// private vertex array on the buffer itself and never touch this cache.
/// The element-array binding is kept out of every vertex array; the index
/// buffer is bound separately on each draw.

use rustc_hash::FxHashMap;

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::native::{BufferTarget, NativeContext, NativeVertexArray};
use crate::resource::{ResourceId, VertexBuffer};

const SOURCE: &str = "lumen::VertexArray";

/// Ordered (buffer id, layout hash) pairs
pub type VertexArrayKey = Vec<(ResourceId, u64)>;

pub fn fingerprint(buffers: &[&VertexBuffer]) -> VertexArrayKey {
    buffers.iter().map(|buffer| (buffer.id(), buffer.format().layout_hash())).collect()
}

/// Shared vertex arrays for multi-buffer draws
#[derive(Debug, Default)]
pub struct VertexArrayCache {
    entries: FxHashMap<VertexArrayKey, NativeVertexArray>,
}

impl VertexArrayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &VertexArrayKey) -> Option<NativeVertexArray> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: VertexArrayKey, vertex_array: NativeVertexArray) {
        self.entries.insert(key, vertex_array);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry without deleting (handles died with the context)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Delete every entry that references `buffer`; `true` if any was removed
    pub fn remove_buffer(&mut self, native: &mut dyn NativeContext, buffer: ResourceId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|key, vertex_array| {
            let keep = key.iter().all(|(id, _)| *id != buffer);
            if !keep {
                native.delete_vertex_array(*vertex_array);
            }
            keep
        });
        self.entries.len() != before
    }

    pub fn destroy(&mut self, native: &mut dyn NativeContext) {
        for (_, vertex_array) in self.entries.drain() {
            native.delete_vertex_array(vertex_array);
        }
    }
}

/// Point every attribute of `buffers` at its buffer
///
/// Each buffer is bound to the array target in turn. Instanced formats get
/// a divisor of 1 when the context supports instancing.
pub fn bind_attributes(native: &mut dyn NativeContext, caps: &Capabilities, buffers: &[&VertexBuffer]) {
    let mut location_zero = false;

    for buffer in buffers {
        let format = buffer.format();
        native.bind_buffer(BufferTarget::Array, buffer.native_handle());

        for element in format.elements() {
            let location = element.semantic.location();
            location_zero |= location == 0;

            if element.as_int && caps.is_modern() {
                native.vertex_attrib_i_pointer(location, element.components, element.data_type, format.stride(), element.offset);
            } else {
                native.vertex_attrib_pointer(
                    location,
                    element.components,
                    element.data_type,
                    element.normalize,
                    format.stride(),
                    element.offset,
                );
            }
            native.enable_vertex_attrib_array(location);

            if format.instancing() && caps.instancing {
                native.vertex_attrib_divisor(location, 1);
            }
        }
    }

    if !location_zero && cfg!(debug_assertions) {
        crate::gfx_warn!(
            SOURCE,
            "No vertex attribute is mapped to location 0, which may cause rendering to fail on some platforms"
        );
    }
}

/// Build a vertex array capturing the attributes of `buffers`
pub fn create_vertex_array(
    native: &mut dyn NativeContext,
    caps: &Capabilities,
    buffers: &[&VertexBuffer],
) -> Result<NativeVertexArray> {
    let vertex_array = match native.create_vertex_array() {
        Ok(vertex_array) => vertex_array,
        Err(e) => crate::gfx_bail!(SOURCE, "Failed to create vertex array: {}", e),
    };

    native.bind_vertex_array(Some(vertex_array));
    // Keep any stale element-array binding out of the new vertex array
    native.bind_buffer(BufferTarget::ElementArray, None);
    bind_attributes(native, caps, buffers);
    native.bind_vertex_array(None);
    native.bind_buffer(BufferTarget::Array, None);

    Ok(vertex_array)
}

#[cfg(test)]
#[path = "vertex_array_tests.rs"]
mod tests;
