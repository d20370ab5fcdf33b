/// Vertex and index buffers
///
/// Both keep their CPU-side bytes so they can be re-uploaded after a context
/// loss. A vertex buffer also owns the private vertex array used when it is
/// the only buffer of a draw.

use crate::error::Result;
use crate::native::{BufferTarget, BufferUsage, IndexFormat, NativeBuffer, NativeContext, NativeVertexArray};
use crate::resource::{ensure_context, DeviceId, DeviceLink, ResourceId, VertexFormat};

/// State shared by vertex and index buffers
#[derive(Debug)]
struct BufferStorage {
    usage: BufferUsage,
    data: Vec<u8>,
    native: Option<NativeBuffer>,
    dirty: bool,
    link: DeviceLink,
}

impl BufferStorage {
    fn new(usage: BufferUsage, data: Vec<u8>) -> Self {
        Self { usage, data, native: None, dirty: true, link: DeviceLink::default() }
    }

    fn initialize(&mut self, native: &mut dyn NativeContext, device: DeviceId, generation: u64, what: &str) -> Result<()> {
        ensure_context(native)?;
        let buffer = match native.create_buffer() {
            Ok(buffer) => buffer,
            Err(e) => crate::gfx_bail!("lumen::Buffer", "Failed to create {} buffer: {}", what, e),
        };
        self.native = Some(buffer);
        self.link = DeviceLink { device: Some(device), generation };
        self.dirty = true;
        Ok(())
    }

    fn upload(&mut self, native: &mut dyn NativeContext, target: BufferTarget) {
        native.bind_buffer(target, self.native);
        native.buffer_data(target, &self.data, self.usage);
        self.dirty = false;
    }

    fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.dirty = true;
    }

    fn lose_context(&mut self) {
        self.native = None;
        self.link.generation = 0;
        self.dirty = true;
    }

    fn destroy(&mut self, native: &mut dyn NativeContext) {
        if let Some(buffer) = self.native.take() {
            native.delete_buffer(buffer);
        }
        self.link = DeviceLink::default();
        self.dirty = true;
    }
}

// ===== VERTEX BUFFER =====

#[derive(Debug)]
pub struct VertexBuffer {
    id: ResourceId,
    format: VertexFormat,
    num_vertices: u32,
    storage: BufferStorage,
    /// Private vertex array for single-buffer draws
    vertex_array: Option<NativeVertexArray>,
}

impl VertexBuffer {
    /// `data` defaults to zeroed storage for `num_vertices` vertices
    pub fn new(format: VertexFormat, num_vertices: u32, usage: BufferUsage, data: Option<Vec<u8>>) -> Self {
        let size = (format.stride() * num_vertices) as usize;
        let data = data.unwrap_or_else(|| vec![0; size]);
        Self {
            id: ResourceId::next(),
            format,
            num_vertices,
            storage: BufferStorage::new(usage, data),
            vertex_array: None,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    pub fn data(&self) -> &[u8] {
        &self.storage.data
    }

    pub fn is_dirty(&self) -> bool {
        self.storage.dirty
    }

    pub fn native_handle(&self) -> Option<NativeBuffer> {
        self.storage.native
    }

    /// Replace the contents; uploaded on next use
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.num_vertices = match self.format.stride() {
            0 => 0,
            stride => data.len() as u32 / stride,
        };
        self.storage.set_data(data);
    }

    pub(crate) fn link(&self) -> DeviceLink {
        self.storage.link
    }

    pub(crate) fn vertex_array(&self) -> Option<NativeVertexArray> {
        self.vertex_array
    }

    pub(crate) fn set_vertex_array(&mut self, vertex_array: NativeVertexArray) {
        self.vertex_array = Some(vertex_array);
    }

    pub(crate) fn initialize(&mut self, native: &mut dyn NativeContext, device: DeviceId, generation: u64) -> Result<()> {
        self.storage.initialize(native, device, generation, "vertex")
    }

    /// Bind to the array target and upload the CPU data
    pub(crate) fn upload(&mut self, native: &mut dyn NativeContext) {
        self.storage.upload(native, BufferTarget::Array);
    }

    pub(crate) fn lose_context(&mut self) {
        self.storage.lose_context();
        self.vertex_array = None;
    }

    pub(crate) fn destroy(&mut self, native: &mut dyn NativeContext) {
        if let Some(vertex_array) = self.vertex_array.take() {
            native.delete_vertex_array(vertex_array);
        }
        self.storage.destroy(native);
    }
}

// ===== INDEX BUFFER =====

#[derive(Debug)]
pub struct IndexBuffer {
    id: ResourceId,
    format: IndexFormat,
    num_indices: u32,
    storage: BufferStorage,
}

impl IndexBuffer {
    pub fn new(format: IndexFormat, num_indices: u32, usage: BufferUsage, data: Option<Vec<u8>>) -> Self {
        let size = (format.size_bytes() * num_indices) as usize;
        let data = data.unwrap_or_else(|| vec![0; size]);
        Self {
            id: ResourceId::next(),
            format,
            num_indices,
            storage: BufferStorage::new(usage, data),
        }
    }

    /// 16-bit index buffer from a slice of indices
    pub fn from_u16(indices: &[u16], usage: BufferUsage) -> Self {
        Self::new(IndexFormat::U16, indices.len() as u32, usage, Some(bytemuck::cast_slice::<_, u8>(indices).to_vec()))
    }

    /// 32-bit index buffer from a slice of indices
    pub fn from_u32(indices: &[u32], usage: BufferUsage) -> Self {
        Self::new(IndexFormat::U32, indices.len() as u32, usage, Some(bytemuck::cast_slice::<_, u8>(indices).to_vec()))
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }

    pub fn is_dirty(&self) -> bool {
        self.storage.dirty
    }

    pub fn native_handle(&self) -> Option<NativeBuffer> {
        self.storage.native
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.num_indices = data.len() as u32 / self.format.size_bytes();
        self.storage.set_data(data);
    }

    pub(crate) fn link(&self) -> DeviceLink {
        self.storage.link
    }

    pub(crate) fn initialize(&mut self, native: &mut dyn NativeContext, device: DeviceId, generation: u64) -> Result<()> {
        self.storage.initialize(native, device, generation, "index")
    }

    /// Bind to the element-array target and upload. The caller unbinds any
    /// vertex array first, since that binding is vertex-array state.
    pub(crate) fn upload(&mut self, native: &mut dyn NativeContext) {
        self.storage.upload(native, BufferTarget::ElementArray);
    }

    pub(crate) fn lose_context(&mut self) {
        self.storage.lose_context();
    }

    pub(crate) fn destroy(&mut self, native: &mut dyn NativeContext) {
        self.storage.destroy(native);
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
