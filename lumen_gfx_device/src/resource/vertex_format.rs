/// Vertex format
///
/// Describes an interleaved vertex layout. The layout hash identifies the
/// format inside vertex-array fingerprints, so two formats with the same
/// elements share cached vertex arrays.

use std::hash::{Hash, Hasher};
use rustc_hash::FxHasher;

use crate::native::DataType;

/// Attribute meaning, mapped to a fixed attribute location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    Normal,
    BlendWeight,
    BlendIndices,
    Color,
    /// Texture coordinate set 0-7
    TexCoord(u8),
    Tangent,
    /// Generic attribute 0-15 (aliases the named locations)
    Attr(u8),
}

impl VertexSemantic {
    /// Shader attribute location bound before linking
    pub fn location(self) -> u32 {
        match self {
            VertexSemantic::Position => 0,
            VertexSemantic::Normal => 1,
            VertexSemantic::BlendWeight => 2,
            VertexSemantic::BlendIndices => 3,
            VertexSemantic::Color => 4,
            VertexSemantic::TexCoord(set) => 5 + set.min(7) as u32,
            VertexSemantic::Tangent => 13,
            VertexSemantic::Attr(index) => index.min(15) as u32,
        }
    }

    /// Attribute name used in shader sources
    pub fn attribute_name(self) -> String {
        match self {
            VertexSemantic::Position => "vertex_position".to_string(),
            VertexSemantic::Normal => "vertex_normal".to_string(),
            VertexSemantic::BlendWeight => "vertex_boneWeights".to_string(),
            VertexSemantic::BlendIndices => "vertex_boneIndices".to_string(),
            VertexSemantic::Color => "vertex_color".to_string(),
            VertexSemantic::TexCoord(set) => format!("vertex_texCoord{}", set),
            VertexSemantic::Tangent => "vertex_tangent".to_string(),
            VertexSemantic::Attr(index) => format!("vertex_attr{}", index),
        }
    }
}

/// One attribute inside a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub semantic: VertexSemantic,
    /// Component count (1-4)
    pub components: u32,
    pub data_type: DataType,
    /// Normalize integer data to [0, 1] / [-1, 1]
    pub normalize: bool,
    /// Read as integer in the shader (modern generation)
    pub as_int: bool,
    /// Byte offset inside the vertex (filled by `VertexFormat::new`)
    pub offset: u32,
}

impl VertexElement {
    pub fn new(semantic: VertexSemantic, components: u32, data_type: DataType) -> Self {
        Self {
            semantic,
            components,
            data_type,
            normalize: false,
            as_int: false,
            offset: 0,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    pub fn integer(mut self) -> Self {
        self.as_int = true;
        self
    }

    pub fn size(&self) -> u32 {
        self.components * self.data_type.size_bytes()
    }
}

/// Interleaved vertex layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexFormat {
    elements: Vec<VertexElement>,
    stride: u32,
    /// Per-instance data (attribute divisor 1)
    instancing: bool,
    layout_hash: u64,
}

impl VertexFormat {
    /// Lay the elements out back to back, each padded to 4 bytes
    pub fn new(mut elements: Vec<VertexElement>, instancing: bool) -> Self {
        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.size().next_multiple_of(4);
        }

        let mut hasher = FxHasher::default();
        elements.hash(&mut hasher);
        offset.hash(&mut hasher);
        instancing.hash(&mut hasher);

        Self {
            elements,
            stride: offset,
            instancing,
            layout_hash: hasher.finish(),
        }
    }

    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Size of one vertex in bytes
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn instancing(&self) -> bool {
        self.instancing
    }

    pub fn layout_hash(&self) -> u64 {
        self.layout_hash
    }

    pub fn element(&self, semantic: VertexSemantic) -> Option<&VertexElement> {
        self.elements.iter().find(|e| e.semantic == semantic)
    }
}

#[cfg(test)]
#[path = "vertex_format_tests.rs"]
mod tests;
