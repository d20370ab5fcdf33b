/// Uniform values, the uniform scope and the commit dispatch table
///
/// Values are published by name into a `UniformScope`. Every write stamps
/// the entry with a new version; a shader commits a uniform only when the
/// entry version differs from the one it committed last.

use std::borrow::Cow;
use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::native::{ActiveUniformType, NativeContext, UniformLocation};
use crate::resource::TextureRef;

new_key_type! {
    /// Stable handle to a uniform scope entry
    pub struct ScopeId;
}

/// Value bound to a uniform or sampler name
#[derive(Debug, Clone)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    UInt(u32),
    UVec2(UVec2),
    UVec3(UVec3),
    UVec4(UVec4),
    Bool(bool),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    Vec2Array(Vec<Vec2>),
    Vec3Array(Vec<Vec3>),
    Vec4Array(Vec<Vec4>),
    IntArray(Vec<i32>),
    UIntArray(Vec<u32>),
    Mat4Array(Vec<Mat4>),
    Texture(TextureRef),
    TextureArray(Vec<TextureRef>),
}

impl UniformValue {
    /// Flattened float data (matrices column-major)
    pub fn floats(&self) -> Option<&[f32]> {
        Some(match self {
            UniformValue::Float(v) => std::slice::from_ref(v),
            UniformValue::Vec2(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::Vec3(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::Vec4(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::Mat2(m) => bytemuck::cast_slice(std::slice::from_ref(m)),
            UniformValue::Mat3(m) => bytemuck::cast_slice(std::slice::from_ref(m)),
            UniformValue::Mat4(m) => bytemuck::cast_slice(std::slice::from_ref(m)),
            UniformValue::FloatArray(v) => v.as_slice(),
            UniformValue::Vec2Array(v) => bytemuck::cast_slice(v),
            UniformValue::Vec3Array(v) => bytemuck::cast_slice(v),
            UniformValue::Vec4Array(v) => bytemuck::cast_slice(v),
            UniformValue::Mat4Array(v) => bytemuck::cast_slice(v),
            _ => return None,
        })
    }

    /// Signed integer data (booleans as 0 / 1)
    pub fn ints(&self) -> Option<Cow<'_, [i32]>> {
        Some(match self {
            UniformValue::Int(v) => Cow::Borrowed(std::slice::from_ref(v)),
            UniformValue::IVec2(v) => Cow::Borrowed(bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::IVec3(v) => Cow::Borrowed(bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::IVec4(v) => Cow::Borrowed(bytemuck::cast_slice(std::slice::from_ref(v))),
            UniformValue::IntArray(v) => Cow::Borrowed(v.as_slice()),
            UniformValue::Bool(v) => Cow::Owned(vec![*v as i32]),
            _ => return None,
        })
    }

    pub fn uints(&self) -> Option<&[u32]> {
        Some(match self {
            UniformValue::UInt(v) => std::slice::from_ref(v),
            UniformValue::UVec2(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::UVec3(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::UVec4(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::UIntArray(v) => v.as_slice(),
            _ => return None,
        })
    }
}

// ===== UNIFORM KINDS =====

/// Closed set of non-sampler uniform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    UVec2,
    UVec3,
    UVec4,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
    FloatArray,
    Vec2Array,
    Vec3Array,
    Vec4Array,
    IntArray,
    UIntArray,
    Mat4Array,
}

impl UniformKind {
    pub const COUNT: usize = 26;

    /// Kind of a reflected uniform, `None` for samplers and unsupported arrays
    pub fn from_active(ty: ActiveUniformType, size: u32) -> Option<UniformKind> {
        use ActiveUniformType as T;
        let array = size > 1;
        Some(match (ty, array) {
            (T::Float, false) => UniformKind::Float,
            (T::FloatVec2, false) => UniformKind::Vec2,
            (T::FloatVec3, false) => UniformKind::Vec3,
            (T::FloatVec4, false) => UniformKind::Vec4,
            (T::Int, false) => UniformKind::Int,
            (T::IntVec2, false) => UniformKind::IVec2,
            (T::IntVec3, false) => UniformKind::IVec3,
            (T::IntVec4, false) => UniformKind::IVec4,
            (T::UInt, false) => UniformKind::UInt,
            (T::UIntVec2, false) => UniformKind::UVec2,
            (T::UIntVec3, false) => UniformKind::UVec3,
            (T::UIntVec4, false) => UniformKind::UVec4,
            (T::Bool, false) => UniformKind::Bool,
            (T::BoolVec2, false) => UniformKind::BVec2,
            (T::BoolVec3, false) => UniformKind::BVec3,
            (T::BoolVec4, false) => UniformKind::BVec4,
            (T::FloatMat2, false) => UniformKind::Mat2,
            (T::FloatMat3, false) => UniformKind::Mat3,
            (T::FloatMat4, false) => UniformKind::Mat4,
            (T::Float, true) => UniformKind::FloatArray,
            (T::FloatVec2, true) => UniformKind::Vec2Array,
            (T::FloatVec3, true) => UniformKind::Vec3Array,
            (T::FloatVec4, true) => UniformKind::Vec4Array,
            (T::Int | T::Bool, true) => UniformKind::IntArray,
            (T::UInt, true) => UniformKind::UIntArray,
            (T::FloatMat4, true) => UniformKind::Mat4Array,
            _ => return None,
        })
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Uploads one value for one uniform kind
pub type CommitFn = fn(&mut dyn NativeContext, UniformLocation, &UniformValue);

macro_rules! commit_floats {
    ($name:ident, $components:expr) => {
        fn $name(native: &mut dyn NativeContext, location: UniformLocation, value: &UniformValue) {
            if let Some(data) = value.floats() {
                native.uniform_f32(location, $components, data);
            }
        }
    };
}

macro_rules! commit_ints {
    ($name:ident, $components:expr) => {
        fn $name(native: &mut dyn NativeContext, location: UniformLocation, value: &UniformValue) {
            if let Some(data) = value.ints() {
                native.uniform_i32(location, $components, &data);
            }
        }
    };
}

macro_rules! commit_uints {
    ($name:ident, $components:expr) => {
        fn $name(native: &mut dyn NativeContext, location: UniformLocation, value: &UniformValue) {
            if let Some(data) = value.uints() {
                native.uniform_u32(location, $components, data);
            }
        }
    };
}

macro_rules! commit_matrix {
    ($name:ident, $dimension:expr) => {
        fn $name(native: &mut dyn NativeContext, location: UniformLocation, value: &UniformValue) {
            if let Some(data) = value.floats() {
                native.uniform_matrix_f32(location, $dimension, data);
            }
        }
    };
}

commit_floats!(commit_float, 1);
commit_floats!(commit_vec2, 2);
commit_floats!(commit_vec3, 3);
commit_floats!(commit_vec4, 4);
commit_ints!(commit_int, 1);
commit_ints!(commit_ivec2, 2);
commit_ints!(commit_ivec3, 3);
commit_ints!(commit_ivec4, 4);
commit_uints!(commit_uint, 1);
commit_uints!(commit_uvec2, 2);
commit_uints!(commit_uvec3, 3);
commit_uints!(commit_uvec4, 4);
commit_matrix!(commit_mat2, 2);
commit_matrix!(commit_mat3, 3);
commit_matrix!(commit_mat4, 4);

/// Commit routine per `UniformKind`, indexed by `UniformKind::index`
pub const COMMIT_FUNCTIONS: [CommitFn; UniformKind::COUNT] = [
    commit_float,  // Float
    commit_vec2,   // Vec2
    commit_vec3,   // Vec3
    commit_vec4,   // Vec4
    commit_int,    // Int
    commit_ivec2,  // IVec2
    commit_ivec3,  // IVec3
    commit_ivec4,  // IVec4
    commit_uint,   // UInt
    commit_uvec2,  // UVec2
    commit_uvec3,  // UVec3
    commit_uvec4,  // UVec4
    commit_int,    // Bool
    commit_ivec2,  // BVec2
    commit_ivec3,  // BVec3
    commit_ivec4,  // BVec4
    commit_mat2,   // Mat2
    commit_mat3,   // Mat3
    commit_mat4,   // Mat4
    commit_float,  // FloatArray
    commit_vec2,   // Vec2Array
    commit_vec3,   // Vec3Array
    commit_vec4,   // Vec4Array
    commit_int,    // IntArray
    commit_uint,   // UIntArray
    commit_mat4,   // Mat4Array
];

/// Upload `value` with the routine registered for `kind`
pub fn commit_uniform(native: &mut dyn NativeContext, kind: UniformKind, location: UniformLocation, value: &UniformValue) {
    COMMIT_FUNCTIONS[kind.index()](native, location, value);
}

// ===== UNIFORM SCOPE =====

#[derive(Debug)]
struct ScopeEntry {
    name: String,
    value: Option<UniformValue>,
    version: u64,
}

/// Named uniform values with version stamps
#[derive(Debug, Default)]
pub struct UniformScope {
    entries: SlotMap<ScopeId, ScopeEntry>,
    by_name: FxHashMap<String, ScopeId>,
    /// Last version handed out (0 = never written)
    version: u64,
}

impl UniformScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, creating an empty entry on first use
    pub fn resolve(&mut self, name: &str) -> ScopeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.entries.insert(ScopeEntry { name: name.to_string(), value: None, version: 0 });
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn set(&mut self, name: &str, value: UniformValue) -> ScopeId {
        let id = self.resolve(name);
        self.set_by_id(id, value);
        id
    }

    pub fn set_by_id(&mut self, id: ScopeId, value: UniformValue) {
        self.version += 1;
        if let Some(entry) = self.entries.get_mut(id) {
            entry.value = Some(value);
            entry.version = self.version;
        }
    }

    /// Remove the value; the entry keeps its id
    pub fn clear(&mut self, name: &str) {
        if let Some(&id) = self.by_name.get(name) {
            self.version += 1;
            if let Some(entry) = self.entries.get_mut(id) {
                entry.value = None;
                entry.version = self.version;
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.by_name.get(name).and_then(|&id| self.value(id))
    }

    pub fn value(&self, id: ScopeId) -> Option<&UniformValue> {
        self.entries.get(id).and_then(|entry| entry.value.as_ref())
    }

    pub fn version(&self, id: ScopeId) -> u64 {
        self.entries.get(id).map_or(0, |entry| entry.version)
    }

    pub fn name(&self, id: ScopeId) -> Option<&str> {
        self.entries.get(id).map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
