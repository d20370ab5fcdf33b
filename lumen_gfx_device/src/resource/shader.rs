/// Shader program resource
///
/// Links a program from ready-made sources (source assembly happens upstream)
/// and reflects its active uniforms into sampler and uniform slots resolved
/// against the device's `UniformScope`.

use crate::error::Result;
use crate::native::{ActiveUniformType, NativeContext, NativeProgram, ProgramDesc, TextureTarget, UniformLocation};
use crate::resource::{
    ensure_context, DeviceId, DeviceLink, ResourceId, ScopeId, UniformKind, UniformScope, VertexSemantic,
};

const SOURCE: &str = "lumen::Shader";

/// Descriptor for creating a shader
#[derive(Debug, Clone, Default)]
pub struct ShaderDesc {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
    /// Vertex attributes bound to their semantic locations before linking
    pub attributes: Vec<VertexSemantic>,
    /// Varyings captured by transform feedback
    pub feedback_varyings: Vec<String>,
}

/// Non-sampler uniform of a linked program
#[derive(Debug, Clone)]
pub struct UniformSlot {
    pub name: String,
    pub location: UniformLocation,
    pub kind: UniformKind,
    pub scope_id: ScopeId,
    /// Scope version last uploaded (0 = never)
    pub(crate) committed_version: u64,
}

/// Sampler uniform of a linked program
#[derive(Debug, Clone)]
pub struct SamplerSlot {
    pub name: String,
    pub location: UniformLocation,
    pub target: TextureTarget,
    /// Array length (1 for a single sampler)
    pub array_size: u32,
    pub scope_id: ScopeId,
    /// Texture units last uploaded for this sampler
    pub(crate) units: Vec<i32>,
}

#[derive(Debug)]
pub struct Shader {
    id: ResourceId,
    desc: ShaderDesc,
    program: Option<NativeProgram>,
    /// Link failed in the current context; not retried until it is lost
    failed: bool,
    uniforms: Vec<UniformSlot>,
    samplers: Vec<SamplerSlot>,
    pub(crate) link: DeviceLink,
}

impl Shader {
    pub fn new(desc: ShaderDesc) -> Self {
        Self {
            id: ResourceId::next(),
            desc,
            program: None,
            failed: false,
            uniforms: Vec::new(),
            samplers: Vec::new(),
            link: DeviceLink::default(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn program(&self) -> Option<NativeProgram> {
        self.program
    }

    pub fn is_linked(&self) -> bool {
        self.program.is_some()
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn uniforms(&self) -> &[UniformSlot] {
        &self.uniforms
    }

    pub fn samplers(&self) -> &[SamplerSlot] {
        &self.samplers
    }

    pub(crate) fn slots_mut(&mut self) -> (&mut [UniformSlot], &mut [SamplerSlot]) {
        (&mut self.uniforms, &mut self.samplers)
    }

    /// Link the program and reflect its uniforms
    pub(crate) fn link(
        &mut self,
        native: &mut dyn NativeContext,
        scope: &mut UniformScope,
        device: DeviceId,
        generation: u64,
    ) -> Result<()> {
        ensure_context(native)?;
        let attributes: Vec<(String, u32)> = self
            .desc
            .attributes
            .iter()
            .map(|semantic| (semantic.attribute_name(), semantic.location()))
            .collect();
        let desc = ProgramDesc {
            vertex: &self.desc.vertex,
            fragment: &self.desc.fragment,
            attributes: &attributes,
            feedback_varyings: &self.desc.feedback_varyings,
        };

        self.link = DeviceLink { device: Some(device), generation };
        let program = match native.create_program(&desc) {
            Ok(program) => program,
            Err(e) => {
                self.failed = true;
                crate::gfx_bail!(SOURCE, "Failed to link shader '{}': {}", self.desc.name, e)
            }
        };
        self.program = Some(program);
        self.failed = false;
        self.reflect(native, program, scope);

        crate::gfx_debug!(
            SOURCE,
            "Linked '{}' ({} uniforms, {} samplers)",
            self.desc.name,
            self.uniforms.len(),
            self.samplers.len()
        );
        Ok(())
    }

    fn reflect(&mut self, native: &mut dyn NativeContext, program: NativeProgram, scope: &mut UniformScope) {
        self.uniforms.clear();
        self.samplers.clear();

        for uniform in native.active_uniforms(program) {
            let name = uniform.name.strip_suffix("[0]").unwrap_or(&uniform.name).to_string();
            let scope_id = scope.resolve(&name);

            if let Some(target) = sampler_target(uniform.ty) {
                self.samplers.push(SamplerSlot {
                    name,
                    location: uniform.location,
                    target,
                    array_size: uniform.size.max(1),
                    scope_id,
                    units: Vec::new(),
                });
            } else if let Some(kind) = UniformKind::from_active(uniform.ty, uniform.size) {
                self.uniforms.push(UniformSlot {
                    name,
                    location: uniform.location,
                    kind,
                    scope_id,
                    committed_version: 0,
                });
            } else {
                crate::gfx_warn!(
                    SOURCE,
                    "Shader '{}': uniform '{}' of type {:?}[{}] is not supported",
                    self.desc.name,
                    name,
                    uniform.ty,
                    uniform.size
                );
            }
        }
    }

    pub(crate) fn lose_context(&mut self) {
        self.program = None;
        self.failed = false;
        self.uniforms.clear();
        self.samplers.clear();
        self.link.generation = 0;
    }

    pub(crate) fn destroy(&mut self, native: &mut dyn NativeContext) {
        if let Some(program) = self.program.take() {
            native.delete_program(program);
        }
        self.uniforms.clear();
        self.samplers.clear();
        self.link = DeviceLink::default();
    }
}

/// Texture target sampled by a sampler uniform type
fn sampler_target(ty: ActiveUniformType) -> Option<TextureTarget> {
    match ty {
        ActiveUniformType::Sampler2D
        | ActiveUniformType::Sampler2DShadow
        | ActiveUniformType::IntSampler2D
        | ActiveUniformType::UIntSampler2D => Some(TextureTarget::Texture2D),
        ActiveUniformType::SamplerCube | ActiveUniformType::SamplerCubeShadow => Some(TextureTarget::CubeMap),
        ActiveUniformType::Sampler2DArray | ActiveUniformType::Sampler2DArrayShadow => Some(TextureTarget::Texture2DArray),
        ActiveUniformType::Sampler3D => Some(TextureTarget::Texture3D),
        _ => None,
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
