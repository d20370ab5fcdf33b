use super::*;
use crate::native::mock_context::{MockContext, MockHandle};
use crate::native::{ActiveUniform, ApiGeneration};

fn uniform(name: &str, ty: ActiveUniformType, size: u32, location: u32) -> ActiveUniform {
    ActiveUniform { name: name.to_string(), ty, size, location: UniformLocation(location) }
}

fn setup(uniforms: Vec<ActiveUniform>) -> (MockContext, MockHandle) {
    let (context, state) = MockContext::new(ApiGeneration::Modern);
    state.borrow_mut().program_uniforms = uniforms;
    (context, state)
}

fn shader() -> Shader {
    Shader::new(ShaderDesc {
        name: "lit".to_string(),
        attributes: vec![VertexSemantic::Position, VertexSemantic::Normal],
        ..ShaderDesc::default()
    })
}

#[test]
fn test_link_reflects_uniforms_and_samplers() {
    let (mut context, state) = setup(vec![
        uniform("matrix_model", ActiveUniformType::FloatMat4, 1, 0),
        uniform("bones[0]", ActiveUniformType::FloatVec4, 64, 1),
        uniform("texture_diffuse", ActiveUniformType::Sampler2D, 1, 2),
        uniform("shadow_maps[0]", ActiveUniformType::Sampler2DShadow, 4, 3),
    ]);
    let mut scope = UniformScope::new();
    let mut shader = shader();

    shader.link(&mut context, &mut scope, DeviceId::next(), 1).unwrap();

    assert!(shader.is_linked());
    assert_eq!(state.borrow().count_exact("create_program(2)"), 1);
    assert_eq!(shader.uniforms().len(), 2);
    assert_eq!(shader.uniforms()[1].name, "bones");
    assert_eq!(shader.uniforms()[1].kind, UniformKind::Vec4Array);
    assert_eq!(shader.samplers().len(), 2);
    assert_eq!(shader.samplers()[1].name, "shadow_maps");
    assert_eq!(shader.samplers()[1].array_size, 4);
    assert_eq!(shader.samplers()[1].scope_id, scope.resolve("shadow_maps"));
}

#[test]
fn test_link_failure_marks_failed() {
    let (mut context, state) = setup(Vec::new());
    state.borrow_mut().fail_program_link = true;
    let mut scope = UniformScope::new();
    let mut shader = shader();

    let result = shader.link(&mut context, &mut scope, DeviceId::next(), 1);

    assert!(result.is_err());
    assert!(shader.failed());
    assert!(!shader.is_linked());
}

#[test]
fn test_unsupported_uniform_is_skipped() {
    let (mut context, _state) = setup(vec![uniform("normals[0]", ActiveUniformType::FloatMat3, 2, 0)]);
    let mut scope = UniformScope::new();
    let mut shader = shader();

    shader.link(&mut context, &mut scope, DeviceId::next(), 1).unwrap();

    assert!(shader.uniforms().is_empty());
}

#[test]
fn test_lose_context_clears_program_and_failure() {
    let (mut context, state) = setup(vec![uniform("tint", ActiveUniformType::FloatVec4, 1, 0)]);
    let mut scope = UniformScope::new();
    let mut shader = shader();
    shader.link(&mut context, &mut scope, DeviceId::next(), 1).unwrap();

    shader.lose_context();
    assert!(!shader.is_linked());
    assert!(shader.uniforms().is_empty());

    shader.link(&mut context, &mut scope, DeviceId::next(), 2).unwrap();
    shader.destroy(&mut context);
    assert_eq!(state.borrow().count("delete_program"), 1);
}
