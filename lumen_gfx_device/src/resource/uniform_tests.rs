use super::*;
use crate::native::mock_context::MockContext;
use crate::native::ApiGeneration;

// ===== SCOPE =====

#[test]
fn test_resolve_is_stable() {
    let mut scope = UniformScope::new();
    let a = scope.resolve("matrix_model");
    let b = scope.resolve("matrix_model");
    assert_eq!(a, b);
    assert_eq!(scope.len(), 1);
    assert_eq!(scope.version(a), 0);
    assert!(scope.value(a).is_none());
}

#[test]
fn test_versions_increase_on_every_write() {
    let mut scope = UniformScope::new();
    let id = scope.set("light_color", UniformValue::Vec3(Vec3::ONE));
    let first = scope.version(id);

    scope.set("light_color", UniformValue::Vec3(Vec3::ONE));
    let second = scope.version(id);
    scope.clear("light_color");
    let third = scope.version(id);

    assert!(first > 0);
    assert!(second > first);
    assert!(third > second);
    assert!(scope.get("light_color").is_none());
    assert_eq!(scope.name(id), Some("light_color"));
}

#[test]
fn test_versions_are_global_across_entries() {
    let mut scope = UniformScope::new();
    let a = scope.set("a", UniformValue::Float(1.0));
    let b = scope.set("b", UniformValue::Float(2.0));
    assert_ne!(scope.version(a), scope.version(b));
}

#[test]
fn test_clear_unknown_name_is_noop() {
    let mut scope = UniformScope::new();
    scope.clear("missing");
    assert!(scope.is_empty());
}

// ===== KINDS =====

#[test]
fn test_kind_from_active_uniform() {
    assert_eq!(UniformKind::from_active(ActiveUniformType::FloatVec3, 1), Some(UniformKind::Vec3));
    assert_eq!(UniformKind::from_active(ActiveUniformType::FloatVec4, 8), Some(UniformKind::Vec4Array));
    assert_eq!(UniformKind::from_active(ActiveUniformType::Bool, 4), Some(UniformKind::IntArray));
    assert_eq!(UniformKind::from_active(ActiveUniformType::Sampler2D, 1), None);
    assert_eq!(UniformKind::from_active(ActiveUniformType::FloatMat3, 2), None);
}

#[test]
fn test_commit_table_matches_kind_order() {
    assert_eq!(COMMIT_FUNCTIONS.len(), UniformKind::COUNT);
    assert_eq!(UniformKind::Mat4Array.index(), UniformKind::COUNT - 1);
}

// ===== COMMIT =====

#[test]
fn test_commit_vectors_and_matrices() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let location = UniformLocation(3);

    commit_uniform(&mut context, UniformKind::Vec3, location, &UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)));
    commit_uniform(&mut context, UniformKind::Mat4, location, &UniformValue::Mat4(Mat4::IDENTITY));
    commit_uniform(&mut context, UniformKind::Bool, location, &UniformValue::Bool(true));
    commit_uniform(&mut context, UniformKind::UVec2, location, &UniformValue::UVec2(UVec2::new(4, 5)));

    let state = state.borrow();
    assert_eq!(state.count_exact("uniform_f32(3, 3, [1.0, 2.0, 3.0])"), 1);
    assert_eq!(state.count_exact("uniform_matrix_f32(3, 4, 16)"), 1);
    assert_eq!(state.count_exact("uniform_i32(3, 1, [1])"), 1);
    assert_eq!(state.count_exact("uniform_u32(3, 2, [4, 5])"), 1);
}

#[test]
fn test_commit_arrays_flatten() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);

    commit_uniform(
        &mut context,
        UniformKind::Vec2Array,
        UniformLocation(1),
        &UniformValue::Vec2Array(vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]),
    );
    commit_uniform(&mut context, UniformKind::Mat4Array, UniformLocation(2), &UniformValue::Mat4Array(vec![Mat4::IDENTITY; 3]));

    let state = state.borrow();
    assert_eq!(state.count_exact("uniform_f32(1, 2, [1.0, 2.0, 3.0, 4.0])"), 1);
    assert_eq!(state.count_exact("uniform_matrix_f32(2, 4, 48)"), 1);
}

#[test]
fn test_commit_mismatched_value_is_skipped() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    commit_uniform(&mut context, UniformKind::Vec4, UniformLocation(0), &UniformValue::Int(1));
    assert!(state.borrow().calls.is_empty());
}

#[test]
fn test_matrix_is_column_major() {
    let matrix = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
    let value = UniformValue::Mat4(matrix);
    let data = value.floats().unwrap();
    assert_eq!(&data[12..15], &[7.0, 8.0, 9.0]);
    assert_eq!(data, &matrix.to_cols_array()[..]);
}
