use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use serial_test::serial;

use super::*;
use crate::capabilities::PlatformInfo;
use crate::log::{self, LogEntry, LogSeverity, Logger};
use crate::native::mock_context::{MockContext, MockHandle};
use crate::native::{ApiGeneration, BufferUsage, DataType};
use crate::resource::{DeviceId, VertexElement, VertexFormat, VertexSemantic};

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn setup() -> (MockContext, MockHandle, Capabilities) {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());
    state.borrow_mut().clear_calls();
    (context, state, caps)
}

fn buffer(context: &mut MockContext, elements: Vec<VertexElement>, instancing: bool) -> VertexBuffer {
    let mut buffer = VertexBuffer::new(VertexFormat::new(elements, instancing), 3, BufferUsage::Static, None);
    buffer.initialize(context, DeviceId::next(), 1).unwrap();
    buffer
}

fn positions(context: &mut MockContext) -> VertexBuffer {
    buffer(context, vec![VertexElement::new(VertexSemantic::Position, 3, DataType::Float32)], false)
}

#[test]
fn test_fingerprint_same_buffers_same_key() {
    let (mut context, _state, _caps) = setup();
    let a = positions(&mut context);
    let b = buffer(&mut context, vec![VertexElement::new(VertexSemantic::Normal, 3, DataType::Float32)], false);

    assert_eq!(fingerprint(&[&a, &b]), fingerprint(&[&a, &b]));
    assert_ne!(fingerprint(&[&a, &b]), fingerprint(&[&b, &a]));
}

#[test]
fn test_fingerprint_includes_layout_hash() {
    let (mut context, _state, _caps) = setup();
    let a = positions(&mut context);

    assert_eq!(fingerprint(&[&a]), vec![(a.id(), a.format().layout_hash())]);
}

#[test]
fn test_cache_hit_and_miss() {
    let (mut context, _state, caps) = setup();
    let a = positions(&mut context);
    let b = buffer(&mut context, vec![VertexElement::new(VertexSemantic::TexCoord(0), 2, DataType::Float32)], false);
    let mut cache = VertexArrayCache::new();

    let key = fingerprint(&[&a, &b]);
    let vertex_array = create_vertex_array(&mut context, &caps, &[&a, &b]).unwrap();
    cache.insert(key.clone(), vertex_array);

    assert_eq!(cache.get(&fingerprint(&[&a, &b])), Some(vertex_array));
    assert_eq!(cache.get(&fingerprint(&[&b, &a])), None);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_create_vertex_array_call_sequence() {
    let (mut context, state, caps) = setup();
    let a = buffer(
        &mut context,
        vec![
            VertexElement::new(VertexSemantic::Position, 3, DataType::Float32),
            VertexElement::new(VertexSemantic::BlendIndices, 4, DataType::UInt8).integer(),
        ],
        false,
    );
    state.borrow_mut().clear_calls();

    let vertex_array = create_vertex_array(&mut context, &caps, &[&a]).unwrap();

    let handle = a.native_handle().unwrap().0;
    let expected = vec![
        "create_vertex_array".to_string(),
        format!("bind_vertex_array(Some({}))", vertex_array.0),
        "bind_buffer(ElementArray, None)".to_string(),
        format!("bind_buffer(Array, Some({}))", handle),
        "vertex_attrib_pointer(0, 3, Float32, false, 16, 0)".to_string(),
        "enable_vertex_attrib_array(0)".to_string(),
        "vertex_attrib_i_pointer(3, 4, UInt8, 16, 12)".to_string(),
        "enable_vertex_attrib_array(3)".to_string(),
        "bind_vertex_array(None)".to_string(),
        "bind_buffer(Array, None)".to_string(),
    ];
    assert_eq!(state.borrow().calls, expected);
}

#[test]
fn test_instanced_format_sets_divisor() {
    let (mut context, state, caps) = setup();
    let instances = buffer(&mut context, vec![VertexElement::new(VertexSemantic::Attr(14), 4, DataType::Float32)], true);
    let a = positions(&mut context);

    create_vertex_array(&mut context, &caps, &[&a, &instances]).unwrap();

    let state = state.borrow();
    assert_eq!(state.count_exact("vertex_attrib_divisor(14, 1)"), 1);
    assert_eq!(state.count("vertex_attrib_divisor"), 1);
}

#[test]
fn test_destroy_deletes_entries() {
    let (mut context, state, _caps) = setup();
    let mut cache = VertexArrayCache::new();
    let a = positions(&mut context);
    cache.insert(fingerprint(&[&a]), NativeVertexArray(NonZeroU32::new(40).unwrap()));

    cache.destroy(&mut context);

    assert!(cache.is_empty());
    assert_eq!(state.borrow().count_exact("delete_vertex_array(40)"), 1);
}

#[test]
#[serial]
fn test_warns_without_location_zero() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    log::set_logger(CaptureLogger { entries: entries.clone() });

    let (mut context, _state, caps) = setup();
    let normals = buffer(&mut context, vec![VertexElement::new(VertexSemantic::Normal, 3, DataType::Float32)], false);
    create_vertex_array(&mut context, &caps, &[&normals]).unwrap();
    let with_position = positions(&mut context);
    create_vertex_array(&mut context, &caps, &[&with_position]).unwrap();

    log::reset_logger();
    let warnings = entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.severity == LogSeverity::Warn && e.message.contains("location 0"))
        .count();
    assert_eq!(warnings, if cfg!(debug_assertions) { 1 } else { 0 });
}
