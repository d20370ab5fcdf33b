use std::task::Poll;
use std::time::Duration;

use crate::device::{ContextSource, DeviceOptions, GraphicsDevice};
use crate::native::mock_context::{MockContext, MockHandle};
use crate::native::{ApiGeneration, ClearFlags};
use crate::state::ClearOptions;

fn device(generation: ApiGeneration) -> (GraphicsDevice, MockHandle) {
    let (context, state) = MockContext::new(generation);
    let device = GraphicsDevice::new(DeviceOptions::default(), ContextSource::External(Box::new(context))).unwrap();
    state.borrow_mut().clear_calls();
    (device, state)
}

#[test]
fn test_modern_readback_waits_for_fence() {
    let (mut device, state) = device(ApiGeneration::Modern);

    let mut readback = device.read_pixels_async(0, 0, 2, 2);
    assert!(readback.is_pending());
    assert_eq!(state.borrow().count_exact("buffer_storage(PixelPack, 16, Stream)"), 1);
    assert_eq!(state.borrow().count("flush"), 1);

    assert_eq!(readback.poll(&mut device), Poll::Pending);
    assert_eq!(readback.poll(&mut device), Poll::Pending);
    assert_eq!(readback.poll(&mut device), Poll::Ready(Some(vec![7; 16])));
    assert_eq!(readback.poll(&mut device), Poll::Ready(None));

    let state = state.borrow();
    assert_eq!(state.count("delete_sync"), 1);
    assert_eq!(state.count("delete_buffer"), 1);
    assert_eq!(state.count("read_pixels"), 0);
}

#[test]
fn test_legacy_readback_is_immediate() {
    let (mut device, _state) = device(ApiGeneration::Legacy);
    device.clear(&ClearOptions { color: [1.0, 0.0, 0.0, 1.0], flags: ClearFlags::COLOR, ..ClearOptions::default() });

    let mut readback = device.read_pixels_async(0, 0, 1, 1);

    assert!(!readback.is_pending());
    assert_eq!(readback.poll(&mut device), Poll::Ready(Some(vec![255, 0, 0, 255])));
}

#[test]
fn test_readback_abandoned_on_context_loss() {
    let (mut device, state) = device(ApiGeneration::Modern);
    let mut readback = device.read_pixels_async(0, 0, 4, 4);

    device.debug_lose_context(Duration::ZERO);
    device.pump();

    assert_eq!(readback.poll(&mut device), Poll::Ready(None));
    assert_eq!(state.borrow().count("client_wait_sync"), 0);
}

#[test]
fn test_failed_fence_releases_buffer() {
    let (mut device, state) = device(ApiGeneration::Modern);
    let mut readback = device.read_pixels_async(0, 0, 4, 4);

    state.borrow_mut().lost = true;

    assert_eq!(readback.poll(&mut device), Poll::Ready(None));
    assert_eq!(state.borrow().count("delete_buffer"), 1);
    assert!(!readback.is_pending());
}
