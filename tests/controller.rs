//! Lifecycle and frame scheduling of `CombinedUpdateRenderController`.

#[allow(dead_code)]
mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use common::{Harness, SceneProbe, TIMEOUT, wait_until};
use dpi::PhysicalSize;
use xian_render_loop::{
    CombinedUpdateRenderController, ControllerError, ControllerState, ExternalVSync,
    NativeWindowSurface, ThreadController, TimerVSync,
};

fn controller_with(
    harness: &Harness,
    vsync: Arc<dyn xian_render_loop::VSyncSource>,
) -> CombinedUpdateRenderController {
    CombinedUpdateRenderController::builder(harness.scene(), harness.backend())
        .vsync(vsync)
        .surface(NativeWindowSurface::new(1, PhysicalSize::new(64, 64), false))
        .build()
}

fn settle(controller: &CombinedUpdateRenderController) {
    assert!(wait_until(|| controller.is_render_thread_sleeping()));
}

#[test]
fn every_external_vsync_tick_renders_one_frame() {
    let harness = Harness::new(SceneProbe::continuous());
    let vsync = Arc::new(ExternalVSync::new());
    let controller = controller_with(&harness, vsync.clone());
    controller.initialize().unwrap();
    controller.start();

    for _ in 0..100 {
        let frame = vsync.tick();
        assert!(vsync.wait_consumed(frame, TIMEOUT));
    }
    assert!(wait_until(|| controller.frames_rendered() == 100));
    assert_eq!(harness.scene.renders(), 100);

    controller.stop();
    assert_eq!(controller.state(), ControllerState::Stopped);
    assert_eq!(harness.backend.violations(), 0);
}

#[test]
fn render_once_while_paused_renders_exactly_once() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let controller = controller_with(&harness, Arc::new(TimerVSync::new(Duration::from_millis(1))));
    controller.initialize().unwrap();
    controller.start();
    assert!(wait_until(|| controller.frames_rendered() >= 1));
    controller.pause();
    settle(&controller);

    let before = controller.frames_rendered();
    controller.request_update_once();
    assert!(wait_until(|| controller.frames_rendered() == before + 1));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.frames_rendered(), before + 1);
    assert_eq!(controller.state(), ControllerState::Paused);
}

#[test]
fn request_update_before_pickup_coalesces() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let vsync = Arc::new(ExternalVSync::new());
    let controller = controller_with(&harness, vsync.clone());
    controller.initialize().unwrap();
    controller.start();
    let frame = vsync.tick();
    assert!(vsync.wait_consumed(frame, TIMEOUT));
    assert!(wait_until(|| controller.frames_rendered() == 1));
    settle(&controller);

    for _ in 0..10 {
        controller.request_update();
    }
    let frame = vsync.tick();
    assert!(vsync.wait_consumed(frame, TIMEOUT));
    assert!(wait_until(|| controller.frames_rendered() == 2));
    settle(&controller);

    for _ in 0..3 {
        vsync.tick();
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.frames_rendered(), 2);
}

#[test]
fn refresh_rate_throttles_renders() {
    let harness = Harness::new(SceneProbe::continuous());
    let vsync = Arc::new(ExternalVSync::new());
    let controller = controller_with(&harness, vsync.clone());
    controller.set_render_refresh_rate(2);
    assert_eq!(controller.render_refresh_rate(), 2);
    controller.initialize().unwrap();
    controller.start();

    for _ in 0..20 {
        let frame = vsync.tick();
        assert!(vsync.wait_consumed(frame, TIMEOUT));
    }
    assert!(wait_until(|| controller.frames_rendered() >= 9));
    thread::sleep(Duration::from_millis(20));
    assert!(controller.frames_rendered().abs_diff(10) <= 1);

    controller.set_render_refresh_rate(0);
    assert_eq!(controller.render_refresh_rate(), 1);
}

#[test]
fn lifecycle_calls_are_idempotent() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let controller = controller_with(&harness, Arc::new(TimerVSync::default()));

    controller.stop();
    controller.start();
    assert_eq!(controller.state(), ControllerState::Uninitialized);

    controller.initialize().unwrap();
    assert!(matches!(
        controller.initialize(),
        Err(ControllerError::AlreadyInitialized)
    ));
    assert_eq!(harness.scene.contexts_created.load(Ordering::SeqCst), 1);

    controller.start();
    controller.start();
    assert_eq!(controller.state(), ControllerState::Running);
    controller.pause();
    controller.pause();
    assert_eq!(controller.state(), ControllerState::Paused);
    controller.resume();
    controller.resume();
    assert_eq!(controller.state(), ControllerState::Running);

    controller.stop();
    controller.stop();
    assert_eq!(controller.state(), ControllerState::Stopped);
    assert_eq!(harness.scene.contexts_destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(harness.backend.shutdowns.load(Ordering::SeqCst), 1);

    controller.start();
    controller.request_update();
    assert_eq!(controller.state(), ControllerState::Stopped);
}

#[test]
fn stop_interrupts_a_long_vsync_wait() {
    let harness = Harness::new(SceneProbe::continuous());
    let controller = controller_with(&harness, Arc::new(TimerVSync::new(Duration::from_secs(10))));
    controller.initialize().unwrap();
    controller.start();
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    controller.stop();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn graphics_failure_is_reported_by_initialize() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    harness.backend.fail_initialize.store(true, Ordering::SeqCst);
    let controller = controller_with(&harness, Arc::new(TimerVSync::default()));

    let result = controller.initialize();
    assert!(matches!(result, Err(ControllerError::Graphics(_))));
    assert_eq!(controller.state(), ControllerState::Stopped);
    assert_eq!(harness.scene.contexts_created.load(Ordering::SeqCst), 0);

    controller.start();
    assert_eq!(controller.state(), ControllerState::Stopped);
}

#[test]
fn resume_forces_a_full_clear() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let controller = controller_with(&harness, Arc::new(TimerVSync::new(Duration::from_millis(1))));
    controller.initialize().unwrap();
    controller.start();
    assert!(wait_until(|| controller.frames_rendered() == 1));
    settle(&controller);
    assert_eq!(harness.scene.force_clears.load(Ordering::SeqCst), 0);

    controller.pause();
    controller.resume();
    assert!(wait_until(|| controller.frames_rendered() == 2));
    assert_eq!(harness.scene.force_clears.load(Ordering::SeqCst), 1);
}

#[test]
fn pre_render_callback_is_dropped_after_returning_false() {
    let harness = Harness::new(SceneProbe::continuous());
    let controller = controller_with(&harness, Arc::new(TimerVSync::new(Duration::from_millis(1))));
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    controller.set_pre_render_callback(Some(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    })));
    controller.initialize().unwrap();
    controller.start();

    assert!(wait_until(|| controller.frames_rendered() >= 3));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn clearing_the_pre_render_callback_while_it_runs_sticks() {
    let harness = Harness::new(SceneProbe::continuous());
    let controller = controller_with(&harness, Arc::new(TimerVSync::new(Duration::from_millis(1))));
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    controller.set_pre_render_callback(Some(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        true
    })));
    controller.initialize().unwrap();
    controller.start();

    assert!(wait_until(|| calls.load(Ordering::SeqCst) == 1));
    controller.set_pre_render_callback(None);
    let frames = controller.frames_rendered();
    assert!(wait_until(|| controller.frames_rendered() >= frames + 5));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn frame_time_stats_are_published() {
    let harness = Harness::new(SceneProbe::continuous());
    let controller = controller_with(&harness, Arc::new(TimerVSync::new(Duration::from_millis(1))));
    controller.initialize().unwrap();
    controller.start();
    assert!(wait_until(|| controller.frames_rendered() >= 5));
    controller.pause();
    settle(&controller);

    let stats = controller.frame_time_stats();
    assert!(stats.run_count >= 5);
    assert!(stats.min_seconds <= stats.max_seconds);
    assert!(stats.total_seconds >= stats.max_seconds);
}
