//! Surface replacement, deletion and resize handled on the render thread.

#[allow(dead_code)]
mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use common::{Harness, SceneProbe, wait_until};
use dpi::PhysicalSize;
use xian_render_loop::{
    CombinedUpdateRenderController, NativeWindowSurface, RenderSurface, SurfaceHandle,
    ThreadController, TimerVSync,
};

fn surface(window: usize) -> SurfaceHandle {
    NativeWindowSurface::new(window, PhysicalSize::new(64, 64), false)
}

fn running_controller(harness: &Harness, first: SurfaceHandle) -> CombinedUpdateRenderController {
    let controller = CombinedUpdateRenderController::builder(harness.scene(), harness.backend())
        .vsync(Arc::new(TimerVSync::new(Duration::from_millis(1))))
        .surface(first)
        .build();
    controller.initialize().unwrap();
    controller.start();
    controller
}

#[test]
fn replaced_surface_is_never_used_after_replace_returns() {
    let harness = Harness::new(SceneProbe::continuous());
    let controller = running_controller(&harness, surface(1));

    for window in 2..52 {
        let old = controller.current_surface().unwrap().native_window();
        controller.replace_surface(surface(window)).unwrap();
        assert!(harness.backend.is_destroyed(old));
        thread::sleep(Duration::from_millis(1));
    }
    assert!(wait_until(|| harness.scene.renders() > 0));

    controller.stop();
    assert_eq!(harness.backend.violations(), 0);
}

#[test]
fn deleted_surface_suspends_rendering_until_replaced() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let first = surface(1);
    let controller = running_controller(&harness, first.clone());
    assert!(wait_until(|| controller.frames_rendered() == 1));
    assert!(wait_until(|| controller.is_render_thread_sleeping()));

    controller.delete_surface(&first).unwrap();
    assert!(harness.backend.is_destroyed(1));
    assert!(controller.current_surface().is_none());

    controller.request_update_once();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.frames_rendered(), 1);

    controller.replace_surface(surface(2)).unwrap();
    assert!(wait_until(|| controller.frames_rendered() >= 2));
    assert_eq!(harness.backend.violations(), 0);
}

#[test]
fn resize_and_wait_applies_before_returning() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let controller = running_controller(&harness, surface(1));

    controller
        .resize_surface_and_wait(PhysicalSize::new(320, 200))
        .unwrap();
    assert_eq!(
        harness.backend.resizes.lock().last().copied(),
        Some((1, PhysicalSize::new(320, 200)))
    );

    let frames = controller.frames_rendered();
    controller.resize_surface(PhysicalSize::new(640, 400));
    assert!(wait_until(|| harness.backend.resizes.lock().len() == 2));
    assert!(wait_until(|| controller.frames_rendered() > frames));
}

#[test]
fn surface_calls_without_a_render_thread_only_record_the_surface() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let controller = CombinedUpdateRenderController::builder(harness.scene(), harness.backend())
        .build();
    assert!(controller.current_surface().is_none());

    let window = surface(7);
    controller.replace_surface(window.clone()).unwrap();
    assert_eq!(controller.current_surface().map(|s| s.native_window()), Some(7));
    controller.delete_surface(&window).unwrap();
    assert!(controller.current_surface().is_none());
    assert!(harness.backend.live.lock().is_empty());
}

/// Starts a 300 ms render and returns once the render thread is inside it.
fn begin_slow_render(harness: &Harness, controller: &CombinedUpdateRenderController) {
    assert!(wait_until(|| controller.frames_rendered() == 1));
    assert!(wait_until(|| controller.is_render_thread_sleeping()));
    harness.scene.render_delay_ms.store(300, Ordering::SeqCst);
    let updates = harness.scene.updates();
    controller.request_update_once();
    assert!(wait_until(|| harness.scene.updates() > updates));
}

#[test]
fn overlapping_replacements_are_both_answered() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let controller = running_controller(&harness, surface(1));
    begin_slow_render(&harness, &controller);

    let (first, second) = thread::scope(|scope| {
        let first = scope.spawn(|| controller.replace_surface(surface(2)));
        thread::sleep(Duration::from_millis(30));
        let second = scope.spawn(|| controller.replace_surface(surface(3)));
        (first.join().unwrap(), second.join().unwrap())
    });
    assert!(first.is_ok());
    assert!(second.is_ok());

    let current = controller.current_surface().unwrap().native_window();
    let replaced = if current == 3 { 2 } else { 3 };
    assert!(harness.backend.is_destroyed(1));
    assert!(harness.backend.is_destroyed(replaced));
    assert!(!harness.backend.is_destroyed(current));
    harness.scene.render_delay_ms.store(0, Ordering::SeqCst);
    controller.stop();
    assert_eq!(harness.backend.violations(), 0);
}

#[test]
fn blocking_resize_queues_behind_a_pending_blocking_resize() {
    let harness = Harness::new(Arc::new(SceneProbe::default()));
    let controller = running_controller(&harness, surface(1));
    begin_slow_render(&harness, &controller);

    thread::scope(|scope| {
        let first = scope.spawn(|| controller.resize_surface_and_wait(PhysicalSize::new(100, 100)));
        thread::sleep(Duration::from_millis(30));
        let second =
            scope.spawn(|| controller.resize_surface_and_wait(PhysicalSize::new(200, 200)));
        assert!(first.join().unwrap().is_ok());
        assert!(second.join().unwrap().is_ok());
    });

    let resizes = harness.backend.resizes.lock().clone();
    assert_eq!(
        resizes,
        vec![
            (1, PhysicalSize::new(100, 100)),
            (1, PhysicalSize::new(200, 200)),
        ]
    );
    harness.scene.render_delay_ms.store(0, Ordering::SeqCst);
}
