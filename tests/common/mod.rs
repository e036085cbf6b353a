//! Scene and backend doubles shared by the controller tests.
//!
//! Both report into `Arc`-shared probes so the test thread can observe what the render thread
//! did without touching the controller internals.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use dpi::PhysicalSize;
use parking_lot::Mutex;
use xian_render_loop::{
    GraphicsApi, GraphicsBackend, GraphicsError, KeepUpdating, RenderStatus, RenderSurface,
    SceneCore, SurfaceHandle, UpdateStatus, UpdateTiming,
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Polls `condition` until it holds or `TIMEOUT` expires.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while !condition() {
        if Instant::now() > deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

#[derive(Default)]
pub struct SceneProbe {
    pub keep_updating: AtomicU32,
    pub needs_notification: AtomicBool,
    pub needs_post_render: AtomicBool,
    pub updates: AtomicU64,
    pub renders: AtomicU64,
    pub force_clears: AtomicU64,
    /// Milliseconds each `render` call sleeps for.
    pub render_delay_ms: AtomicU64,
    pub contexts_created: AtomicU32,
    pub contexts_destroyed: AtomicU32,
    pub elapsed: Mutex<Vec<f32>>,
}

impl SceneProbe {
    pub fn continuous() -> Arc<Self> {
        let probe = Arc::new(Self::default());
        probe
            .keep_updating
            .store(KeepUpdating::ANIMATIONS_RUNNING.bits(), Ordering::SeqCst);
        probe
    }

    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

pub struct MockScene {
    pub probe: Arc<SceneProbe>,
}

impl SceneCore for MockScene {
    fn context_created(&mut self) {
        self.probe.contexts_created.fetch_add(1, Ordering::SeqCst);
    }

    fn context_destroyed(&mut self) {
        self.probe.contexts_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn update(&mut self, timing: UpdateTiming) -> UpdateStatus {
        self.probe.updates.fetch_add(1, Ordering::SeqCst);
        self.probe.elapsed.lock().push(timing.elapsed_seconds);
        UpdateStatus {
            keep_updating: KeepUpdating::from_bits_truncate(
                self.probe.keep_updating.load(Ordering::SeqCst),
            ),
            needs_notification: self.probe.needs_notification.load(Ordering::SeqCst),
            surface_rect_changed: false,
        }
    }

    fn render(&mut self, force_clear: bool) -> RenderStatus {
        if force_clear {
            self.probe.force_clears.fetch_add(1, Ordering::SeqCst);
        }
        let delay = self.probe.render_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.probe.renders.fetch_add(1, Ordering::SeqCst);
        RenderStatus {
            needs_update: false,
            needs_post_render: self.probe.needs_post_render.load(Ordering::SeqCst),
        }
    }
}

/// Records backend calls per native window id and counts every use of a destroyed surface.
#[derive(Default)]
pub struct BackendProbe {
    pub fail_initialize: AtomicBool,
    pub live: Mutex<HashSet<usize>>,
    pub destroyed: Mutex<HashSet<usize>>,
    pub violations: AtomicU32,
    pub presents: AtomicU64,
    pub wait_clients: AtomicU64,
    pub resizes: Mutex<Vec<(usize, PhysicalSize<u32>)>>,
    pub shutdowns: AtomicU32,
}

impl BackendProbe {
    pub fn is_destroyed(&self, window: usize) -> bool {
        self.destroyed.lock().contains(&window)
    }

    pub fn violations(&self) -> u32 {
        self.violations.load(Ordering::SeqCst)
    }

    fn check(&self, surface: &SurfaceHandle) {
        let window = surface.native_window();
        if !self.live.lock().contains(&window) || self.is_destroyed(window) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct MockBackend {
    pub probe: Arc<BackendProbe>,
}

impl GraphicsBackend for MockBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Gles
    }

    fn initialize(&mut self) -> Result<(), GraphicsError> {
        if self.probe.fail_initialize.load(Ordering::SeqCst) {
            return Err(GraphicsError::ContextCreation("no display".to_string()));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.probe.shutdowns.fetch_add(1, Ordering::SeqCst);
    }

    fn create_surface(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError> {
        self.probe.live.lock().insert(surface.native_window());
        Ok(())
    }

    fn destroy_surface(&mut self, surface: &SurfaceHandle) {
        let window = surface.native_window();
        self.probe.live.lock().remove(&window);
        self.probe.destroyed.lock().insert(window);
    }

    fn resize_surface(
        &mut self,
        surface: &SurfaceHandle,
        size: PhysicalSize<u32>,
    ) -> Result<(), GraphicsError> {
        self.probe.check(surface);
        self.probe
            .resizes
            .lock()
            .push((surface.native_window(), size));
        Ok(())
    }

    fn make_current(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError> {
        self.probe.check(surface);
        Ok(())
    }

    fn make_context_null(&mut self) {}

    fn present(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError> {
        self.probe.check(surface);
        self.probe.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn wait_client(&mut self) {
        self.probe.wait_clients.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub scene: Arc<SceneProbe>,
    pub backend: Arc<BackendProbe>,
}

impl Harness {
    pub fn new(scene: Arc<SceneProbe>) -> Self {
        Self {
            scene,
            backend: Arc::new(BackendProbe::default()),
        }
    }

    pub fn scene(&self) -> MockScene {
        MockScene {
            probe: self.scene.clone(),
        }
    }

    pub fn backend(&self) -> MockBackend {
        MockBackend {
            probe: self.backend.clone(),
        }
    }
}
