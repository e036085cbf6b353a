//! ### English
//! Controller running update and render on one dedicated thread.
//!
//! ### 中文
//! 在同一独立线程上执行 update 与渲染的控制器。

use std::sync::Arc;
use std::thread;

use dpi::PhysicalSize;
use parking_lot::Mutex;

use crate::engine::config::RenderLoopOptions;
use crate::engine::error::ControllerError;
use crate::engine::graphics::{GraphicsBackend, SurfaceHandle, same_surface};
use crate::engine::scene::SceneCore;
use crate::engine::stats::FrameTimeSnapshot;
use crate::engine::sync::Reply;
use crate::engine::vsync::{TimerVSync, VSyncSource};

use super::render_thread::{ThreadParts, run_render_thread};
use super::state::{ControllerState, PreRenderCallback, ResizeRequest, Shared, SurfaceRequest};
use super::{Notifications, ThreadController};

/// ### English
/// Builder for `CombinedUpdateRenderController`.
///
/// ### 中文
/// `CombinedUpdateRenderController` 的构建器。
pub struct ControllerBuilder {
    scene: Box<dyn SceneCore>,
    backend: Box<dyn GraphicsBackend>,
    vsync: Option<Arc<dyn VSyncSource>>,
    surface: Option<SurfaceHandle>,
    options: RenderLoopOptions,
    notifications: Notifications,
}

impl ControllerBuilder {
    pub fn new(scene: impl SceneCore + 'static, backend: impl GraphicsBackend + 'static) -> Self {
        Self::from_boxed(Box::new(scene), Box::new(backend))
    }

    pub fn from_boxed(scene: Box<dyn SceneCore>, backend: Box<dyn GraphicsBackend>) -> Self {
        Self {
            scene,
            backend,
            vsync: None,
            surface: None,
            options: RenderLoopOptions::default(),
            notifications: Notifications::default(),
        }
    }

    /// ### English
    /// VSync source used for continuous rendering (default: `TimerVSync` at 60 Hz).
    ///
    /// ### 中文
    /// 连续渲染使用的 VSync 源（默认：60 Hz 的 `TimerVSync`）。
    pub fn vsync(mut self, vsync: Arc<dyn VSyncSource>) -> Self {
        self.vsync = Some(vsync);
        self
    }

    /// ### English
    /// Surface bound when the render thread starts.
    ///
    /// ### 中文
    /// 渲染线程启动时绑定的 surface。
    pub fn surface(mut self, surface: SurfaceHandle) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn options(mut self, options: RenderLoopOptions) -> Self {
        self.options = options;
        self
    }

    pub fn notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn build(self) -> CombinedUpdateRenderController {
        let options = self.options.normalized();
        let vsync = self
            .vsync
            .unwrap_or_else(|| Arc::new(TimerVSync::default()));
        CombinedUpdateRenderController {
            shared: Arc::new(Shared::new(self.surface, options.render_refresh_rate)),
            vsync,
            options,
            parts: Mutex::new(Some(ThreadParts {
                scene: self.scene,
                backend: self.backend,
                notifications: self.notifications,
            })),
            thread: Mutex::new(None),
        }
    }
}

/// ### English
/// Drives one update/render thread.
///
/// All shared flags live behind a single mutex; the condition variable next to it is the only
/// way the render thread is woken. None of the methods perform GPU work themselves.
///
/// ### 中文
/// 驱动一个 update/render 线程。
///
/// 所有共享标记都位于同一把互斥锁之后；与之配套的条件变量是唤醒渲染线程的唯一方式。
/// 这些方法本身都不执行 GPU 工作。
pub struct CombinedUpdateRenderController {
    shared: Arc<Shared>,
    vsync: Arc<dyn VSyncSource>,
    options: RenderLoopOptions,
    /// ### English
    /// Scene/backend waiting to be moved into the render thread by `initialize()`.
    ///
    /// ### 中文
    /// 等待 `initialize()` 移交给渲染线程的场景/后端。
    parts: Mutex<Option<ThreadParts>>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CombinedUpdateRenderController {
    pub fn builder(
        scene: impl SceneCore + 'static,
        backend: impl GraphicsBackend + 'static,
    ) -> ControllerBuilder {
        ControllerBuilder::new(scene, backend)
    }

    /// ### English
    /// Latest frame-time statistics published by the render thread.
    ///
    /// ### 中文
    /// 渲染线程最近发布的帧时间统计。
    pub fn frame_time_stats(&self) -> FrameTimeSnapshot {
        self.shared.state.lock().stats
    }

    /// ### English
    /// Number of update + render passes performed so far.
    ///
    /// ### 中文
    /// 迄今为止执行的 update + render 次数。
    pub fn frames_rendered(&self) -> u64 {
        self.shared.state.lock().frames_rendered
    }

    /// ### English
    /// Whether the render thread is blocked waiting for work.
    ///
    /// ### 中文
    /// 渲染线程是否正阻塞等待工作。
    pub fn is_render_thread_sleeping(&self) -> bool {
        self.shared.state.lock().sleeping
    }

    pub fn render_refresh_rate(&self) -> u32 {
        self.shared.state.lock().refresh_rate
    }

    pub fn current_surface(&self) -> Option<SurfaceHandle> {
        self.shared.state.lock().current_surface.clone()
    }

    /// ### English
    /// Same as `resize_surface`, but blocks until the render thread applied the new size.
    ///
    /// ### 中文
    /// 与 `resize_surface` 相同，但会阻塞直到渲染线程应用了新尺寸。
    pub fn resize_surface_and_wait(&self, size: PhysicalSize<u32>) -> Result<(), ControllerError> {
        let (reply, handshake) = Reply::pair();
        {
            let mut state = self.shared.state.lock();
            if !state.thread_alive {
                return Ok(());
            }
            let merge = matches!(&state.resize_request, Some(pending) if pending.reply.is_none());
            if merge {
                if let Some(pending) = state.resize_request.as_mut() {
                    pending.size = size;
                    pending.reply = Some(reply);
                }
            } else {
                while state.resize_request.is_some() && state.thread_alive {
                    self.shared.cond.wait(&mut state);
                }
                if !state.thread_alive {
                    return Ok(());
                }
                state.resize_request = Some(ResizeRequest {
                    size,
                    reply: Some(reply),
                });
            }
        }
        self.shared.cond.notify_all();
        self.vsync.interrupt();
        handshake.wait()
    }

    /// ### English
    /// Queues a replace/delete request and blocks until the render thread answers it.
    /// Returns `None` if no render thread is alive to answer.
    ///
    /// ### 中文
    /// 排队一个替换/删除请求并阻塞直到渲染线程应答；
    /// 若没有存活的渲染线程可应答则返回 `None`。
    fn submit_surface_request(
        &self,
        make: impl FnOnce(Reply<()>) -> SurfaceRequest,
    ) -> Option<Result<(), ControllerError>> {
        let (reply, handshake) = Reply::pair();
        {
            let mut state = self.shared.state.lock();
            while state.surface_request.is_some() && state.thread_alive {
                self.shared.cond.wait(&mut state);
            }
            if !state.thread_alive {
                return None;
            }
            state.surface_request = Some(make(reply));
        }
        self.shared.cond.notify_all();
        self.vsync.interrupt();
        Some(handshake.wait())
    }

    fn is_render_thread(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == thread::current().id())
    }
}

impl ThreadController for CombinedUpdateRenderController {
    fn initialize(&self) -> Result<(), ControllerError> {
        if self.shared.state.lock().lifecycle != ControllerState::Uninitialized {
            log::warn!("initialize() called twice");
            return Err(ControllerError::AlreadyInitialized);
        }
        let Some(parts) = self.parts.lock().take() else {
            return Err(ControllerError::AlreadyInitialized);
        };

        let (init, handshake) = Reply::pair();
        let shared = self.shared.clone();
        let vsync = self.vsync.clone();
        let options = self.options.clone();
        let handle = thread::Builder::new()
            .name(self.options.thread_name.clone())
            .spawn(move || run_render_thread(shared, vsync, parts, options, init))
            .map_err(ControllerError::ThreadSpawn)?;

        match handshake.wait_timeout(self.options.init_timeout) {
            Some(Ok(())) => {
                self.shared.state.lock().lifecycle = ControllerState::Initialized;
                *self.thread.lock() = Some(handle);
                log::debug!("controller initialized");
                Ok(())
            }
            Some(Err(err)) => {
                let _ = handle.join();
                self.shared.state.lock().lifecycle = ControllerState::Stopped;
                Err(err)
            }
            None => {
                self.shared.state.lock().destroy = true;
                self.shared.cond.notify_all();
                self.vsync.interrupt();
                let _ = handle.join();
                self.shared.state.lock().lifecycle = ControllerState::Stopped;
                Err(ControllerError::InitializeTimeout)
            }
        }
    }

    fn start(&self) {
        let mut state = self.shared.state.lock();
        match state.lifecycle {
            ControllerState::Initialized | ControllerState::Paused => {
                state.lifecycle = ControllerState::Running;
                state.update_requested = true;
                drop(state);
                self.shared.cond.notify_all();
                log::debug!("controller running");
            }
            ControllerState::Running => {}
            other => log::warn!("start() ignored in state {other:?}"),
        }
    }

    fn pause(&self) {
        let mut state = self.shared.state.lock();
        match state.lifecycle {
            ControllerState::Running => {
                state.lifecycle = ControllerState::Paused;
                drop(state);
                self.shared.cond.notify_all();
                log::debug!("controller paused");
            }
            ControllerState::Paused => {}
            other => log::debug!("pause() ignored in state {other:?}"),
        }
    }

    fn resume(&self) {
        let mut state = self.shared.state.lock();
        match state.lifecycle {
            ControllerState::Paused => {
                state.lifecycle = ControllerState::Running;
                state.update_requested = true;
                state.force_clear = true;
                state.use_elapsed_after_wait = true;
                drop(state);
                self.shared.cond.notify_all();
                log::debug!("controller resumed");
            }
            ControllerState::Running => {}
            other => log::debug!("resume() ignored in state {other:?}"),
        }
    }

    fn stop(&self) {
        let mut state = self.shared.state.lock();
        match state.lifecycle {
            ControllerState::Stopped => return,
            ControllerState::Uninitialized => {
                log::debug!("stop() before initialize() ignored");
                return;
            }
            _ => {}
        }
        state.lifecycle = ControllerState::Stopped;
        state.destroy = true;
        drop(state);
        self.shared.cond.notify_all();
        self.vsync.interrupt();

        if self.is_render_thread() {
            log::warn!("stop() called from the render thread; not joining");
            return;
        }
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        log::debug!("controller stopped");
    }

    fn request_update(&self) {
        let mut state = self.shared.state.lock();
        if !state.update_requested {
            state.update_requested = true;
            drop(state);
            self.shared.cond.notify_all();
        }
    }

    fn request_update_once(&self) {
        let mut state = self.shared.state.lock();
        if !state.update_once_requested {
            state.update_once_requested = true;
            drop(state);
            self.shared.cond.notify_all();
        }
    }

    fn replace_surface(&self, surface: SurfaceHandle) -> Result<(), ControllerError> {
        if self.is_render_thread() {
            log::warn!("replace_surface() called from the render thread");
            return Err(ControllerError::CalledFromRenderThread);
        }
        let request = surface.clone();
        match self.submit_surface_request(move |reply| SurfaceRequest::Replace {
            surface: request,
            reply,
        }) {
            Some(result) => result,
            None => {
                self.shared.state.lock().current_surface = Some(surface);
                Ok(())
            }
        }
    }

    fn resize_surface(&self, size: PhysicalSize<u32>) {
        let mut state = self.shared.state.lock();
        if !state.thread_alive {
            return;
        }
        match state.resize_request.as_mut() {
            Some(pending) => pending.size = size,
            None => state.resize_request = Some(ResizeRequest { size, reply: None }),
        }
        drop(state);
        self.shared.cond.notify_all();
    }

    fn delete_surface(&self, surface: &SurfaceHandle) -> Result<(), ControllerError> {
        if self.is_render_thread() {
            log::warn!("delete_surface() called from the render thread");
            return Err(ControllerError::CalledFromRenderThread);
        }
        let request = surface.clone();
        match self.submit_surface_request(move |reply| SurfaceRequest::Delete {
            surface: request,
            reply,
        }) {
            Some(result) => result,
            None => {
                let mut state = self.shared.state.lock();
                if state
                    .current_surface
                    .as_ref()
                    .is_some_and(|current| same_surface(current, surface))
                {
                    state.current_surface = None;
                }
                Ok(())
            }
        }
    }

    fn set_render_refresh_rate(&self, vsyncs_per_render: u32) {
        self.shared.state.lock().refresh_rate = vsyncs_per_render.max(1);
    }

    fn set_pre_render_callback(&self, callback: Option<PreRenderCallback>) {
        let mut state = self.shared.state.lock();
        state.pre_render = callback;
        state.pre_render_generation = state.pre_render_generation.wrapping_add(1);
        drop(state);
        self.shared.cond.notify_all();
    }

    fn post_render_complete(&self) {
        let mut state = self.shared.state.lock();
        if state.post_rendering {
            state.post_rendering = false;
            drop(state);
            self.shared.cond.notify_all();
        }
    }

    fn state(&self) -> ControllerState {
        self.shared.state.lock().lifecycle
    }
}

impl Drop for CombinedUpdateRenderController {
    /// ### English
    /// Ensures the render thread is stopped and joined when the controller is dropped.
    ///
    /// ### 中文
    /// 确保控制器 drop 时渲染线程已停止并 join。
    fn drop(&mut self) {
        self.stop();
    }
}
