/// ### English
/// Dedicated update/render thread: owns the graphics context and produces frames.
///
/// ### 中文
/// 独立的 update/render 线程：持有图形上下文并产出帧。
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;

use crate::engine::config::RenderLoopOptions;
use crate::engine::error::{ControllerError, GraphicsError};
use crate::engine::graphics::{GraphicsBackend, SurfaceHandle, same_surface};
use crate::engine::scene::{SceneCore, UpdateTiming};
use crate::engine::stats::{FpsTracker, FrameTimeStamp, FrameTimeStats, UpdateStatusLogger};
use crate::engine::sync::Reply;
use crate::engine::vsync::VSyncSource;

use super::Notifications;
use super::pacing::{FramePacer, PacedFrame};
use super::state::{ResizeRequest, Shared, SharedState, SurfaceRequest};

/// ### English
/// Everything moved into the render thread at `initialize()`.
///
/// ### 中文
/// 在 `initialize()` 时移交给渲染线程的全部对象。
pub(crate) struct ThreadParts {
    pub(crate) scene: Box<dyn SceneCore>,
    pub(crate) backend: Box<dyn GraphicsBackend>,
    pub(crate) notifications: Notifications,
}

/// ### English
/// What one loop iteration decided to render.
///
/// ### 中文
/// 一次循环迭代决定渲染的内容。
struct FramePlan {
    surface: SurfaceHandle,
    force_clear: bool,
    use_elapsed_after_wait: bool,
    continuous: bool,
    paced: Option<PacedFrame>,
}

struct RenderThread {
    shared: Arc<Shared>,
    vsync: Arc<dyn VSyncSource>,
    scene: Box<dyn SceneCore>,
    backend: Box<dyn GraphicsBackend>,
    notifications: Notifications,
    surface: Option<SurfaceHandle>,
    pacer: FramePacer,
    stats: FrameTimeStats,
    fps: FpsTracker,
    status_logger: UpdateStatusLogger,
    epoch: Instant,
    last_frame: Option<Instant>,
    /// ### English
    /// The scene asked for another update after the last frame.
    ///
    /// ### 中文
    /// 上一帧之后场景请求继续 update。
    update_required: bool,
    /// ### English
    /// The thread slept on the condition variable since the last rendered frame.
    ///
    /// ### 中文
    /// 自上一次渲染以来线程曾在条件变量上睡眠。
    waited_since_frame: bool,
    frame_number: u32,
}

/// ### English
/// Marks the thread as gone and abandons pending requests, even when the loop unwinds.
///
/// ### 中文
/// 将线程标记为已退出并放弃待处理请求（即使循环 unwind 也会执行）。
struct ExitGuard {
    shared: Arc<Shared>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.thread_alive = false;
        state.sleeping = false;
        state.post_rendering = false;
        let request = state.surface_request.take();
        let resize = state.resize_request.take();
        drop(state);
        drop(request);
        drop(resize);
        self.shared.cond.notify_all();
    }
}

/// ### English
/// Render thread entry function. Returns after `stop()` or an initialization failure.
///
/// #### Parameters
/// - `shared`: Mutex/condvar pair shared with the controller.
/// - `vsync`: VSync source pacing continuous rendering.
/// - `parts`: Scene, backend and notifications owned by this thread.
/// - `options`: Diagnostics options.
/// - `init`: Answered once graphics initialization finished (or failed).
///
/// ### 中文
/// 渲染线程入口函数；在 `stop()` 或初始化失败后返回。
///
/// #### 参数
/// - `shared`：与控制器共享的互斥锁/条件变量对。
/// - `vsync`：为连续渲染提供节奏的 VSync 源。
/// - `parts`：本线程持有的场景、后端与通知。
/// - `options`：诊断相关选项。
/// - `init`：图形初始化完成（或失败）后应答。
pub(crate) fn run_render_thread(
    shared: Arc<Shared>,
    vsync: Arc<dyn VSyncSource>,
    parts: ThreadParts,
    options: RenderLoopOptions,
    init: Reply<()>,
) {
    let _exit = ExitGuard {
        shared: shared.clone(),
    };
    let surface = shared.state.lock().current_surface.clone();

    let mut thread = RenderThread {
        shared,
        vsync,
        scene: parts.scene,
        backend: parts.backend,
        notifications: parts.notifications,
        surface,
        pacer: FramePacer::new(),
        stats: FrameTimeStats::new(),
        fps: FpsTracker::new(options.fps_tracking_seconds),
        status_logger: UpdateStatusLogger::new(options.update_status_frequency),
        epoch: Instant::now(),
        last_frame: None,
        update_required: false,
        waited_since_frame: false,
        frame_number: 0,
    };

    if let Err(err) = thread.initialize_graphics() {
        log::error!("render thread initialization failed: {err}");
        thread.backend.shutdown();
        init.send(Err(ControllerError::Graphics(err)));
        return;
    }

    thread.shared.state.lock().thread_alive = true;
    init.send(Ok(()));
    log::debug!("render thread started");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| thread.run_loop()));
    match outcome {
        Ok(()) => thread.shutdown_graphics(),
        Err(_) => {
            log::error!("render thread panicked; graphics context abandoned");
            thread.backend.make_context_null();
        }
    }
    log::debug!("render thread exited");
}

impl RenderThread {
    fn initialize_graphics(&mut self) -> Result<(), GraphicsError> {
        if let Err(err) = self.vsync.initialize() {
            log::warn!("vsync initialization failed ({err}); using fixed-interval pacing");
        }
        self.backend.initialize()?;

        if let Some(surface) = self.surface.clone() {
            self.backend.create_surface(&surface)?;
            self.backend.make_current(&surface)?;
        }
        self.scene.context_created();
        self.backend.make_context_null();
        Ok(())
    }

    fn shutdown_graphics(&mut self) {
        if let Some(surface) = self.surface.clone() {
            if let Err(err) = self.backend.make_current(&surface) {
                log::warn!("make_current before shutdown failed: {err}");
            }
        }
        self.scene.context_destroyed();
        self.backend.make_context_null();
        if let Some(surface) = self.surface.take() {
            self.backend.destroy_surface(&surface);
        }
        self.backend.shutdown();
    }

    /// ### English
    /// Whether a frame should be produced right now, given the shared state.
    ///
    /// ### 中文
    /// 根据共享状态判断当前是否应当产出一帧。
    fn frame_due(&self, state: &SharedState) -> bool {
        if self.surface.is_none() || state.post_rendering {
            return false;
        }
        state.update_once_requested
            || (state.is_continuous() && (state.update_requested || self.update_required))
    }

    fn run_loop(&mut self) {
        loop {
            /// ### English
            /// 1) Sleep until there is something to do.
            ///
            /// ### 中文
            /// 1) 睡眠直到有事可做。
            let mut state = self.shared.state.lock();
            let mut waited = false;
            while !state.destroy && !state.has_surface_work() && !self.frame_due(&state) {
                if !waited {
                    waited = true;
                    state.sleeping = true;
                    if let Some(idle) = &self.notifications.idle {
                        MutexGuard::unlocked(&mut state, || idle.trigger());
                        continue;
                    }
                }
                self.shared.cond.wait(&mut state);
            }
            state.sleeping = false;
            if state.destroy {
                return;
            }
            if waited {
                self.waited_since_frame = true;
                self.pacer.reset(state.refresh_rate);
            }

            /// ### English
            /// 2) Surface replacement/deletion/resize, acknowledged before any further frame.
            ///
            /// ### 中文
            /// 2) surface 替换/删除/resize：在继续出帧之前完成并应答。
            if state.has_surface_work() {
                let request = state.surface_request.take();
                let resize = state.resize_request.take();
                drop(state);
                // Callers queued behind this request wait for the slot to free up.
                self.shared.cond.notify_all();
                if waited {
                    self.vsync.resynchronize();
                }
                if let Some(request) = request {
                    self.handle_surface_request(request);
                }
                if let Some(resize) = resize {
                    self.handle_resize(resize);
                }
                continue;
            }

            let continuous = state.is_continuous();
            let refresh_rate = state.refresh_rate;
            drop(state);
            if waited {
                self.vsync.resynchronize();
            }

            /// ### English
            /// 3) Pace continuous frames to VSync; a render-once frame while paused goes now.
            ///
            /// ### 中文
            /// 3) 连续模式的帧按 VSync 节奏；暂停时的 render-once 帧立即执行。
            let paced = if continuous {
                match self.pacer.wait(self.vsync.as_ref(), refresh_rate) {
                    Some(paced) => Some(paced),
                    None => continue,
                }
            } else {
                None
            };

            /// ### English
            /// 4) Re-check under lock, then copy out and clear the request flags.
            ///
            /// ### 中文
            /// 4) 持锁重新检查，然后拷贝并清除请求标记。
            let mut state = self.shared.state.lock();
            if state.destroy {
                return;
            }
            if state.has_surface_work() || !self.frame_due(&state) {
                continue;
            }
            let Some(surface) = self.surface.clone() else {
                continue;
            };
            let plan = FramePlan {
                surface,
                force_clear: std::mem::take(&mut state.force_clear),
                use_elapsed_after_wait: std::mem::take(&mut state.use_elapsed_after_wait),
                continuous: state.is_continuous(),
                paced,
            };
            state.update_requested = false;
            state.update_once_requested = false;
            let generation = state.pre_render_generation;
            let pre_render = state.pre_render.take().map(|callback| (callback, generation));
            drop(state);

            /// ### English
            /// 5) One update + render pass with the context current.
            ///
            /// ### 中文
            /// 5) 在上下文 current 的情况下执行一次 update + render。
            self.render_frame(plan, pre_render);
        }
    }

    fn render_frame(
        &mut self,
        plan: FramePlan,
        pre_render: Option<(super::PreRenderCallback, u64)>,
    ) {
        if let Err(err) = self.backend.make_current(&plan.surface) {
            log::warn!("frame skipped: {err}");
            self.restore_pre_render(pre_render);
            return;
        }

        let pre_render = pre_render
            .and_then(|(mut callback, generation)| callback().then_some((callback, generation)));
        self.restore_pre_render(pre_render);

        let now = Instant::now();
        let interval = self.vsync.frame_interval();
        let since_last_frame = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        let elapsed_seconds = if self.waited_since_frame {
            if plan.use_elapsed_after_wait {
                since_last_frame.as_secs_f32()
            } else {
                0.0
            }
        } else {
            let ticks = plan.paced.map_or(1, |paced| paced.ticks);
            interval.as_secs_f32() * ticks as f32
        };

        let last_vsync_ms = match plan.paced {
            Some(paced) => paced.tick.as_millis(),
            None => self.epoch.elapsed().as_millis() as u64,
        };
        let timing = UpdateTiming {
            elapsed_seconds,
            last_vsync_ms,
            next_vsync_ms: last_vsync_ms + interval.as_millis() as u64,
        };

        self.frame_number = match plan.paced {
            Some(paced) => paced.tick.frame_number,
            None => self.frame_number.wrapping_add(1),
        };
        self.stats
            .start_time(FrameTimeStamp::new(self.frame_number, self.micros_now()));

        let update = self.scene.update(timing);
        if update.needs_notification
            && let Some(core_events) = &self.notifications.core_events
        {
            core_events.trigger();
        }
        self.status_logger.log(update.keep_updating);

        let render = self.scene.render(plan.force_clear);
        if render.needs_post_render
            && let Err(err) = self.backend.present(&plan.surface)
        {
            log::warn!("present failed: {err}");
        }
        self.stats
            .end_time(FrameTimeStamp::new(self.frame_number, self.micros_now()));

        if let Err(err) = self.backend.take_error() {
            log::warn!("GL error during frame {}: {err}", self.frame_number);
        }

        self.update_required = !update.keep_updating.is_empty() || render.needs_update;
        if plan.continuous && !self.waited_since_frame {
            self.fps.track(since_last_frame.as_secs_f32());
        }
        self.last_frame = Some(now);
        self.waited_since_frame = false;

        let post_render_sync = render.needs_post_render && plan.surface.requires_post_render_sync();
        if post_render_sync {
            self.backend.wait_client();
        }
        self.backend.make_context_null();

        let mut state = self.shared.state.lock();
        state.stats = self.stats.snapshot();
        state.frames_rendered += 1;
        if post_render_sync {
            state.post_rendering = true;
            if let Some(post_render) = &self.notifications.post_render {
                MutexGuard::unlocked(&mut state, || post_render.trigger());
            }
            while state.post_rendering && !state.destroy && !state.has_surface_work() {
                self.shared.cond.wait(&mut state);
            }
            state.post_rendering = false;
        }
    }

    /// ### English
    /// Puts the callback back unless `set_pre_render_callback` ran while it was taken out.
    ///
    /// ### 中文
    /// 将回调放回；若取出期间调用过 `set_pre_render_callback` 则丢弃。
    fn restore_pre_render(&self, taken: Option<(super::PreRenderCallback, u64)>) {
        let Some((callback, generation)) = taken else {
            return;
        };
        let mut state = self.shared.state.lock();
        if state.pre_render_generation == generation {
            state.pre_render = Some(callback);
        }
    }

    fn micros_now(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    fn handle_surface_request(&mut self, request: SurfaceRequest) {
        match request {
            SurfaceRequest::Replace { surface, reply } => {
                let result = self.replace_surface(&surface);
                let mut state = self.shared.state.lock();
                state.current_surface = self.surface.clone();
                if result.is_ok() {
                    state.update_requested = true;
                }
                drop(state);
                reply.send(result.map_err(ControllerError::from));
            }
            SurfaceRequest::Delete { surface, reply } => {
                self.delete_surface(&surface);
                self.shared.state.lock().current_surface = self.surface.clone();
                reply.send(Ok(()));
            }
        }
    }

    /// ### English
    /// Releases and destroys the old surface, then creates and binds the new one.
    /// The old surface is never touched again once this returns.
    ///
    /// ### 中文
    /// 释放并销毁旧 surface，然后创建并绑定新 surface。
    /// 本函数返回后不会再访问旧 surface。
    fn replace_surface(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError> {
        self.backend.make_context_null();
        if let Some(old) = self.surface.take() {
            self.backend.destroy_surface(&old);
        }
        self.backend.create_surface(surface)?;
        self.backend.make_current(surface)?;
        self.surface = Some(surface.clone());
        self.backend.make_context_null();
        log::debug!("surface replaced");
        Ok(())
    }

    fn delete_surface(&mut self, surface: &SurfaceHandle) {
        self.backend.make_context_null();
        if let Some(current) = &self.surface
            && same_surface(current, surface)
        {
            self.surface = None;
            log::debug!("current surface deleted; rendering suspended until a new surface");
        }
        self.backend.destroy_surface(surface);
    }

    fn handle_resize(&mut self, resize: ResizeRequest) {
        let result = match &self.surface {
            Some(surface) => self.backend.resize_surface(surface, resize.size),
            None => Ok(()),
        };
        if let Err(err) = &result {
            log::warn!("surface resize failed: {err}");
        } else {
            let mut state = self.shared.state.lock();
            state.update_requested = true;
            state.force_clear = true;
        }
        if let Some(reply) = resize.reply {
            reply.send(result.map_err(ControllerError::from));
        }
    }
}
