use dpi::PhysicalSize;
use parking_lot::{Condvar, Mutex};

use crate::engine::graphics::SurfaceHandle;
use crate::engine::stats::FrameTimeSnapshot;
use crate::engine::sync::Reply;

/// ### English
/// Lifecycle of a controller.
///
/// `Uninitialized → Initialized → {Running ⇄ Paused} → Stopped`.
///
/// ### 中文
/// 控制器的生命周期。
///
/// `Uninitialized → Initialized → {Running ⇄ Paused} → Stopped`。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerState {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Stopped,
}

/// ### English
/// Callback run on the render thread before each render; returning `false` removes it.
///
/// ### 中文
/// 每次渲染前在渲染线程执行的回调；返回 `false` 时将其移除。
pub type PreRenderCallback = Box<dyn FnMut() -> bool + Send>;

pub(crate) enum SurfaceRequest {
    Replace {
        surface: SurfaceHandle,
        reply: Reply<()>,
    },
    Delete {
        surface: SurfaceHandle,
        reply: Reply<()>,
    },
}

pub(crate) struct ResizeRequest {
    pub(crate) size: PhysicalSize<u32>,
    pub(crate) reply: Option<Reply<()>>,
}

/// ### English
/// Every field shared between the event thread and the render thread.
/// Only ever accessed with `Shared::state` locked.
///
/// ### 中文
/// 事件线程与渲染线程共享的全部字段。
/// 只能在持有 `Shared::state` 锁时访问。
pub(crate) struct SharedState {
    pub(crate) lifecycle: ControllerState,
    pub(crate) update_requested: bool,
    pub(crate) update_once_requested: bool,
    pub(crate) destroy: bool,
    pub(crate) surface_request: Option<SurfaceRequest>,
    pub(crate) resize_request: Option<ResizeRequest>,
    /// ### English
    /// VSyncs per render, always `>= 1`.
    ///
    /// ### 中文
    /// 每次渲染的 VSync 数，始终 `>= 1`。
    pub(crate) refresh_rate: u32,
    /// ### English
    /// The next render must clear the whole surface.
    ///
    /// ### 中文
    /// 下一次渲染必须清除整个 surface。
    pub(crate) force_clear: bool,
    /// ### English
    /// The next frame after a wait advances by wall-clock time (set by `resume`).
    ///
    /// ### 中文
    /// 等待之后的下一帧按真实时间推进（由 `resume` 设置）。
    pub(crate) use_elapsed_after_wait: bool,
    pub(crate) post_rendering: bool,
    pub(crate) pre_render: Option<PreRenderCallback>,
    /// ### English
    /// Bumped by every `set_pre_render_callback`.
    ///
    /// ### 中文
    /// 每次 `set_pre_render_callback` 时递增。
    pub(crate) pre_render_generation: u64,
    /// ### English
    /// The render thread is inside its loop and will answer surface requests.
    ///
    /// ### 中文
    /// 渲染线程正处于循环中，会应答 surface 请求。
    pub(crate) thread_alive: bool,
    pub(crate) sleeping: bool,
    /// ### English
    /// Surface the render thread draws into (or will, once started).
    ///
    /// ### 中文
    /// 渲染线程当前（或启动后）绘制的 surface。
    pub(crate) current_surface: Option<SurfaceHandle>,
    pub(crate) stats: FrameTimeSnapshot,
    pub(crate) frames_rendered: u64,
}

impl SharedState {
    pub(crate) fn new(surface: Option<SurfaceHandle>, refresh_rate: u32) -> Self {
        Self {
            lifecycle: ControllerState::Uninitialized,
            update_requested: false,
            update_once_requested: false,
            destroy: false,
            surface_request: None,
            resize_request: None,
            refresh_rate: refresh_rate.max(1),
            force_clear: false,
            use_elapsed_after_wait: false,
            post_rendering: false,
            pre_render: None,
            pre_render_generation: 0,
            thread_alive: false,
            sleeping: false,
            current_surface: surface,
            stats: FrameTimeSnapshot::default(),
            frames_rendered: 0,
        }
    }

    #[inline]
    pub(crate) fn is_continuous(&self) -> bool {
        self.lifecycle == ControllerState::Running
    }

    #[inline]
    pub(crate) fn has_surface_work(&self) -> bool {
        self.surface_request.is_some() || self.resize_request.is_some()
    }
}

/// ### English
/// The single mutex + condition variable pair coordinating both threads.
///
/// ### 中文
/// 协调两个线程的唯一互斥锁 + 条件变量对。
pub(crate) struct Shared {
    pub(crate) state: Mutex<SharedState>,
    pub(crate) cond: Condvar,
}

impl Shared {
    pub(crate) fn new(surface: Option<SurfaceHandle>, refresh_rate: u32) -> Self {
        Self {
            state: Mutex::new(SharedState::new(surface, refresh_rate)),
            cond: Condvar::new(),
        }
    }
}
