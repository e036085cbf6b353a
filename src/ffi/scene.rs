//! ### English
//! Scene and event-thread callback tables supplied by the embedder.
//!
//! ### 中文
//! 宿主提供的场景回调表与事件线程回调表。

use std::ffi::c_void;
use std::sync::Arc;

use crate::engine::bridge::{EventLoopWaker, EventThreadBridge, TriggerPolicy};
use crate::engine::controller::Notifications;
use crate::engine::error::GraphicsError;
use crate::engine::scene::{KeepUpdating, RenderStatus, SceneCore, UpdateStatus, UpdateTiming};

type SceneContextFn = unsafe extern "C" fn(*mut c_void);
/// ### English
/// `void update(void* user_data, float elapsed_seconds, uint64_t last_vsync_ms,
/// uint64_t next_vsync_ms, XianUpdateStatus* out)`.
///
/// ### 中文
/// `void update(void* user_data, float elapsed_seconds, uint64_t last_vsync_ms,
/// uint64_t next_vsync_ms, XianUpdateStatus* out)`。
type SceneUpdateFn = unsafe extern "C" fn(*mut c_void, f32, u64, u64, *mut XianUpdateStatus);
type SceneRenderFn = unsafe extern "C" fn(*mut c_void, bool, *mut XianRenderStatus);
type EventFn = unsafe extern "C" fn(*mut c_void);

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
/// ### English
/// Output of the embedder's `update` callback.
///
/// ### 中文
/// 宿主 `update` 回调的输出。
pub struct XianUpdateStatus {
    /// ### English
    /// Bitmask of keep-updating reasons (see `KeepUpdating`); unknown bits are ignored.
    ///
    /// ### 中文
    /// 继续 update 原因的位掩码（见 `KeepUpdating`）；未知位会被忽略。
    pub keep_updating: u32,
    pub needs_notification: bool,
    pub surface_rect_changed: bool,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
/// ### English
/// Output of the embedder's `render` callback.
///
/// ### 中文
/// 宿主 `render` 回调的输出。
pub struct XianRenderStatus {
    pub needs_update: bool,
    pub needs_post_render: bool,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
/// ### English
/// Scene callbacks run on the render thread with the GL context current.
///
/// `update` and `render` are required; `context_created` / `context_destroyed` may be 0.
///
/// ### 中文
/// 在渲染线程、GL 上下文 current 时执行的场景回调。
///
/// `update` 与 `render` 为必填；`context_created` / `context_destroyed` 可以为 0。
pub struct XianSceneCallbacks {
    pub user_data: usize,
    pub context_created: usize,
    pub context_destroyed: usize,
    pub update: usize,
    pub render: usize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
/// ### English
/// Optional event-thread callbacks. Every field may be 0.
///
/// `wake_event_loop` may be called from any thread; it should make the embedder's event loop
/// call `xian_render_loop_process_events` soon. The `on_*` callbacks run inside
/// `xian_render_loop_process_events`.
///
/// ### 中文
/// 可选的事件线程回调，每个字段都可以为 0。
///
/// `wake_event_loop` 可能在任意线程调用，宿主应尽快让事件循环调用
/// `xian_render_loop_process_events`。`on_*` 回调在 `xian_render_loop_process_events` 内执行。
pub struct XianEventCallbacks {
    pub user_data: usize,
    pub on_core_events: usize,
    pub on_idle: usize,
    pub on_post_render: usize,
    pub wake_event_loop: usize,
}

/// ### English
/// `SceneCore` implemented by calling back into the embedder.
///
/// ### 中文
/// 通过回调宿主实现的 `SceneCore`。
pub(super) struct FfiScene {
    user_data: usize,
    context_created: Option<SceneContextFn>,
    context_destroyed: Option<SceneContextFn>,
    update: SceneUpdateFn,
    render: SceneRenderFn,
}

impl FfiScene {
    /// ### English
    /// Validates the callback table.
    ///
    /// # Safety
    /// Every non-zero address must point to a function with the documented signature, callable
    /// from the render thread.
    ///
    /// ### 中文
    /// 校验回调表。
    ///
    /// # Safety
    /// 所有非 0 地址都必须指向签名与文档一致、且可在渲染线程调用的函数。
    pub(super) unsafe fn load(table: XianSceneCallbacks) -> Result<Self, GraphicsError> {
        if table.update == 0 {
            return Err(GraphicsError::MissingSymbol("update"));
        }
        if table.render == 0 {
            return Err(GraphicsError::MissingSymbol("render"));
        }
        Ok(Self {
            user_data: table.user_data,
            context_created: unsafe { optional_fn(table.context_created) },
            context_destroyed: unsafe { optional_fn(table.context_destroyed) },
            update: unsafe { std::mem::transmute::<usize, SceneUpdateFn>(table.update) },
            render: unsafe { std::mem::transmute::<usize, SceneRenderFn>(table.render) },
        })
    }
}

/// ### English
/// Converts a possibly-zero address into an optional `void(void*)` function pointer.
///
/// # Safety
/// A non-zero `address` must point to a function with that signature.
///
/// ### 中文
/// 将可能为 0 的地址转换为可选的 `void(void*)` 函数指针。
///
/// # Safety
/// 非 0 的 `address` 必须指向该签名的函数。
unsafe fn optional_fn(address: usize) -> Option<EventFn> {
    (address != 0).then(|| unsafe { std::mem::transmute::<usize, EventFn>(address) })
}

impl SceneCore for FfiScene {
    fn context_created(&mut self) {
        if let Some(callback) = self.context_created {
            unsafe { callback(self.user_data as *mut c_void) };
        }
    }

    fn context_destroyed(&mut self) {
        if let Some(callback) = self.context_destroyed {
            unsafe { callback(self.user_data as *mut c_void) };
        }
    }

    fn update(&mut self, timing: UpdateTiming) -> UpdateStatus {
        let mut out = XianUpdateStatus::default();
        unsafe {
            (self.update)(
                self.user_data as *mut c_void,
                timing.elapsed_seconds,
                timing.last_vsync_ms,
                timing.next_vsync_ms,
                &mut out,
            )
        };
        UpdateStatus {
            keep_updating: KeepUpdating::from_bits_truncate(out.keep_updating),
            needs_notification: out.needs_notification,
            surface_rect_changed: out.surface_rect_changed,
        }
    }

    fn render(&mut self, force_clear: bool) -> RenderStatus {
        let mut out = XianRenderStatus::default();
        unsafe { (self.render)(self.user_data as *mut c_void, force_clear, &mut out) };
        RenderStatus {
            needs_update: out.needs_update,
            needs_post_render: out.needs_post_render,
        }
    }
}

/// ### English
/// Builds the cross-thread waker from `wake_event_loop`, if provided.
///
/// # Safety
/// A non-zero `wake_event_loop` must be a `void(void*)` function callable from any thread.
///
/// ### 中文
/// 根据 `wake_event_loop`（若提供）构建跨线程唤醒器。
///
/// # Safety
/// 非 0 的 `wake_event_loop` 必须是可在任意线程调用的 `void(void*)` 函数。
pub(super) unsafe fn event_loop_waker(events: &XianEventCallbacks) -> Option<EventLoopWaker> {
    let wake = unsafe { optional_fn(events.wake_event_loop) }?;
    let user_data = events.user_data;
    Some(Arc::new(move || unsafe { wake(user_data as *mut c_void) }))
}

/// ### English
/// Registers the `on_*` callbacks as bridge triggers and returns the matching notifications.
///
/// # Safety
/// Every non-zero `on_*` address must be a `void(void*)` function.
///
/// ### 中文
/// 将 `on_*` 回调注册为 bridge 触发器，并返回对应的通知集合。
///
/// # Safety
/// 所有非 0 的 `on_*` 地址都必须是 `void(void*)` 函数。
pub(super) unsafe fn install_event_callbacks(
    bridge: &mut EventThreadBridge,
    events: &XianEventCallbacks,
) -> Notifications {
    let user_data = events.user_data;
    let mut register = |address: usize| {
        let callback = unsafe { optional_fn(address) }?;
        Some(bridge.add_trigger(TriggerPolicy::KeepAlive, move || unsafe {
            callback(user_data as *mut c_void)
        }))
    };
    Notifications {
        core_events: register(events.on_core_events),
        idle: register(events.on_idle),
        post_render: register(events.on_post_render),
    }
}
