//! ### English
//! C ABI bindings for the render loop lifecycle, scheduling and event processing.
//!
//! ### 中文
//! 渲染循环生命周期、调度与事件处理相关的 C ABI 绑定。

use std::sync::Arc;

use dpi::PhysicalSize;

use super::scene::{FfiScene, event_loop_waker, install_event_callbacks};
use super::{XianEventCallbacks, XianRenderLoop, XianSceneCallbacks, handle_mut};
use crate::engine::bridge::EventThreadBridge;
use crate::engine::config::RenderLoopOptions;
use crate::engine::controller::{CombinedUpdateRenderController, ThreadController};
use crate::engine::flags::{
    XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC, XIAN_RENDER_LOOP_FLAG_POST_RENDER_SYNC,
    XIAN_RENDER_LOOP_FLAG_READ_ENVIRONMENT,
};
use crate::engine::graphics::{EmbedderEglApi, GlesBackend, NativeWindowSurface};
use crate::engine::vsync::ExternalVSync;

#[unsafe(no_mangle)]
/// ### English
/// Creates a render loop. The render thread is not started until `xian_render_loop_initialize`.
///
/// `egl_api` and `scene` are required and copied. `events` may be NULL.
/// `native_window` may be 0, in which case nothing renders until
/// `xian_render_loop_replace_surface`. `flags` is a combination of `XIAN_RENDER_LOOP_FLAG_*`.
///
/// Returns NULL if a required table is NULL or incomplete.
///
/// ### 中文
/// 创建渲染循环。渲染线程在 `xian_render_loop_initialize` 之前不会启动。
///
/// `egl_api` 与 `scene` 为必填，会被拷贝；`events` 可以为 NULL。
/// `native_window` 可以为 0，此时在 `xian_render_loop_replace_surface` 之前不会渲染。
/// `flags` 为若干 `XIAN_RENDER_LOOP_FLAG_*` 的组合。
///
/// 必填函数表为 NULL 或不完整时返回 NULL。
pub unsafe extern "C" fn xian_render_loop_create(
    egl_api: *const EmbedderEglApi,
    scene: *const XianSceneCallbacks,
    events: *const XianEventCallbacks,
    native_window: usize,
    width: u32,
    height: u32,
    flags: u32,
) -> *mut XianRenderLoop {
    let (Some(egl_api), Some(scene)) = (unsafe { egl_api.as_ref() }, unsafe { scene.as_ref() })
    else {
        log::error!("xian_render_loop_create: egl_api and scene are required");
        return std::ptr::null_mut();
    };
    let events = unsafe { events.as_ref() }.copied().unwrap_or_default();

    let backend = match unsafe { GlesBackend::new(*egl_api) } {
        Ok(backend) => backend,
        Err(err) => {
            log::error!("xian_render_loop_create: {err}");
            return std::ptr::null_mut();
        }
    };
    let scene = match unsafe { FfiScene::load(*scene) } {
        Ok(scene) => scene,
        Err(err) => {
            log::error!("xian_render_loop_create: scene callbacks: {err}");
            return std::ptr::null_mut();
        }
    };

    let mut bridge = match unsafe { event_loop_waker(&events) } {
        Some(waker) => EventThreadBridge::with_waker(waker),
        None => EventThreadBridge::new(),
    };
    let notifications = unsafe { install_event_callbacks(&mut bridge, &events) };

    let options = if flags & XIAN_RENDER_LOOP_FLAG_READ_ENVIRONMENT != 0 {
        RenderLoopOptions::from_env()
    } else {
        RenderLoopOptions::default()
    };
    let post_render_sync = flags & XIAN_RENDER_LOOP_FLAG_POST_RENDER_SYNC != 0;
    let surface = (native_window != 0).then(|| {
        NativeWindowSurface::new(
            native_window,
            PhysicalSize::new(width, height),
            post_render_sync,
        )
    });

    let mut builder = CombinedUpdateRenderController::builder(scene, backend)
        .options(options)
        .notifications(notifications);
    let external_vsync = (flags & XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC != 0)
        .then(|| Arc::new(ExternalVSync::new()));
    if let Some(vsync) = &external_vsync {
        builder = builder.vsync(vsync.clone());
    }
    if let Some(surface) = &surface {
        builder = builder.surface(surface.clone());
    }

    Box::into_raw(Box::new(XianRenderLoop {
        controller: builder.build(),
        bridge,
        external_vsync,
        surface,
        post_render_sync,
    }))
}

#[unsafe(no_mangle)]
/// ### English
/// Stops the render thread (if running) and frees the handle.
///
/// ### 中文
/// 停止渲染线程（若在运行）并释放句柄。
pub unsafe extern "C" fn xian_render_loop_destroy(handle: *mut XianRenderLoop) {
    if handle.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(handle));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Spawns the render thread and initializes graphics on it. Blocks until ready.
/// Returns false on failure (already initialized, graphics failure or timeout).
///
/// ### 中文
/// 创建渲染线程并在其上初始化图形，阻塞直到就绪。
/// 失败（已初始化、图形失败或超时）时返回 false。
pub unsafe extern "C" fn xian_render_loop_initialize(handle: *mut XianRenderLoop) -> bool {
    let Some(render_loop) = (unsafe { handle_mut(handle) }) else {
        return false;
    };
    match render_loop.controller.initialize() {
        Ok(()) => true,
        Err(err) => {
            log::error!("xian_render_loop_initialize: {err}");
            false
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn xian_render_loop_start(handle: *mut XianRenderLoop) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.start();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn xian_render_loop_pause(handle: *mut XianRenderLoop) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.pause();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn xian_render_loop_resume(handle: *mut XianRenderLoop) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.resume();
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Stops and joins the render thread. The handle stays valid until destroyed.
///
/// ### 中文
/// 停止并 join 渲染线程；句柄在销毁前仍然有效。
pub unsafe extern "C" fn xian_render_loop_stop(handle: *mut XianRenderLoop) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.stop();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn xian_render_loop_request_update(handle: *mut XianRenderLoop) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.request_update();
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Requests exactly one update + render, also while paused.
///
/// ### 中文
/// 请求恰好一次 update + render，暂停时同样有效。
pub unsafe extern "C" fn xian_render_loop_request_update_once(handle: *mut XianRenderLoop) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.request_update_once();
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Renders once every `vsyncs_per_render` VSyncs (`0` is treated as `1`).
///
/// ### 中文
/// 每 `vsyncs_per_render` 个 VSync 渲染一次（`0` 视为 `1`）。
pub unsafe extern "C" fn xian_render_loop_set_render_refresh_rate(
    handle: *mut XianRenderLoop,
    vsyncs_per_render: u32,
) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.set_render_refresh_rate(vsyncs_per_render);
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Signals one vertical blank. Only meaningful with `XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC`;
/// may be called from any thread. Returns the frame number, or 0 without external VSync.
///
/// ### 中文
/// 发出一次垂直消隐信号。仅在使用 `XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC` 时有意义；
/// 可在任意线程调用。返回帧号，未启用外部 VSync 时返回 0。
pub unsafe extern "C" fn xian_render_loop_vsync_tick(handle: *const XianRenderLoop) -> u32 {
    let Some(render_loop) = (unsafe { handle.as_ref() }) else {
        return 0;
    };
    render_loop
        .external_vsync
        .as_ref()
        .map_or(0, |vsync| vsync.tick())
}

#[unsafe(no_mangle)]
/// ### English
/// Answers an `on_post_render` notification; the render thread continues with the next frame.
///
/// ### 中文
/// 应答 `on_post_render` 通知；渲染线程随后继续下一帧。
pub unsafe extern "C" fn xian_render_loop_post_render_complete(handle: *mut XianRenderLoop) {
    if let Some(render_loop) = unsafe { handle_mut(handle) } {
        render_loop.controller.post_render_complete();
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Runs pending event-thread callbacks without blocking. Returns how many ran.
///
/// ### 中文
/// 不阻塞地执行待处理的事件线程回调，返回执行的数量。
pub unsafe extern "C" fn xian_render_loop_process_events(handle: *mut XianRenderLoop) -> u32 {
    let Some(render_loop) = (unsafe { handle_mut(handle) }) else {
        return 0;
    };
    render_loop.bridge.process_pending() as u32
}
