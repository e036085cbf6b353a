//! ### English
//! C ABI surface for `xian_render_loop`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Function tables are passed as raw addresses (`usize`) and validated before use.
//! Every `xian_render_loop_*` call except `xian_render_loop_vsync_tick` must come from the
//! embedder's event thread (the thread that created the handle).
//!
//! ### 中文
//! `xian_render_loop` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 函数表以原始地址（`usize`）传入，使用前会先校验。
//! 除 `xian_render_loop_vsync_tick` 外，所有 `xian_render_loop_*` 调用都必须来自宿主的事件线程
//! （即创建句柄的线程）。
mod abi;
mod render_loop;
mod scene;
mod surface;

use std::sync::Arc;

use crate::engine::bridge::EventThreadBridge;
use crate::engine::controller::CombinedUpdateRenderController;
use crate::engine::graphics::NativeWindowSurface;
use crate::engine::vsync::ExternalVSync;

pub use scene::{XianEventCallbacks, XianSceneCallbacks};

/// ### English
/// Opaque render loop handle owning the update/render thread.
///
/// ### 中文
/// 不透明的渲染循环句柄，持有 update/render 线程。
pub struct XianRenderLoop {
    /// ### English
    /// Declared first so the render thread is joined before the bridge goes away.
    ///
    /// ### 中文
    /// 最先声明，保证在 bridge 释放之前 join 渲染线程。
    controller: CombinedUpdateRenderController,
    bridge: EventThreadBridge,
    /// ### English
    /// Set when created with `XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC`.
    ///
    /// ### 中文
    /// 以 `XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC` 创建时存在。
    external_vsync: Option<Arc<ExternalVSync>>,
    surface: Option<Arc<NativeWindowSurface>>,
    post_render_sync: bool,
}

/// ### English
/// C ABI version for `xian_render_loop`.
///
/// ### 中文
/// `xian_render_loop` 的 C ABI 版本号。
const XIAN_RENDER_LOOP_ABI_VERSION: u32 = 1;

/// ### English
/// Borrows the handle behind a raw pointer, or `None` for NULL.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by `xian_render_loop_create`.
///
/// ### 中文
/// 借用裸指针背后的句柄；NULL 时返回 `None`。
///
/// # Safety
/// `handle` 必须为 NULL，或是由 `xian_render_loop_create` 返回且仍然有效的指针。
#[inline]
unsafe fn handle_mut<'a>(handle: *mut XianRenderLoop) -> Option<&'a mut XianRenderLoop> {
    unsafe { handle.as_mut() }
}

#[cfg(test)]
mod tests {
    use std::ffi::{c_char, c_int, c_void};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::render_loop::*;
    use super::scene::{XianRenderStatus, XianUpdateStatus};
    use super::surface::*;
    use super::*;
    use crate::engine::flags::XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC;
    use crate::engine::graphics::EmbedderEglApi;

    unsafe extern "C" fn egl_ok(_: *mut c_void) -> c_int {
        0
    }
    unsafe extern "C" fn egl_void(_: *mut c_void) {}
    unsafe extern "C" fn egl_create_surface(_: *mut c_void, window: usize, _: u32, _: u32) -> usize {
        window
    }
    unsafe extern "C" fn egl_destroy_surface(_: *mut c_void, _: usize) {}
    unsafe extern "C" fn egl_resize_surface(_: *mut c_void, _: usize, _: u32, _: u32) -> c_int {
        0
    }
    unsafe extern "C" fn egl_with_surface(_: *mut c_void, _: usize) -> c_int {
        0
    }
    unsafe extern "C" fn egl_get_proc_address(_: *mut c_void, _: *const c_char) -> *const c_void {
        std::ptr::null()
    }

    unsafe extern "C" fn scene_update(
        _: *mut c_void,
        _: f32,
        _: u64,
        _: u64,
        out: *mut XianUpdateStatus,
    ) {
        unsafe { (*out).keep_updating = 0 };
    }
    unsafe extern "C" fn scene_render(user_data: *mut c_void, _: bool, out: *mut XianRenderStatus) {
        let renders = unsafe { &*(user_data as *const AtomicU32) };
        renders.fetch_add(1, Ordering::SeqCst);
        unsafe { (*out).needs_post_render = true };
    }
    unsafe extern "C" fn on_idle(user_data: *mut c_void) {
        let idles = unsafe { &*(user_data as *const AtomicU32) };
        idles.fetch_add(1, Ordering::SeqCst);
    }

    fn egl_api() -> EmbedderEglApi {
        EmbedderEglApi {
            user_data: 0,
            initialize: egl_ok as usize,
            terminate: egl_void as usize,
            create_surface: egl_create_surface as usize,
            destroy_surface: egl_destroy_surface as usize,
            resize_surface: egl_resize_surface as usize,
            make_current: egl_with_surface as usize,
            make_context_null: egl_void as usize,
            swap_buffers: egl_with_surface as usize,
            get_proc_address: egl_get_proc_address as usize,
        }
    }

    fn wait_for(counter: &AtomicU32, mut poll: impl FnMut()) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) == 0 {
            if Instant::now() > deadline {
                return false;
            }
            poll();
            thread::sleep(Duration::from_millis(2));
        }
        true
    }

    #[test]
    fn abi_version_is_stable() {
        assert_eq!(abi::xian_render_loop_abi_version(), XIAN_RENDER_LOOP_ABI_VERSION);
    }

    #[test]
    fn create_rejects_missing_tables() {
        let api = egl_api();
        let handle = unsafe {
            xian_render_loop_create(&api, std::ptr::null(), std::ptr::null(), 1, 8, 8, 0)
        };
        assert!(handle.is_null());

        let scene = XianSceneCallbacks {
            update: scene_update as usize,
            ..XianSceneCallbacks::default()
        };
        let handle =
            unsafe { xian_render_loop_create(&api, &scene, std::ptr::null(), 1, 8, 8, 0) };
        assert!(handle.is_null());
    }

    #[test]
    fn external_vsync_drives_frames_and_idle_reaches_event_thread() {
        let renders = AtomicU32::new(0);
        let idles = AtomicU32::new(0);
        let api = egl_api();
        let scene = XianSceneCallbacks {
            user_data: &renders as *const AtomicU32 as usize,
            update: scene_update as usize,
            render: scene_render as usize,
            ..XianSceneCallbacks::default()
        };
        let events = XianEventCallbacks {
            user_data: &idles as *const AtomicU32 as usize,
            on_idle: on_idle as usize,
            ..XianEventCallbacks::default()
        };

        let handle = unsafe {
            xian_render_loop_create(
                &api,
                &scene,
                &events,
                0x10,
                64,
                64,
                XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC,
            )
        };
        assert!(!handle.is_null());
        unsafe {
            assert!(xian_render_loop_initialize(handle));
            assert!(!xian_render_loop_initialize(handle));
        }

        assert!(wait_for(&idles, || unsafe {
            xian_render_loop_process_events(handle);
        }));

        unsafe { xian_render_loop_start(handle) };
        assert!(wait_for(&renders, || unsafe {
            xian_render_loop_vsync_tick(handle);
        }));

        unsafe {
            assert!(xian_render_loop_replace_surface(handle, 0x20, 32, 32));
            xian_render_loop_resize_surface(handle, 16, 16);
            assert!(xian_render_loop_delete_surface(handle));
            xian_render_loop_stop(handle);
            xian_render_loop_stop(handle);
            xian_render_loop_destroy(handle);
        }
    }
}
