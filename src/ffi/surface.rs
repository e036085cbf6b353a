//! ### English
//! C ABI bindings for surface replacement, resize and deletion.
//!
//! ### 中文
//! surface 替换、resize 与删除相关的 C ABI 绑定。

use dpi::PhysicalSize;

use super::{XianRenderLoop, handle_mut};
use crate::engine::controller::ThreadController;
use crate::engine::graphics::{NativeWindowSurface, SurfaceHandle};

#[unsafe(no_mangle)]
/// ### English
/// Switches rendering to a new native window. Blocks until the render thread released (and
/// destroyed its EGL surface for) the previous window, so the embedder may free it afterwards.
///
/// Returns false if the handle is NULL, `native_window` is 0, or the new surface could not be
/// created.
///
/// ### 中文
/// 将渲染切换到新的原生窗口。阻塞直到渲染线程释放了旧窗口（并销毁其 EGL surface），
/// 之后宿主即可释放旧窗口。
///
/// 句柄为 NULL、`native_window` 为 0 或新 surface 创建失败时返回 false。
pub unsafe extern "C" fn xian_render_loop_replace_surface(
    handle: *mut XianRenderLoop,
    native_window: usize,
    width: u32,
    height: u32,
) -> bool {
    let Some(render_loop) = (unsafe { handle_mut(handle) }) else {
        return false;
    };
    if native_window == 0 {
        return false;
    }

    let surface = NativeWindowSurface::new(
        native_window,
        PhysicalSize::new(width, height),
        render_loop.post_render_sync,
    );
    match render_loop.controller.replace_surface(surface.clone()) {
        Ok(()) => {
            render_loop.surface = Some(surface);
            true
        }
        Err(err) => {
            log::error!("xian_render_loop_replace_surface: {err}");
            render_loop.surface = None;
            false
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Reports a new size for the current window; applied before the next render. Does not block.
///
/// ### 中文
/// 报告当前窗口的新尺寸，在下一次渲染前生效；不阻塞。
pub unsafe extern "C" fn xian_render_loop_resize_surface(
    handle: *mut XianRenderLoop,
    width: u32,
    height: u32,
) {
    let Some(render_loop) = (unsafe { handle_mut(handle) }) else {
        return;
    };
    let Some(surface) = &render_loop.surface else {
        return;
    };
    let size = PhysicalSize::new(width, height);
    surface.set_size(size);
    render_loop.controller.resize_surface(size);
}

#[unsafe(no_mangle)]
/// ### English
/// Releases the current window on the render thread and blocks until done. Rendering is
/// suspended until `xian_render_loop_replace_surface`.
///
/// ### 中文
/// 在渲染线程释放当前窗口并阻塞直到完成；在 `xian_render_loop_replace_surface`
/// 之前渲染会被挂起。
pub unsafe extern "C" fn xian_render_loop_delete_surface(handle: *mut XianRenderLoop) -> bool {
    let Some(render_loop) = (unsafe { handle_mut(handle) }) else {
        return false;
    };
    let Some(surface) = render_loop.surface.take() else {
        return true;
    };
    let surface: SurfaceHandle = surface;
    match render_loop.controller.delete_surface(&surface) {
        Ok(()) => true,
        Err(err) => {
            log::error!("xian_render_loop_delete_surface: {err}");
            false
        }
    }
}
