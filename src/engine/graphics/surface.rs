use std::sync::Arc;

use dpi::PhysicalSize;
use parking_lot::Mutex;

/// ### English
/// An OS-level drawable (window, pixmap or native buffer) the backend renders into.
///
/// The event thread creates and owns the object; the render thread only makes it current.
///
/// ### 中文
/// 后端渲染的目标：操作系统层面的可绘制对象（窗口、pixmap 或原生缓冲）。
///
/// 由事件线程创建并持有；渲染线程只负责将其设为 current。
pub trait RenderSurface: Send + Sync {
    fn size(&self) -> PhysicalSize<u32>;

    /// ### English
    /// Native window handle as an address (`0` when not applicable).
    ///
    /// ### 中文
    /// 以地址表示的原生窗口句柄（不适用时为 `0`）。
    fn native_window(&self) -> usize {
        0
    }

    /// ### English
    /// Whether the render thread must wait for `post_render_complete()` after each present.
    ///
    /// ### 中文
    /// 每次 present 后渲染线程是否必须等待 `post_render_complete()`。
    fn requires_post_render_sync(&self) -> bool {
        false
    }
}

pub type SurfaceHandle = Arc<dyn RenderSurface>;

/// ### English
/// Identity comparison of two surface handles (same object, not same contents).
///
/// ### 中文
/// 比较两个 surface 句柄是否为同一对象（而非内容相同）。
#[inline]
pub fn same_surface(a: &SurfaceHandle, b: &SurfaceHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// ### English
/// Surface backed by an embedder-provided native window handle.
///
/// ### 中文
/// 由宿主提供的原生窗口句柄支撑的 surface。
pub struct NativeWindowSurface {
    window: usize,
    size: Mutex<PhysicalSize<u32>>,
    post_render_sync: bool,
}

impl NativeWindowSurface {
    /// ### English
    /// Wraps a native window. Zero dimensions are clamped to 1.
    ///
    /// #### Parameters
    /// - `window`: Native window handle address.
    /// - `size`: Initial drawable size in pixels.
    /// - `post_render_sync`: See `RenderSurface::requires_post_render_sync`.
    ///
    /// ### 中文
    /// 包装一个原生窗口；尺寸为 0 时钳制为 1。
    ///
    /// #### 参数
    /// - `window`：原生窗口句柄地址。
    /// - `size`：初始可绘制尺寸（像素）。
    /// - `post_render_sync`：见 `RenderSurface::requires_post_render_sync`。
    pub fn new(window: usize, size: PhysicalSize<u32>, post_render_sync: bool) -> Arc<Self> {
        Arc::new(Self {
            window,
            size: Mutex::new(clamp_size(size)),
            post_render_sync,
        })
    }

    pub fn set_size(&self, size: PhysicalSize<u32>) {
        *self.size.lock() = clamp_size(size);
    }
}

impl RenderSurface for NativeWindowSurface {
    fn size(&self) -> PhysicalSize<u32> {
        *self.size.lock()
    }

    fn native_window(&self) -> usize {
        self.window
    }

    fn requires_post_render_sync(&self) -> bool {
        self.post_render_sync
    }
}

#[inline]
pub(crate) fn clamp_size(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.max(1), size.height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_not_contents() {
        let a: SurfaceHandle = NativeWindowSurface::new(1, PhysicalSize::new(4, 4), false);
        let b: SurfaceHandle = NativeWindowSurface::new(1, PhysicalSize::new(4, 4), false);
        assert!(same_surface(&a, &a.clone()));
        assert!(!same_surface(&a, &b));
    }

    #[test]
    fn zero_size_is_clamped() {
        let surface = NativeWindowSurface::new(7, PhysicalSize::new(0, 0), true);
        assert_eq!(surface.size(), PhysicalSize::new(1, 1));
        surface.set_size(PhysicalSize::new(640, 0));
        assert_eq!(surface.size(), PhysicalSize::new(640, 1));
        assert!(surface.requires_post_render_sync());
        assert_eq!(surface.native_window(), 7);
    }
}
