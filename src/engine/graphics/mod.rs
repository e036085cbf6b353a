/// ### English
/// Graphics backend boundary used by the render thread.
///
/// The controller only talks to `GraphicsBackend`; GLES/EGL and Vulkan backends are
/// interchangeable behind it.
///
/// ### 中文
/// 渲染线程使用的图形后端边界。
///
/// 控制器只与 `GraphicsBackend` 交互；GLES/EGL 与 Vulkan 后端可以在其后互换。
mod egl;
mod gles;
mod surface;

use dpi::PhysicalSize;

pub use egl::EmbedderEglApi;
pub use gles::GlesBackend;
pub use surface::{NativeWindowSurface, RenderSurface, SurfaceHandle, same_surface};

use crate::engine::error::GraphicsError;

/// ### English
/// Closed set of graphics APIs a backend can drive.
///
/// ### 中文
/// 后端可驱动的图形 API 的封闭集合。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphicsApi {
    Gles,
    Vulkan,
}

/// ### English
/// Graphics context owned by the render thread.
///
/// Every method is called on the render thread, except that the backend is constructed on the
/// event thread and moved over before `initialize`.
///
/// ### 中文
/// 由渲染线程持有的图形上下文。
///
/// 除了在事件线程构造并在 `initialize` 之前移交之外，所有方法都在渲染线程调用。
pub trait GraphicsBackend: Send {
    fn api(&self) -> GraphicsApi;

    /// ### English
    /// Creates the device/context. Failure aborts `initialize()` of the controller.
    ///
    /// ### 中文
    /// 创建设备/上下文；失败会使控制器的 `initialize()` 失败。
    fn initialize(&mut self) -> Result<(), GraphicsError>;

    fn shutdown(&mut self);

    fn create_surface(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError>;

    fn destroy_surface(&mut self, surface: &SurfaceHandle);

    fn resize_surface(
        &mut self,
        surface: &SurfaceHandle,
        size: PhysicalSize<u32>,
    ) -> Result<(), GraphicsError>;

    fn make_current(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError>;

    fn make_context_null(&mut self);

    /// ### English
    /// Swaps/presents the buffers of `surface`.
    ///
    /// ### 中文
    /// 对 `surface` 执行 swap/present。
    fn present(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError>;

    /// ### English
    /// Blocks until the client API finished all submitted work.
    ///
    /// ### 中文
    /// 阻塞直到客户端 API 完成所有已提交的工作。
    fn wait_client(&mut self);

    /// ### English
    /// Reports a pending API error raised during the frame, if any.
    ///
    /// ### 中文
    /// 报告本帧期间产生的 API 错误（若有）。
    fn take_error(&mut self) -> Result<(), GraphicsError> {
        Ok(())
    }
}
