/// ### English
/// Update/render thread controller.
///
/// `CombinedUpdateRenderController` runs scene updates and rendering on one dedicated thread and
/// is driven from the event thread through `ThreadController`.
///
/// ### 中文
/// update/render 线程控制器。
///
/// `CombinedUpdateRenderController` 在一个独立线程上执行场景 update 与渲染，
/// 由事件线程通过 `ThreadController` 驱动。
mod combined;
mod pacing;
mod render_thread;
mod state;

use dpi::PhysicalSize;

pub use combined::{CombinedUpdateRenderController, ControllerBuilder};
pub use state::{ControllerState, PreRenderCallback};

use crate::engine::bridge::TriggerHandle;
use crate::engine::error::ControllerError;
use crate::engine::graphics::SurfaceHandle;

/// ### English
/// Event-thread notifications raised by the render thread.
///
/// ### 中文
/// 渲染线程发往事件线程的通知。
#[derive(Clone, Debug, Default)]
pub struct Notifications {
    /// ### English
    /// The scene queued events that must be processed on the event thread.
    ///
    /// ### 中文
    /// 场景产生了需要在事件线程处理的事件。
    pub core_events: Option<TriggerHandle>,
    /// ### English
    /// The render thread went to sleep because nothing needs updating.
    ///
    /// ### 中文
    /// 渲染线程因无需 update 而进入睡眠。
    pub idle: Option<TriggerHandle>,
    /// ### English
    /// A frame was presented to a surface that needs post-render synchronization; answer with
    /// `post_render_complete()`.
    ///
    /// ### 中文
    /// 一帧已 present 到需要渲染后同步的 surface；请以 `post_render_complete()` 应答。
    pub post_render: Option<TriggerHandle>,
}

/// ### English
/// Control surface of an update/render thread. Called from the event thread.
///
/// Lifecycle calls tolerate redundant or misordered use: they log and do nothing instead of
/// failing.
///
/// ### 中文
/// update/render 线程的控制接口，由事件线程调用。
///
/// 生命周期调用可容忍冗余或乱序：只记录日志而不失败。
pub trait ThreadController: Send + Sync {
    /// ### English
    /// Spawns the render thread in a suspended state and initializes graphics on it.
    /// Blocks until graphics are ready; graphics failures are returned here.
    ///
    /// ### 中文
    /// 以挂起状态创建渲染线程并在其上初始化图形；阻塞直到图形就绪，图形错误在此返回。
    fn initialize(&self) -> Result<(), ControllerError>;

    fn start(&self);

    fn pause(&self);

    fn resume(&self);

    /// ### English
    /// Asks the render thread to exit and joins it. Safe to call repeatedly.
    ///
    /// ### 中文
    /// 请求渲染线程退出并 join；可重复调用。
    fn stop(&self);

    /// ### English
    /// At least one more update + render pass is due. Calls before the render thread picks the
    /// request up coalesce into one pass.
    ///
    /// ### 中文
    /// 至少还需要一次 update + render。渲染线程处理之前的多次调用会合并为一次。
    fn request_update(&self);

    /// ### English
    /// Exactly one pass, also while paused; the state is unchanged afterwards.
    ///
    /// ### 中文
    /// 仅执行一次，暂停时同样有效；之后状态保持不变。
    fn request_update_once(&self);

    /// ### English
    /// Switches rendering to `surface`. Returns once the render thread stopped using (and
    /// destroyed its backend objects for) the previous surface.
    ///
    /// ### 中文
    /// 将渲染切换到 `surface`；在渲染线程停止使用旧 surface（并销毁其后端对象）之后返回。
    fn replace_surface(&self, surface: SurfaceHandle) -> Result<(), ControllerError>;

    /// ### English
    /// The current surface changed size; applied before the next render.
    ///
    /// ### 中文
    /// 当前 surface 尺寸已改变；在下一次渲染前生效。
    fn resize_surface(&self, size: PhysicalSize<u32>);

    /// ### English
    /// Releases `surface` on the render thread. Blocks until done.
    ///
    /// ### 中文
    /// 在渲染线程释放 `surface`；阻塞直到完成。
    fn delete_surface(&self, surface: &SurfaceHandle) -> Result<(), ControllerError>;

    /// ### English
    /// Renders once every `vsyncs_per_render` VSyncs (`0` is treated as `1`).
    ///
    /// ### 中文
    /// 每 `vsyncs_per_render` 个 VSync 渲染一次（`0` 视为 `1`）。
    fn set_render_refresh_rate(&self, vsyncs_per_render: u32);

    fn set_pre_render_callback(&self, callback: Option<PreRenderCallback>);

    fn post_render_complete(&self);

    fn state(&self) -> ControllerState;
}
