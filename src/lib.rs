/// ### English
/// `xian_render_loop` crate root.
/// The Rust API lives under `engine`; `ffi` exports the same controller through a C ABI.
///
/// ### 中文
/// `xian_render_loop` 的 crate 根。
/// Rust API 位于 `engine` 模块；`ffi` 通过 C ABI 导出同一个控制器。
pub mod engine;
mod ffi;

pub use engine::bridge::{EventThreadBridge, EventThreadSender, TriggerHandle, TriggerPolicy};
pub use engine::config::RenderLoopOptions;
pub use engine::controller::{
    CombinedUpdateRenderController, ControllerBuilder, ControllerState, Notifications,
    PreRenderCallback, ThreadController,
};
pub use engine::error::{ControllerError, GraphicsError, VSyncError};
pub use engine::graphics::{
    EmbedderEglApi, GlesBackend, GraphicsApi, GraphicsBackend, NativeWindowSurface, RenderSurface,
    SurfaceHandle, same_surface,
};
pub use engine::scene::{KeepUpdating, RenderStatus, SceneCore, UpdateStatus, UpdateTiming};
pub use engine::stats::{FrameTimeSnapshot, FrameTimeStamp, FrameTimeStats};
pub use engine::vsync::{ExternalVSync, TimerVSync, VSyncSource, VSyncTick};
