//! ### English
//! Boundary to the scene-graph engine driven by the render thread.
//!
//! The controller never looks at scene content. It schedules `update` and `render` and reacts to
//! the status flags they return.
//!
//! ### 中文
//! 与由渲染线程驱动的场景图引擎之间的边界。
//!
//! 控制器从不解读场景内容，只负责调度 `update` 与 `render` 并根据返回的状态标志作出反应。

use bitflags::bitflags;

bitflags! {
    /// ### English
    /// Reasons the scene wants another update pass.
    ///
    /// ### 中文
    /// 场景需要继续 update 的原因。
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeepUpdating: u32 {
        const STAGE_KEEP_RENDERING = 1 << 0;
        const ANIMATIONS_RUNNING = 1 << 1;
        const MONITORING_PERFORMANCE = 1 << 2;
        const RENDER_TASK_SYNC = 1 << 3;
    }
}

impl KeepUpdating {
    /// ### English
    /// Human readable reasons, in bit order.
    ///
    /// ### 中文
    /// 按位顺序给出的可读原因。
    pub fn reasons(self) -> impl Iterator<Item = &'static str> {
        [
            (Self::STAGE_KEEP_RENDERING, "stage keep-rendering requested"),
            (Self::ANIMATIONS_RUNNING, "animations running"),
            (Self::MONITORING_PERFORMANCE, "monitoring performance"),
            (Self::RENDER_TASK_SYNC, "render task waiting for completion"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, reason)| reason)
    }
}

/// ### English
/// Timing handed to one update pass.
///
/// ### 中文
/// 传给一次 update 的时间信息。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateTiming {
    /// ### English
    /// Seconds of scene time to advance.
    ///
    /// ### 中文
    /// 场景需要推进的时间（秒）。
    pub elapsed_seconds: f32,
    pub last_vsync_ms: u64,
    pub next_vsync_ms: u64,
}

/// ### English
/// Result of one update pass.
///
/// ### 中文
/// 一次 update 的结果。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStatus {
    pub keep_updating: KeepUpdating,
    /// ### English
    /// The scene queued events that must be processed on the event thread.
    ///
    /// ### 中文
    /// 场景产生了需要在事件线程处理的事件。
    pub needs_notification: bool,
    pub surface_rect_changed: bool,
}

/// ### English
/// Result of one render pass.
///
/// ### 中文
/// 一次 render 的结果。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStatus {
    pub needs_update: bool,
    /// ### English
    /// Something was drawn and the buffers must be presented.
    ///
    /// ### 中文
    /// 有内容被绘制，需要 present。
    pub needs_post_render: bool,
}

/// ### English
/// Scene engine driven by the update/render thread.
///
/// All methods run on the render thread with the graphics context current.
///
/// ### 中文
/// 由 update/render 线程驱动的场景引擎。
///
/// 所有方法都在渲染线程中调用，且调用时图形上下文已 current。
pub trait SceneCore: Send {
    /// ### English
    /// Called once after the graphics backend and first surface are ready.
    ///
    /// ### 中文
    /// 在图形后端与首个 surface 就绪后调用一次。
    fn context_created(&mut self) {}

    /// ### English
    /// Called once before the graphics backend shuts down.
    ///
    /// ### 中文
    /// 在图形后端关闭之前调用一次。
    fn context_destroyed(&mut self) {}

    fn update(&mut self, timing: UpdateTiming) -> UpdateStatus;

    /// ### English
    /// Renders one frame.
    ///
    /// #### Parameters
    /// - `force_clear`: The frame must clear the whole surface (first frame after resume).
    ///
    /// ### 中文
    /// 渲染一帧。
    ///
    /// #### 参数
    /// - `force_clear`：本帧必须清除整个 surface（resume 后的第一帧）。
    fn render(&mut self, force_clear: bool) -> RenderStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_follow_set_bits() {
        let flags = KeepUpdating::ANIMATIONS_RUNNING | KeepUpdating::RENDER_TASK_SYNC;
        let reasons: Vec<_> = flags.reasons().collect();
        assert_eq!(
            reasons,
            vec!["animations running", "render task waiting for completion"]
        );
        assert_eq!(KeepUpdating::empty().reasons().count(), 0);
    }
}
