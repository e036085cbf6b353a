/// ### English
/// Frame timing statistics and periodic diagnostics emitted by the render thread.
///
/// ### 中文
/// 渲染线程产生的帧时间统计与周期性诊断输出。
mod fps_tracker;
mod frame_time;
mod update_status;

pub use fps_tracker::FpsTracker;
pub use frame_time::{FrameTimeSnapshot, FrameTimeStamp, FrameTimeStats};
pub use update_status::UpdateStatusLogger;
