/// ### English
/// VSync sources pacing the render thread.
///
/// A source blocks the render thread until the next vertical blank (or a timer-based stand-in)
/// and reports a monotonically increasing frame number with its timestamp.
///
/// ### 中文
/// 为渲染线程提供节奏的 VSync 源。
///
/// VSync 源会阻塞渲染线程直到下一次垂直消隐（或基于计时器的替代），
/// 并返回单调递增的帧号及其时间戳。
mod external;
mod timer;

use std::time::Duration;

pub use external::ExternalVSync;
pub use timer::TimerVSync;

use crate::engine::error::VSyncError;

/// ### English
/// Default frame interval (60 Hz).
///
/// ### 中文
/// 默认帧间隔（60 Hz）。
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

/// ### English
/// One VSync event: frame sequence number and timestamp.
///
/// ### 中文
/// 一次 VSync 事件：帧序号与时间戳。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VSyncTick {
    pub frame_number: u32,
    pub seconds: u32,
    pub microseconds: u32,
}

impl VSyncTick {
    /// ### English
    /// Builds a tick from a timestamp measured since the source's epoch.
    ///
    /// ### 中文
    /// 根据自 VSync 源起点起算的时间戳构造 tick。
    pub fn from_elapsed(frame_number: u32, elapsed: Duration) -> Self {
        Self {
            frame_number,
            seconds: elapsed.as_secs() as u32,
            microseconds: elapsed.subsec_micros(),
        }
    }

    #[inline]
    pub fn as_millis(&self) -> u64 {
        self.seconds as u64 * 1000 + self.microseconds as u64 / 1000
    }
}

/// ### English
/// Blocking source of VSync events.
///
/// Only the render thread calls `initialize` and `do_sync`. `interrupt` may be called from any
/// thread and makes a blocked (or the next) `do_sync` return `VSyncError::Interrupted`.
///
/// ### 中文
/// 阻塞式 VSync 事件源。
///
/// 只有渲染线程调用 `initialize` 与 `do_sync`；`interrupt` 可在任意线程调用，
/// 使阻塞中（或下一次）的 `do_sync` 返回 `VSyncError::Interrupted`。
pub trait VSyncSource: Send + Sync {
    fn initialize(&self) -> Result<(), VSyncError>;

    /// ### English
    /// Blocks until the next VSync.
    ///
    /// `Interrupted`/`Timeout` mean no frame was produced; other errors are platform failures.
    ///
    /// ### 中文
    /// 阻塞直到下一次 VSync。
    ///
    /// `Interrupted`/`Timeout` 表示没有产生帧；其它错误为平台故障。
    fn do_sync(&self) -> Result<VSyncTick, VSyncError>;

    /// ### English
    /// Whether a genuine hardware signal is used (as opposed to a timer approximation).
    ///
    /// ### 中文
    /// 是否使用真实硬件信号（而非计时器近似）。
    fn use_hardware(&self) -> bool;

    fn frame_interval(&self) -> Duration {
        DEFAULT_FRAME_DURATION
    }

    fn interrupt(&self) {}

    /// ### English
    /// Forgets stale timing and any interrupt raised while the render thread slept.
    ///
    /// ### 中文
    /// 丢弃渲染线程睡眠期间过期的时序信息与中断。
    fn resynchronize(&self) {}
}
