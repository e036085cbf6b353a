use std::thread;
use std::time::Instant;

use crate::engine::error::VSyncError;
use crate::engine::vsync::{VSyncSource, VSyncTick};

/// ### English
/// Counts VSync ticks and decides which of them produce a render when the refresh rate is
/// throttled to one render every `n` ticks.
///
/// ### 中文
/// 统计 VSync tick，并在刷新率被限制为每 `n` 个 tick 渲染一次时决定哪些 tick 产生渲染。
pub(crate) struct FramePacer {
    last_frame_number: Option<u32>,
    ticks: u32,
    since_render: u32,
    epoch: Instant,
    fallback_logged: bool,
}

/// ### English
/// A tick that should produce a render.
///
/// ### 中文
/// 应当产生一次渲染的 tick。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PacedFrame {
    pub(crate) tick: VSyncTick,
    /// ### English
    /// VSync intervals covered since the previous render.
    ///
    /// ### 中文
    /// 自上次渲染以来经过的 VSync 间隔数。
    pub(crate) ticks: u32,
}

impl FramePacer {
    pub(crate) fn new() -> Self {
        Self {
            last_frame_number: None,
            ticks: 0,
            since_render: 0,
            epoch: Instant::now(),
            fallback_logged: false,
        }
    }

    /// ### English
    /// Forgets frame history after the render thread slept; the next tick renders.
    ///
    /// ### 中文
    /// 渲染线程睡眠后清除帧历史；下一个 tick 会触发渲染。
    pub(crate) fn reset(&mut self, refresh_rate: u32) {
        self.last_frame_number = None;
        self.ticks = refresh_rate.max(1) - 1;
        self.since_render = 0;
    }

    /// ### English
    /// Accounts one tick; returns the covered interval count when it is time to render.
    ///
    /// ### 中文
    /// 记录一个 tick；到了渲染时机时返回覆盖的间隔数。
    pub(crate) fn on_tick(&mut self, frame_number: u32, refresh_rate: u32) -> Option<u32> {
        let refresh_rate = refresh_rate.max(1);
        let jump = match self.last_frame_number {
            Some(previous) => frame_number.wrapping_sub(previous).max(1),
            None => 1,
        };
        self.last_frame_number = Some(frame_number);
        self.ticks = self.ticks.saturating_add(jump);
        self.since_render = self.since_render.saturating_add(jump);
        if self.ticks < refresh_rate {
            return None;
        }
        self.ticks = (self.ticks - refresh_rate).min(refresh_rate - 1);
        Some(std::mem::take(&mut self.since_render))
    }

    /// ### English
    /// Blocks on `vsync` for one tick. Returns `None` when no render is due yet (throttled,
    /// interrupted or timed out); the caller re-checks its state and tries again.
    ///
    /// Platform failures fall back to sleeping one frame interval.
    ///
    /// ### 中文
    /// 在 `vsync` 上阻塞等待一个 tick。尚不需要渲染（被限速、被中断或超时）时返回 `None`，
    /// 调用方应重新检查状态后再试。
    ///
    /// 平台故障时退回到睡眠一个帧间隔。
    pub(crate) fn wait(&mut self, vsync: &dyn VSyncSource, refresh_rate: u32) -> Option<PacedFrame> {
        let tick = match vsync.do_sync() {
            Ok(tick) => tick,
            Err(VSyncError::Interrupted) | Err(VSyncError::Timeout) => return None,
            Err(err) => {
                if !self.fallback_logged {
                    log::warn!("vsync failed ({err}); falling back to fixed-interval pacing");
                    self.fallback_logged = true;
                }
                thread::sleep(vsync.frame_interval());
                let frame_number = self.last_frame_number.map_or(1, |n| n.wrapping_add(1));
                VSyncTick::from_elapsed(frame_number, self.epoch.elapsed())
            }
        };
        let ticks = self.on_tick(tick.frame_number, refresh_rate)?;
        Some(PacedFrame { tick, ticks })
    }
}
