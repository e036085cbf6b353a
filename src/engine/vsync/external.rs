use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{DEFAULT_FRAME_DURATION, VSyncSource, VSyncTick};
use crate::engine::error::VSyncError;

/// ### English
/// Longest time one `do_sync` call blocks waiting for an embedder tick.
///
/// ### 中文
/// 单次 `do_sync` 等待宿主 tick 的最长阻塞时间。
const DEFAULT_WAIT_LIMIT: Duration = Duration::from_millis(100);

struct ExternalState {
    initialized: bool,
    epoch: Instant,
    produced: u32,
    consumed: u32,
    last_tick: VSyncTick,
    interrupted: bool,
}

/// ### English
/// VSync source driven by the embedder (e.g. a compositor frame callback).
///
/// The embedder calls `tick()` once per vertical blank; the render thread consumes ticks in
/// `do_sync`. Ticks that arrive before the render thread consumes them collapse into one sync
/// whose frame number jumps accordingly.
///
/// ### 中文
/// 由宿主驱动的 VSync 源（例如合成器的帧回调）。
///
/// 宿主每次垂直消隐调用一次 `tick()`；渲染线程在 `do_sync` 中消费 tick。
/// 在渲染线程消费之前到达的多个 tick 会合并为一次同步，帧号随之跳跃。
pub struct ExternalVSync {
    state: Mutex<ExternalState>,
    produced: Condvar,
    consumed: Condvar,
    wait_limit: Duration,
    frame_interval: Duration,
}

impl Default for ExternalVSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalVSync {
    pub fn new() -> Self {
        Self::with_wait_limit(DEFAULT_WAIT_LIMIT)
    }

    /// ### English
    /// Creates a source whose `do_sync` gives up with `VSyncError::Timeout` after `wait_limit`.
    ///
    /// ### 中文
    /// 创建一个 `do_sync` 在 `wait_limit` 之后以 `VSyncError::Timeout` 返回的源。
    pub fn with_wait_limit(wait_limit: Duration) -> Self {
        Self {
            state: Mutex::new(ExternalState {
                initialized: false,
                epoch: Instant::now(),
                produced: 0,
                consumed: 0,
                last_tick: VSyncTick::default(),
                interrupted: false,
            }),
            produced: Condvar::new(),
            consumed: Condvar::new(),
            wait_limit,
            frame_interval: DEFAULT_FRAME_DURATION,
        }
    }

    /// ### English
    /// Signals one vertical blank timestamped now. Returns the new frame number.
    ///
    /// ### 中文
    /// 以当前时间发出一次垂直消隐信号，返回新的帧号。
    pub fn tick(&self) -> u32 {
        let elapsed = self.state.lock().epoch.elapsed();
        self.tick_at(elapsed)
    }

    /// ### English
    /// Signals one vertical blank with an explicit timestamp (since this source's creation).
    ///
    /// ### 中文
    /// 以显式时间戳（自本源创建起）发出一次垂直消隐信号。
    pub fn tick_at(&self, elapsed: Duration) -> u32 {
        let mut state = self.state.lock();
        state.produced = state.produced.wrapping_add(1);
        state.last_tick = VSyncTick::from_elapsed(state.produced, elapsed);
        let frame_number = state.produced;
        drop(state);
        self.produced.notify_all();
        frame_number
    }

    /// ### English
    /// Waits until the render thread consumed the tick numbered `frame_number`.
    ///
    /// #### Parameters
    /// - `frame_number`: Value returned by `tick()`.
    /// - `timeout`: Maximum time to wait.
    ///
    /// ### 中文
    /// 等待渲染线程消费编号为 `frame_number` 的 tick。
    ///
    /// #### 参数
    /// - `frame_number`：`tick()` 的返回值。
    /// - `timeout`：最长等待时间。
    pub fn wait_consumed(&self, frame_number: u32, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while (state.consumed.wrapping_sub(frame_number) as i32) < 0 {
            if self
                .consumed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return (state.consumed.wrapping_sub(frame_number) as i32) >= 0;
            }
        }
        true
    }

    /// ### English
    /// Latest tick number consumed by the render thread.
    ///
    /// ### 中文
    /// 渲染线程最近消费的 tick 编号。
    pub fn consumed(&self) -> u32 {
        self.state.lock().consumed
    }
}

impl VSyncSource for ExternalVSync {
    fn initialize(&self) -> Result<(), VSyncError> {
        self.state.lock().initialized = true;
        Ok(())
    }

    fn do_sync(&self) -> Result<VSyncTick, VSyncError> {
        let deadline = Instant::now() + self.wait_limit;
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(VSyncError::NotInitialized);
        }
        loop {
            if state.interrupted {
                state.interrupted = false;
                return Err(VSyncError::Interrupted);
            }
            if state.produced != state.consumed {
                state.consumed = state.produced;
                let tick = state.last_tick;
                drop(state);
                self.consumed.notify_all();
                return Ok(tick);
            }
            if self
                .produced
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.produced == state.consumed
                && !state.interrupted
            {
                return Err(VSyncError::Timeout);
            }
        }
    }

    fn use_hardware(&self) -> bool {
        true
    }

    fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    fn interrupt(&self) {
        self.state.lock().interrupted = true;
        self.produced.notify_all();
    }

    /// ### English
    /// Only the pending interrupt is dropped; an unconsumed tick still counts.
    ///
    /// ### 中文
    /// 只丢弃未处理的中断；尚未消费的 tick 仍然有效。
    fn resynchronize(&self) {
        self.state.lock().interrupted = false;
    }
}
