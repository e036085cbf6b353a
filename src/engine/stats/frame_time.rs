//! ### English
//! Min/max/rolling-average/total statistics over a repeating start→end interval.
//!
//! ### 中文
//! 针对重复出现的 start→end 区间的最小/最大/滑动平均/总计统计。

/// ### English
/// Weight of the history in the exponential rolling average.
///
/// ### 中文
/// 指数滑动平均中历史值的权重。
const HISTORY_WEIGHT: f64 = 0.9;

const MICROSECONDS_TO_SECONDS: f32 = 1.0 / 1_000_000.0;

/// ### English
/// A monotonic point in time with microsecond resolution.
///
/// ### 中文
/// 微秒精度的单调时间点。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTimeStamp {
    pub frame: u32,
    pub microseconds: u64,
}

impl FrameTimeStamp {
    #[inline]
    pub fn new(frame: u32, microseconds: u64) -> Self {
        Self { frame, microseconds }
    }

    /// ### English
    /// Microseconds from `start` to `end`, wrapping on overflow.
    ///
    /// ### 中文
    /// 从 `start` 到 `end` 的微秒数（溢出时回绕）。
    #[inline]
    pub fn microsecond_diff(start: &Self, end: &Self) -> u64 {
        end.microseconds.wrapping_sub(start.microseconds)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimeState {
    WaitingForStartTime,
    WaitingForEndTime,
}

/// ### English
/// Copy of the statistics in seconds, safe to hand to another thread.
///
/// ### 中文
/// 以秒为单位的统计副本，可交给其他线程读取。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTimeSnapshot {
    pub min_seconds: f32,
    pub max_seconds: f32,
    pub rolling_average_seconds: f32,
    pub total_seconds: f32,
    pub run_count: u32,
}

/// ### English
/// Statistics for a repeating timed interval.
///
/// `start_time` twice in a row, or `end_time` without a start, resets every counter.
///
/// ### 中文
/// 重复计时区间的统计。
///
/// 连续两次 `start_time`，或没有 start 的 `end_time`，都会重置所有计数。
#[derive(Clone, Debug)]
pub struct FrameTimeStats {
    start: FrameTimeStamp,
    state: TimeState,
    min: u64,
    max: u64,
    average: f64,
    total: u64,
    run_count: u32,
}

impl Default for FrameTimeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimeStats {
    pub fn new() -> Self {
        Self {
            start: FrameTimeStamp::default(),
            state: TimeState::WaitingForStartTime,
            min: 0,
            max: 0,
            average: 0.0,
            total: 0,
            run_count: 0,
        }
    }

    /// ### English
    /// Records the start of one interval.
    ///
    /// #### Parameters
    /// - `stamp`: Start time of the interval.
    ///
    /// ### 中文
    /// 记录一个区间的开始。
    ///
    /// #### 参数
    /// - `stamp`：区间开始时间。
    pub fn start_time(&mut self, stamp: FrameTimeStamp) {
        if self.state != TimeState::WaitingForStartTime {
            self.reset();
        }
        self.start = stamp;
        self.state = TimeState::WaitingForEndTime;
    }

    /// ### English
    /// Records the end of the interval opened by `start_time`.
    ///
    /// #### Parameters
    /// - `stamp`: End time of the interval.
    ///
    /// ### 中文
    /// 记录由 `start_time` 开启的区间的结束。
    ///
    /// #### 参数
    /// - `stamp`：区间结束时间。
    pub fn end_time(&mut self, stamp: FrameTimeStamp) {
        if self.state != TimeState::WaitingForEndTime {
            self.reset();
            return;
        }
        self.state = TimeState::WaitingForStartTime;
        self.run_count += 1;

        let elapsed = FrameTimeStamp::microsecond_diff(&self.start, &stamp);
        if self.run_count == 1 {
            self.min = elapsed;
            self.max = elapsed;
            self.average = elapsed as f64;
        } else if elapsed < self.min {
            self.min = elapsed;
        } else if elapsed > self.max {
            self.max = elapsed;
        }

        self.total = self.total.wrapping_add(elapsed);
        self.average = elapsed as f64 * (1.0 - HISTORY_WEIGHT) + self.average * HISTORY_WEIGHT;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn min_time(&self) -> f32 {
        self.min as f32 * MICROSECONDS_TO_SECONDS
    }

    pub fn max_time(&self) -> f32 {
        self.max as f32 * MICROSECONDS_TO_SECONDS
    }

    pub fn rolling_average_time(&self) -> f32 {
        self.average as f32 * MICROSECONDS_TO_SECONDS
    }

    pub fn total_time(&self) -> f32 {
        self.total as f32 * MICROSECONDS_TO_SECONDS
    }

    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    pub fn snapshot(&self) -> FrameTimeSnapshot {
        FrameTimeSnapshot {
            min_seconds: self.min_time(),
            max_seconds: self.max_time(),
            rolling_average_seconds: self.rolling_average_time(),
            total_seconds: self.total_time(),
            run_count: self.run_count,
        }
    }
}
