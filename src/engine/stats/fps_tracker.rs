/// ### English
/// Averages the frame rate over a fixed window and logs it when the window closes.
///
/// ### 中文
/// 在固定时间窗口内统计平均帧率，窗口结束时输出日志。
#[derive(Clone, Debug, Default)]
pub struct FpsTracker {
    tracking_seconds: f32,
    elapsed_seconds: f32,
    frame_count: u32,
}

impl FpsTracker {
    /// ### English
    /// Creates a tracker; `tracking_seconds == 0` disables it.
    ///
    /// ### 中文
    /// 创建统计器；`tracking_seconds == 0` 表示关闭。
    pub fn new(tracking_seconds: u32) -> Self {
        Self {
            tracking_seconds: tracking_seconds as f32,
            elapsed_seconds: 0.0,
            frame_count: 0,
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.tracking_seconds > 0.0
    }

    /// ### English
    /// Accounts one frame. Returns the average FPS when a window was just closed.
    ///
    /// #### Parameters
    /// - `seconds_from_last_frame`: Wall-clock time since the previous frame.
    ///
    /// ### 中文
    /// 记录一帧；若刚好结束一个统计窗口则返回平均 FPS。
    ///
    /// #### 参数
    /// - `seconds_from_last_frame`：距上一帧的真实时间。
    pub fn track(&mut self, seconds_from_last_frame: f32) -> Option<f32> {
        if !self.enabled() {
            return None;
        }
        if self.elapsed_seconds < self.tracking_seconds {
            self.elapsed_seconds += seconds_from_last_frame;
            self.frame_count += 1;
            return None;
        }

        let fps = if self.elapsed_seconds > 0.0 {
            self.frame_count as f32 / self.elapsed_seconds
        } else {
            0.0
        };
        log::info!(
            "fps tracking: {} frames in {:.2}s, average {:.1} fps",
            self.frame_count,
            self.elapsed_seconds,
            fps
        );
        self.elapsed_seconds = 0.0;
        self.frame_count = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracker_never_reports() {
        let mut tracker = FpsTracker::new(0);
        assert!((0..1000).all(|_| tracker.track(1.0).is_none()));
    }

    #[test]
    fn reports_average_once_window_is_full() {
        let mut tracker = FpsTracker::new(1);
        let mut reports = Vec::new();
        for _ in 0..70 {
            if let Some(fps) = tracker.track(1.0 / 60.0) {
                reports.push(fps);
            }
        }
        assert_eq!(reports.len(), 1);
        assert!((reports[0] - 60.0).abs() < 1.0);
    }
}
