use crate::engine::scene::KeepUpdating;

/// ### English
/// Periodically logs why the scene keeps (or stops) updating.
///
/// ### 中文
/// 周期性输出场景继续（或停止）update 的原因。
#[derive(Clone, Debug, Default)]
pub struct UpdateStatusLogger {
    frequency: u32,
    frame_count: u32,
}

impl UpdateStatusLogger {
    /// ### English
    /// Creates a logger emitting every `frequency` frames; `0` disables it.
    ///
    /// ### 中文
    /// 创建每 `frequency` 帧输出一次的记录器；`0` 表示关闭。
    pub fn new(frequency: u32) -> Self {
        Self {
            frequency,
            frame_count: 0,
        }
    }

    /// ### English
    /// Accounts one update. Returns the emitted line when this frame hit the interval.
    ///
    /// ### 中文
    /// 记录一次 update；若本帧达到输出间隔则返回输出的日志行。
    pub fn log(&mut self, keep_updating: KeepUpdating) -> Option<String> {
        if self.frequency == 0 {
            return None;
        }
        self.frame_count += 1;
        if self.frame_count < self.frequency {
            return None;
        }
        self.frame_count = 0;

        let mut line = format!("update status: keep updating {}", !keep_updating.is_empty());
        if !keep_updating.is_empty() {
            line.push_str(" because:");
            for reason in keep_updating.reasons() {
                line.push_str(" <");
                line.push_str(reason);
                line.push('>');
            }
        }
        log::info!("{line}");
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_every_nth_frame_with_reasons() {
        let mut logger = UpdateStatusLogger::new(3);
        assert!(logger.log(KeepUpdating::ANIMATIONS_RUNNING).is_none());
        assert!(logger.log(KeepUpdating::ANIMATIONS_RUNNING).is_none());
        let line = logger.log(KeepUpdating::ANIMATIONS_RUNNING).unwrap_or_default();
        assert_eq!(
            line,
            "update status: keep updating true because: <animations running>"
        );
        assert!(logger.log(KeepUpdating::empty()).is_none());
    }

    #[test]
    fn idle_scene_reports_false() {
        let mut logger = UpdateStatusLogger::new(1);
        assert_eq!(
            logger.log(KeepUpdating::empty()).as_deref(),
            Some("update status: keep updating false")
        );
    }
}
