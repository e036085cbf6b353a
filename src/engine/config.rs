//! ### English
//! Render loop options and their environment overrides.
//!
//! ### 中文
//! 渲染循环选项及其环境变量覆盖。

use std::time::Duration;

/// ### English
/// Environment variable: number of VSyncs per render (honoured only when greater than 1).
///
/// ### 中文
/// 环境变量：每次渲染间隔的 VSync 数（仅当大于 1 时生效）。
pub const ENV_RENDER_REFRESH_RATE: &str = "XIAN_RENDER_REFRESH_RATE";

/// ### English
/// Environment variable: FPS tracking window in seconds (`0` disables tracking).
///
/// ### 中文
/// 环境变量：FPS 统计窗口（秒），`0` 表示关闭。
pub const ENV_FPS_TRACKING: &str = "XIAN_FPS_TRACKING";

/// ### English
/// Environment variable: number of frames between update-status log lines (`0` disables).
///
/// ### 中文
/// 环境变量：两次 update-status 日志之间的帧数（`0` 表示关闭）。
pub const ENV_UPDATE_STATUS_INTERVAL: &str = "XIAN_UPDATE_STATUS_INTERVAL";

const DEFAULT_THREAD_NAME: &str = "XianRenderThread";

/// ### English
/// Options used when building a `CombinedUpdateRenderController`.
///
/// ### 中文
/// 构建 `CombinedUpdateRenderController` 时使用的选项。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderLoopOptions {
    /// ### English
    /// VSyncs between two render passes (`>= 1`).
    ///
    /// ### 中文
    /// 两次渲染之间的 VSync 数（`>= 1`）。
    pub render_refresh_rate: u32,
    /// ### English
    /// FPS tracking window in seconds; `0` disables the tracker.
    ///
    /// ### 中文
    /// FPS 统计窗口（秒）；`0` 表示关闭。
    pub fps_tracking_seconds: u32,
    /// ### English
    /// Frames between two update-status log lines; `0` disables the logger.
    ///
    /// ### 中文
    /// 两次 update-status 日志之间的帧数；`0` 表示关闭。
    pub update_status_frequency: u32,
    /// ### English
    /// Maximum time `initialize()` waits for the render thread to set up graphics.
    ///
    /// ### 中文
    /// `initialize()` 等待渲染线程完成图形初始化的最长时间。
    pub init_timeout: Duration,
    pub thread_name: String,
}

impl Default for RenderLoopOptions {
    fn default() -> Self {
        Self {
            render_refresh_rate: 1,
            fps_tracking_seconds: 0,
            update_status_frequency: 0,
            init_timeout: Duration::from_secs(30),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl RenderLoopOptions {
    /// ### English
    /// Default options overridden by the `XIAN_*` process environment variables.
    ///
    /// ### 中文
    /// 使用进程环境变量 `XIAN_*` 覆盖后的默认选项。
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// ### English
    /// Default options overridden by values returned from `lookup`.
    ///
    /// Unparsable values are ignored with a warning.
    ///
    /// #### Parameters
    /// - `lookup`: Returns the raw value for one variable name, or `None` if unset.
    ///
    /// ### 中文
    /// 使用 `lookup` 返回的值覆盖默认选项。
    ///
    /// 无法解析的值会被忽略并输出警告。
    ///
    /// #### 参数
    /// - `lookup`：根据变量名返回原始值；未设置时返回 `None`。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(rate) = parse_u32(&lookup, ENV_RENDER_REFRESH_RATE)
            && rate > 1
        {
            options.render_refresh_rate = rate;
        }
        if let Some(seconds) = parse_u32(&lookup, ENV_FPS_TRACKING) {
            options.fps_tracking_seconds = seconds;
        }
        if let Some(frames) = parse_u32(&lookup, ENV_UPDATE_STATUS_INTERVAL) {
            options.update_status_frequency = frames;
        }

        options
    }

    /// ### English
    /// Returns a copy with `render_refresh_rate` clamped to at least 1.
    ///
    /// ### 中文
    /// 返回 `render_refresh_rate` 至少为 1 的副本。
    pub(crate) fn normalized(mut self) -> Self {
        self.render_refresh_rate = self.render_refresh_rate.max(1);
        if self.thread_name.is_empty() {
            self.thread_name = DEFAULT_THREAD_NAME.to_string();
        }
        self
    }
}

fn parse_u32(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u32> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u32>() {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring {key}={raw:?}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let options = RenderLoopOptions::from_lookup(|_| None);
        assert_eq!(options, RenderLoopOptions::default());
        assert_eq!(options.render_refresh_rate, 1);
        assert_eq!(options.init_timeout, Duration::from_secs(30));
    }

    #[test]
    fn refresh_rate_only_applies_above_one() {
        let options = RenderLoopOptions::from_lookup(lookup(&[(ENV_RENDER_REFRESH_RATE, "0")]));
        assert_eq!(options.render_refresh_rate, 1);

        let options = RenderLoopOptions::from_lookup(lookup(&[(ENV_RENDER_REFRESH_RATE, "3")]));
        assert_eq!(options.render_refresh_rate, 3);
    }

    #[test]
    fn garbage_values_are_ignored() {
        let options = RenderLoopOptions::from_lookup(lookup(&[
            (ENV_FPS_TRACKING, "five"),
            (ENV_UPDATE_STATUS_INTERVAL, " 120 "),
        ]));
        assert_eq!(options.fps_tracking_seconds, 0);
        assert_eq!(options.update_status_frequency, 120);
    }

    #[test]
    fn normalized_clamps_zero_rate() {
        let options = RenderLoopOptions {
            render_refresh_rate: 0,
            thread_name: String::new(),
            ..RenderLoopOptions::default()
        }
        .normalized();
        assert_eq!(options.render_refresh_rate, 1);
        assert_eq!(options.thread_name, DEFAULT_THREAD_NAME);
    }
}
