use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{DEFAULT_FRAME_DURATION, VSyncSource, VSyncTick};
use crate::engine::error::VSyncError;

struct TimerState {
    initialized: bool,
    epoch: Instant,
    sleep_until: Option<Instant>,
    frame_number: u32,
    interrupted: bool,
}

/// ### English
/// Timer-based VSync substitute.
///
/// Keeps a sleep-until deadline advanced by one frame interval per sync. When the caller falls
/// more than one interval behind, whole frames are dropped (the frame number jumps) instead of
/// bursting to catch up.
///
/// ### 中文
/// 基于计时器的 VSync 替代实现。
///
/// 维护一个每次同步前进一个帧间隔的截止时间；若调用方落后超过一个间隔，
/// 则整帧丢弃（帧号跳跃），而不是连续突发追帧。
pub struct TimerVSync {
    frame_duration: Duration,
    state: Mutex<TimerState>,
    wake: Condvar,
}

impl Default for TimerVSync {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_DURATION)
    }
}

impl TimerVSync {
    /// ### English
    /// Creates a timer source; a zero `frame_duration` falls back to 60 Hz.
    ///
    /// ### 中文
    /// 创建计时器源；`frame_duration` 为 0 时回退到 60 Hz。
    pub fn new(frame_duration: Duration) -> Self {
        let frame_duration = if frame_duration.is_zero() {
            DEFAULT_FRAME_DURATION
        } else {
            frame_duration
        };
        Self {
            frame_duration,
            state: Mutex::new(TimerState {
                initialized: false,
                epoch: Instant::now(),
                sleep_until: None,
                frame_number: 0,
                interrupted: false,
            }),
            wake: Condvar::new(),
        }
    }
}

impl VSyncSource for TimerVSync {
    fn initialize(&self) -> Result<(), VSyncError> {
        let mut state = self.state.lock();
        if state.initialized {
            log::debug!("timer vsync initialized twice");
        }
        state.initialized = true;
        state.epoch = Instant::now();
        state.sleep_until = None;
        Ok(())
    }

    fn do_sync(&self) -> Result<VSyncTick, VSyncError> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(VSyncError::NotInitialized);
        }

        let now = Instant::now();
        let mut frames = 1u32;
        let deadline = match state.sleep_until {
            None => now + self.frame_duration,
            Some(previous) => {
                let mut deadline = previous + self.frame_duration;
                while now > deadline + self.frame_duration {
                    deadline += self.frame_duration;
                    frames += 1;
                }
                deadline
            }
        };
        if frames > 1 {
            log::trace!("timer vsync dropped {} frames", frames - 1);
        }

        while Instant::now() < deadline {
            if state.interrupted {
                state.interrupted = false;
                return Err(VSyncError::Interrupted);
            }
            self.wake.wait_until(&mut state, deadline);
        }
        if state.interrupted {
            state.interrupted = false;
            return Err(VSyncError::Interrupted);
        }

        state.sleep_until = Some(deadline);
        state.frame_number = state.frame_number.wrapping_add(frames);
        Ok(VSyncTick::from_elapsed(
            state.frame_number,
            deadline.saturating_duration_since(state.epoch),
        ))
    }

    fn use_hardware(&self) -> bool {
        false
    }

    fn frame_interval(&self) -> Duration {
        self.frame_duration
    }

    fn interrupt(&self) {
        self.state.lock().interrupted = true;
        self.wake.notify_all();
    }

    fn resynchronize(&self) {
        let mut state = self.state.lock();
        state.sleep_until = None;
        state.interrupted = false;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn sync_before_initialize_fails() {
        let vsync = TimerVSync::default();
        assert_eq!(vsync.do_sync(), Err(VSyncError::NotInitialized));
    }

    #[test]
    fn frames_advance_at_interval() {
        let vsync = TimerVSync::new(Duration::from_millis(2));
        vsync.initialize().unwrap();
        let started = Instant::now();
        let first = vsync.do_sync().unwrap();
        let second = vsync.do_sync().unwrap();
        assert!(second.frame_number > first.frame_number);
        assert!(started.elapsed() >= Duration::from_millis(4));
        assert!(!vsync.use_hardware());
    }

    #[test]
    fn late_caller_drops_frames() {
        let vsync = TimerVSync::new(Duration::from_millis(2));
        vsync.initialize().unwrap();
        let first = vsync.do_sync().unwrap();
        thread::sleep(Duration::from_millis(20));
        let second = vsync.do_sync().unwrap();
        assert!(second.frame_number.wrapping_sub(first.frame_number) > 1);
    }

    #[test]
    fn interrupt_releases_blocked_sync() {
        let vsync = Arc::new(TimerVSync::new(Duration::from_secs(10)));
        vsync.initialize().unwrap();
        let remote = vsync.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.interrupt();
        });
        let started = Instant::now();
        assert_eq!(vsync.do_sync(), Err(VSyncError::Interrupted));
        assert!(started.elapsed() < Duration::from_secs(5));
        waker.join().unwrap();
    }

    #[test]
    fn resynchronize_discards_a_pending_interrupt() {
        let vsync = TimerVSync::new(Duration::from_millis(1));
        vsync.initialize().unwrap();
        vsync.interrupt();
        vsync.resynchronize();
        assert!(vsync.do_sync().is_ok());
    }
}
