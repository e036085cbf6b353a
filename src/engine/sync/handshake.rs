use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::engine::error::ControllerError;

const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const READY: u8 = 2;
const TAKEN: u8 = 3;

/// ### English
/// One-shot rendezvous between a requesting thread and the render thread.
///
/// - No locks.
/// - The requesting thread is stored so the completer can `unpark()` it.
///
/// Used for initialization, surface replacement, surface deletion and blocking resize.
///
/// ### 中文
/// 请求线程与渲染线程之间的一次性会合点。
///
/// - 无锁。
/// - 保存请求线程句柄，完成方可以 `unpark()` 唤醒它。
///
/// 用于初始化、surface 替换、surface 删除以及阻塞式 resize。
pub(crate) struct Handshake<T> {
    /// ### English
    /// `EMPTY` → `WRITING` → `READY` → `TAKEN`.
    ///
    /// ### 中文
    /// `EMPTY` → `WRITING` → `READY` → `TAKEN`。
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
    waiter: thread::Thread,
}

unsafe impl<T: Send> Send for Handshake<T> {}
unsafe impl<T: Send> Sync for Handshake<T> {}

impl<T> Handshake<T> {
    /// ### English
    /// Creates a handshake whose waiter is the calling thread.
    ///
    /// ### 中文
    /// 创建一个以当前线程为等待方的 handshake。
    #[inline]
    pub(crate) fn for_current_thread() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
            waiter: thread::current(),
        })
    }

    /// ### English
    /// Publishes the value and wakes the waiter. Returns `false` if already completed.
    ///
    /// ### 中文
    /// 写入值并唤醒等待方；若已完成过则返回 `false`。
    #[inline]
    pub(crate) fn complete(&self, value: T) -> bool {
        if self
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        unsafe {
            (*self.value.get()).write(value);
        }
        self.state.store(READY, Ordering::Release);
        self.waiter.unpark();
        true
    }

    #[inline]
    pub(crate) fn is_completed(&self) -> bool {
        self.state.load(Ordering::Acquire) != EMPTY
    }

    #[inline]
    pub(crate) fn try_take(&self) -> Option<T> {
        self.state
            .compare_exchange(READY, TAKEN, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| unsafe { (*self.value.get()).assume_init_read() })
    }

    /// ### English
    /// Blocks until the value is published. Must be called from the waiter thread.
    ///
    /// ### 中文
    /// 阻塞直到值被写入；必须在等待方线程调用。
    pub(crate) fn wait(&self) -> T {
        loop {
            if let Some(value) = self.try_take() {
                return value;
            }
            thread::park();
        }
    }

    /// ### English
    /// Waits for the value with a timeout.
    ///
    /// ### 中文
    /// 在超时时间内等待值。
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.try_take() {
                return Some(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

impl<T> Drop for Handshake<T> {
    fn drop(&mut self) {
        if self.state.load(Ordering::Acquire) == READY {
            unsafe {
                drop((*self.value.get()).assume_init_read());
            }
        }
    }
}

/// ### English
/// Render-thread side of a `Handshake` carrying a controller result.
///
/// Dropping it without replying answers `ControllerError::Abandoned`, so a waiter is released even
/// when the render thread exits or unwinds.
///
/// ### 中文
/// 携带控制器结果的 `Handshake` 的渲染线程一侧。
///
/// 未应答即被 drop 时会回复 `ControllerError::Abandoned`，
/// 因此即使渲染线程退出或 unwind，等待方也会被释放。
pub(crate) struct Reply<T> {
    handshake: Arc<Handshake<Result<T, ControllerError>>>,
}

impl<T> Reply<T> {
    /// ### English
    /// Creates a reply/handshake pair whose waiter is the calling thread.
    ///
    /// ### 中文
    /// 创建以当前线程为等待方的 reply/handshake 对。
    pub(crate) fn pair() -> (Self, Arc<Handshake<Result<T, ControllerError>>>) {
        let handshake = Handshake::for_current_thread();
        (
            Self {
                handshake: handshake.clone(),
            },
            handshake,
        )
    }

    #[inline]
    pub(crate) fn send(self, value: Result<T, ControllerError>) {
        self.handshake.complete(value);
    }
}

impl<T> Drop for Reply<T> {
    fn drop(&mut self) {
        if !self.handshake.is_completed() {
            self.handshake.complete(Err(ControllerError::Abandoned));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_across_threads() {
        let handshake = Handshake::for_current_thread();
        let remote = handshake.clone();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            assert!(remote.complete(7u32));
            assert!(!remote.complete(8u32));
        });
        assert_eq!(handshake.wait(), 7);
        worker.join().unwrap();
    }

    #[test]
    fn wait_timeout_expires_when_nobody_answers() {
        let handshake = Handshake::<u32>::for_current_thread();
        assert_eq!(handshake.wait_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn dropped_reply_reports_abandoned() {
        let (reply, handshake) = Reply::<()>::pair();
        thread::spawn(move || drop(reply)).join().unwrap();
        assert!(matches!(handshake.wait(), Err(ControllerError::Abandoned)));
    }

    #[test]
    fn unread_value_is_dropped_with_the_handshake() {
        let payload = Arc::new(());
        let handshake = Handshake::for_current_thread();
        handshake.complete(payload.clone());
        assert_eq!(Arc::strong_count(&payload), 2);
        drop(handshake);
        assert_eq!(Arc::strong_count(&payload), 1);
    }
}
