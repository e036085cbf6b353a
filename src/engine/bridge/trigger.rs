use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;

use super::{BridgeMessage, EventLoopWaker};

/// ### English
/// Lifetime of a registered trigger callback.
///
/// ### 中文
/// 已注册触发回调的生命周期。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerPolicy {
    /// ### English
    /// The callback stays registered and may run any number of times.
    ///
    /// ### 中文
    /// 回调保持注册，可被执行任意次。
    KeepAlive,
    /// ### English
    /// The bridge frees the callback after its first execution.
    ///
    /// ### 中文
    /// 首次执行后由桥释放该回调。
    DeleteAfterTrigger,
}

/// ### English
/// Thread-safe handle that schedules a registered callback on the event thread.
///
/// Triggers issued before the event thread runs the callback coalesce into one execution.
///
/// ### 中文
/// 线程安全句柄：在事件线程上调度一个已注册的回调。
///
/// 在事件线程执行回调之前的多次触发会合并为一次执行。
#[derive(Clone)]
pub struct TriggerHandle {
    pub(super) id: u64,
    pub(super) pending: Arc<AtomicBool>,
    pub(super) tx: Sender<BridgeMessage>,
    pub(super) waker: Option<EventLoopWaker>,
}

impl TriggerHandle {
    /// ### English
    /// Schedules the callback. Returns `false` if the bridge is gone.
    ///
    /// ### 中文
    /// 调度回调；若桥已销毁则返回 `false`。
    pub fn trigger(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return true;
        }
        if self.tx.send(BridgeMessage::Fire(self.id)).is_err() {
            self.pending.store(false, Ordering::Release);
            return false;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for TriggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerHandle")
            .field("id", &self.id)
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .finish()
    }
}
