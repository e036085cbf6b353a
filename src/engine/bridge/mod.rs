//! ### English
//! Cross-thread callback bridge into the event (main) thread.
//!
//! The render thread never runs application callbacks itself. It posts one-shot tasks or fires
//! registered triggers, and the event thread executes them from `process_pending()`.
//!
//! ### 中文
//! 通往事件（主）线程的跨线程回调桥。
//!
//! 渲染线程从不直接执行应用回调，而是投递一次性任务或触发已注册的回调，
//! 由事件线程在 `process_pending()` 中执行。
mod trigger;

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

pub use trigger::{TriggerHandle, TriggerPolicy};

/// ### English
/// Hook telling the host main loop that `process_pending()` should run soon.
///
/// ### 中文
/// 通知宿主主循环“应尽快调用 `process_pending()`”的钩子。
pub type EventLoopWaker = Arc<dyn Fn() + Send + Sync>;

pub(crate) enum BridgeMessage {
    Task(Box<dyn FnOnce() + Send>),
    Fire(u64),
}

struct RegisteredTrigger {
    callback: Box<dyn FnMut()>,
    policy: TriggerPolicy,
    pending: Arc<AtomicBool>,
}

/// ### English
/// Event-thread end of the bridge. Owned by the event thread (`!Send`).
///
/// ### 中文
/// 桥在事件线程的一端，由事件线程持有（`!Send`）。
pub struct EventThreadBridge {
    tx: Sender<BridgeMessage>,
    rx: Receiver<BridgeMessage>,
    waker: Option<EventLoopWaker>,
    triggers: HashMap<u64, RegisteredTrigger>,
    next_trigger_id: u64,
    _event_thread_only: PhantomData<*const ()>,
}

impl Default for EventThreadBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EventThreadBridge {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            waker: None,
            triggers: HashMap::new(),
            next_trigger_id: 1,
            _event_thread_only: PhantomData,
        }
    }

    /// ### English
    /// Creates a bridge that calls `waker` after each post so a host main loop can schedule
    /// `process_pending()`.
    ///
    /// ### 中文
    /// 创建一个在每次投递后调用 `waker` 的桥，便于宿主主循环安排 `process_pending()`。
    pub fn with_waker(waker: EventLoopWaker) -> Self {
        let mut bridge = Self::new();
        bridge.waker = Some(waker);
        bridge
    }

    /// ### English
    /// Returns a cloneable sender for one-shot tasks.
    ///
    /// ### 中文
    /// 返回一个可克隆的一次性任务发送端。
    pub fn sender(&self) -> EventThreadSender {
        EventThreadSender {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }

    /// ### English
    /// Registers a callback that runs on the event thread whenever the returned handle fires.
    ///
    /// #### Parameters
    /// - `policy`: Whether the callback survives its first execution.
    /// - `callback`: Callback executed from `process_pending()`.
    ///
    /// ### 中文
    /// 注册一个回调：每当返回的句柄被触发时在事件线程执行。
    ///
    /// #### 参数
    /// - `policy`：回调在首次执行后是否保留。
    /// - `callback`：在 `process_pending()` 中执行的回调。
    pub fn add_trigger(
        &mut self,
        policy: TriggerPolicy,
        callback: impl FnMut() + 'static,
    ) -> TriggerHandle {
        let id = self.next_trigger_id;
        self.next_trigger_id += 1;
        let pending = Arc::new(AtomicBool::new(false));
        self.triggers.insert(
            id,
            RegisteredTrigger {
                callback: Box::new(callback),
                policy,
                pending: pending.clone(),
            },
        );
        TriggerHandle {
            id,
            pending,
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }

    /// ### English
    /// Unregisters a trigger; later fires of its handle are ignored.
    ///
    /// ### 中文
    /// 注销一个触发器；之后对其句柄的触发将被忽略。
    pub fn remove_trigger(&mut self, handle: &TriggerHandle) -> bool {
        self.triggers.remove(&handle.id).is_some()
    }

    #[inline]
    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// ### English
    /// Runs every queued task and fired trigger without blocking. Returns how many callbacks ran.
    ///
    /// ### 中文
    /// 不阻塞地执行所有已排队的任务与已触发的回调，返回执行的回调数量。
    pub fn process_pending(&mut self) -> usize {
        let mut executed = 0;
        loop {
            match self.rx.try_recv() {
                Ok(message) => executed += self.dispatch(message),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return executed,
            }
        }
    }

    /// ### English
    /// Blocks up to `timeout` for the first message, then drains like `process_pending()`.
    ///
    /// ### 中文
    /// 最多阻塞 `timeout` 等待第一条消息，随后像 `process_pending()` 一样清空队列。
    pub fn wait_and_process(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                let executed = self.dispatch(message);
                executed + self.process_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn dispatch(&mut self, message: BridgeMessage) -> usize {
        match message {
            BridgeMessage::Task(task) => {
                task();
                1
            }
            BridgeMessage::Fire(id) => {
                let Some(trigger) = self.triggers.get_mut(&id) else {
                    return 0;
                };
                trigger.pending.store(false, Ordering::Release);
                (trigger.callback)();
                if trigger.policy == TriggerPolicy::DeleteAfterTrigger {
                    self.triggers.remove(&id);
                }
                1
            }
        }
    }
}

/// ### English
/// Thread-safe sender of one-shot tasks into the event thread.
///
/// ### 中文
/// 向事件线程投递一次性任务的线程安全发送端。
#[derive(Clone)]
pub struct EventThreadSender {
    tx: Sender<BridgeMessage>,
    waker: Option<EventLoopWaker>,
}

impl EventThreadSender {
    /// ### English
    /// Queues `task` to run once on the event thread. Returns `false` if the bridge is gone.
    ///
    /// ### 中文
    /// 排队 `task`，使其在事件线程执行一次；若桥已销毁则返回 `false`。
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        if self.tx.send(BridgeMessage::Task(Box::new(task))).is_err() {
            return false;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }
}
