//! ### English
//! Error types surfaced by the controller, the graphics backend and VSync sources.
//!
//! Only initialization errors ever reach the caller; per-frame errors are logged and absorbed on
//! the render thread.
//!
//! ### 中文
//! 控制器、图形后端与 VSync 源使用的错误类型。
//!
//! 只有初始化错误会返回给调用方；逐帧错误在渲染线程记录日志后被吞掉。

use std::io;

use thiserror::Error;

/// ### English
/// Errors returned by `ThreadController` operations.
///
/// ### 中文
/// `ThreadController` 操作返回的错误。
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller is already initialized")]
    AlreadyInitialized,
    /// ### English
    /// A blocking request was made from the render thread itself (it would wait on itself).
    ///
    /// ### 中文
    /// 在渲染线程自身上发起了阻塞请求（会等待自己）。
    #[error("blocking request made from the render thread")]
    CalledFromRenderThread,
    #[error("failed to spawn the render thread: {0}")]
    ThreadSpawn(#[source] io::Error),
    #[error("graphics initialization failed: {0}")]
    Graphics(#[from] GraphicsError),
    #[error("timed out waiting for the render thread to initialize")]
    InitializeTimeout,
    /// ### English
    /// The render thread exited (or panicked) before answering a blocking request.
    ///
    /// ### 中文
    /// 渲染线程在应答阻塞请求之前已退出（或 panic）。
    #[error("render thread exited before completing the request")]
    Abandoned,
}

/// ### English
/// Errors reported by a `GraphicsBackend`.
///
/// ### 中文
/// `GraphicsBackend` 报告的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicsError {
    #[error("failed to create graphics context: {0}")]
    ContextCreation(String),
    #[error("failed to make context current: {0}")]
    MakeCurrent(String),
    #[error("failed to present: {0}")]
    Present(String),
    #[error("surface operation failed: {0}")]
    Surface(String),
    #[error("GL error 0x{0:04x}")]
    Gl(u32),
    #[error("embedder symbol `{0}` is NULL")]
    MissingSymbol(&'static str),
}

/// ### English
/// Errors returned by `VSyncSource::do_sync`.
///
/// `Interrupted` and `Timeout` mean "no frame this time"; `NotInitialized` and `Platform` make
/// the render thread fall back to a fixed-interval sleep.
///
/// ### 中文
/// `VSyncSource::do_sync` 返回的错误。
///
/// `Interrupted` 与 `Timeout` 表示“本次没有帧”；`NotInitialized` 与 `Platform`
/// 会让渲染线程退回固定间隔睡眠。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VSyncError {
    #[error("vsync source used before initialize()")]
    NotInitialized,
    #[error("vsync wait interrupted")]
    Interrupted,
    #[error("timed out waiting for vsync")]
    Timeout,
    #[error("vsync platform failure: {0}")]
    Platform(String),
}
