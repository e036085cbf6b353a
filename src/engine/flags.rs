//! ### English
//! Bitflags controlling how a render loop is created through the C ABI.
//!
//! These are passed as a `u32` bitmask to `xian_render_loop_create`.
//!
//! ### 中文
//! 控制通过 C ABI 创建渲染循环时行为的位标志。
//!
//! 以 `u32` 位掩码传给 `xian_render_loop_create`。

/// ### English
/// Drive VSync from the embedder: the render thread only produces a frame after
/// `xian_render_loop_vsync_tick` is called. Without this flag a timer-based 60 Hz source is used.
///
/// ### 中文
/// 由宿主驱动 VSync：渲染线程仅在调用 `xian_render_loop_vsync_tick` 后才产出一帧。
/// 未设置该标志时使用基于计时器的 60 Hz 源。
pub const XIAN_RENDER_LOOP_FLAG_EXTERNAL_VSYNC: u32 = 1 << 0;

/// ### English
/// Read `XIAN_RENDER_REFRESH_RATE`, `XIAN_FPS_TRACKING` and `XIAN_UPDATE_STATUS_INTERVAL` from the
/// process environment instead of using the defaults.
///
/// ### 中文
/// 从进程环境变量读取 `XIAN_RENDER_REFRESH_RATE`、`XIAN_FPS_TRACKING` 与
/// `XIAN_UPDATE_STATUS_INTERVAL`，而不是使用默认值。
pub const XIAN_RENDER_LOOP_FLAG_READ_ENVIRONMENT: u32 = 1 << 1;

/// ### English
/// The surface passed at creation needs post-render synchronization: after each presented frame
/// the render thread waits for `xian_render_loop_post_render_complete`.
///
/// ### 中文
/// 创建时传入的 surface 需要渲染后同步：每次 present 之后渲染线程会等待
/// `xian_render_loop_post_render_complete`。
pub const XIAN_RENDER_LOOP_FLAG_POST_RENDER_SYNC: u32 = 1 << 2;
