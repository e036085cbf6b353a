/// ### English
/// Render loop internals: the update/render thread, its controller, frame pacing and the
/// collaborator boundaries (scene, graphics backend, VSync source, event-thread bridge).
///
/// ### 中文
/// 渲染循环内部模块：update/render 线程及其控制器、帧节奏控制，
/// 以及与外部协作方的边界（场景、图形后端、VSync 源、事件线程桥）。
pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod flags;
pub mod graphics;
pub mod scene;
pub mod stats;
pub(crate) mod sync;
pub mod vsync;
