/// ### English
/// Cross-thread rendezvous primitives shared by the controller and the render thread.
///
/// ### 中文
/// 控制器与渲染线程共用的跨线程会合原语。
mod handshake;

pub(crate) use handshake::Reply;
