//! ### English
//! Embedder-provided EGL function table.
//!
//! The host already links EGL (and usually created the display), so instead of locating
//! `libEGL` by name the render loop receives thin wrappers as raw function addresses.
//!
//! ### 中文
//! 由宿主提供的 EGL 函数表。
//!
//! 宿主已经链接了 EGL（通常也已创建 display），因此渲染循环不按名字查找 `libEGL`，
//! 而是以原始函数地址的形式接收一组薄封装。

use std::ffi::{c_char, c_int, c_void};

use crate::engine::error::GraphicsError;

/// ### English
/// `int initialize(void* user_data)`; returns 0 on success.
///
/// ### 中文
/// `int initialize(void* user_data)`；成功返回 0。
type EglInitialize = unsafe extern "C" fn(*mut c_void) -> c_int;
type EglTerminate = unsafe extern "C" fn(*mut c_void);
/// ### English
/// `uintptr_t create_surface(void* user_data, uintptr_t native_window, uint32_t w, uint32_t h)`;
/// returns the EGL surface or 0 on failure.
///
/// ### 中文
/// `uintptr_t create_surface(void* user_data, uintptr_t native_window, uint32_t w, uint32_t h)`；
/// 返回 EGL surface，失败返回 0。
type EglCreateSurface = unsafe extern "C" fn(*mut c_void, usize, u32, u32) -> usize;
type EglDestroySurface = unsafe extern "C" fn(*mut c_void, usize);
type EglResizeSurface = unsafe extern "C" fn(*mut c_void, usize, u32, u32) -> c_int;
type EglMakeCurrent = unsafe extern "C" fn(*mut c_void, usize) -> c_int;
type EglMakeContextNull = unsafe extern "C" fn(*mut c_void);
type EglSwapBuffers = unsafe extern "C" fn(*mut c_void, usize) -> c_int;
type EglGetProcAddress = unsafe extern "C" fn(*mut c_void, *const c_char) -> *const c_void;

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// Function pointer table for EGL wrappers provided by the embedder.
///
/// All function fields are raw addresses (`usize`) and must be non-zero. `user_data` is passed
/// back unchanged as the first argument of every call.
///
/// ### 中文
/// 由宿主提供的 EGL 封装函数指针表。
///
/// 所有函数字段都是原始地址（`usize`），且必须非 0。`user_data` 会原样作为每次调用的第一个参数。
pub struct EmbedderEglApi {
    pub user_data: usize,
    pub initialize: usize,
    pub terminate: usize,
    pub create_surface: usize,
    pub destroy_surface: usize,
    pub resize_surface: usize,
    pub make_current: usize,
    pub make_context_null: usize,
    pub swap_buffers: usize,
    pub get_proc_address: usize,
}

/// ### English
/// Validated, typed view of an `EmbedderEglApi`.
///
/// ### 中文
/// 经过校验的、带类型的 `EmbedderEglApi` 视图。
#[derive(Clone, Copy)]
pub(crate) struct LoadedEglApi {
    user_data: *mut c_void,
    initialize: EglInitialize,
    terminate: EglTerminate,
    create_surface: EglCreateSurface,
    destroy_surface: EglDestroySurface,
    resize_surface: EglResizeSurface,
    make_current: EglMakeCurrent,
    make_context_null: EglMakeContextNull,
    swap_buffers: EglSwapBuffers,
    get_proc_address: EglGetProcAddress,
}

/// ### English
/// The embedder guarantees its wrappers may be called from the render thread.
///
/// ### 中文
/// 宿主保证这些封装可以在渲染线程调用。
unsafe impl Send for LoadedEglApi {}

impl LoadedEglApi {
    /// ### English
    /// Validates every function address and converts the table into typed function pointers.
    ///
    /// # Safety
    /// Every non-zero address must point to a function with the documented signature.
    ///
    /// ### 中文
    /// 校验所有函数地址，并将函数表转换为带类型的函数指针。
    ///
    /// # Safety
    /// 所有非 0 地址都必须指向签名与文档一致的函数。
    pub(crate) unsafe fn load(api: EmbedderEglApi) -> Result<Self, GraphicsError> {
        let checks = [
            (api.initialize, "initialize"),
            (api.terminate, "terminate"),
            (api.create_surface, "create_surface"),
            (api.destroy_surface, "destroy_surface"),
            (api.resize_surface, "resize_surface"),
            (api.make_current, "make_current"),
            (api.make_context_null, "make_context_null"),
            (api.swap_buffers, "swap_buffers"),
            (api.get_proc_address, "get_proc_address"),
        ];
        if let Some((_, name)) = checks.iter().find(|(address, _)| *address == 0) {
            return Err(GraphicsError::MissingSymbol(name));
        }

        Ok(Self {
            user_data: api.user_data as *mut c_void,
            initialize: unsafe { std::mem::transmute::<usize, EglInitialize>(api.initialize) },
            terminate: unsafe { std::mem::transmute::<usize, EglTerminate>(api.terminate) },
            create_surface: unsafe {
                std::mem::transmute::<usize, EglCreateSurface>(api.create_surface)
            },
            destroy_surface: unsafe {
                std::mem::transmute::<usize, EglDestroySurface>(api.destroy_surface)
            },
            resize_surface: unsafe {
                std::mem::transmute::<usize, EglResizeSurface>(api.resize_surface)
            },
            make_current: unsafe {
                std::mem::transmute::<usize, EglMakeCurrent>(api.make_current)
            },
            make_context_null: unsafe {
                std::mem::transmute::<usize, EglMakeContextNull>(api.make_context_null)
            },
            swap_buffers: unsafe {
                std::mem::transmute::<usize, EglSwapBuffers>(api.swap_buffers)
            },
            get_proc_address: unsafe {
                std::mem::transmute::<usize, EglGetProcAddress>(api.get_proc_address)
            },
        })
    }

    pub(crate) fn initialize(&self) -> Result<(), GraphicsError> {
        match unsafe { (self.initialize)(self.user_data) } {
            0 => Ok(()),
            code => Err(GraphicsError::ContextCreation(format!(
                "embedder initialize returned {code}"
            ))),
        }
    }

    pub(crate) fn terminate(&self) {
        unsafe { (self.terminate)(self.user_data) }
    }

    pub(crate) fn create_surface(
        &self,
        native_window: usize,
        width: u32,
        height: u32,
    ) -> Result<usize, GraphicsError> {
        match unsafe { (self.create_surface)(self.user_data, native_window, width, height) } {
            0 => Err(GraphicsError::Surface(format!(
                "create_surface failed for window 0x{native_window:x}"
            ))),
            surface => Ok(surface),
        }
    }

    pub(crate) fn destroy_surface(&self, surface: usize) {
        unsafe { (self.destroy_surface)(self.user_data, surface) }
    }

    pub(crate) fn resize_surface(
        &self,
        surface: usize,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError> {
        match unsafe { (self.resize_surface)(self.user_data, surface, width, height) } {
            0 => Ok(()),
            code => Err(GraphicsError::Surface(format!(
                "resize_surface returned {code}"
            ))),
        }
    }

    pub(crate) fn make_current(&self, surface: usize) -> Result<(), GraphicsError> {
        match unsafe { (self.make_current)(self.user_data, surface) } {
            0 => Ok(()),
            code => Err(GraphicsError::MakeCurrent(format!(
                "make_current returned {code}"
            ))),
        }
    }

    pub(crate) fn make_context_null(&self) {
        unsafe { (self.make_context_null)(self.user_data) }
    }

    pub(crate) fn swap_buffers(&self, surface: usize) -> Result<(), GraphicsError> {
        match unsafe { (self.swap_buffers)(self.user_data, surface) } {
            0 => Ok(()),
            code => Err(GraphicsError::Present(format!(
                "swap_buffers returned {code}"
            ))),
        }
    }

    /// ### English
    /// Resolves a GL entry point; returns null if unknown.
    ///
    /// # Safety
    /// `name` must be a valid NUL-terminated string.
    ///
    /// ### 中文
    /// 解析 GL 入口函数；未知时返回 null。
    ///
    /// # Safety
    /// `name` 必须是合法的 NUL 结尾字符串。
    pub(crate) unsafe fn get_proc_address(&self, name: *const c_char) -> *const c_void {
        unsafe { (self.get_proc_address)(self.user_data, name) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_symbol_is_named() {
        let api = EmbedderEglApi {
            initialize: 1,
            terminate: 1,
            create_surface: 1,
            destroy_surface: 1,
            resize_surface: 1,
            make_current: 0,
            make_context_null: 1,
            swap_buffers: 1,
            get_proc_address: 1,
            ..EmbedderEglApi::default()
        };
        let err = unsafe { LoadedEglApi::load(api) }.err();
        assert_eq!(err, Some(GraphicsError::MissingSymbol("make_current")));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = unsafe { LoadedEglApi::load(EmbedderEglApi::default()) }.err();
        assert_eq!(err, Some(GraphicsError::MissingSymbol("initialize")));
    }
}
