/// ### English
/// GLES backend over the embedder EGL table.
/// GL entry points are loaded with `glow` the first time a surface is made current.
///
/// ### 中文
/// 基于宿主 EGL 函数表的 GLES 后端。
/// 首次将 surface 设为 current 时使用 `glow` 加载 GL 入口函数。
use std::ffi::CString;

use dpi::PhysicalSize;
use glow::HasContext as _;

use super::egl::{EmbedderEglApi, LoadedEglApi};
use super::{GraphicsApi, GraphicsBackend, SurfaceHandle, same_surface};
use crate::engine::error::GraphicsError;

fn parse_gl_version(version: &str) -> (u32, u32) {
    /// ### English
    /// Expected forms: `"OpenGL ES 3.2 ..."` or `"4.6.0 ..."`.
    ///
    /// ### 中文
    /// 期望的版本字符串形式：`"OpenGL ES 3.2 ..."` 或 `"4.6.0 ..."`。
    let number_token = version
        .split_whitespace()
        .find(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()));
    let Some(token) = number_token else {
        return (0, 0);
    };
    let mut parts = token.split('.');
    let major = parts.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);
    (major, minor)
}

/// ### English
/// GL entry points the backend itself calls; without them no `glow` context is built.
///
/// ### 中文
/// 后端自身会调用的 GL 入口函数；缺少任一个时不会创建 `glow` 上下文。
const REQUIRED_GL_SYMBOLS: [&str; 3] = ["glGetString", "glFinish", "glGetError"];

/// ### English
/// `GraphicsBackend` for GLES through an `EmbedderEglApi`.
///
/// ### 中文
/// 通过 `EmbedderEglApi` 驱动 GLES 的 `GraphicsBackend`。
pub struct GlesBackend {
    egl: LoadedEglApi,
    /// ### English
    /// Backend surfaces keyed by surface identity: `(handle, EGL surface)`.
    ///
    /// ### 中文
    /// 以 surface 身份为键的后端 surface：`(句柄, EGL surface)`。
    surfaces: Vec<(SurfaceHandle, usize)>,
    gl: Option<glow::Context>,
    gl_probed: bool,
    initialized: bool,
}

/// ### English
/// Built on the event thread, then used only by the render thread.
///
/// ### 中文
/// 在事件线程构造，之后只由渲染线程使用。
unsafe impl Send for GlesBackend {}

impl GlesBackend {
    /// ### English
    /// Validates the embedder table and creates an uninitialized backend.
    ///
    /// # Safety
    /// Every address in `api` must point to a function with the documented signature, callable
    /// from the render thread.
    ///
    /// ### 中文
    /// 校验宿主函数表并创建一个尚未初始化的后端。
    ///
    /// # Safety
    /// `api` 中的每个地址都必须指向签名与文档一致、且可在渲染线程调用的函数。
    pub unsafe fn new(api: EmbedderEglApi) -> Result<Self, GraphicsError> {
        let egl = unsafe { LoadedEglApi::load(api)? };
        Ok(Self {
            egl,
            surfaces: Vec::new(),
            gl: None,
            gl_probed: false,
            initialized: false,
        })
    }

    fn egl_surface(&self, surface: &SurfaceHandle) -> Result<usize, GraphicsError> {
        self.surfaces
            .iter()
            .find(|(handle, _)| same_surface(handle, surface))
            .map(|(_, egl_surface)| *egl_surface)
            .ok_or_else(|| GraphicsError::Surface("surface was never created".to_string()))
    }

    fn load_gl(&mut self) {
        if self.gl_probed {
            return;
        }
        self.gl_probed = true;
        let egl = self.egl;
        let resolve = |name: &str| {
            CString::new(name)
                .map(|name| unsafe { egl.get_proc_address(name.as_ptr()) })
                .unwrap_or(std::ptr::null())
        };
        if let Some(missing) = REQUIRED_GL_SYMBOLS
            .iter()
            .find(|&&name| resolve(name).is_null())
        {
            log::warn!("{missing} unavailable; GL error checks disabled");
            return;
        }

        let glow = unsafe { glow::Context::from_loader_function(resolve) };
        let version = unsafe { glow.get_parameter_string(glow::VERSION) };
        let (major, minor) = parse_gl_version(&version);
        log::info!("GL context ready: {version} (parsed {major}.{minor})");
        self.gl = Some(glow);
    }
}

impl GraphicsBackend for GlesBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Gles
    }

    fn initialize(&mut self) -> Result<(), GraphicsError> {
        if self.initialized {
            return Ok(());
        }
        self.egl.initialize()?;
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.egl.make_context_null();
        for (_, egl_surface) in self.surfaces.drain(..) {
            self.egl.destroy_surface(egl_surface);
        }
        self.gl = None;
        self.gl_probed = false;
        self.egl.terminate();
        self.initialized = false;
    }

    fn create_surface(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError> {
        if self.egl_surface(surface).is_ok() {
            return Ok(());
        }
        let size = surface.size();
        let egl_surface =
            self.egl
                .create_surface(surface.native_window(), size.width, size.height)?;
        self.surfaces.push((surface.clone(), egl_surface));
        Ok(())
    }

    fn destroy_surface(&mut self, surface: &SurfaceHandle) {
        if let Some(index) = self
            .surfaces
            .iter()
            .position(|(handle, _)| same_surface(handle, surface))
        {
            let (_, egl_surface) = self.surfaces.swap_remove(index);
            self.egl.destroy_surface(egl_surface);
        }
    }

    fn resize_surface(
        &mut self,
        surface: &SurfaceHandle,
        size: PhysicalSize<u32>,
    ) -> Result<(), GraphicsError> {
        let egl_surface = self.egl_surface(surface)?;
        self.egl.resize_surface(egl_surface, size.width, size.height)
    }

    fn make_current(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError> {
        let egl_surface = self.egl_surface(surface)?;
        self.egl.make_current(egl_surface)?;
        self.load_gl();
        Ok(())
    }

    fn make_context_null(&mut self) {
        self.egl.make_context_null();
    }

    fn present(&mut self, surface: &SurfaceHandle) -> Result<(), GraphicsError> {
        let egl_surface = self.egl_surface(surface)?;
        self.egl.swap_buffers(egl_surface)
    }

    fn wait_client(&mut self) {
        if let Some(gl) = &self.gl {
            unsafe { gl.finish() };
        }
    }

    fn take_error(&mut self) -> Result<(), GraphicsError> {
        let Some(gl) = &self.gl else {
            return Ok(());
        };
        match unsafe { gl.get_error() } {
            glow::NO_ERROR => Ok(()),
            code => Err(GraphicsError::Gl(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_desktop_and_es_versions() {
        assert_eq!(parse_gl_version("OpenGL ES 3.2 Mesa 24.0"), (3, 2));
        assert_eq!(parse_gl_version("4.6.0 NVIDIA 550.54"), (4, 6));
        assert_eq!(parse_gl_version("garbage"), (0, 0));
    }
}
