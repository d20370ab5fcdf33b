/// Render target
///
/// A set of attachments rendered into by a pass. Color and depth textures are
/// caller-owned `TextureRef`s; the target owns only its framebuffers and
/// renderbuffers. Multisampled targets render into a renderbuffer-backed
/// framebuffer and resolve into the texture-backed one.

use crate::capabilities::Capabilities;
use crate::error::{Error, Result};
use crate::native::{
    Attachment, BlitFilter, ClearFlags, FramebufferTarget, NativeContext, NativeFramebuffer, NativeRenderbuffer,
    NativeTexture, PixelFormat, TextureTarget,
};
use crate::resource::{ensure_context, DeviceId, DeviceLink, ResourceId, TextureRef};

const SOURCE: &str = "lumen::RenderTarget";

/// Descriptor for creating a render target
#[derive(Debug, Clone)]
pub struct RenderTargetDesc {
    pub name: String,
    pub color_buffers: Vec<TextureRef>,
    /// Sampleable depth attachment; takes precedence over `depth`
    pub depth_buffer: Option<TextureRef>,
    /// Allocate a depth renderbuffer when no depth texture is given
    pub depth: bool,
    pub stencil: bool,
    /// MSAA sample count (1 = no multisampling)
    pub samples: u32,
    /// Resolve MSAA at `update_end`
    pub auto_resolve: bool,
    /// Face rendered into when the color buffers are cube maps
    pub face: u32,
}

impl Default for RenderTargetDesc {
    fn default() -> Self {
        Self {
            name: String::from("render_target"),
            color_buffers: Vec::new(),
            depth_buffer: None,
            depth: true,
            stencil: false,
            samples: 1,
            auto_resolve: true,
            face: 0,
        }
    }
}

/// Color attachment as seen by `RenderTarget::initialize`
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttachmentTexture {
    pub texture: NativeTexture,
    pub target: TextureTarget,
    pub format: PixelFormat,
}

#[derive(Debug)]
pub struct RenderTarget {
    id: ResourceId,
    desc: RenderTargetDesc,
    /// Effective sample count (clamped at initialization)
    samples: u32,
    framebuffer: Option<NativeFramebuffer>,
    depth_renderbuffer: Option<NativeRenderbuffer>,
    msaa_framebuffer: Option<NativeFramebuffer>,
    msaa_color: Vec<NativeRenderbuffer>,
    msaa_depth: Option<NativeRenderbuffer>,
    pub(crate) link: DeviceLink,
}

impl RenderTarget {
    pub fn new(desc: RenderTargetDesc) -> Self {
        let samples = desc.samples.max(1);
        Self {
            id: ResourceId::next(),
            desc,
            samples,
            framebuffer: None,
            depth_renderbuffer: None,
            msaa_framebuffer: None,
            msaa_color: Vec::new(),
            msaa_depth: None,
            link: DeviceLink::default(),
        }
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn color_buffers(&self) -> &[TextureRef] {
        &self.desc.color_buffers
    }

    pub fn color_buffer(&self, index: usize) -> Option<&TextureRef> {
        self.desc.color_buffers.get(index)
    }

    pub fn depth_buffer(&self) -> Option<&TextureRef> {
        self.desc.depth_buffer.as_ref()
    }

    pub fn has_depth(&self) -> bool {
        self.desc.depth || self.desc.depth_buffer.is_some()
    }

    pub fn has_stencil(&self) -> bool {
        self.desc.stencil
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn auto_resolve(&self) -> bool {
        self.desc.auto_resolve
    }

    /// Size of the first attachment
    pub fn size(&self) -> (u32, u32) {
        self.desc
            .color_buffers
            .first()
            .or(self.desc.depth_buffer.as_ref())
            .map(|texture| {
                let texture = texture.borrow();
                (texture.width(), texture.height())
            })
            .unwrap_or((0, 0))
    }

    pub fn width(&self) -> u32 {
        self.size().0
    }

    pub fn height(&self) -> u32 {
        self.size().1
    }

    pub fn is_initialized(&self) -> bool {
        self.framebuffer.is_some()
    }

    /// Texture-backed (resolved) framebuffer
    pub fn framebuffer(&self) -> Option<NativeFramebuffer> {
        self.framebuffer
    }

    /// Framebuffer draws go to (the multisampled one when present)
    pub fn draw_framebuffer(&self) -> Option<NativeFramebuffer> {
        self.msaa_framebuffer.or(self.framebuffer)
    }

    // ===== DEVICE INTERFACE =====

    /// Create framebuffers and renderbuffers for already-initialized textures
    ///
    /// Leaves `draw_framebuffer()` bound to the framebuffer target.
    pub(crate) fn initialize(
        &mut self,
        native: &mut dyn NativeContext,
        caps: &Capabilities,
        colors: &[AttachmentTexture],
        depth_texture: Option<AttachmentTexture>,
        device: DeviceId,
        generation: u64,
    ) -> Result<()> {
        ensure_context(native)?;
        if colors.is_empty() && depth_texture.is_none() && !self.desc.depth {
            let message = format!("render target '{}' has no attachments", self.desc.name);
            crate::gfx_error!(SOURCE, "{}", message);
            return Err(Error::InvalidResource(message));
        }
        if let Err(e) = self.build(native, caps, colors, depth_texture) {
            // Partially created objects are released; the next use retries
            self.destroy(native);
            native.bind_framebuffer(FramebufferTarget::Framebuffer, None);
            return Err(e);
        }
        self.link = DeviceLink { device: Some(device), generation };

        crate::gfx_debug!(
            SOURCE,
            "Render target '{}' created ({}x{}, {} color, {} samples)",
            self.desc.name,
            self.size().0,
            self.size().1,
            colors.len(),
            self.samples
        );
        Ok(())
    }

    fn build(
        &mut self,
        native: &mut dyn NativeContext,
        caps: &Capabilities,
        colors: &[AttachmentTexture],
        depth_texture: Option<AttachmentTexture>,
    ) -> Result<()> {
        let (width, height) = self.size();
        self.samples = self.desc.samples.clamp(1, caps.max_samples.max(1));

        let framebuffer = create_framebuffer(native, &self.desc.name)?;
        self.framebuffer = Some(framebuffer);
        native.bind_framebuffer(FramebufferTarget::Framebuffer, Some(framebuffer));

        for (index, color) in colors.iter().enumerate() {
            let face = if color.target == TextureTarget::CubeMap { self.desc.face } else { 0 };
            native.framebuffer_texture_2d(Attachment::Color(index as u32), color.target, face, Some(color.texture), 0);
        }
        self.set_draw_buffers(native, caps, colors.len());

        let depth_attachment = if self.desc.stencil { Attachment::DepthStencil } else { Attachment::Depth };
        let depth_format = if self.desc.stencil { PixelFormat::Depth24Stencil8 } else { PixelFormat::Depth16 };
        if let Some(depth) = depth_texture {
            let attachment = if depth.format.has_stencil() { Attachment::DepthStencil } else { Attachment::Depth };
            native.framebuffer_texture_2d(attachment, TextureTarget::Texture2D, 0, Some(depth.texture), 0);
        } else if self.desc.depth && self.samples <= 1 {
            let renderbuffer = create_renderbuffer(native, &self.desc.name)?;
            native.renderbuffer_storage(renderbuffer, 0, depth_format, width, height);
            native.framebuffer_renderbuffer(depth_attachment, Some(renderbuffer));
            self.depth_renderbuffer = Some(renderbuffer);
        }

        if !native.check_framebuffer_status() && cfg!(debug_assertions) {
            crate::gfx_warn!(SOURCE, "Framebuffer of '{}' is incomplete", self.desc.name);
        }

        if self.samples > 1 {
            let msaa = create_framebuffer(native, &self.desc.name)?;
            self.msaa_framebuffer = Some(msaa);
            native.bind_framebuffer(FramebufferTarget::Framebuffer, Some(msaa));

            for (index, color) in colors.iter().enumerate() {
                let renderbuffer = create_renderbuffer(native, &self.desc.name)?;
                native.renderbuffer_storage(renderbuffer, self.samples, color.format, width, height);
                native.framebuffer_renderbuffer(Attachment::Color(index as u32), Some(renderbuffer));
                self.msaa_color.push(renderbuffer);
            }
            self.set_draw_buffers(native, caps, colors.len());

            if self.has_depth() {
                let renderbuffer = create_renderbuffer(native, &self.desc.name)?;
                native.renderbuffer_storage(renderbuffer, self.samples, depth_format, width, height);
                native.framebuffer_renderbuffer(depth_attachment, Some(renderbuffer));
                self.msaa_depth = Some(renderbuffer);
            }

            if !native.check_framebuffer_status() && cfg!(debug_assertions) {
                crate::gfx_warn!(SOURCE, "Multisampled framebuffer of '{}' is incomplete", self.desc.name);
            }
        }
        Ok(())
    }

    fn set_draw_buffers(&self, native: &mut dyn NativeContext, caps: &Capabilities, count: usize) {
        if count <= 1 {
            return;
        }
        if caps.multiple_render_targets {
            let attachments: Vec<Attachment> = (0..count as u32).map(Attachment::Color).collect();
            native.draw_buffers(&attachments);
        } else {
            crate::gfx_warn!(SOURCE, "'{}' has {} color buffers but MRT is unsupported", self.desc.name, count);
        }
    }

    /// Blit the multisampled attachments into the resolved framebuffer
    ///
    /// Leaves the resolved framebuffer bound to the framebuffer target.
    pub(crate) fn resolve(&self, native: &mut dyn NativeContext, color: bool, depth: bool) {
        let (Some(msaa), Some(framebuffer)) = (self.msaa_framebuffer, self.framebuffer) else {
            return;
        };
        let (width, height) = self.size();
        let rect = [0, 0, width as i32, height as i32];

        native.bind_framebuffer(FramebufferTarget::Read, Some(msaa));
        native.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));

        if color {
            let count = self.msaa_color.len();
            for index in 0..count {
                // Route the single read attachment to the matching draw slot
                let mut draw = vec![Attachment::None; count];
                draw[index] = Attachment::Color(index as u32);
                native.read_buffer(Attachment::Color(index as u32));
                if count > 1 {
                    native.draw_buffers(&draw);
                }
                native.blit_framebuffer(rect, rect, ClearFlags::COLOR, BlitFilter::Nearest);
            }
            if count > 1 {
                let all: Vec<Attachment> = (0..count as u32).map(Attachment::Color).collect();
                native.draw_buffers(&all);
            }
        }

        if depth && self.desc.depth_buffer.is_some() {
            native.blit_framebuffer(rect, rect, ClearFlags::DEPTH, BlitFilter::Nearest);
        }

        native.bind_framebuffer(FramebufferTarget::Framebuffer, Some(framebuffer));
    }

    pub(crate) fn lose_context(&mut self) {
        self.framebuffer = None;
        self.depth_renderbuffer = None;
        self.msaa_framebuffer = None;
        self.msaa_color.clear();
        self.msaa_depth = None;
        self.link.generation = 0;
    }

    /// Delete the framebuffer objects. Attached textures are left to their owner.
    pub(crate) fn destroy(&mut self, native: &mut dyn NativeContext) {
        for framebuffer in [self.framebuffer.take(), self.msaa_framebuffer.take()].into_iter().flatten() {
            native.delete_framebuffer(framebuffer);
        }
        let mut renderbuffers: Vec<NativeRenderbuffer> = self.msaa_color.drain(..).collect();
        renderbuffers.extend(self.depth_renderbuffer.take());
        renderbuffers.extend(self.msaa_depth.take());
        for renderbuffer in renderbuffers {
            native.delete_renderbuffer(renderbuffer);
        }
        self.link = DeviceLink::default();
    }
}

fn create_framebuffer(native: &mut dyn NativeContext, name: &str) -> Result<NativeFramebuffer> {
    match native.create_framebuffer() {
        Ok(framebuffer) => Ok(framebuffer),
        Err(e) => crate::gfx_bail!(SOURCE, "Failed to create framebuffer for '{}': {}", name, e),
    }
}

fn create_renderbuffer(native: &mut dyn NativeContext, name: &str) -> Result<NativeRenderbuffer> {
    match native.create_renderbuffer() {
        Ok(renderbuffer) => Ok(renderbuffer),
        Err(e) => crate::gfx_bail!(SOURCE, "Failed to create renderbuffer for '{}': {}", name, e),
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
