/// GraphicsDevice render passes
///
/// A pass binds its render target, sets the full-size viewport and scissor,
/// clears, and at its end discards unneeded attachments, resolves
/// multisampled color and regenerates mip chains. `update_begin` /
/// `update_end` give the same bracketing to raw rendering done outside the
/// pass API.

use std::rc::{Rc, Weak};

use crate::native::{Attachment, BlitFilter, ClearFlags, FramebufferTarget, NativeFramebuffer};
use crate::resource::{AttachmentTexture, RenderTarget, RenderTargetRef, TextureRef};
use crate::state::ClearOptions;

use super::graphics_device::{GraphicsDevice, SOURCE};

/// What happens to one color attachment at the pass boundaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorOps {
    pub clear: bool,
    pub clear_value: [f32; 4],
    /// Keep the rendered contents after the pass
    pub store: bool,
    /// Resolve the multisampled contents into the texture
    pub resolve: bool,
    /// Regenerate the texture's mip chain
    pub mipmaps: bool,
}

impl Default for ColorOps {
    fn default() -> Self {
        Self {
            clear: false,
            clear_value: [0.0, 0.0, 0.0, 1.0],
            store: true,
            resolve: true,
            mipmaps: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilOps {
    pub clear_depth: bool,
    pub clear_depth_value: f32,
    pub clear_stencil: bool,
    pub clear_stencil_value: i32,
    pub store_depth: bool,
    pub store_stencil: bool,
    pub resolve_depth: bool,
}

impl Default for DepthStencilOps {
    fn default() -> Self {
        Self {
            clear_depth: false,
            clear_depth_value: 1.0,
            clear_stencil: false,
            clear_stencil_value: 0,
            store_depth: false,
            store_stencil: false,
            resolve_depth: false,
        }
    }
}

/// Render pass description
#[derive(Debug, Clone, Default)]
pub struct RenderPassDesc {
    pub name: String,
    /// `None` renders to the drawing buffer
    pub render_target: Option<RenderTargetRef>,
    /// One entry per color buffer; the first entry's clear value is used for the clear
    pub color_ops: Vec<ColorOps>,
    pub depth_stencil_ops: DepthStencilOps,
    /// The pass covers the whole target, so discarded attachments can be invalidated
    pub full_size_clear_rect: bool,
}

impl RenderPassDesc {
    fn clear_options(&self) -> ClearOptions {
        let mut options = ClearOptions {
            flags: ClearFlags::empty(),
            ..ClearOptions::default()
        };
        if let Some(color) = self.color_ops.first().filter(|color| color.clear) {
            options.color = color.clear_value;
            options.flags |= ClearFlags::COLOR;
        }
        let depth_stencil = &self.depth_stencil_ops;
        if depth_stencil.clear_depth {
            options.depth = depth_stencil.clear_depth_value;
            options.flags |= ClearFlags::DEPTH;
        }
        if depth_stencil.clear_stencil {
            options.stencil = depth_stencil.clear_stencil_value;
            options.flags |= ClearFlags::STENCIL;
        }
        options
    }
}

impl GraphicsDevice {
    // ===== RENDER TARGET =====

    /// Target of the next `update_begin` / pass (`None` = drawing buffer)
    ///
    /// The device keeps only a weak reference.
    pub fn set_render_target(&mut self, target: Option<&RenderTargetRef>) {
        self.render_target = target.map(Rc::downgrade);
    }

    pub fn render_target(&self) -> Option<RenderTargetRef> {
        self.render_target.as_ref().and_then(Weak::upgrade)
    }

    /// Bind the current render target's framebuffer (or the drawing buffer)
    ///
    /// Returns `false`, leaving the binding untouched, when the target
    /// belongs to another device or cannot be created.
    pub fn update_begin(&mut self) -> bool {
        self.debug_assert_live();
        let mut framebuffer = None;
        if let Some(target) = self.current_render_target() {
            if !self.prepare_render_target(&target) {
                return false;
            }
            framebuffer = target.borrow().draw_framebuffer();
        }
        self.bind_framebuffer(framebuffer);
        true
    }

    /// Resolve and regenerate mipmaps for the current render target
    pub fn update_end(&mut self) {
        self.debug_assert_live();
        self.bind_vertex_array(None);

        let Some(target) = self.current_render_target() else {
            return;
        };
        let target = target.borrow();
        if !target.link.is_current(self.id, self.generation) {
            return;
        }
        if target.samples() > 1 && target.auto_resolve() {
            target.resolve(self.native.as_mut(), true, false);
            self.bound_framebuffer = target.framebuffer();
        }
        self.generate_target_mipmaps(&target, |_| true);
    }

    // ===== PASSES =====

    /// Bind the pass target, set the full-size viewport and scissor, then clear
    ///
    /// Returns `false` without touching viewport, scissor or any buffer when
    /// the target cannot be bound.
    pub fn start_pass(&mut self, pass: &RenderPassDesc) -> bool {
        self.debug_assert_live();
        if self.inside_pass && cfg!(debug_assertions) {
            crate::gfx_error!(SOURCE, "start_pass('{}') called while a render pass is active", pass.name);
        }

        self.set_render_target(pass.render_target.as_ref());
        if !self.update_begin() {
            crate::gfx_warn!(SOURCE, "Render pass '{}' skipped: its render target is unusable", pass.name);
            return false;
        }

        let (width, height) = self.target_size();
        let full = [0, 0, width as i32, height as i32];
        self.state.set_viewport(self.native.as_mut(), full);
        self.state.set_scissor(self.native.as_mut(), full);

        self.state.clear(self.native.as_mut(), &pass.clear_options());

        self.inside_pass = true;
        self.stats.render_passes += 1;
        true
    }

    pub fn end_pass(&mut self, pass: &RenderPassDesc) {
        self.debug_assert_live();
        self.bind_vertex_array(None);
        self.inside_pass = false;

        let Some(target) = self.current_render_target() else {
            return;
        };
        let target = target.borrow();
        if !target.link.is_current(self.id, self.generation) {
            return;
        }

        let color_ops = |index: usize| pass.color_ops.get(index).copied().unwrap_or_default();
        let depth_stencil = &pass.depth_stencil_ops;

        if self.caps.is_modern() && pass.full_size_clear_rect {
            let mut discard: Vec<Attachment> = (0..target.color_buffers().len())
                .filter(|&index| {
                    let ops = color_ops(index);
                    !ops.store && !ops.resolve
                })
                .map(|index| Attachment::Color(index as u32))
                .collect();
            if target.has_depth() && !depth_stencil.store_depth && !depth_stencil.resolve_depth {
                discard.push(Attachment::Depth);
            }
            if target.has_stencil() && !depth_stencil.store_stencil {
                discard.push(Attachment::Stencil);
            }
            if !discard.is_empty() {
                self.bind_framebuffer(target.draw_framebuffer());
                self.native.invalidate_framebuffer(FramebufferTarget::Framebuffer, &discard);
            }
        }

        if target.samples() > 1 {
            let color = (0..target.color_buffers().len()).any(|index| color_ops(index).resolve);
            if color || depth_stencil.resolve_depth {
                target.resolve(self.native.as_mut(), color, depth_stencil.resolve_depth);
                self.bound_framebuffer = target.framebuffer();
            }
        }

        self.generate_target_mipmaps(&target, |index| color_ops(index).mipmaps);
    }

    pub fn is_inside_pass(&self) -> bool {
        self.inside_pass
    }

    /// Clear the bound framebuffer through the state cache
    pub fn clear(&mut self, options: &ClearOptions) {
        self.debug_assert_live();
        self.state.clear(self.native.as_mut(), options);
    }

    // ===== COPIES =====

    /// Copy color and/or depth between render targets (`None` = drawing buffer)
    ///
    /// Returns `false` when the copy is not possible (empty or mismatched
    /// attachments, depth or back-buffer copies on a legacy context).
    pub fn copy_render_target(
        &mut self,
        source: Option<&RenderTargetRef>,
        dest: Option<&RenderTargetRef>,
        color: bool,
        depth: bool,
    ) -> bool {
        self.debug_assert_live();
        let previous = self.bound_framebuffer;
        let copied = self.copy_attachments(source, dest, color, depth);

        // Preparing a target binds its framebuffer
        self.native.bind_framebuffer(FramebufferTarget::Framebuffer, previous);
        self.bound_framebuffer = previous;
        copied
    }

    fn copy_attachments(
        &mut self,
        source_ref: Option<&RenderTargetRef>,
        dest_ref: Option<&RenderTargetRef>,
        color: bool,
        depth: bool,
    ) -> bool {
        for target in [source_ref, dest_ref].into_iter().flatten() {
            if !self.prepare_render_target(target) {
                return false;
            }
        }
        let source = source_ref.map(|target| target.borrow());
        let dest = dest_ref.map(|target| target.borrow());

        if let Err(reason) = validate_copy(source.as_deref(), dest.as_deref(), color, depth) {
            return self.refuse_copy(reason);
        }

        let source_size = source.as_ref().map_or_else(|| self.native.drawing_buffer_size(), |target| target.size());
        let dest_size = dest.as_ref().map_or_else(|| self.native.drawing_buffer_size(), |target| target.size());

        if self.caps.is_modern() {
            let mut mask = ClearFlags::empty();
            mask.set(ClearFlags::COLOR, color);
            mask.set(ClearFlags::DEPTH, depth);

            self.native.bind_framebuffer(FramebufferTarget::Read, source.as_ref().and_then(|t| t.draw_framebuffer()));
            self.native.bind_framebuffer(FramebufferTarget::Draw, dest.as_ref().and_then(|t| t.framebuffer()));
            self.native.blit_framebuffer(
                [0, 0, source_size.0 as i32, source_size.1 as i32],
                [0, 0, dest_size.0 as i32, dest_size.1 as i32],
                mask,
                BlitFilter::Nearest,
            );
        } else {
            if depth {
                return self.refuse_copy("depth copies need a modern context");
            }
            let Some(dest) = dest.as_ref() else {
                return self.refuse_copy("copies into the drawing buffer need a modern context");
            };
            let Some(texture) = dest.color_buffer(0).cloned() else {
                return self.refuse_copy("destination has no color buffer");
            };

            self.native.bind_framebuffer(FramebufferTarget::Framebuffer, source.as_ref().and_then(|t| t.framebuffer()));
            let texture = texture.borrow();
            let scratch = self.units.scratch_unit();
            self.units.bind_on_unit(self.native.as_mut(), scratch, texture.target(), texture.native_handle());
            self.native.copy_tex_sub_image_2d(texture.target(), 0, dest_size.0, dest_size.1);
        }
        true
    }

    pub fn destroy_render_target(&mut self, target: &RenderTargetRef) {
        let mut borrowed = target.borrow_mut();
        if !self.check_owner(borrowed.link, "Render target", borrowed.id()) {
            return;
        }
        let active = self.render_target().is_some_and(|active| Rc::ptr_eq(&active, target));
        if active {
            self.render_target = None;
        }
        if !borrowed.link.is_current(self.id, self.generation) {
            borrowed.lose_context();
            return;
        }
        let owned = [borrowed.framebuffer(), borrowed.draw_framebuffer()];
        if self.bound_framebuffer.is_some() && owned.contains(&self.bound_framebuffer) {
            self.bind_framebuffer(None);
        }
        borrowed.destroy(self.native.as_mut());
    }

    // ===== INTERNAL =====

    pub(super) fn bind_framebuffer(&mut self, framebuffer: Option<NativeFramebuffer>) {
        if self.bound_framebuffer != framebuffer {
            self.native.bind_framebuffer(FramebufferTarget::Framebuffer, framebuffer);
            self.bound_framebuffer = framebuffer;
        }
    }

    /// Active render target, with a diagnostic when it was dropped while set
    fn current_render_target(&mut self) -> Option<RenderTargetRef> {
        let weak = self.render_target.as_ref()?;
        match weak.upgrade() {
            Some(target) => Some(target),
            None => {
                if cfg!(debug_assertions) {
                    crate::gfx_warn!(SOURCE, "Active render target was dropped; rendering to the drawing buffer");
                }
                self.render_target = None;
                None
            }
        }
    }

    fn target_size(&self) -> (u32, u32) {
        let Some(target) = self.render_target() else {
            return self.native.drawing_buffer_size();
        };
        let size = target.borrow().size();
        size
    }

    /// Create the framebuffer objects of `target` in the current context
    ///
    /// Attachment textures are created and uploaded first, on the scratch
    /// unit. Leaves the target's draw framebuffer bound.
    pub(super) fn prepare_render_target(&mut self, target: &RenderTargetRef) -> bool {
        let mut borrowed = target.borrow_mut();
        if !self.check_owner(borrowed.link, "Render target", borrowed.id()) {
            return false;
        }
        if borrowed.link.is_current(self.id, self.generation) {
            return true;
        }
        borrowed.lose_context();

        let color_buffers: Vec<TextureRef> = borrowed.color_buffers().to_vec();
        let mut colors = Vec::with_capacity(color_buffers.len());
        for texture in &color_buffers {
            match self.attachment_texture(texture) {
                Some(attachment) => colors.push(attachment),
                None => return false,
            }
        }
        let depth_texture = match borrowed.depth_buffer().cloned() {
            Some(texture) => match self.attachment_texture(&texture) {
                Some(attachment) => Some(attachment),
                None => return false,
            },
            None => None,
        };

        let result = borrowed.initialize(self.native.as_mut(), &self.caps, &colors, depth_texture, self.id, self.generation);
        // Initialization leaves its draw framebuffer bound, or none on failure
        self.bound_framebuffer = borrowed.draw_framebuffer();
        result.is_ok()
    }

    fn attachment_texture(&mut self, texture: &TextureRef) -> Option<AttachmentTexture> {
        let scratch = self.units.scratch_unit();
        if !self.set_texture(texture, scratch) {
            return None;
        }
        let texture = texture.borrow();
        Some(AttachmentTexture {
            texture: texture.native_handle()?,
            target: texture.target(),
            format: texture.format(),
        })
    }

    /// Regenerate the mip chain of the selected color buffers
    fn generate_target_mipmaps(&mut self, target: &RenderTarget, selected: impl Fn(usize) -> bool) {
        let scratch = self.units.scratch_unit();
        for (index, texture) in target.color_buffers().iter().enumerate() {
            let texture = texture.borrow();
            if !selected(index) || !texture.mipmaps() || texture.format().is_compressed() {
                continue;
            }
            if !self.caps.is_modern() && !texture.is_pot() {
                continue;
            }
            self.units.bind_on_unit(self.native.as_mut(), scratch, texture.target(), texture.native_handle());
            self.native.generate_mipmap(texture.target());
        }
    }

    fn refuse_copy(&self, reason: &str) -> bool {
        if cfg!(debug_assertions) {
            crate::gfx_error!(SOURCE, "copy_render_target: {}", reason);
        }
        false
    }
}

/// Reject copies between empty or mismatched attachments
fn validate_copy(
    source: Option<&RenderTarget>,
    dest: Option<&RenderTarget>,
    color: bool,
    depth: bool,
) -> Result<(), &'static str> {
    if !color && !depth {
        return Err("nothing to copy");
    }

    if color {
        let source_color = source.map(|t| t.color_buffer(0).map(|texture| texture.borrow().format()));
        let dest_color = dest.map(|t| t.color_buffer(0).map(|texture| texture.borrow().format()));
        if source_color == Some(None) {
            return Err("source has no color buffer");
        }
        if dest_color == Some(None) {
            return Err("destination has no color buffer");
        }
        if let (Some(Some(a)), Some(Some(b))) = (source_color, dest_color) {
            if a != b {
                return Err("color formats differ");
            }
        }
    }

    if depth {
        if source.is_some_and(|t| !t.has_depth()) {
            return Err("source has no depth buffer");
        }
        if dest.is_some_and(|t| !t.has_depth()) {
            return Err("destination has no depth buffer");
        }
        let source_depth = source.and_then(|t| t.depth_buffer().map(|texture| texture.borrow().format()));
        let dest_depth = dest.and_then(|t| t.depth_buffer().map(|texture| texture.borrow().format()));
        if let (Some(a), Some(b)) = (source_depth, dest_depth) {
            if a != b {
                return Err("depth formats differ");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "graphics_device_pass_tests.rs"]
mod tests;
