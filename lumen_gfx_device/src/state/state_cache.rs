/// Fixed-function state cache
///
/// Holds the last state submitted to the native context for every aspect.
/// Each setter compares against the cached value and issues only the native
/// calls needed to reach the requested state. All writes to fixed-function
/// state must go through here or the cache stops mirroring the driver.

use crate::native::{Capability, ClearFlags, Face, FrontFace, NativeContext};
use crate::state::{BlendState, CullMode, DepthState, StencilParameters};

/// Viewport or scissor rectangle (x, y, width, height)
pub type Rect = [i32; 4];

#[derive(Debug, Clone)]
pub struct StateCache {
    blend: BlendState,
    blend_color: [f32; 4],
    alpha_to_coverage: bool,

    /// Effective depth state (after the write-implies-test override)
    depth: DepthState,
    depth_bias: bool,
    depth_bias_values: (f32, f32),

    stencil_test: bool,
    stencil_front: StencilParameters,
    stencil_back: StencilParameters,

    cull_mode: CullMode,
    cull_enabled: bool,
    cull_face: Face,
    front_face: FrontFace,
    rasterization: bool,

    viewport: Rect,
    scissor: Rect,
    scissor_test: bool,

    clear_color: [f32; 4],
    clear_depth: f32,
    clear_stencil: i32,
}

impl StateCache {
    /// Submit the default state unconditionally and cache it
    ///
    /// Used at device creation and after a context restore, when the driver
    /// state is unknown.
    pub fn reset(native: &mut dyn NativeContext, modern: bool, size: (u32, u32)) -> Self {
        let cache = Self {
            blend: BlendState::NOBLEND,
            blend_color: [0.0; 4],
            alpha_to_coverage: false,
            depth: DepthState::DEFAULT,
            depth_bias: false,
            depth_bias_values: (0.0, 0.0),
            stencil_test: false,
            stencil_front: StencilParameters::DEFAULT,
            stencil_back: StencilParameters::DEFAULT,
            cull_mode: CullMode::Back,
            cull_enabled: true,
            cull_face: Face::Back,
            front_face: FrontFace::CounterClockwise,
            rasterization: true,
            viewport: [0, 0, size.0 as i32, size.1 as i32],
            scissor: [0, 0, size.0 as i32, size.1 as i32],
            scissor_test: true,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
        };

        let blend = cache.blend;
        native.disable(Capability::Blend);
        native.blend_equation_separate(blend.color_op, blend.alpha_op);
        native.blend_func_separate(blend.color_src, blend.color_dst, blend.alpha_src, blend.alpha_dst);
        let [r, g, b, a] = blend.color_mask;
        native.color_mask(r, g, b, a);
        native.blend_color(cache.blend_color);
        native.disable(Capability::SampleAlphaToCoverage);

        native.enable(Capability::DepthTest);
        native.depth_func(cache.depth.func);
        native.depth_mask(true);
        native.disable(Capability::PolygonOffsetFill);
        native.polygon_offset(0.0, 0.0);

        let stencil = cache.stencil_front;
        native.disable(Capability::StencilTest);
        native.stencil_func_separate(Face::FrontAndBack, stencil.func, stencil.reference, stencil.read_mask);
        native.stencil_op_separate(Face::FrontAndBack, stencil.fail, stencil.zfail, stencil.zpass);
        native.stencil_mask_separate(Face::FrontAndBack, stencil.write_mask);

        native.enable(Capability::CullFace);
        native.cull_face(Face::Back);
        native.front_face(FrontFace::CounterClockwise);
        if modern {
            native.disable(Capability::RasterizerDiscard);
        }

        let [x, y, w, h] = cache.viewport;
        native.viewport(x, y, w, h);
        native.scissor(x, y, w, h);
        native.enable(Capability::ScissorTest);

        native.clear_color(cache.clear_color);
        native.clear_depth(cache.clear_depth);
        native.clear_stencil(cache.clear_stencil);

        cache
    }

    // ===== BLEND =====

    pub fn blend_state(&self) -> BlendState {
        self.blend
    }

    pub fn set_blend_state(&mut self, native: &mut dyn NativeContext, state: BlendState) {
        let current = self.blend;
        if state == current {
            return;
        }

        if state.blend != current.blend {
            toggle(native, Capability::Blend, state.blend);
        }
        if state.equations() != current.equations() {
            native.blend_equation_separate(state.color_op, state.alpha_op);
        }
        if state.factors() != current.factors() {
            native.blend_func_separate(state.color_src, state.color_dst, state.alpha_src, state.alpha_dst);
        }
        if state.color_mask != current.color_mask {
            let [r, g, b, a] = state.color_mask;
            native.color_mask(r, g, b, a);
        }

        self.blend = state;
    }

    pub fn set_blend_color(&mut self, native: &mut dyn NativeContext, color: [f32; 4]) {
        if self.blend_color != color {
            native.blend_color(color);
            self.blend_color = color;
        }
    }

    pub fn set_alpha_to_coverage(&mut self, native: &mut dyn NativeContext, enabled: bool) {
        if self.alpha_to_coverage != enabled {
            toggle(native, Capability::SampleAlphaToCoverage, enabled);
            self.alpha_to_coverage = enabled;
        }
    }

    // ===== DEPTH =====

    /// Effective depth state last submitted
    pub fn depth_state(&self) -> DepthState {
        self.depth
    }

    pub fn set_depth_state(&mut self, native: &mut dyn NativeContext, state: DepthState) {
        let state = state.effective();
        let current = self.depth;
        if state == current {
            return;
        }

        if state.test != current.test {
            toggle(native, Capability::DepthTest, state.test);
        }
        if state.func != current.func {
            native.depth_func(state.func);
        }
        if state.write != current.write {
            native.depth_mask(state.write);
        }

        self.depth = state;
    }

    pub fn set_depth_bias(&mut self, native: &mut dyn NativeContext, enabled: bool) {
        if self.depth_bias != enabled {
            toggle(native, Capability::PolygonOffsetFill, enabled);
            self.depth_bias = enabled;
        }
    }

    pub fn set_depth_bias_values(&mut self, native: &mut dyn NativeContext, constant: f32, slope: f32) {
        if self.depth_bias_values != (constant, slope) {
            native.polygon_offset(slope, constant);
            self.depth_bias_values = (constant, slope);
        }
    }

    // ===== STENCIL =====

    pub fn stencil_test(&self) -> bool {
        self.stencil_test
    }

    pub fn set_stencil_test(&mut self, native: &mut dyn NativeContext, enabled: bool) {
        if self.stencil_test != enabled {
            toggle(native, Capability::StencilTest, enabled);
            self.stencil_test = enabled;
        }
    }

    /// Enable the stencil test with the given faces, or disable it when both
    /// are `None`. A missing face uses the default parameters.
    pub fn set_stencil_state(
        &mut self,
        native: &mut dyn NativeContext,
        front: Option<StencilParameters>,
        back: Option<StencilParameters>,
    ) {
        if front.is_none() && back.is_none() {
            self.set_stencil_test(native, false);
            return;
        }
        self.set_stencil_test(native, true);

        let front = front.unwrap_or_default();
        let back = back.unwrap_or_default();

        if front == back {
            // One combined call per aspect when both faces agree
            if front.function() != self.stencil_front.function() || front.function() != self.stencil_back.function() {
                native.stencil_func_separate(Face::FrontAndBack, front.func, front.reference, front.read_mask);
            }
            if front.operations() != self.stencil_front.operations() || front.operations() != self.stencil_back.operations() {
                native.stencil_op_separate(Face::FrontAndBack, front.fail, front.zfail, front.zpass);
            }
            if front.write_mask != self.stencil_front.write_mask || front.write_mask != self.stencil_back.write_mask {
                native.stencil_mask_separate(Face::FrontAndBack, front.write_mask);
            }
        } else {
            apply_stencil_face(native, Face::Front, &front, &self.stencil_front);
            apply_stencil_face(native, Face::Back, &back, &self.stencil_back);
        }

        self.stencil_front = front;
        self.stencil_back = back;
    }

    pub fn stencil_faces(&self) -> (StencilParameters, StencilParameters) {
        (self.stencil_front, self.stencil_back)
    }

    // ===== RASTER =====

    pub fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    pub fn set_cull_mode(&mut self, native: &mut dyn NativeContext, mode: CullMode) {
        if self.cull_mode == mode {
            return;
        }

        match mode.face() {
            None => {
                if self.cull_enabled {
                    native.disable(Capability::CullFace);
                    self.cull_enabled = false;
                }
            }
            Some(face) => {
                if !self.cull_enabled {
                    native.enable(Capability::CullFace);
                    self.cull_enabled = true;
                }
                if self.cull_face != face {
                    native.cull_face(face);
                    self.cull_face = face;
                }
            }
        }

        self.cull_mode = mode;
    }

    pub fn set_front_face(&mut self, native: &mut dyn NativeContext, front_face: FrontFace) {
        if self.front_face != front_face {
            native.front_face(front_face);
            self.front_face = front_face;
        }
    }

    /// Toggle rasterizer discard (modern generation only, caller checks)
    pub fn set_rasterization(&mut self, native: &mut dyn NativeContext, enabled: bool) {
        if self.rasterization != enabled {
            // Discard is the inverse of rasterization
            toggle(native, Capability::RasterizerDiscard, !enabled);
            self.rasterization = enabled;
        }
    }

    // ===== VIEWPORT / SCISSOR =====

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, native: &mut dyn NativeContext, rect: Rect) {
        if self.viewport != rect {
            let [x, y, w, h] = rect;
            native.viewport(x, y, w, h);
            self.viewport = rect;
        }
    }

    pub fn scissor(&self) -> Rect {
        self.scissor
    }

    pub fn set_scissor(&mut self, native: &mut dyn NativeContext, rect: Rect) {
        if self.scissor != rect {
            let [x, y, w, h] = rect;
            native.scissor(x, y, w, h);
            self.scissor = rect;
        }
    }

    pub fn set_scissor_test(&mut self, native: &mut dyn NativeContext, enabled: bool) {
        if self.scissor_test != enabled {
            toggle(native, Capability::ScissorTest, enabled);
            self.scissor_test = enabled;
        }
    }

    /// Run raw native work with the scissor test, rasterizer discard and
    /// color mask out of the way, then resubmit the cached values
    ///
    /// The work may also change the clear color; it is restored as well.
    pub fn with_unmasked_clear<R>(
        &self,
        native: &mut dyn NativeContext,
        modern: bool,
        work: impl FnOnce(&mut dyn NativeContext) -> R,
    ) -> R {
        native.disable(Capability::ScissorTest);
        if modern {
            native.disable(Capability::RasterizerDiscard);
        }
        native.color_mask(true, true, true, true);

        let result = work(native);

        toggle(native, Capability::ScissorTest, self.scissor_test);
        if modern {
            toggle(native, Capability::RasterizerDiscard, !self.rasterization);
        }
        let [r, g, b, a] = self.blend.color_mask;
        native.color_mask(r, g, b, a);
        native.clear_color(self.clear_color);
        result
    }

    // ===== CLEAR VALUES =====

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, native: &mut dyn NativeContext, color: [f32; 4]) {
        if self.clear_color != color {
            native.clear_color(color);
            self.clear_color = color;
        }
    }

    pub fn set_clear_depth(&mut self, native: &mut dyn NativeContext, depth: f32) {
        if self.clear_depth != depth {
            native.clear_depth(depth);
            self.clear_depth = depth;
        }
    }

    pub fn set_clear_stencil(&mut self, native: &mut dyn NativeContext, stencil: i32) {
        if self.clear_stencil != stencil {
            native.clear_stencil(stencil);
            self.clear_stencil = stencil;
        }
    }

    /// Clear the bound framebuffer
    ///
    /// Clear values are cached. Blending is switched off for color clears and
    /// depth writes are forced on for depth clears, both through the cache.
    /// The clear itself is always issued.
    pub fn clear(&mut self, native: &mut dyn NativeContext, options: &ClearOptions) {
        if options.flags.is_empty() {
            return;
        }

        if options.flags.contains(ClearFlags::COLOR) {
            self.set_clear_color(native, options.color);
            self.set_blend_state(native, BlendState::NOBLEND);
        }
        if options.flags.contains(ClearFlags::DEPTH) {
            self.set_clear_depth(native, options.depth);
            self.set_depth_state(native, DepthState::WRITEDEPTH);
        }
        if options.flags.contains(ClearFlags::STENCIL) {
            self.set_clear_stencil(native, options.stencil);
        }

        native.clear(options.flags);
    }
}

/// Values and buffers for a clear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearOptions {
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: i32,
    pub flags: ClearFlags,
}

impl Default for ClearOptions {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            stencil: 0,
            flags: ClearFlags::COLOR | ClearFlags::DEPTH,
        }
    }
}

fn toggle(native: &mut dyn NativeContext, capability: Capability, enabled: bool) {
    if enabled {
        native.enable(capability);
    } else {
        native.disable(capability);
    }
}

fn apply_stencil_face(
    native: &mut dyn NativeContext,
    face: Face,
    wanted: &StencilParameters,
    current: &StencilParameters,
) {
    if wanted.function() != current.function() {
        native.stencil_func_separate(face, wanted.func, wanted.reference, wanted.read_mask);
    }
    if wanted.operations() != current.operations() {
        native.stencil_op_separate(face, wanted.fail, wanted.zfail, wanted.zpass);
    }
    if wanted.write_mask != current.write_mask {
        native.stencil_mask_separate(face, wanted.write_mask);
    }
}

#[cfg(test)]
#[path = "state_cache_tests.rs"]
mod tests;
