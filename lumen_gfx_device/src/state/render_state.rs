/// Render-state value types
///
/// Plain `Copy` descriptions of each fixed-function aspect. The `StateCache`
/// compares them structurally against what was last submitted.

use crate::native::{BlendEquation, BlendFactor, CompareFunc, Face, StencilOp};

// ===== BLEND =====

/// Blend configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Blending enabled
    pub blend: bool,
    pub color_op: BlendEquation,
    pub alpha_op: BlendEquation,
    pub color_src: BlendFactor,
    pub color_dst: BlendFactor,
    pub alpha_src: BlendFactor,
    pub alpha_dst: BlendFactor,
    /// Per-channel write mask (r, g, b, a)
    pub color_mask: [bool; 4],
}

impl BlendState {
    /// Blending disabled, all channels written
    pub const NOBLEND: BlendState = BlendState {
        blend: false,
        color_op: BlendEquation::Add,
        alpha_op: BlendEquation::Add,
        color_src: BlendFactor::One,
        color_dst: BlendFactor::Zero,
        alpha_src: BlendFactor::One,
        alpha_dst: BlendFactor::Zero,
        color_mask: [true; 4],
    };

    /// Blending disabled, no channel written
    pub const NOWRITE: BlendState = BlendState {
        color_mask: [false; 4],
        ..BlendState::NOBLEND
    };

    /// Classic non-premultiplied alpha blending
    pub const ALPHA_BLEND: BlendState = BlendState {
        blend: true,
        color_src: BlendFactor::SrcAlpha,
        color_dst: BlendFactor::OneMinusSrcAlpha,
        alpha_src: BlendFactor::One,
        alpha_dst: BlendFactor::OneMinusSrcAlpha,
        ..BlendState::NOBLEND
    };

    /// Additive blending
    pub const ADDITIVE: BlendState = BlendState {
        blend: true,
        color_src: BlendFactor::One,
        color_dst: BlendFactor::One,
        alpha_src: BlendFactor::One,
        alpha_dst: BlendFactor::One,
        ..BlendState::NOBLEND
    };

    /// Blend with the same factors for color and alpha
    pub fn new(src: BlendFactor, dst: BlendFactor, op: BlendEquation) -> Self {
        Self {
            blend: true,
            color_op: op,
            alpha_op: op,
            color_src: src,
            color_dst: dst,
            alpha_src: src,
            alpha_dst: dst,
            color_mask: [true; 4],
        }
    }

    pub fn with_color_mask(mut self, red: bool, green: bool, blue: bool, alpha: bool) -> Self {
        self.color_mask = [red, green, blue, alpha];
        self
    }

    pub(crate) fn equations(&self) -> (BlendEquation, BlendEquation) {
        (self.color_op, self.alpha_op)
    }

    pub(crate) fn factors(&self) -> (BlendFactor, BlendFactor, BlendFactor, BlendFactor) {
        (self.color_src, self.color_dst, self.alpha_src, self.alpha_dst)
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::NOBLEND
    }
}

// ===== DEPTH =====

/// Depth test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub test: bool,
    pub write: bool,
    pub func: CompareFunc,
}

impl DepthState {
    /// Test and write, LessEqual
    pub const DEFAULT: DepthState = DepthState { test: true, write: true, func: CompareFunc::LessEqual };

    /// Neither test nor write
    pub const NODEPTH: DepthState = DepthState { test: false, write: false, func: CompareFunc::LessEqual };

    /// Test only
    pub const NOWRITE: DepthState = DepthState { test: true, write: false, func: CompareFunc::LessEqual };

    /// Write without testing
    pub const WRITEDEPTH: DepthState = DepthState { test: false, write: true, func: CompareFunc::LessEqual };

    /// State actually submitted to the driver
    ///
    /// The native API ignores depth writes while the test is off, so a write
    /// without test becomes a test that always passes.
    pub fn effective(self) -> DepthState {
        if !self.test && self.write {
            DepthState { test: true, write: true, func: CompareFunc::Always }
        } else {
            self
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ===== STENCIL =====

/// Stencil function, operations and masks for one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilParameters {
    pub func: CompareFunc,
    pub reference: i32,
    pub read_mask: u32,
    /// Operation when the stencil test fails
    pub fail: StencilOp,
    /// Operation when the stencil test passes and the depth test fails
    pub zfail: StencilOp,
    /// Operation when both tests pass
    pub zpass: StencilOp,
    pub write_mask: u32,
}

impl StencilParameters {
    pub const DEFAULT: StencilParameters = StencilParameters {
        func: CompareFunc::Always,
        reference: 0,
        read_mask: 0xFF,
        fail: StencilOp::Keep,
        zfail: StencilOp::Keep,
        zpass: StencilOp::Keep,
        write_mask: 0xFF,
    };

    pub(crate) fn function(&self) -> (CompareFunc, i32, u32) {
        (self.func, self.reference, self.read_mask)
    }

    pub(crate) fn operations(&self) -> (StencilOp, StencilOp, StencilOp) {
        (self.fail, self.zfail, self.zpass)
    }
}

impl Default for StencilParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ===== CULLING =====

/// Which faces are discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling (cull test disabled)
    None,
    /// Cull back faces
    #[default]
    Back,
    /// Cull front faces
    Front,
    /// Cull every polygon (points and lines still draw)
    FrontAndBack,
}

impl CullMode {
    /// Face passed to the native `cull_face` call
    pub fn face(self) -> Option<Face> {
        match self {
            CullMode::None => None,
            CullMode::Back => Some(Face::Back),
            CullMode::Front => Some(Face::Front),
            CullMode::FrontAndBack => Some(Face::FrontAndBack),
        }
    }
}

#[cfg(test)]
#[path = "render_state_tests.rs"]
mod tests;
