/// Which limit set the rendering context is requested with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ContextProfile {
    /// Full desktop feature level.
    #[default]
    Core,
    /// Downlevel limits for older drivers.
    Compatibility,
}

impl ContextProfile {
    pub(crate) fn limits(self) -> wgpu::Limits {
        match self {
            Self::Core => wgpu::Limits::default(),
            Self::Compatibility => wgpu::Limits::downlevel_defaults(),
        }
    }

    /// The profile an adapter reporting `supported` can actually grant.
    ///
    /// A core request on hardware below the core limits degrades to
    /// compatibility instead of failing device creation.
    pub(crate) fn granted(self, supported: &wgpu::Limits) -> Self {
        match self {
            Self::Core if !Self::Core.limits().check_limits(supported) => Self::Compatibility,
            other => other,
        }
    }
}

/// Rendering context request.
///
/// These are hints. The granted adapter is logged and the profile may be
/// lowered to what it supports; nothing else is checked against the request.
#[derive(Debug, Clone)]
pub struct ContextHints {
    /// Graphics APIs the context may be created on.
    pub backends: wgpu::Backends,

    pub profile: ContextProfile,

    /// Double buffering keeps one frame queued behind the displayed one.
    /// Single buffering limits latency to the frame being presented.
    pub double_buffered: bool,

    pub power_preference: wgpu::PowerPreference,

    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: clear and fragment colors are written to the surface
    /// as-is.
    pub prefer_srgb: bool,
}

impl ContextHints {
    pub(crate) fn frame_latency(&self) -> u32 {
        if self.double_buffered { 2 } else { 1 }
    }
}

impl Default for ContextHints {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::PRIMARY,
            profile: ContextProfile::Core,
            double_buffered: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: false,
        }
    }
}

/// Present mode for a swap interval.
///
/// Any non-zero interval waits for vertical sync.
pub(crate) fn present_mode_for_interval(interval: u32) -> wgpu::PresentMode {
    if interval == 0 {
        wgpu::PresentMode::AutoNoVsync
    } else {
        wgpu::PresentMode::Fifo
    }
}
