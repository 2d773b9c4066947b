/// Windowed backend configuration.
///
/// Mirrors what a desktop platform lets the caller decide up front. Anything not
/// listed here is fixed by lapis: framebuffers are RGBA8 and every present waits
/// for vertical sync unless `present_mode` says otherwise.
#[derive(Debug, Clone)]
pub struct WgpuConfig {
    /// Title of every window opened by this backend.
    pub title: String,

    /// Borderless full screen on the primary monitor.
    ///
    /// Makes the display resolution fixed: window size hints are ignored.
    pub fullscreen: bool,

    /// FIFO waits for vblank and is supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    pub power_preference: wgpu::PowerPreference,

    /// If provided but unsupported on the surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Limits requested from the device. `max_texture_dimension_2d` caps window
    /// and target extents.
    pub required_limits: wgpu::Limits,

    /// Hint; support depends on platform and graphics API.
    pub desired_maximum_frame_latency: u32,

    /// Display size reported when the window system exposes no monitor.
    pub fallback_resolution: (u32, u32),
}

impl Default for WgpuConfig {
    fn default() -> Self {
        Self {
            title: "lapis".to_string(),
            fullscreen: false,
            present_mode: wgpu::PresentMode::Fifo,
            prefer_srgb: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            alpha_mode: None,
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            fallback_resolution: (1280, 720),
        }
    }
}
