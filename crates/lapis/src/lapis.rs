//! The connection object every lapis call goes through.

use crate::backend::{Backend, DisplayInfo, Frame};
use crate::caps::{DrawFeatures, MeshFeatures};
use crate::draw::{ImmediateDraw, Prepared};
use crate::error::{LapisError, Result};
use crate::kind::ObjectKind;
use crate::memory::Regions;
use crate::object::{Context, Target, Window};
use crate::raster::Rgb;
use crate::size::{self, SizeDescriptor, SizingHelper, TargetHelper, WindowHelper};

/// Outcome of one `swap`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SwapInfo {
    /// Targets composed into the presented frame.
    pub refreshed_targets: u32,
    /// Window frame counter after the swap.
    pub frame_index: u32,
}

/// A backend plus the display state captured when it was connected.
///
/// Nothing in lapis is process-global: each `Lapis` value is an independent
/// connection, and objects are only meaningful to the connection that
/// constructed them.
///
/// The library never allocates object memory. The flow for every object is:
/// `query_size` → allocate `Regions` → `construct_*` → per-frame calls →
/// `release_*` → free the memory.
///
/// Lapis is single-threaded. `swap` is the only call that blocks.
#[derive(Debug)]
pub struct Lapis<B: Backend> {
    backend: B,
    display: Option<DisplayInfo>,
    next_id: u32,
}

impl<B: Backend> Lapis<B> {
    /// Per-vertex attributes and texture kinds the backend consumes.
    pub const MESH_FEATURE_MASK: MeshFeatures = B::MESH_FEATURES;

    /// Optional per-draw effects the backend implements.
    pub const DRAW_FEATURE_MASK: DrawFeatures = B::DRAW_FEATURES;

    pub fn new(backend: B) -> Self {
        Self {
            backend,
            display: None,
            next_id: 1,
        }
    }

    /// Connects to the platform. Must succeed exactly once before any sizing
    /// or construction call.
    pub fn connect(&mut self) -> Result<DisplayInfo> {
        if self.display.is_some() {
            return Err(LapisError::AlreadyConnected);
        }

        let display = self.backend.connect()?;
        if !display.device_alignment.is_power_of_two() {
            return Err(LapisError::backend(format!(
                "{} reported a device alignment of {}",
                B::NAME,
                display.device_alignment
            )));
        }

        log::info!(
            "lapis connected to {}: display {}x{}{}, device alignment {}, mesh {:?}, draw {:?}",
            B::NAME,
            display.width,
            display.height,
            if display.fixed_resolution { " (fixed)" } else { "" },
            display.device_alignment,
            B::MESH_FEATURES,
            B::DRAW_FEATURES,
        );

        self.display = Some(display);
        Ok(display)
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.display.is_some()
    }

    /// Display state captured by `connect`.
    pub fn display(&self) -> Result<DisplayInfo> {
        self.display.ok_or(LapisError::NotConnected)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ── sizing ────────────────────────────────────────────────────────────

    /// Memory an object of `kind` needs.
    ///
    /// Windows and targets require a helper of their own kind; contexts take none.
    /// The result depends only on `kind`, `helper` and the display captured at
    /// connect time.
    pub fn query_size(&self, kind: ObjectKind, helper: Option<SizingHelper>) -> Result<SizeDescriptor> {
        size::query(&self.display()?, kind, helper)
    }

    /// Target helper covering the whole of `window`.
    pub fn fill_target_helper(&self, window: &Window<'_>) -> TargetHelper {
        let (width, height) = window.size();
        TargetHelper { width, height }
    }

    // ── construction ──────────────────────────────────────────────────────

    pub fn construct_context<'m>(&mut self, regions: Regions<'m>) -> Result<Context<'m>> {
        let display = self.display()?;
        let size = size::query(&display, ObjectKind::Context, None)?;
        regions.check(&size)?;

        let id = self.next_id();
        log::debug!("constructing context #{id}");
        Ok(Context::construct(regions, id, &display))
    }

    /// Opens a platform window and constructs its state in `regions`.
    ///
    /// On fixed-resolution displays the window covers the display regardless of
    /// `helper`.
    pub fn construct_window<'m>(
        &mut self,
        context: &Context<'_>,
        regions: Regions<'m>,
        helper: &WindowHelper,
    ) -> Result<Window<'m>> {
        let display = self.display()?;
        let extent = size::window_extent(&display, helper)?;
        let size = size::query(&display, ObjectKind::Window, Some((*helper).into()))?;
        regions.check(&size)?;

        let slot = self.backend.open_window(extent.0, extent.1)?;
        let id = self.next_id();
        log::debug!(
            "constructing window #{id} ({}x{}) in slot {}",
            extent.0,
            extent.1,
            slot.0
        );
        Ok(Window::construct(regions, id, context.id(), slot, extent))
    }

    /// Constructs a target owned by `window`, or an offscreen one with `None`.
    ///
    /// Offscreen targets can be drawn to and read back but are never presented.
    pub fn construct_target<'m>(
        &mut self,
        window: Option<&Window<'_>>,
        regions: Regions<'m>,
        helper: &TargetHelper,
    ) -> Result<Target<'m>> {
        let display = self.display()?;
        let extent = size::target_extent(&display, helper)?;
        let size = size::query(&display, ObjectKind::Target, Some((*helper).into()))?;
        regions.check(&size)?;

        let owner = window.map_or(0, |w| w.id());
        let id = self.next_id();
        log::debug!(
            "constructing target #{id} ({}x{}) for window #{owner}",
            extent.0,
            extent.1
        );
        Ok(Target::construct(regions, id, owner, extent))
    }

    // ── per frame ─────────────────────────────────────────────────────────

    /// Pumps pending window-system events into `window`. Never blocks.
    pub fn poll_events(&mut self, window: &mut Window<'_>) -> Result<()> {
        let slot = window.slot();
        self.backend.poll_events(slot, &mut |event| {
            log::debug!("window slot {}: {event:?}", slot.0);
            window.apply_event(event);
        })
    }

    /// Frame-loop condition: `false` once the window system asked to close.
    #[inline]
    pub fn stay_open(&self, window: &Window<'_>) -> bool {
        window.is_open()
    }

    /// Fills `target` with `color`.
    pub fn clear(&self, target: &mut Target<'_>, color: Rgb) -> Result<()> {
        target.canvas().clear(color);
        Ok(())
    }

    /// Rasterizes one immediate-mode draw into `target`.
    ///
    /// Attributes and effects the backend does not support are ignored. An indexed
    /// draw on a backend without index buffers is skipped entirely; the target
    /// still counts as drawn to.
    pub fn draw_immediate(&self, target: &mut Target<'_>, draw: &ImmediateDraw<'_>) -> Result<()> {
        let prepared = Prepared::new(draw, B::MESH_FEATURES, B::DRAW_FEATURES)?;

        let mut canvas = target.canvas();
        if let Some(prepared) = prepared {
            let written: u32 = prepared
                .triangles()
                .map(|tri| canvas.fill_triangle(&tri))
                .sum();
            log::trace!(
                "immediate draw: {} triangles, {written} pixels",
                draw.triangle_count
            );
        }
        Ok(())
    }

    /// Draws `triangle_count` triangles from xyz positions and rgb colors, nine
    /// floats of each per triangle.
    pub fn draw_immediate_pos_color(
        &self,
        target: &mut Target<'_>,
        positions: &[f32],
        colors: &[f32],
        triangle_count: u32,
    ) -> Result<()> {
        let draw = ImmediateDraw::new(positions, triangle_count).with_colors(colors);
        self.draw_immediate(target, &draw)
    }

    /// Marks `target` for refresh at the next swap of its window.
    pub fn schedule(&self, target: &mut Target<'_>) -> Result<()> {
        target.schedule();
        Ok(())
    }

    /// Presents `window`, blocking until the next vertical sync.
    ///
    /// Every target in `targets` owned by `window` that is dirty and scheduled is
    /// composed into the back buffer (top-left aligned, clipped to the window) and
    /// becomes `Clean`; the rest keep their contents on screen from earlier
    /// frames. Schedules are consumed either way.
    pub fn swap(
        &mut self,
        window: &mut Window<'_>,
        targets: &mut [&mut Target<'_>],
    ) -> Result<SwapInfo> {
        let id = window.id();
        let mut refreshed_targets = 0;

        for target in targets.iter_mut() {
            if target.owner() != id {
                log::warn!(
                    "swap of window #{id} was handed a target owned by window #{}; skipped",
                    target.owner()
                );
                continue;
            }
            if target.take_refresh() {
                window.compose(target);
                refreshed_targets += 1;
            }
        }

        let slot = window.slot();
        let (width, height) = window.size();
        let (pixels, index) = window.back_buffer();
        self.backend.present(
            slot,
            Frame {
                pixels,
                width,
                height,
                index,
            },
        )?;

        let frame_index = window.flip();
        log::trace!("window #{id} frame {frame_index}: {refreshed_targets} targets refreshed");

        Ok(SwapInfo {
            refreshed_targets,
            frame_index,
        })
    }

    // ── teardown ──────────────────────────────────────────────────────────

    /// Releases `target` and hands its memory back.
    pub fn release_target<'m>(&mut self, target: Target<'m>) -> Regions<'m> {
        log::debug!("releasing target");
        target.release()
    }

    /// Closes the platform window and hands its memory back.
    ///
    /// A platform failure while closing is logged; the object is released anyway.
    pub fn release_window<'m>(&mut self, window: Window<'m>) -> Regions<'m> {
        let slot = window.slot();
        if let Err(err) = self.backend.close_window(slot) {
            log::warn!("closing window slot {} failed: {err}", slot.0);
        }
        log::debug!("releasing window #{} of context #{}", window.id(), window.context());
        window.release()
    }

    pub fn release_context<'m>(&mut self, context: Context<'m>) -> Regions<'m> {
        log::debug!("releasing context #{}", context.id());
        context.release()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        ConsoleProfile, DesktopProfile, HeadlessBackend, HeadlessConfig, WindowEvent,
    };
    use crate::error::{RegionError, Unsupported};
    use crate::memory::{Allocation, Arena};
    use crate::schedule::TargetState;

    const TRI: [f32; 9] = [0.0, 0.5, 0.0, 0.5, -0.5, 0.0, -0.5, -0.5, 0.0];
    const RGB: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

    type Desktop = Lapis<HeadlessBackend<DesktopProfile>>;
    type Console = Lapis<HeadlessBackend<ConsoleProfile>>;

    fn desktop(config: HeadlessConfig) -> Desktop {
        let mut lapis = Lapis::new(HeadlessBackend::new(HeadlessConfig {
            display_width: 640,
            display_height: 480,
            ..config
        }));
        lapis.connect().unwrap();
        lapis
    }

    fn alloc<B: Backend>(lapis: &Lapis<B>, kind: ObjectKind, helper: Option<SizingHelper>) -> Allocation {
        Allocation::new(&lapis.query_size(kind, helper).unwrap()).unwrap()
    }

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = (y * width + x) as usize * 4;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    // ── connection ────────────────────────────────────────────────────────

    #[test]
    fn sizing_requires_a_connection() {
        let lapis = Desktop::new(HeadlessBackend::new(HeadlessConfig::unpaced()));
        assert!(!lapis.is_connected());
        assert_eq!(
            lapis.query_size(ObjectKind::Context, None),
            Err(LapisError::NotConnected)
        );
    }

    #[test]
    fn construction_requires_a_connection() {
        let mut lapis = Desktop::new(HeadlessBackend::new(HeadlessConfig::unpaced()));
        let mut host = [0u8; 64];
        let mut device = [0u8; 64];
        assert!(matches!(
            lapis.construct_context(Regions::new(&mut host, &mut device)),
            Err(LapisError::NotConnected)
        ));
    }

    #[test]
    fn connect_is_exactly_once() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        assert_eq!(lapis.connect(), Err(LapisError::AlreadyConnected));
        assert_eq!(lapis.display().unwrap().width, 640);
    }

    #[test]
    fn connections_are_independent() {
        let desktop = desktop(HeadlessConfig::unpaced());
        let mut console = Console::new(HeadlessBackend::new(HeadlessConfig::unpaced()));
        console.connect().unwrap();

        let d = desktop.query_size(ObjectKind::Context, None).unwrap();
        let c = console.query_size(ObjectKind::Context, None).unwrap();
        assert_eq!(d.device_bytes, 640 * 480 * 4);
        assert_eq!(c.device_bytes, 320 * 240 * 4);
        assert_ne!(d.device_alignment, c.device_alignment);
    }

    #[test]
    fn capability_masks_are_per_backend_constants() {
        assert_eq!(
            Desktop::MESH_FEATURE_MASK,
            MeshFeatures::VERTEX_POS | MeshFeatures::INDEX_BUFFER | MeshFeatures::VERTEX_COLOR
        );
        assert_eq!(
            Console::MESH_FEATURE_MASK,
            MeshFeatures::VERTEX_POS | MeshFeatures::INDEX_BUFFER
        );
        assert_eq!(Console::DRAW_FEATURE_MASK, DrawFeatures::empty());
    }

    // ── sizing and construction ───────────────────────────────────────────

    #[test]
    fn context_size_is_idempotent() {
        let lapis = desktop(HeadlessConfig::unpaced());
        let first = lapis.query_size(ObjectKind::Context, None).unwrap();
        for _ in 0..4 {
            assert_eq!(lapis.query_size(ObjectKind::Context, None).unwrap(), first);
        }
    }

    #[test]
    fn exact_allocations_are_sufficient() {
        let mut lapis = desktop(HeadlessConfig::unpaced());

        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();

        for (w, h) in [(1, 1), (720, 360), (33, 17)] {
            let helper = WindowHelper { width: w, height: h };
            let mut win_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
            let window = lapis.construct_window(&context, win_mem.regions(), &helper).unwrap();
            assert_eq!(window.size(), (w, h));

            let th = lapis.fill_target_helper(&window);
            let mut tgt_mem = alloc(&lapis, ObjectKind::Target, Some(th.into()));
            let target = lapis.construct_target(Some(&window), tgt_mem.regions(), &th).unwrap();
            assert_eq!(target.size(), (w, h));

            lapis.release_target(target);
            lapis.release_window(window);
        }
        lapis.release_context(context);
    }

    #[test]
    fn arena_regions_are_sufficient() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let ctx = lapis.query_size(ObjectKind::Context, None).unwrap();
        let helper = TargetHelper { width: 16, height: 16 };
        let tgt = lapis.query_size(ObjectKind::Target, Some(helper.into())).unwrap();

        let mut buffer = vec![0u8; 2 * 1024 * 1024];
        let mut arena = Arena::new(&mut buffer);
        let context = lapis.construct_context(arena.regions(&ctx).unwrap()).unwrap();
        let target = lapis
            .construct_target(None, arena.regions(&tgt).unwrap(), &helper)
            .unwrap();

        assert!(target.is_offscreen());
        assert_eq!(context.display_size(), (640, 480));
    }

    #[test]
    fn short_regions_are_rejected_before_writing() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let size = lapis.query_size(ObjectKind::Context, None).unwrap();
        let mut host = vec![0u8; size.host_bytes];
        let mut device = vec![0u8; size.device_bytes - 1];

        let err = lapis
            .construct_context(Regions::new(&mut host, &mut device))
            .unwrap_err();
        assert!(matches!(
            err,
            LapisError::InvalidRegion(RegionError::TooSmall { region: "device", .. })
        ));
        assert!(host.iter().all(|&b| b == 0));
    }

    #[test]
    fn unsupported_target_is_rejected_before_writing() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let mut host = [0u8; 256];
        let mut device = [0u8; 256];

        let zero = TargetHelper { width: 0, height: 4 };
        assert!(matches!(
            lapis.construct_target(None, Regions::new(&mut host, &mut device), &zero),
            Err(LapisError::UnsupportedConfiguration(Unsupported::ZeroExtent { .. }))
        ));

        let huge = TargetHelper { width: 8193, height: 1 };
        assert!(matches!(
            lapis.construct_target(None, Regions::new(&mut host, &mut device), &huge),
            Err(LapisError::UnsupportedConfiguration(Unsupported::ExceedsMaximum { max: 8192, .. }))
        ));

        assert!(host.iter().chain(device.iter()).all(|&b| b == 0));
    }

    #[test]
    fn unsupported_window_is_rejected_without_opening() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();

        let mut host = [0u8; 256];
        let mut device = [0u8; 256];
        let helper = WindowHelper { width: 0, height: 8 };
        assert!(matches!(
            lapis.construct_window(&context, Regions::new(&mut host, &mut device), &helper),
            Err(LapisError::UnsupportedConfiguration(Unsupported::ZeroExtent { .. }))
        ));
        assert_eq!(lapis.backend().open_windows(), 0);
    }

    #[test]
    fn fixed_resolution_overrides_window_hint() {
        let mut lapis = Console::new(HeadlessBackend::new(HeadlessConfig::unpaced()));
        lapis.connect().unwrap();
        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();

        let helper = WindowHelper { width: 720, height: 360 };
        let mut win_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let window = lapis.construct_window(&context, win_mem.regions(), &helper).unwrap();
        assert_eq!(window.size(), (320, 240));
        assert_eq!(lapis.fill_target_helper(&window), TargetHelper { width: 320, height: 240 });
    }

    // ── scheduling ────────────────────────────────────────────────────────

    #[test]
    fn target_state_follows_draw_schedule_swap() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();
        let helper = WindowHelper { width: 32, height: 32 };
        let mut win_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let mut window = lapis.construct_window(&context, win_mem.regions(), &helper).unwrap();
        let th = lapis.fill_target_helper(&window);
        let mut tgt_mem = alloc(&lapis, ObjectKind::Target, Some(th.into()));
        let mut target = lapis.construct_target(Some(&window), tgt_mem.regions(), &th).unwrap();

        assert_eq!(target.state(), TargetState::Dirty);
        lapis.clear(&mut target, Rgb::white()).unwrap();
        lapis.draw_immediate_pos_color(&mut target, &TRI, &RGB, 1).unwrap();
        assert_eq!(target.state(), TargetState::Dirty);

        // Dirty but not scheduled: nothing is refreshed.
        let info = lapis.swap(&mut window, &mut [&mut target]).unwrap();
        assert_eq!(info.refreshed_targets, 0);
        assert_eq!(target.state(), TargetState::Dirty);

        lapis.schedule(&mut target).unwrap();
        let info = lapis.swap(&mut window, &mut [&mut target]).unwrap();
        assert_eq!(info.refreshed_targets, 1);
        assert_eq!(info.frame_index, 2);
        assert_eq!(target.state(), TargetState::Clean);
        assert_eq!(target.refresh_count(), 1);

        let info = lapis.swap(&mut window, &mut [&mut target]).unwrap();
        assert_eq!(info.refreshed_targets, 0);
        assert_eq!(target.state(), TargetState::Clean);
        assert_eq!(target.refresh_count(), 1);
    }

    #[test]
    fn partial_refresh_composes_over_last_frame() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();
        let helper = WindowHelper { width: 16, height: 16 };
        let mut win_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let mut window = lapis.construct_window(&context, win_mem.regions(), &helper).unwrap();

        let full = lapis.fill_target_helper(&window);
        let glyph = TargetHelper { width: 4, height: 4 };
        let mut bg_mem = alloc(&lapis, ObjectKind::Target, Some(full.into()));
        let mut fg_mem = alloc(&lapis, ObjectKind::Target, Some(glyph.into()));
        let mut background = lapis.construct_target(Some(&window), bg_mem.regions(), &full).unwrap();
        let mut glyph = lapis.construct_target(Some(&window), fg_mem.regions(), &glyph).unwrap();

        lapis.clear(&mut background, Rgb::new(1.0, 0.0, 0.0)).unwrap();
        lapis.schedule(&mut background).unwrap();
        lapis.swap(&mut window, &mut [&mut background, &mut glyph]).unwrap();

        lapis.clear(&mut glyph, Rgb::new(0.0, 1.0, 0.0)).unwrap();
        lapis.schedule(&mut glyph).unwrap();
        let info = lapis.swap(&mut window, &mut [&mut background, &mut glyph]).unwrap();
        assert_eq!(info.refreshed_targets, 1);

        let front = window.front_buffer();
        assert_eq!(pixel(front, 16, 1, 1), [0, 255, 0, 255]);
        assert_eq!(pixel(front, 16, 10, 10), [255, 0, 0, 255]);
    }

    #[test]
    fn foreign_and_offscreen_targets_are_not_presented() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();
        let helper = WindowHelper { width: 8, height: 8 };
        let mut a_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let mut b_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let mut a = lapis.construct_window(&context, a_mem.regions(), &helper).unwrap();
        let b = lapis.construct_window(&context, b_mem.regions(), &helper).unwrap();

        let th = TargetHelper { width: 8, height: 8 };
        let mut owned_mem = alloc(&lapis, ObjectKind::Target, Some(th.into()));
        let mut off_mem = alloc(&lapis, ObjectKind::Target, Some(th.into()));
        let mut foreign = lapis.construct_target(Some(&b), owned_mem.regions(), &th).unwrap();
        let mut offscreen = lapis.construct_target(None, off_mem.regions(), &th).unwrap();

        lapis.schedule(&mut foreign).unwrap();
        lapis.schedule(&mut offscreen).unwrap();
        let info = lapis.swap(&mut a, &mut [&mut foreign, &mut offscreen]).unwrap();
        assert_eq!(info.refreshed_targets, 0);
        assert!(foreign.is_scheduled());
        assert!(a.front_buffer().iter().all(|&byte| byte == 0));
    }

    // ── capability masking ────────────────────────────────────────────────

    #[test]
    fn flat_backend_drops_colors_silently() {
        let mut lapis = Console::new(HeadlessBackend::new(HeadlessConfig::unpaced()));
        lapis.connect().unwrap();
        let helper = TargetHelper { width: 32, height: 32 };
        let mut mem = alloc(&lapis, ObjectKind::Target, Some(helper.into()));
        let mut target = lapis.construct_target(None, mem.regions(), &helper).unwrap();

        lapis.draw_immediate_pos_color(&mut target, &TRI, &RGB, 1).unwrap();
        assert_eq!(pixel(target.pixels(), 32, 16, 20), [255, 255, 255, 255]);
    }

    #[test]
    fn unsupported_effects_do_not_fail_the_draw() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let helper = TargetHelper { width: 8, height: 8 };
        let mut mem = alloc(&lapis, ObjectKind::Target, Some(helper.into()));
        let mut target = lapis.construct_target(None, mem.regions(), &helper).unwrap();

        let draw = ImmediateDraw::new(&TRI, 1)
            .with_normals(&TRI)
            .with_tex_coords(&[0.0; 6])
            .with_effects(DrawFeatures::DYNAMIC_SHADOWS);
        assert_eq!(lapis.draw_immediate(&mut target, &draw), Ok(()));
    }

    #[test]
    fn short_geometry_is_reported() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let helper = TargetHelper { width: 8, height: 8 };
        let mut mem = alloc(&lapis, ObjectKind::Target, Some(helper.into()));
        let mut target = lapis.construct_target(None, mem.regions(), &helper).unwrap();

        assert!(matches!(
            lapis.draw_immediate_pos_color(&mut target, &TRI, &RGB[..3], 1),
            Err(LapisError::InvalidGeometry { attribute: "colors", .. })
        ));
    }

    // ── window events ─────────────────────────────────────────────────────

    #[test]
    fn polled_events_update_window_state() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();
        let helper = WindowHelper { width: 64, height: 64 };
        let mut win_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let mut window = lapis.construct_window(&context, win_mem.regions(), &helper).unwrap();

        assert!(lapis.stay_open(&window));
        assert_eq!(window.requested_size(), None);

        let slot = window.slot();
        let backend = lapis.backend_mut();
        backend.push_event(slot, WindowEvent::Focused(true));
        backend.push_event(slot, WindowEvent::PointerMoved { x: 3.0, y: 4.5 });
        backend.push_event(slot, WindowEvent::Resized { width: 100, height: 50 });
        lapis.poll_events(&mut window).unwrap();

        assert!(window.is_focused());
        assert_eq!(window.pointer_position(), (3.0, 4.5));
        assert_eq!(window.requested_size(), Some((100, 50)));
        assert_eq!(window.size(), (64, 64));
        assert!(lapis.stay_open(&window));

        lapis.backend_mut().push_event(slot, WindowEvent::CloseRequested);
        lapis.poll_events(&mut window).unwrap();
        assert!(!lapis.stay_open(&window));
    }

    // ── scenario ──────────────────────────────────────────────────────────

    #[test]
    fn hello_triangle_runs_until_closed() {
        let mut lapis = desktop(HeadlessConfig {
            close_after_frames: Some(3),
            ..HeadlessConfig::unpaced()
        });

        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();

        let helper = WindowHelper { width: 720, height: 360 };
        let mut win_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let mut window = lapis.construct_window(&context, win_mem.regions(), &helper).unwrap();

        let th = lapis.fill_target_helper(&window);
        let mut tgt_mem = alloc(&lapis, ObjectKind::Target, Some(th.into()));
        let mut target = lapis.construct_target(Some(&window), tgt_mem.regions(), &th).unwrap();

        let mut frames = 0;
        while lapis.stay_open(&window) {
            lapis.poll_events(&mut window).unwrap();
            lapis.clear(&mut target, Rgb::black()).unwrap();
            lapis.draw_immediate_pos_color(&mut target, &TRI, &RGB, 1).unwrap();
            lapis.schedule(&mut target).unwrap();
            lapis.swap(&mut window, &mut [&mut target]).unwrap();
            frames += 1;
            assert!(frames < 10, "close request never arrived");
        }

        // The close queued by the third present is seen at the fourth poll.
        assert_eq!(frames, 4);
        assert_eq!(window.frame_index(), 4);
        assert_eq!(target.refresh_count(), 4);

        let centre = pixel(window.front_buffer(), 720, 360, 180);
        assert_eq!(centre[3], 255);
        assert!(centre[..3].iter().any(|&c| c > 0));
        assert_eq!(pixel(window.front_buffer(), 720, 0, 0), [0, 0, 0, 255]);

        lapis.release_target(target);
        lapis.release_window(window);
        lapis.release_context(context);
        assert_eq!(lapis.backend().open_windows(), 0);
    }

    // ── debug sentinels ───────────────────────────────────────────────────

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "used before construction or after release")]
    fn unconstructed_regions_are_detected() {
        let mut host = [0u8; 64];
        let mut device = [0u8; 64];
        let _ = Target::from_constructed(Regions::new(&mut host, &mut device));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "used before construction or after release")]
    fn released_regions_are_detected() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let helper = TargetHelper { width: 4, height: 4 };
        let mut mem = alloc(&lapis, ObjectKind::Target, Some(helper.into()));
        let target = lapis.construct_target(None, mem.regions(), &helper).unwrap();
        let regions = lapis.release_target(target);
        let _ = Target::from_constructed(regions);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "context used before construction or after release")]
    fn kind_confusion_is_detected() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let mut ctx_mem = alloc(&lapis, ObjectKind::Context, None);
        let context = lapis.construct_context(ctx_mem.regions()).unwrap();
        let helper = WindowHelper { width: 4, height: 4 };
        let mut win_mem = alloc(&lapis, ObjectKind::Window, Some(helper.into()));
        let window = lapis.construct_window(&context, win_mem.regions(), &helper).unwrap();

        // Dropping a handle leaves the object constructed in its memory.
        drop(window);
        let _ = Context::from_constructed(win_mem.regions());
    }

    #[test]
    fn rewrapped_objects_keep_their_state() {
        let mut lapis = desktop(HeadlessConfig::unpaced());
        let helper = TargetHelper { width: 4, height: 4 };
        let size = lapis.query_size(ObjectKind::Target, Some(helper.into())).unwrap();
        let mut host = vec![0u8; size.host_bytes];
        let mut device = vec![0u8; size.device_bytes + size.device_alignment];
        let offset = device.as_ptr().align_offset(size.device_alignment);
        let device = &mut device[offset..offset + size.device_bytes];

        {
            let mut target = lapis
                .construct_target(None, Regions::new(&mut host, &mut *device), &helper)
                .unwrap();
            lapis.schedule(&mut target).unwrap();
        }

        let target = Target::from_constructed(Regions::new(&mut host, device));
        assert!(target.is_scheduled());
        assert_eq!(target.size(), (4, 4));
    }
}
