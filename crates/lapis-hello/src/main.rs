//! Opens a window and draws one RGB triangle until the window is closed.

use anyhow::Context as _;
use lapis::backend::{WgpuBackend, WgpuConfig};
use lapis::logging::{LoggingConfig, init_logging};
use lapis::{Allocation, Lapis, ObjectKind, Rgb, WindowHelper};

const POSITIONS: [f32; 9] = [
    0.0, 0.5, 0.0, //
    0.5, -0.5, 0.0, //
    -0.5, -0.5, 0.0,
];
const COLORS: [f32; 9] = [
    1.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, //
    0.0, 0.0, 1.0,
];

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let mut lapis = Lapis::new(WgpuBackend::new(WgpuConfig {
        title: "lapis hello".to_string(),
        ..WgpuConfig::default()
    }));
    lapis.connect().context("failed to connect")?;

    let mut context_memory = Allocation::new(&lapis.query_size(ObjectKind::Context, None)?)?;
    let context = lapis.construct_context(context_memory.regions())?;

    let window_helper = WindowHelper {
        width: 640,
        height: 480,
    };
    let mut window_memory =
        Allocation::new(&lapis.query_size(ObjectKind::Window, Some(window_helper.into()))?)?;
    let mut window = lapis
        .construct_window(&context, window_memory.regions(), &window_helper)
        .context("failed to open window")?;

    let target_helper = lapis.fill_target_helper(&window);
    let mut target_memory =
        Allocation::new(&lapis.query_size(ObjectKind::Target, Some(target_helper.into()))?)?;
    let mut target = lapis.construct_target(Some(&window), target_memory.regions(), &target_helper)?;

    while lapis.stay_open(&window) {
        lapis.poll_events(&mut window)?;

        lapis.clear(&mut target, Rgb::new(0.1, 0.1, 0.12))?;
        lapis.draw_immediate_pos_color(&mut target, &POSITIONS, &COLORS, 1)?;
        lapis.schedule(&mut target)?;
        lapis.swap(&mut window, &mut [&mut target])?;
    }

    log::info!("window closed after {} frames", window.frame_index());

    lapis.release_target(target);
    lapis.release_window(window);
    lapis.release_context(context);
    Ok(())
}
