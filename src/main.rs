//! Block Field entry point
//!
//! On the web this mounts the field into `#block-field`. Natively it runs a
//! headless session (settle, click, settle) and reports frame statistics.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;

    use block_field::platform::BlockFieldHandle;

    /// Container id the page provides
    const CONTAINER_ID: &str = "block-field";

    thread_local! {
        // Keeps the field alive for the lifetime of the page
        static HANDLE: RefCell<Option<BlockFieldHandle>> = const { RefCell::new(None) };
    }

    pub fn run() {
        block_field::platform::init_logging();
        log::info!("Block Field starting...");

        match BlockFieldHandle::mount(CONTAINER_ID) {
            Ok(handle) => {
                HANDLE.with(|h| *h.borrow_mut() = Some(handle));
                log::info!("Block Field running!");
            }
            Err(e) => log::error!("Failed to mount block field: {:?}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_app::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Block Field (native) starting...");
    log::info!("Interactive mode needs a browser - run with `trunk serve` for the web version");

    let out_path = std::env::args().nth(1);
    if let Err(e) = headless::run(out_path.as_deref()) {
        log::error!("Headless run failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fs::File;
    use std::io::{self, BufWriter, Write};

    use block_field::renderer::Raster;
    use block_field::{BlockField, Settings, Theme, TickRate};

    /// Simulated display refresh interval
    const REFRESH_MS: f64 = 1000.0 / 60.0;
    const SETTLE_LIMIT: usize = 600;

    /// Feed display refreshes until a frame reports idle; returns refreshes used
    fn settle(field: &mut BlockField, clock_ms: &mut f64) -> Option<usize> {
        (1..=SETTLE_LIMIT).find(|_| {
            *clock_ms += REFRESH_MS;
            field
                .frame(*clock_ms, Theme::Dark)
                .is_some_and(|frame| frame.rate == TickRate::Low)
        })
    }

    pub fn run(out_path: Option<&str>) -> io::Result<()> {
        let settings = Settings::load();
        let seed = 0x5eed;
        let mut field = BlockField::mount(Some(settings.default_width), settings, seed);
        let mut clock_ms = 0.0;

        match settle(&mut field, &mut clock_ms) {
            Some(frames) => log::info!("Settled after {} frames", frames),
            None => log::warn!("Still animating after {} frames", SETTLE_LIMIT),
        }

        let Some(size) = field.size() else {
            return Ok(());
        };
        let center = size / 2.0;
        if field.click(center.x, center.y) {
            log::info!("Clicked at ({:.0}, {:.0})", center.x, center.y);
        }
        match settle(&mut field, &mut clock_ms) {
            Some(frames) => log::info!("Wave settled after {} frames", frames),
            None => log::warn!("Wave still animating after {} frames", SETTLE_LIMIT),
        }

        if let Some(path) = out_path {
            if let Some(list) = field.draw(Theme::Dark) {
                write_ppm(&Raster::render(&list), path)?;
                log::info!("Wrote {} triangles to {}", list.triangle_count(), path);
            }
        }

        if let Some(stats) = field.stats() {
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
        field.destroy();
        Ok(())
    }

    /// Binary PPM; alpha is dropped
    fn write_ppm(raster: &Raster, path: &str) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write!(out, "P6\n{} {}\n255\n", raster.width(), raster.height())?;
        for px in raster.as_rgba().chunks_exact(4) {
            out.write_all(&px[..3])?;
        }
        out.flush()
    }
}
