//! Demo firmware: clean start, base map, then a rotating message drawn with
//! partial refreshes.

#[cfg(target_os = "espidf")]
mod firmware {
    use std::time::{Duration, Instant};

    use anyhow::Context;
    use embedded_graphics::mono_font::{iso_8859_15::FONT_10X20, MonoTextStyle};
    use embedded_graphics::pixelcolor::Rgb565;
    use embedded_graphics::prelude::*;
    use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
    use esp_idf_svc::hal::delay::FreeRtos;

    use gde_display::epd::flag::Flag;
    use gde_display::epd::platform::EspPlatform;
    use gde_display::{pack, Canvas, Epd, PanelConfig, PixelFormat};

    // Pre-converted base map (generated at build time from assets/base_map.png)
    const BASE_MAP: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/base_map.bin"));

    const MESSAGES: [&str; 2] = ["Airgradient", "Welcome"];
    const MESSAGE_INTERVAL: Duration = Duration::from_secs(5);
    const POLL_MS: u32 = 50;

    /// Message strip: full panel width, centred vertically
    const LABEL_Y: u16 = 380;
    const LABEL_HEIGHT: u16 = 40;

    fn render_message(
        epd: &mut Epd<EspPlatform>,
        canvas: &mut Canvas,
        message: &str,
    ) -> anyhow::Result<()> {
        canvas.clear(Rgb565::WHITE)?;

        let character_style = MonoTextStyle::new(&FONT_10X20, Rgb565::BLACK);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        let centre = canvas.bounding_box().center();
        Text::with_text_style(message, centre, character_style, text_style).draw(canvas)?;

        let packed = pack(&canvas.full_source()?, PixelFormat::Rgb565)?;
        log::info!(
            "Drawing '{}' ({} ink pixels) at {:?}",
            message,
            packed.ink_pixels,
            packed.window
        );
        epd.draw_packed(&packed, false)?;
        Ok(())
    }

    pub fn run() -> anyhow::Result<()> {
        // It is necessary to call this function once. Otherwise some patches to the runtime
        // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
        esp_idf_svc::sys::link_patches();

        // Bind the log crate to the ESP Logging facilities
        esp_idf_svc::log::EspLogger::initialize_default();

        let config = PanelConfig::board();
        log::info!("Panel lines: {:?}", config.lines());

        let mut epd = Epd::new(EspPlatform::new());
        epd.init(config).context("EPD init failed")?;

        log::info!("Display full refresh for clean start");
        epd.hardware_init(false)?;
        epd.clear(Flag::FILL_WHITE)?;
        FreeRtos::delay_ms(1000);

        epd.hardware_init(true)?;
        epd.load_base_map(BASE_MAP, true)
            .context("Failed to load base map")?;

        let geometry = epd
            .config()
            .map(|c| c.geometry)
            .unwrap_or_default();
        let mut canvas = Canvas::new(geometry.width, LABEL_HEIGHT).with_origin(0, LABEL_Y);

        let mut index = 0;
        render_message(&mut epd, &mut canvas, MESSAGES[index])?;
        let mut last_switch = Instant::now();

        loop {
            if last_switch.elapsed() >= MESSAGE_INTERVAL {
                last_switch = Instant::now();
                index = (index + 1) % MESSAGES.len();
                if let Err(e) = render_message(&mut epd, &mut canvas, MESSAGES[index]) {
                    log::error!("Failed to draw message: {:?}", e);
                }
            }
            FreeRtos::delay_ms(POLL_MS);
        }
    }
}

// https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("this firmware only runs on ESP-IDF targets; the library is usable on any host")
}
