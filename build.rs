use image::GenericImageView;
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Panel geometry, must match `gde_display::epd::Geometry::PANEL_480X800`
const PANEL_WIDTH: u32 = 480;
const PANEL_HEIGHT: u32 = 800;

/// Convert a PNG image into a full-frame 1bpp base map at build time.
///
/// Bit set = white, bit cleared = ink, most significant bit first. A missing
/// image yields an all-white frame so the firmware always has a base map.
fn convert_base_map(
    input_path: &str,
    output_path: &str,
    threshold: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", input_path);

    let bytes_per_row = PANEL_WIDTH.div_ceil(8);
    let total_bytes = (bytes_per_row * PANEL_HEIGHT) as usize;
    let mut buffer = vec![0xFFu8; total_bytes];

    if !Path::new(input_path).exists() {
        println!(
            "cargo:warning=Base map '{}' not found, using a white frame",
            input_path
        );
        File::create(output_path)?.write_all(&buffer)?;
        return Ok(());
    }

    let img = image::open(input_path)?;
    let (orig_width, orig_height) = img.dimensions();

    let orig_ratio = orig_width as f32 / orig_height as f32;
    let target_ratio = PANEL_WIDTH as f32 / PANEL_HEIGHT as f32;
    let (new_width, new_height) = if orig_ratio > target_ratio {
        (PANEL_WIDTH, (PANEL_WIDTH as f32 / orig_ratio) as u32)
    } else {
        ((PANEL_HEIGHT as f32 * orig_ratio) as u32, PANEL_HEIGHT)
    };

    let gray = img
        .resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
        .to_luma8();

    let offset_x = (PANEL_WIDTH - new_width) / 2;
    let offset_y = (PANEL_HEIGHT - new_height) / 2;

    for y in 0..PANEL_HEIGHT {
        for x in 0..PANEL_WIDTH {
            let inside = x
                .checked_sub(offset_x)
                .zip(y.checked_sub(offset_y))
                .filter(|&(ix, iy)| ix < new_width && iy < new_height);

            let brightness = match inside {
                Some((ix, iy)) => gray.get_pixel(ix, iy)[0],
                None => 255,
            };

            if brightness < threshold {
                let byte_index = (y * bytes_per_row + x / 8) as usize;
                buffer[byte_index] &= !(1 << (7 - (x % 8)));
            }
        }
    }

    File::create(output_path)?.write_all(&buffer)?;
    println!(
        "cargo:warning=Base map converted from {} ({} bytes)",
        input_path,
        buffer.len()
    );
    Ok(())
}

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let base_map_output = format!("{}/base_map.bin", out_dir);

    if let Err(e) = convert_base_map("assets/base_map.png", &base_map_output, 128) {
        panic!("Failed to convert assets/base_map.png: {}", e);
    }
}
