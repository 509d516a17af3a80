//! Draws one frame with the software backend and saves it as a screenshot.
//!
//! ```text
//! cargo run --example software_frame -- [output-dir]
//! ```

use std::io::Cursor;
use std::path::PathBuf;

use deferred_render::config::{BackendKind, LogLevel};
use deferred_render::render::{depth, Color, Flip};
use deferred_render::{logging, DeferredRenderer, RendererConfig, Sprite};

fn checkerboard(size: u32) -> anyhow::Result<Vec<u8>> {
    let img = image::RgbaImage::from_fn(size, size, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Rgba([240, 200, 40, 255])
        } else {
            image::Rgba([40, 80, 200, 255])
        }
    });

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("screenshots"));

    let config = RendererConfig::builder()
        .screen(320, 240)
        .window(640, 400)
        .backend(BackendKind::Software)
        .screenshots_dir(out_dir)
        .log_level(LogLevel::Debug)
        .build()?;
    logging::init(config.log_level);

    let mut renderer = DeferredRenderer::new(config)?;
    let tiles = renderer.lazy_load_picture_bytes(checkerboard(32)?, None, false);

    // submitted front to back, painted back to front
    renderer.render_rect(140, 100, 40, 40, depth::HUD, Color::rgba(255, 255, 255, 160), true);
    renderer.render_sprite(Sprite::new(tiles, 40.0, 40.0).size(64.0, 64.0).depth(depth::PLAYER));
    renderer.render_sprite(
        Sprite::new(tiles, 200.0, 60.0)
            .src(0, 0, 16, 16)
            .size(48.0, 48.0)
            .rotate_around(30.0, 0.0, 0.0)
            .flip(Flip::HORIZONTAL)
            .color(Color::rgb(255, 128, 128))
            .depth(depth::NPC_NORMAL),
    );
    renderer.render_circle(260, 180, 30, depth::EFFECT, Color::rgb(200, 30, 30));
    renderer.render_circle_hole(60, 180, 25, depth::EFFECT, Color::rgb(30, 160, 30));
    renderer.render_rect(0, 0, 320, 240, depth::BACKGROUND_2, Color::rgb(20, 20, 28), true);

    renderer.repaint();

    if let Some(task) = renderer.make_shot() {
        let path = task.wait()?;
        println!("saved {}", path.display());
    }

    println!("lazy textures uploaded: {} bytes", renderer.lazy_loaded_bytes());
    renderer.close();
    Ok(())
}
