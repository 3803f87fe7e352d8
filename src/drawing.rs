use crate::animation::Animation;
use crate::colour::Rgba;
use crate::config::ProfileOptions;
use cairo::{Context, FontSlant, FontWeight, Format, ImageSurface};
use thiserror::Error;

const FONT_FAMILY: &str = "Sans";

/// Largest share of the screen an animation frame may cover.
const MAX_FRAME_SHARE: f64 = 0.4;

#[derive(Debug, Error)]
pub enum DrawError {
    #[error(transparent)]
    Cairo(#[from] cairo::Error),

    #[error("surface data unavailable: {0}")]
    Borrow(#[from] cairo::BorrowError),

    #[error("canvas holds {actual} bytes, expected {expected}")]
    CanvasSize { expected: usize, actual: usize },
}

/// Everything the splash shows.
pub struct Scene {
    pub options: ProfileOptions,
    pub animation: Option<Animation>,
    pub percent: f64,
    pub frame: usize,
}

impl Scene {
    pub fn new(options: ProfileOptions, animation: Option<Animation>) -> Self {
        Self {
            options,
            animation,
            percent: 0.0,
            frame: 0,
        }
    }
}

/// Text shown for a percentage, e.g. `42%`.
pub fn percent_label(percent: f64) -> String {
    format!("{}%", percent.clamp(0.0, 100.0) as u32)
}

/// Caption font size for a screen height; 48 px on a 1080 px screen.
pub fn caption_size(height: i32) -> f64 {
    (height as f64 / 22.5).max(12.0)
}

/// Render `scene` into an ARGB8888 `canvas` of `width * height` pixels.
pub fn draw_splash(
    canvas: &mut [u8],
    width: i32,
    height: i32,
    scene: &Scene,
) -> Result<(), DrawError> {
    let row = width as usize * 4;
    let expected = row * height as usize;
    if canvas.len() < expected {
        return Err(DrawError::CanvasSize {
            expected,
            actual: canvas.len(),
        });
    }

    let mut surface = ImageSurface::create(Format::ARgb32, width, height)?;
    {
        let cr = Context::new(&surface)?;
        paint_scene(&cr, width as f64, height as f64, scene)?;
    }
    surface.flush();

    let stride = surface.stride() as usize;
    let data = surface.data()?;
    for (y, dst) in canvas[..expected].chunks_exact_mut(row).enumerate() {
        let start = y * stride;
        dst.copy_from_slice(&data[start..start + row]);
    }
    Ok(())
}

fn paint_scene(cr: &Context, w: f64, h: f64, scene: &Scene) -> Result<(), DrawError> {
    let options = &scene.options;

    set_source(cr, options.background);
    cr.paint()?;

    let caption_size = caption_size(h as i32);
    let caption_y = h / 2.0;

    if let Some(frame) = scene.animation.as_ref().and_then(|a| a.frame(scene.frame)) {
        let fw = frame.width() as f64;
        let fh = frame.height() as f64;
        let scale = (w * MAX_FRAME_SHARE / fw).min(h * MAX_FRAME_SHARE / fh).min(1.0);
        let x = (w - fw * scale) / 2.0;
        let y = caption_y - caption_size * 1.5 - fh * scale;

        cr.save()?;
        cr.translate(x, y);
        cr.scale(scale, scale);
        cr.set_source_surface(frame, 0.0, 0.0)?;
        cr.paint()?;
        cr.restore()?;
    }

    set_source(cr, options.text);
    cr.select_font_face(FONT_FAMILY, FontSlant::Normal, FontWeight::Bold);

    if !options.caption.is_empty() {
        cr.set_font_size(caption_size);
        for (i, line) in options.caption.lines().enumerate() {
            centre_text(cr, w, caption_y + i as f64 * caption_size * 1.2, line)?;
        }
    }

    if options.show_percentage {
        let lines = options.caption.lines().count().max(1) as f64;
        cr.set_font_size(caption_size / 2.0);
        centre_text(
            cr,
            w,
            caption_y + caption_size * (lines * 1.2 + 0.2),
            &percent_label(scene.percent),
        )?;
    }
    Ok(())
}

fn centre_text(cr: &Context, w: f64, baseline: f64, text: &str) -> Result<(), cairo::Error> {
    let extents = cr.text_extents(text)?;
    cr.move_to((w - extents.width()) / 2.0 - extents.x_bearing(), baseline);
    cr.show_text(text)
}

fn set_source(cr: &Context, colour: Rgba) {
    let (r, g, b, a) = colour.to_f64();
    cr.set_source_rgba(r, g, b, a);
}
