// Stencil preview helpers: BMP output and a text-mode highlight preview.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use label_stencil::{HighlightPass, MonospaceLayout, StencilSurface};

// ============================================================================
// BMP output (32-bit BGRA, top-down)
// ============================================================================

/// Encode `surface` as a 32-bit top-down BMP.
pub fn write_bmp<W: Write>(out: &mut W, surface: &StencilSurface) -> io::Result<()> {
    let w = surface.width();
    let h = surface.height();
    let row_size = w * 4;
    let image_size = row_size * h;
    let file_size = 14 + 40 + image_size;

    // BMP file header (14 bytes)
    out.write_all(b"BM")?;
    out.write_all(&file_size.to_le_bytes())?;
    out.write_all(&[0u8; 4])?; // reserved
    out.write_all(&(14u32 + 40).to_le_bytes())?; // pixel data offset

    // BITMAPINFOHEADER (40 bytes)
    out.write_all(&40u32.to_le_bytes())?;
    out.write_all(&w.to_le_bytes())?;
    out.write_all(&(-(h as i32)).to_le_bytes())?; // negative height = top-down
    out.write_all(&1u16.to_le_bytes())?; // planes
    out.write_all(&32u16.to_le_bytes())?; // bits per pixel
    out.write_all(&0u32.to_le_bytes())?; // BI_RGB
    out.write_all(&image_size.to_le_bytes())?;
    out.write_all(&[0u8; 16])?; // resolution, palette

    let mut row = vec![0u8; row_size as usize];
    for y in 0..h {
        for (dst, src) in row
            .chunks_exact_mut(4)
            .zip(surface.row_slice(y).chunks_exact(4))
        {
            dst.copy_from_slice(&[src[2], src[1], src[0], src[3]]);
        }
        out.write_all(&row)?;
    }
    Ok(())
}

pub fn save_bmp(path: &Path, surface: &StencilSurface) -> io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    write_bmp(&mut f, surface)?;
    f.flush()
}

// ============================================================================
// Text preview
// ============================================================================

/// Lay `chars` out on `layout` and mark highlighted ones.
///
/// Highlighted characters are kept, the rest replaced by `dim`. With
/// `ansi` set, highlighted characters are printed bold white instead and the
/// rest keep their glyph in green.
pub fn render_text(
    chars: &[&str],
    layout: &MonospaceLayout,
    pass: &HighlightPass,
    dim: char,
    ansi: bool,
) -> String {
    let cols = layout.columns();
    let mut s = String::new();
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && i % cols == 0 {
            s.push('\n');
        }
        match (pass.is_highlighted(i), ansi) {
            (true, true) => {
                s.push_str("\x1b[1;97m");
                s.push_str(ch);
                s.push_str("\x1b[0m");
            }
            (false, true) => {
                s.push_str("\x1b[32m");
                s.push_str(ch);
                s.push_str("\x1b[0m");
            }
            (true, false) => s.push_str(ch),
            (false, false) => s.push(dim),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use label_stencil::{Bounds, CharacterGrid, LabelConfig, LabelController};

    #[test]
    fn test_bmp_header_and_size() {
        let mut s = StencilSurface::new(3, 2);
        s.clear(&label_stencil::Rgba8::new(10, 20, 30, 40));
        let mut out = Vec::new();
        write_bmp(&mut out, &s).unwrap();
        assert_eq!(&out[0..2], b"BM");
        assert_eq!(out.len(), 54 + 3 * 2 * 4);
        assert_eq!(i32::from_le_bytes([out[22], out[23], out[24], out[25]]), -2);
        assert_eq!(&out[54..58], &[30, 20, 10, 40]);
    }

    #[test]
    fn test_render_text_marks_highlights() {
        let config = LabelConfig {
            text: "I".to_string(),
            font_size_px: 40.0,
            offset_x: 0.0,
            offset_y: 40.0,
            highlight_threshold: 0.4,
        };
        let text = "x".repeat(24);
        let mut c = LabelController::new(config, Bounds::new(40.0, 40.0), &text);
        let layout = MonospaceLayout::new(4.0, 8.0, 40.0, 24);
        let pass = c.highlight(&layout);
        let grid = CharacterGrid::new(&text);
        let chars: Vec<&str> = grid.cells().iter().map(|c| c.source_char.as_str()).collect();
        let out = render_text(&chars, &layout, &pass, '.', false);
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains('x'));
        assert!(out.contains('.'));
    }
}
