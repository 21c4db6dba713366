// ABOUTME: BDF (Bitmap Distribution Format) font parser and glyph source.
// ABOUTME: Scales bitmap glyphs to the atlas font size with nearest-neighbour sampling.

use std::collections::HashMap;

use crate::surface::{GlyphBitmap, GlyphSource};

/// A parsed BDF font
#[derive(Debug, Clone)]
pub struct BdfFont {
    /// Font name from FONT property
    pub name: String,
    /// Global bounding box (width, height, offset x, offset y)
    pub bbox: [i32; 4],
    /// Font ascent (from FONT_ASCENT property)
    pub ascent: i32,
    /// Font descent (from FONT_DESCENT property, positive below baseline)
    pub descent: i32,
    glyphs: HashMap<char, BdfGlyph>,
}

/// A single glyph in a BDF font
#[derive(Debug, Clone)]
pub struct BdfGlyph {
    /// Device width - how far the pen advances
    pub dwidth_x: i32,
    pub width: u32,
    pub height: u32,
    /// X offset from origin
    pub offset_x: i32,
    /// Y offset of the bitmap bottom from the baseline (positive = above)
    pub offset_y: i32,
    /// One entry per row, bits left-aligned, (width + 7) / 8 bytes per row
    pub rows: Vec<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BdfError {
    #[error("Invalid BDF format: {0}")]
    InvalidFormat(String),
    #[error("Failed to parse number in {0:?}")]
    ParseNumber(String),
}

/// Parse the whitespace-separated numbers following a keyword.
fn numbers<const N: usize>(line: &str, rest: &str) -> Result<[i32; N], BdfError> {
    let mut out = [0i32; N];
    let mut parts = rest.split_whitespace();
    for slot in out.iter_mut() {
        *slot = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| BdfError::ParseNumber(line.to_string()))?;
    }
    Ok(out)
}

impl BdfFont {
    pub fn parse(data: &[u8]) -> Result<Self, BdfError> {
        let content = std::str::from_utf8(data)
            .map_err(|e| BdfError::InvalidFormat(format!("Invalid UTF-8: {}", e)))?;
        Self::parse_str(content)
    }

    pub fn parse_str(content: &str) -> Result<Self, BdfError> {
        let mut lines = content.lines().map(str::trim);

        match lines.next() {
            Some(first) if first.starts_with("STARTFONT") => {}
            Some(_) => return Err(BdfError::InvalidFormat("Missing STARTFONT".into())),
            None => return Err(BdfError::InvalidFormat("Empty file".into())),
        }

        let mut name = String::new();
        let mut bbox = [0i32; 4];
        let mut ascent = None;
        let mut descent = None;

        for line in lines.by_ref() {
            if line.starts_with("CHARS ") {
                break;
            }
            if let Some(rest) = line.strip_prefix("FONT ") {
                name = rest.to_string();
            } else if let Some(rest) = line.strip_prefix("FONTBOUNDINGBOX ") {
                bbox = numbers::<4>(line, rest)?;
            } else if let Some(rest) = line.strip_prefix("FONT_ASCENT ") {
                ascent = Some(numbers::<1>(line, rest)?[0]);
            } else if let Some(rest) = line.strip_prefix("FONT_DESCENT ") {
                descent = Some(numbers::<1>(line, rest)?[0]);
            }
        }

        // Without explicit metrics the bounding box offset is the descent
        let descent = descent.unwrap_or(-bbox[3]);
        let ascent = ascent.unwrap_or(bbox[1] - descent);

        let mut glyphs = HashMap::new();
        while let Some(line) = lines.next() {
            if line == "ENDFONT" {
                break;
            }
            if line.starts_with("STARTCHAR") {
                if let Some((c, glyph)) = Self::parse_glyph(&mut lines)? {
                    glyphs.insert(c, glyph);
                }
            }
        }

        Ok(BdfFont {
            name,
            bbox,
            ascent,
            descent,
            glyphs,
        })
    }

    fn parse_glyph<'a, I>(lines: &mut I) -> Result<Option<(char, BdfGlyph)>, BdfError>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut encoding: Option<i64> = None;
        let mut dwidth_x = 0;
        let mut bbx = [0i32; 4];
        let mut rows = Vec::new();
        let mut in_bitmap = false;

        for line in lines.by_ref() {
            if line == "ENDCHAR" {
                break;
            }
            if in_bitmap {
                rows.push(Self::parse_hex_row(line)?);
            } else if let Some(rest) = line.strip_prefix("ENCODING ") {
                encoding = Some(numbers::<1>(line, rest)?[0] as i64);
            } else if let Some(rest) = line.strip_prefix("DWIDTH ") {
                dwidth_x = numbers::<1>(line, rest)?[0];
            } else if let Some(rest) = line.strip_prefix("BBX ") {
                bbx = numbers::<4>(line, rest)?;
            } else if line == "BITMAP" {
                in_bitmap = true;
            }
        }

        // Negative encodings are Adobe-specific unencoded glyphs
        let Some(c) = encoding
            .and_then(|e| u32::try_from(e).ok())
            .and_then(char::from_u32)
        else {
            return Ok(None);
        };

        Ok(Some((
            c,
            BdfGlyph {
                dwidth_x,
                width: bbx[0].max(0) as u32,
                height: bbx[1].max(0) as u32,
                offset_x: bbx[2],
                offset_y: bbx[3],
                rows,
            },
        )))
    }

    fn parse_hex_row(hex: &str) -> Result<Vec<u8>, BdfError> {
        let invalid = || BdfError::InvalidFormat(format!("Invalid hex row: {}", hex));
        if hex.len() % 2 != 0 || !hex.is_ascii() {
            return Err(invalid());
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid()))
            .collect()
    }

    pub fn get_char(&self, c: char) -> Option<&BdfGlyph> {
        self.glyphs.get(&c)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Native line height (ascent + descent)
    pub fn cell_height(&self) -> u32 {
        (self.ascent + self.descent).max(1) as u32
    }
}

impl BdfGlyph {
    /// Whether the pixel at (x, y) in the glyph's bounding box is set
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        let Some(row) = self.rows.get(y as usize) else {
            return false;
        };
        let byte = (x / 8) as usize;
        let bit = 7 - (x % 8);
        row.get(byte).is_some_and(|b| (b >> bit) & 1 == 1)
    }

    /// Render to a grayscale bitmap of `width * height` bytes, each 0 or 255.
    pub fn render(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((self.width * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push(if self.is_set(x, y) { 255 } else { 0 });
            }
        }
        pixels
    }
}

impl GlyphSource for BdfFont {
    fn rasterize_centered(&self, c: char, font_size: f32) -> Option<GlyphBitmap> {
        let glyph = self.get_char(c)?;
        let scale = font_size / self.cell_height() as f32;

        let width = (glyph.width as f32 * scale).round() as usize;
        let height = (glyph.height as f32 * scale).round() as usize;

        let mut coverage = vec![0u8; width * height];
        for y in 0..height {
            let src_y = ((y as f32 + 0.5) / scale) as u32;
            for x in 0..width {
                let src_x = ((x as f32 + 0.5) / scale) as u32;
                if glyph.is_set(src_x.min(glyph.width.saturating_sub(1)), src_y) {
                    coverage[y * width + x] = 255;
                }
            }
        }

        // Centre on the advance box horizontally and the ascent/descent box vertically
        let advance = glyph.dwidth_x as f32 * scale;
        let baseline = (self.ascent - self.descent) as f32 * scale / 2.0;
        Some(GlyphBitmap {
            width,
            height,
            coverage,
            left: -advance / 2.0 + glyph.offset_x as f32 * scale,
            top: baseline - (glyph.offset_y as f32 + glyph.height as f32) * scale,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 8x8 test font: space, a centered dot, a 2x2 block and a full block.
    pub(crate) const TEST_BDF: &str = r#"STARTFONT 2.1
FONT -Test-Blocks-Medium-R-Normal--8-80-75-75-C-80-ISO10646-1
SIZE 8 75 75
FONTBOUNDINGBOX 8 8 0 -2
STARTPROPERTIES 2
FONT_ASCENT 6
FONT_DESCENT 2
ENDPROPERTIES
CHARS 4
STARTCHAR space
ENCODING 32
SWIDTH 500 0
DWIDTH 8 0
BBX 8 8 0 -2
BITMAP
00
00
00
00
00
00
00
00
ENDCHAR
STARTCHAR period
ENCODING 46
SWIDTH 500 0
DWIDTH 8 0
BBX 8 8 0 -2
BITMAP
00
00
00
18
18
00
00
00
ENDCHAR
STARTCHAR colon
ENCODING 58
SWIDTH 500 0
DWIDTH 8 0
BBX 8 8 0 -2
BITMAP
00
00
3C
3C
3C
3C
00
00
ENDCHAR
STARTCHAR numbersign
ENCODING 35
SWIDTH 500 0
DWIDTH 8 0
BBX 8 8 0 -2
BITMAP
FF
FF
FF
FF
FF
FF
FF
FF
ENDCHAR
STARTCHAR unencoded
ENCODING -1
BBX 8 8 0 -2
BITMAP
FF
FF
FF
FF
FF
FF
FF
FF
ENDCHAR
ENDFONT
"#;

    pub(crate) fn test_font() -> BdfFont {
        BdfFont::parse_str(TEST_BDF).unwrap()
    }

    #[test]
    fn test_parse_bdf() {
        let font = test_font();
        assert_eq!(font.bbox, [8, 8, 0, -2]);
        assert_eq!(font.ascent, 6);
        assert_eq!(font.descent, 2);
        assert_eq!(font.cell_height(), 8);
        // The unencoded glyph is skipped
        assert_eq!(font.glyph_count(), 4);

        let dot = font.get_char('.').unwrap();
        assert_eq!((dot.width, dot.height), (8, 8));
        assert_eq!(dot.rows.len(), 8);
    }

    #[test]
    fn test_render_glyph() {
        let font = test_font();
        let pixels = font.get_char('.').unwrap().render();

        // Row 3: 0x18 = 00011000
        assert_eq!(pixels[3 * 8 + 3], 255);
        assert_eq!(pixels[3 * 8 + 4], 255);
        assert_eq!(pixels[3 * 8 + 2], 0);
        assert_eq!(pixels[0], 0);
    }

    #[test]
    fn test_missing_startfont() {
        assert!(BdfFont::parse_str("FONT nope\n").is_err());
        assert!(BdfFont::parse_str("").is_err());
    }

    #[test]
    fn test_scaled_full_block_is_centred() {
        let font = test_font();
        let bitmap = font.rasterize_centered('#', 32.0).unwrap();

        // 8px glyph scaled 4x
        assert_eq!((bitmap.width, bitmap.height), (32, 32));
        assert!(bitmap.coverage.iter().all(|&c| c == 255));
        // Horizontal: advance box centred on the anchor
        assert_eq!(bitmap.left, -16.0);
        // Vertical: the glyph spans the whole ascent/descent box
        assert_eq!(bitmap.top, -16.0);
    }

    #[test]
    fn test_unknown_char_has_no_bitmap() {
        assert!(test_font().rasterize_centered('Q', 16.0).is_none());
    }
}
