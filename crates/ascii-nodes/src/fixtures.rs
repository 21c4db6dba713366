// ABOUTME: Test backends shared by the node tests.
// ABOUTME: A tiny embedded BDF font plus a backend whose surface is never available.

use std::sync::Arc;

use ascii_renderer::{AtlasError, RasterBackend, RasterSurface, SoftwareBackend};

/// 8x8 font with a blank space and a full block for '#'.
const BLOCKS_BDF: &str = r#"STARTFONT 2.1
FONT -Test-Blocks-Medium-R-Normal--8-80-75-75-C-80-ISO10646-1
SIZE 8 75 75
FONTBOUNDINGBOX 8 8 0 -2
STARTPROPERTIES 2
FONT_ASCENT 6
FONT_DESCENT 2
ENDPROPERTIES
CHARS 2
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
ENDFONT
"#;

pub fn backend() -> Arc<dyn RasterBackend> {
    Arc::new(SoftwareBackend::from_font_bytes(BLOCKS_BDF.as_bytes()).unwrap())
}

pub struct NoSurface;

impl RasterBackend for NoSurface {
    fn acquire(&self, _width: u32, _height: u32) -> Result<Box<dyn RasterSurface>, AtlasError> {
        Err(AtlasError::SurfaceUnavailable("no display".into()))
    }
}
