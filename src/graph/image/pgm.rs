//! Minimal PGM (portable graymap) decoder for `P2` and `P5` files.

use super::GrayImage;
use crate::error::{Error, Result};

struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while self.bytes.get(self.pos).is_some_and(|&c| c != b'\n') {
                    self.pos += 1;
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a str> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(Error::ParseImage("unexpected end of header".into()));
        }
        let bytes: &'a [u8] = self.bytes;
        core::str::from_utf8(&bytes[start..self.pos])
            .map_err(|_| Error::ParseImage("header is not ASCII".into()))
    }

    fn number(&mut self, what: &str) -> Result<usize> {
        let tok = self.token()?;
        tok.parse()
            .map_err(|_| Error::ParseImage(format!("bad {what} `{tok}`")))
    }
}

pub(super) fn decode(bytes: &[u8]) -> Result<GrayImage> {
    let mut header = Header { bytes, pos: 0 };
    let magic = header.token()?;
    if magic != "P2" && magic != "P5" {
        return Err(Error::ParseImage(format!("unsupported magic `{magic}`")));
    }
    let width = header.number("width")?;
    let height = header.number("height")?;
    let max = header.number("maxval")?;
    if max == 0 || max > 255 {
        return Err(Error::ParseImage(format!("unsupported maxval {max}")));
    }
    let scale = |v: usize| -> u8 { u8::try_from(v * 255 / max).unwrap_or(u8::MAX) };

    let count = width * height;
    let pixels = if magic == "P5" {
        // Exactly one whitespace byte separates the header from the raster.
        let start = header.pos + 1;
        let raster = bytes
            .get(start..start + count)
            .ok_or_else(|| Error::ParseImage("raster shorter than width*height".into()))?;
        raster.iter().map(|&v| scale(usize::from(v))).collect()
    } else {
        let mut pixels = Vec::with_capacity(count);
        for _ in 0..count {
            let v = header.number("sample")?;
            if v > max {
                return Err(Error::ParseImage(format!("sample {v} exceeds maxval {max}")));
            }
            pixels.push(scale(v));
        }
        pixels
    };
    GrayImage::new(width, height, pixels)
}
