//! Conversion between [`Chunk`]s and their packed wire representation.
//!
//! The encoder and decoder only ever deal with the typed variants; every bit of tag arithmetic
//! lives in this module.

use crate::{
    consts::*,
    utils::{diff, sum},
    Pixel, PixelCache,
};

/// Longest packed chunk: QOI_OP_RGBA plus four channel bytes.
pub const MAX_CHUNK_LEN: usize = 5;

/// One decoded unit of the chunk stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// Cache slot 0..63.
    Index(u8),
    /// Per-channel differences from the previous pixel, each in `-2..=1`.
    Diff { dr: i8, dg: i8, db: i8 },
    /// Green difference in `-32..=31`, red and blue relative to it in `-8..=7`.
    Luma { dg: i8, dr_dg: i8, db_dg: i8 },
    /// Number of repeats of the previous pixel, `1..=62`.
    Run(u8),
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

impl Chunk {
    /// Picks the smallest non-run chunk that turns `prev` into `pixel`, given a cache miss.
    ///
    /// Alpha changes always produce [`Chunk::Rgba`]; alpha is never delta-coded.
    pub fn delta(prev: Pixel, pixel: Pixel) -> Self {
        if pixel.a != prev.a {
            return Chunk::Rgba(pixel.to_array());
        }

        let (dr, dg, db) = (
            diff(pixel.r, prev.r),
            diff(pixel.g, prev.g),
            diff(pixel.b, prev.b),
        );

        if matches!((dr, dg, db), (-2..=1, -2..=1, -2..=1)) {
            return Chunk::Diff { dr, dg, db };
        }

        let dr_dg = dr.wrapping_sub(dg);
        let db_dg = db.wrapping_sub(dg);

        if matches!((dr_dg, dg, db_dg), (-8..=7, -32..=31, -8..=7)) {
            Chunk::Luma { dg, dr_dg, db_dg }
        } else {
            Chunk::Rgb([pixel.r, pixel.g, pixel.b])
        }
    }

    /// Packs the chunk into `buf`, returning the used part.
    pub fn write<'b>(&self, buf: &'b mut [u8; MAX_CHUNK_LEN]) -> &'b [u8] {
        let len = match *self {
            Chunk::Index(index) => {
                buf[0] = QOI_OP_INDEX | (index & 0b0011_1111);
                1
            }
            Chunk::Diff { dr, dg, db } => {
                let mut b = QOI_OP_DIFF;
                b |= ((dr + 2) as u8) << 4;
                b |= ((dg + 2) as u8) << 2;
                b |= (db + 2) as u8;
                buf[0] = b;
                1
            }
            Chunk::Luma { dg, dr_dg, db_dg } => {
                buf[0] = QOI_OP_LUMA | (dg + 32) as u8;
                buf[1] = ((dr_dg + 8) as u8) << 4 | (db_dg + 8) as u8;
                2
            }
            Chunk::Run(run) => {
                debug_assert!((1..=QOI_MAX_RUN).contains(&run));
                buf[0] = QOI_OP_RUN | (run - 1);
                1
            }
            Chunk::Rgb([r, g, b]) => {
                buf[..4].copy_from_slice(&[QOI_OP_RGB, r, g, b]);
                4
            }
            Chunk::Rgba([r, g, b, a]) => {
                buf.copy_from_slice(&[QOI_OP_RGBA, r, g, b, a]);
                5
            }
        };

        &buf[..len]
    }

    /// Number of bytes following the tag byte `tag`.
    #[inline]
    pub const fn payload_len(tag: u8) -> usize {
        match tag {
            QOI_OP_RGB => 3,
            QOI_OP_RGBA => 4,
            _ if tag & QOI_MASK_2 == QOI_OP_LUMA => 1,
            _ => 0,
        }
    }

    /// Unpacks a chunk from its tag byte and the [`payload_len`](Self::payload_len) bytes
    /// following it.
    pub fn parse(tag: u8, payload: &[u8]) -> Self {
        match tag {
            QOI_OP_RGB => Chunk::Rgb([payload[0], payload[1], payload[2]]),
            QOI_OP_RGBA => Chunk::Rgba([payload[0], payload[1], payload[2], payload[3]]),
            _ => match tag & QOI_MASK_2 {
                QOI_OP_INDEX => Chunk::Index(tag),
                QOI_OP_DIFF => Chunk::Diff {
                    dr: ((tag >> 4) & 0b11) as i8 - 2,
                    dg: ((tag >> 2) & 0b11) as i8 - 2,
                    db: (tag & 0b11) as i8 - 2,
                },
                QOI_OP_LUMA => Chunk::Luma {
                    dg: (tag & 0b0011_1111) as i8 - 32,
                    dr_dg: (payload[0] >> 4) as i8 - 8,
                    db_dg: (payload[0] & 0b1111) as i8 - 8,
                },
                _ => Chunk::Run((tag & 0b0011_1111) + 1),
            },
        }
    }

    /// Computes the pixel this chunk describes. Runs leave `prev` unchanged.
    pub fn apply(&self, prev: Pixel, cache: &PixelCache) -> Pixel {
        match *self {
            Chunk::Index(index) => cache.get(index),
            Chunk::Diff { dr, dg, db } => Pixel {
                r: sum(prev.r, dr),
                g: sum(prev.g, dg),
                b: sum(prev.b, db),
                a: prev.a,
            },
            Chunk::Luma { dg, dr_dg, db_dg } => Pixel {
                r: sum(prev.r, dg.wrapping_add(dr_dg)),
                g: sum(prev.g, dg),
                b: sum(prev.b, dg.wrapping_add(db_dg)),
                a: prev.a,
            },
            Chunk::Run(_) => prev,
            Chunk::Rgb([r, g, b]) => Pixel { r, g, b, a: prev.a },
            Chunk::Rgba(rgba) => Pixel::from(rgba),
        }
    }
}
