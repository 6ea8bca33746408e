//! Implementation of the [QOI Image format](https://qoiformat.org/), a lossless codec for RGB and
//! RGBA images.
//!
//! QOI gets its compression ratio without any entropy coder: every pixel is described by one of
//! six chunk types, chosen by a fixed priority:
//!
//! 1. [`QOI_OP_RUN`](consts::QOI_OP_RUN) if it repeats the previous pixel,
//! 2. [`QOI_OP_INDEX`](consts::QOI_OP_INDEX) if it is in the 64-slot color cache,
//! 3. [`QOI_OP_RGBA`](consts::QOI_OP_RGBA) if its alpha differs from the previous pixel,
//! 4. [`QOI_OP_DIFF`](consts::QOI_OP_DIFF) for small per-channel differences,
//! 5. [`QOI_OP_LUMA`](consts::QOI_OP_LUMA) for differences relative to the green channel,
//! 6. [`QOI_OP_RGB`](consts::QOI_OP_RGB) otherwise.
//!
//! # Stream format
//!
//! - 14-byte [`Header`]: magic `qoif`, u32be width, u32be height, channel count, colorspace
//! - chunks, see [consts] for the different operation types
//! - end marker: seven `0x00` bytes followed by `0x01`
//!
//! All encode and decode state (previous pixel, color cache) lives in a context value owned by a
//! single call, so separate images can be processed in parallel without any locking.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod chunk;
pub mod decode;
pub mod encode;
pub mod header;
pub mod pixel;
pub mod utils;

pub use decode::{QoiDecodeContext, TruncationPolicy};
pub use encode::QoiEncodeContext;
pub use header::{Channels, Colorspace, Header, HeaderError};
pub use pixel::{Pixel, PixelCache};

pub mod consts {
    /// Re-emit a pixel from the color cache.
    ///
    /// ```plain
    /// .- QOI_OP_INDEX ----------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------|
    /// |  0  0 |     index       |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b00
    /// - 6-bit index into the color cache: 0..63
    pub const QOI_OP_INDEX: u8 = 0b0000_0000;

    /// Calculate a pixel based on a 2-bit difference from the previous pixel.
    ///
    /// ```plain
    /// .- QOI_OP_DIFF -----------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----+-----+-----|
    /// |  0  1 |  dr |  dg |  db |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b01
    /// - 2-bit red, green and blue channel differences from the previous pixel between -2..1,
    ///   each stored with a bias of 2
    ///
    /// Differences wrap around, so `1 - 2` is `255` and `255 + 1` is `0`. Alpha is unchanged.
    pub const QOI_OP_DIFF: u8 = 0b0100_0000;

    /// Calculate a pixel based on a 6-bit green-channel difference from the previous pixel, and
    /// differences to the green-channel difference for red and blue.
    ///
    ///  ```plain
    /// .- QOI_OP_LUMA -------------------------------------.
    /// |         Byte[0]         |         Byte[1]         |
    /// |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------+-------------+-----------|
    /// |  1  0 |  green diff     |   dr - dg   |  db - dg  |
    /// `---------------------------------------------------`
    /// ```
    ///
    /// - 2-bit tag b10
    /// - 6-bit green channel difference from the previous pixel (`-32..31`), stored with a bias of
    ///   32
    /// - 4-bit red channel difference minus green channel difference (`-8..7`), stored with a bias
    ///   of 8
    /// - 4-bit blue channel difference minus green channel difference (`-8..7`), stored with a bias
    ///   of 8
    pub const QOI_OP_LUMA: u8 = 0b1000_0000;

    /// Repeats the previous pixel.
    ///
    /// ```plain
    /// .- QOI_OP_RUN ------------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------|
    /// |  1  1 |       run       |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b11
    /// - 6-bit run-length repeating the previous pixel: 1..62
    /// - The run-length is stored with a bias of -1. Note that the run-lengths 63 and 64 (`b111110`
    ///   and `b111111`) are illegal as they are occupied by the QOI_OP_RGB and QOI_OP_RGBA tags.
    pub const QOI_OP_RUN: u8 = 0b1100_0000;

    /// Emits a raw RGB pixel, keeping the alpha of the previous pixel.
    ///
    /// ```plain
    /// .- QOI_OP_RGB ------------------------------------------.
    /// |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] |
    /// |  7  6  5  4  3  2  1  0 | 7 .. 0  | 7 .. 0  | 7 .. 0  |
    /// |-------------------------+---------+---------+---------|
    /// |  1  1  1  1  1  1  1  0 |   red   |  green  |  blue   |
    /// `-------------------------------------------------------`
    /// ```
    pub const QOI_OP_RGB: u8 = 0b1111_1110;

    /// Emits a raw RGBA pixel.
    ///
    /// ```plain
    /// .- QOI_OP_RGBA ---------------------------------------------------.
    /// |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] | Byte[4] |
    /// |  7  6  5  4  3  2  1  0 | 7 .. 0  | 7 .. 0  | 7 .. 0  | 7 .. 0  |
    /// |-------------------------+---------+---------+---------+---------|
    /// |  1  1  1  1  1  1  1  1 |   red   |  green  |  blue   |  alpha  |
    /// `-----------------------------------------------------------------`
    /// ```
    pub const QOI_OP_RGBA: u8 = 0b1111_1111;

    /// Mask for the 2-bit chunk tags.
    pub const QOI_MASK_2: u8 = 0b1100_0000;

    /// `qoif` as a big-endian u32.
    pub const QOI_MAGIC: u32 = u32::from_be_bytes(*b"qoif");

    pub const QOI_HEADER_SIZE: usize = 14;

    /// Marks the end of the stream.
    pub const QOI_END_MARKER: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

    pub const QOI_CACHE_SIZE: usize = 64;

    /// Longest run a single QOI_OP_RUN chunk can describe.
    pub const QOI_MAX_RUN: u8 = 62;

    /// Upper bound on `width * height`. Guards against overflow and absurd allocations: at 5 bytes
    /// per pixel in the worst case, this keeps encoded images below 2 GB.
    pub const QOI_PIXELS_MAX: u64 = 400_000_000;
}
