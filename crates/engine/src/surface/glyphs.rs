//! Built-in 3x5 bitmap font used by the software surface and the default text metrics.
//!
//! Each glyph packs five 3-bit rows into a `u16`, top row in the highest bits.

pub(crate) const GLYPH_COLUMNS: u32 = 3;
pub(crate) const GLYPH_ROWS: u32 = 5;
/// Horizontal advance per character, in glyph cells (one blank column between glyphs).
pub(crate) const ADVANCE_COLUMNS: u32 = GLYPH_COLUMNS + 1;
/// Glyph cells per em; a `{pixels}px` font maps `pixels` onto this many cells.
pub(crate) const CELLS_PER_EM: f64 = 7.0;

const FIRST_PRINTABLE: u32 = 0x20;

const GLYPHS: [u16; 95] = [
    0x0000, // space
    0x2482, // !
    0x5a00, // "
    0x5f7d, // #
    0x7ddf, // $
    0x52a5, // %
    0x2aab, // &
    0x2400, // quote
    0x1491, // (
    0x4494, // )
    0x0aa8, // *
    0x05d0, // +
    0x0014, // ,
    0x01c0, // -
    0x0002, // .
    0x12a4, // /
    0x7b6f, // 0
    0x2c97, // 1
    0x73e7, // 2
    0x73cf, // 3
    0x5bc9, // 4
    0x79cf, // 5
    0x79ef, // 6
    0x7292, // 7
    0x7bef, // 8
    0x7bcf, // 9
    0x0410, // :
    0x0414, // ;
    0x1511, // <
    0x0e38, // =
    0x4454, // >
    0x72c2, // ?
    0x7be7, // @
    0x2bed, // A
    0x6bae, // B
    0x7927, // C
    0x6b6e, // D
    0x79a7, // E
    0x79a4, // F
    0x796f, // G
    0x5bed, // H
    0x7497, // I
    0x726f, // J
    0x5bad, // K
    0x4927, // L
    0x5fed, // M
    0x5ffd, // N
    0x7b6f, // O
    0x6ba4, // P
    0x7b79, // Q
    0x6bad, // R
    0x79cf, // S
    0x7492, // T
    0x5b6f, // U
    0x5b6a, // V
    0x5bfd, // W
    0x5aad, // X
    0x5a92, // Y
    0x72a7, // Z
    0x6926, // [
    0x4889, // backslash
    0x324b, // ]
    0x2a00, // ^
    0x0007, // _
    0x4400, // `
    0x0e7f, // a
    0x49ae, // b
    0x0f27, // c
    0x13ef, // d
    0x0fa7, // e
    0x39a4, // f
    0x0f79, // g
    0x49ad, // h
    0x2092, // i
    0x106a, // j
    0x4bad, // k
    0x4927, // l
    0x0ded, // m
    0x0d6d, // n
    0x0f6f, // o
    0x0d74, // p
    0x0f79, // q
    0x0d64, // r
    0x0f8f, // s
    0x2e93, // t
    0x0b6f, // u
    0x0b6a, // v
    0x0b7a, // w
    0x0a95, // x
    0x0b79, // y
    0x0e57, // z
    0x3593, // {
    0x2492, // |
    0x64d6, // }
    0x0780, // ~
];

/// Row bits for `ch`, or `None` outside printable ASCII.
pub(crate) fn glyph_rows(ch: char) -> Option<[u8; GLYPH_ROWS as usize]> {
    let index = (ch as u32).checked_sub(FIRST_PRINTABLE)? as usize;
    let packed = *GLYPHS.get(index)?;
    let mut rows = [0u8; GLYPH_ROWS as usize];
    for (row, bits) in rows.iter_mut().enumerate() {
        let shift = (GLYPH_ROWS as usize - 1 - row) * GLYPH_COLUMNS as usize;
        *bits = ((packed >> shift) & 0b111) as u8;
    }
    Some(rows)
}

pub(crate) fn cell_size(pixels: f64) -> f64 {
    pixels.max(0.0) / CELLS_PER_EM
}

/// Width in surface pixels of `line` rendered at `pixels` font size.
pub(crate) fn line_advance(line: &str, pixels: f64) -> f64 {
    line.chars().count() as f64 * ADVANCE_COLUMNS as f64 * cell_size(pixels)
}
