//! Conversion between packed 32-bit chunk tags and their four-character text.
//!
//! Tags are stored little-endian, so the first character of the text lives in
//! the lowest byte of the code. Every byte maps to exactly one `char` (Latin-1),
//! which keeps NULs and high bytes intact through a round trip.

/// Container tag for little-endian RIFF files.
pub const RIFF: u32 = u32::from_le_bytes(*b"RIFF");
/// Big-endian container variant; only detected, never byte-swapped.
pub const RIFX: u32 = u32::from_le_bytes(*b"RIFX");
pub const LIST: u32 = u32::from_le_bytes(*b"LIST");

// Akai program chunks
pub const PRG: u32 = u32::from_le_bytes(*b"prg ");
pub const OUT: u32 = u32::from_le_bytes(*b"out ");
pub const TUNE: u32 = u32::from_le_bytes(*b"tune");
pub const LFO: u32 = u32::from_le_bytes(*b"lfo ");
pub const MODS: u32 = u32::from_le_bytes(*b"mods");
pub const KGRP: u32 = u32::from_le_bytes(*b"kgrp");

// Keygroup sub-chunks
pub const KLOC: u32 = u32::from_le_bytes(*b"kloc");
pub const ENV: u32 = u32::from_le_bytes(*b"env ");
pub const FILT: u32 = u32::from_le_bytes(*b"filt");
pub const ZONE: u32 = u32::from_le_bytes(*b"zone");

/// Packs the first four characters of `text` into a tag.
///
/// Only the low byte of each character is kept; missing characters pack as 0.
pub fn to_fourcc(text: &str) -> u32 {
    let mut bytes = [0u8; 4];
    for (slot, ch) in bytes.iter_mut().zip(text.chars()) {
        *slot = (u32::from(ch) & 0xFF) as u8;
    }
    u32::from_le_bytes(bytes)
}

pub fn from_fourcc(code: u32) -> String {
    code.to_le_bytes().iter().map(|&b| char::from(b)).collect()
}

/// Decodes one embedded name character; a zero byte yields the empty string.
pub fn from_one_cc(byte: u32) -> String {
    match byte & 0xFF {
        0 => String::new(),
        low => char::from(low as u8).to_string(),
    }
}
