// --- Akai Program Decoding ---
//
// The program chunks of an AKP file are flat byte records. Keygroups are the
// exception: `kgrp` is a small container of its own whose sub-chunks land in
// fixed slots according to how often their tag has appeared so far.

use std::io::{Read, Seek};

use log::{debug, warn};

use crate::error::Result;
use crate::fourcc::{self, from_fourcc, from_one_cc};
use crate::program::{Keygroup, Program};
use crate::reader::ByteReader;
use crate::riff::{ChunkHandler, ChunkHeader};

/// Bytes a `zone` sub-chunk always occupies, whatever its header says.
pub const ZONE_WIDTH: u32 = 48;
const SAMPLE_NAME_LEN: u32 = 32;
const ZONE_TRAILER_LEN: u32 = 14;

/// Target list for a keygroup sub-chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Klocation,
    AmpEnv,
    FilterEnv,
    AuxEnv,
    Filter,
    Zone1,
    Zone2,
    Zone3,
    Zone4,
}

/// Occurrence counters for the repeated keygroup sub-chunks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlotCounters {
    envelopes: u8,
    zones: u8,
}

impl SlotCounters {
    /// Picks the slot for the next sub-chunk tagged `tag`, advancing the
    /// relevant counter. `None` means the payload has nowhere to go.
    pub fn resolve(&mut self, tag: u32) -> Option<Slot> {
        match tag {
            fourcc::KLOC => Some(Slot::Klocation),
            fourcc::FILT => Some(Slot::Filter),
            fourcc::ENV => {
                let slot = match self.envelopes {
                    0 => Slot::AmpEnv,
                    1 => Slot::FilterEnv,
                    2 => Slot::AuxEnv,
                    _ => return None,
                };
                self.envelopes += 1;
                Some(slot)
            }
            fourcc::ZONE => {
                let slot = match self.zones {
                    0 => Slot::Zone1,
                    1 => Slot::Zone2,
                    2 => Slot::Zone3,
                    3 => Slot::Zone4,
                    _ => return None,
                };
                self.zones += 1;
                Some(slot)
            }
            _ => None,
        }
    }
}

impl Keygroup {
    pub fn slot_mut(&mut self, slot: Slot) -> &mut Vec<String> {
        match slot {
            Slot::Klocation => &mut self.klocation,
            Slot::AmpEnv => &mut self.amp_env,
            Slot::FilterEnv => &mut self.filter_env,
            Slot::AuxEnv => &mut self.aux_env,
            Slot::Filter => &mut self.filter,
            Slot::Zone1 => &mut self.zone1,
            Slot::Zone2 => &mut self.zone2,
            Slot::Zone3 => &mut self.zone3,
            Slot::Zone4 => &mut self.zone4,
        }
    }
}

/// Routing state for `lfo ` chunks: the first goes to the primary list,
/// every later one to the secondary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum LfoRoute {
    #[default]
    Primary,
    Secondary,
}

/// Builds a [`Program`] from the chunks a RIFF walk hands it.
#[derive(Debug, Default)]
pub struct AkaiDecoder {
    program: Program,
    lfo: LfoRoute,
}

impl AkaiDecoder {
    pub fn new(name: impl Into<String>) -> Self {
        AkaiDecoder {
            program: Program::new(name),
            lfo: LfoRoute::Primary,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    fn lfo_target(&mut self) -> &mut Vec<String> {
        match self.lfo {
            LfoRoute::Primary => {
                self.lfo = LfoRoute::Secondary;
                &mut self.program.lfo_values
            }
            LfoRoute::Secondary => &mut self.program.lfo2_values,
        }
    }

    /// Decodes one `kgrp` of `length` bytes and returns the bytes actually read.
    ///
    /// Zone sub-chunks are charged a flat [`ZONE_WIDTH`], so a producer using a
    /// different zone size desynchronises the rest of the keygroup.
    pub fn decode_keygroup<R: Read + Seek>(
        &mut self,
        reader: &mut ByteReader<R>,
        length: u32,
    ) -> Result<u64> {
        let mut keygroup = Keygroup::default();
        let mut counters = SlotCounters::default();
        let mut remaining = i64::from(length);
        let mut consumed = 0u64;

        while remaining > 0 {
            let (tag, size) = reader.read_header()?;
            remaining -= 8;
            consumed += 8;

            let mut dropped = Vec::new();
            let target = match counters.resolve(tag) {
                Some(slot) => keygroup.slot_mut(slot),
                None => {
                    warn!(
                        "keygroup {}: no slot for sub-chunk '{}', dropping it",
                        self.program.keygroups.len() + 1,
                        from_fourcc(tag)
                    );
                    &mut dropped
                }
            };

            let width = if tag == fourcc::ZONE {
                read_zone(reader, target)?;
                ZONE_WIDTH
            } else {
                read_tokens(reader, size, target)?;
                size
            };
            remaining -= i64::from(width);
            consumed += u64::from(width);
        }

        debug!(
            "keygroup {} decoded ({} bytes)",
            self.program.keygroups.len() + 1,
            consumed
        );
        self.program.keygroups.push(keygroup);
        Ok(consumed)
    }
}

impl ChunkHandler for AkaiDecoder {
    fn chunk<R: Read + Seek>(
        &mut self,
        reader: &mut ByteReader<R>,
        chunk: ChunkHeader,
    ) -> Result<u64> {
        let target = match chunk.tag {
            fourcc::PRG => &mut self.program.prg_values,
            fourcc::OUT => &mut self.program.out_values,
            fourcc::TUNE => &mut self.program.tune_values,
            fourcc::LFO => self.lfo_target(),
            fourcc::MODS => &mut self.program.mods_values,
            fourcc::KGRP => return self.decode_keygroup(reader, chunk.size),
            _ => {
                debug!("skipping chunk '{}'", from_fourcc(chunk.tag));
                return Ok(0);
            }
        };
        read_tokens(reader, chunk.size, target)?;
        Ok(u64::from(chunk.size))
    }
}

/// Appends `count` bytes as decimal tokens.
fn read_tokens<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    count: u32,
    tokens: &mut Vec<String>,
) -> Result<()> {
    for _ in 0..count {
        tokens.push(reader.read_byte()?.to_string());
    }
    Ok(())
}

/// Reads the fixed zone layout: an unused byte, the name length, a 32-byte
/// name field and 14 trailing bytes. The name becomes one token.
fn read_zone<R: Read + Seek>(reader: &mut ByteReader<R>, tokens: &mut Vec<String>) -> Result<()> {
    reader.read_byte()?;
    let name_len = reader.read_byte()?;

    let mut name = String::new();
    for index in 0..SAMPLE_NAME_LEN {
        let byte = reader.read_byte()?;
        if index < name_len {
            name.push_str(&from_one_cc(byte));
        }
    }

    tokens.push(name);
    read_tokens(reader, ZONE_TRAILER_LEN, tokens)
}
