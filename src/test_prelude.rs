use std::fs;
use std::path::Path;

use crate::tis::{self, TileData, PALETTE_ENTRIES, PIXEL_COUNT, TILE_DIM, TILE_SIZE};

// The gray ramp never contains the reserved green and adjacent entries are
// equidistant.
pub fn gray(v: usize) -> u32 {
    let v = v as u32;
    v << 16 | v << 8 | v
}

pub fn tile_with(palette: impl Fn(usize) -> u32, pixels: impl Fn(usize) -> u8) -> TileData {
    let mut tile = TileData::new();
    for i in 0..PALETTE_ENTRIES {
        tile.set_palette_color(i, palette(i));
    }
    for p in 0..PIXEL_COUNT {
        tile.set_pixel(p, pixels(p));
    }
    tile
}

// Distinct per seed, and the palette never contains the reserved green.
pub fn numbered_tile(seed: u8) -> TileData {
    tile_with(
        |i| (seed as u32) << 16 | i as u32,
        |p| ((p + seed as usize) % 256) as u8,
    )
}

pub fn write_tis(path: &Path, tiles: &[TileData]) {
    let mut bytes = Vec::with_capacity(24 + tiles.len() * TILE_SIZE);
    bytes.extend_from_slice(tis::SIGNATURE);
    bytes.extend_from_slice(&(tiles.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(TILE_SIZE as u32).to_le_bytes());
    bytes.extend_from_slice(&24u32.to_le_bytes());
    bytes.extend_from_slice(&(TILE_DIM as u32).to_le_bytes());
    for tile in tiles {
        bytes.extend_from_slice(tile.as_bytes());
    }
    fs::write(path, bytes).unwrap();
}

// A minimal WED file: one overlay, a single-row tile grid, and the tilemap
// and lookup tables the cells reference.
pub struct WedBuilder {
    resref: String,
    cells: Vec<(u16, i16, u8)>,
    lookup: Vec<u16>,
}

impl WedBuilder {
    pub fn new(resref: &str) -> WedBuilder {
        WedBuilder {
            resref: resref.to_string(),
            cells: Vec::new(),
            lookup: Vec::new(),
        }
    }

    pub fn cell(mut self, start: u16, secondary: i16, flags: u8) -> WedBuilder {
        self.cells.push((start, secondary, flags));
        self
    }

    pub fn lookup(mut self, entries: &[u16]) -> WedBuilder {
        self.lookup = entries.to_vec();
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        const OVL: usize = 0x20;
        let tilemap = OVL + 0x18;
        let lookup_ofs = tilemap + self.cells.len() * 10;

        let mut b = Vec::new();
        b.extend_from_slice(b"WED V1.3");
        b.extend_from_slice(&1u32.to_le_bytes()); // overlay count
        b.extend_from_slice(&0u32.to_le_bytes()); // door count
        b.extend_from_slice(&(OVL as u32).to_le_bytes());
        b.resize(OVL, 0);

        b.extend_from_slice(&(self.cells.len() as u16).to_le_bytes()); // width
        b.extend_from_slice(&1u16.to_le_bytes()); // height
        let mut resref = [0u8; 8];
        resref[..self.resref.len()].copy_from_slice(self.resref.as_bytes());
        b.extend_from_slice(&resref);
        b.extend_from_slice(&[0u8; 4]); // unique tile count, movement type
        b.extend_from_slice(&(tilemap as u32).to_le_bytes());
        b.extend_from_slice(&(lookup_ofs as u32).to_le_bytes());

        for &(start, secondary, flags) in &self.cells {
            b.extend_from_slice(&start.to_le_bytes());
            b.extend_from_slice(&1u16.to_le_bytes()); // primary tile count
            b.extend_from_slice(&secondary.to_le_bytes());
            b.push(flags);
            b.extend_from_slice(&[0u8; 3]); // animation speed, extra flags
        }
        for &entry in &self.lookup {
            b.extend_from_slice(&entry.to_le_bytes());
        }
        b
    }

    pub fn write(&self, path: &Path) {
        fs::write(path, self.bytes()).unwrap();
    }
}
