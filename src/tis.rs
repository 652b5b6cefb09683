use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{ReadBytesExt, LE};

use crate::error::{Error, Result};

pub const SIGNATURE: &[u8; 8] = b"TIS V1  ";
pub const PALETTE_ENTRIES: usize = 256;
pub const TILE_DIM: usize = 64;
pub const PIXEL_COUNT: usize = TILE_DIM * TILE_DIM;
pub const PIXEL_OFFSET: usize = PALETTE_ENTRIES * 4;
pub const TILE_SIZE: usize = PIXEL_OFFSET + PIXEL_COUNT;

// The reserved transparent color, pure green: entries are stored as
// blue/green/red/unused bytes, so this is one read as a little-endian u32.
pub const TRANSPARENT: u32 = 0x0000_ff00;

// One tile record: a 256-entry palette followed by a 64x64 buffer of
// palette indices.
#[derive(Clone, PartialEq, Eq)]
pub struct TileData(Box<[u8; TILE_SIZE]>);

impl TileData {
    pub fn new() -> TileData {
        TileData(Box::new([0; TILE_SIZE]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    // 0x00RRGGBB with the unused byte in the high bits
    pub fn palette_color(&self, index: usize) -> u32 {
        let o = index * 4;
        u32::from_le_bytes([self.0[o], self.0[o + 1], self.0[o + 2], self.0[o + 3]])
    }

    pub fn set_palette_color(&mut self, index: usize, color: u32) {
        self.0[index * 4..index * 4 + 4].copy_from_slice(&color.to_le_bytes());
    }

    // lowest slot wins
    pub fn find_color(&self, color: u32) -> Option<usize> {
        (0..PALETTE_ENTRIES).find(|&i| self.palette_color(i) == color)
    }

    pub fn pixel(&self, index: usize) -> u8 {
        self.0[PIXEL_OFFSET + index]
    }

    pub fn set_pixel(&mut self, index: usize, value: u8) {
        self.0[PIXEL_OFFSET + index] = value;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.0[PIXEL_OFFSET..]
    }
}

impl Default for TileData {
    fn default() -> TileData {
        TileData::new()
    }
}

#[derive(Debug)]
pub struct Tis {
    file: File,
    path: PathBuf,
    tile_count: u32,
    tiles_offset: u64,
}

impl Tis {
    // Opens read-write; only palette-based stores with 64x64 tiles pass.
    pub fn open(path: &Path) -> Result<Tis> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::io(format!("cannot open TIS file {}", path.display()), e))?;

        let header_err = |e| Error::io(format!("{}: cannot read TIS header", path.display()), e);
        let mut signature = [0u8; 8];
        file.read_exact(&mut signature).map_err(header_err)?;
        if &signature != SIGNATURE {
            return Err(Error::format(path, "not a valid TIS file"));
        }
        let tile_count = file.read_u32::<LE>().map_err(header_err)?;
        let tile_size = file.read_u32::<LE>().map_err(header_err)?;
        if tile_size as usize != TILE_SIZE {
            return Err(Error::format(
                path,
                format!("not a palette-based TIS file (tile size {tile_size})"),
            ));
        }
        let tiles_offset = file.read_u32::<LE>().map_err(header_err)?;
        let tile_dim = file.read_u32::<LE>().map_err(header_err)?;
        if tile_dim as usize != TILE_DIM {
            return Err(Error::format(
                path,
                format!("unsupported tile dimension {tile_dim}, expected {TILE_DIM}"),
            ));
        }

        Ok(Tis {
            file,
            path: path.to_owned(),
            tile_count,
            tiles_offset: tiles_offset as u64,
        })
    }

    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    fn checked_offset(&self, index: u32) -> io::Result<u64> {
        if index >= self.tile_count {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("tile index past the {} tiles in the store", self.tile_count),
            ));
        }
        Ok(self.tiles_offset + index as u64 * TILE_SIZE as u64)
    }

    pub fn read_tile(&mut self, index: u32) -> Result<TileData> {
        let mut data = Box::new([0u8; TILE_SIZE]);
        self.checked_offset(index)
            .and_then(|offset| self.file.seek(SeekFrom::Start(offset)))
            .and_then(|_| self.file.read_exact(&mut data[..]))
            .map_err(|e| Error::io(format!("{}: cannot read tile {index}", self.path.display()), e))?;
        Ok(TileData(data))
    }

    pub fn write_tile(&mut self, index: u32, tile: &TileData) -> Result<()> {
        self.checked_offset(index)
            .and_then(|offset| self.file.seek(SeekFrom::Start(offset)))
            .and_then(|_| self.file.write_all(tile.as_bytes()))
            .map_err(|e| Error::io(format!("{}: cannot write tile {index}", self.path.display()), e))?;
        Ok(())
    }
}
