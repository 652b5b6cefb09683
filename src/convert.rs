// Classic games punch the overlay hole into the secondary tile with
// zero-valued pixels; Enhanced Edition games mark it in the primary tile
// with a reserved green palette entry. Converting means moving the hole
// from one tile of the pair to the other.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use imagequant::RGBA;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::tis::{Tis, TileData, PIXEL_COUNT, TRANSPARENT};
use crate::{palette, quant, wed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Auto,
    ToEe,
    FromEe,
}

// the concrete direction applied to one tile pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToEe,
    FromEe,
}

pub struct Options {
    pub mode: Mode,
    pub search_paths: Vec<PathBuf>,
    // None updates stores in place
    pub output_dir: Option<PathBuf>,
}

// Green at slot 0 plus at least one zero pixel marks an Enhanced Edition
// tile. Runs per tile pair because one store can mix both encodings.
pub fn detect(mode: Mode, primary: &TileData) -> Direction {
    match mode {
        Mode::ToEe => Direction::ToEe,
        Mode::FromEe => Direction::FromEe,
        Mode::Auto => {
            if primary.palette_color(0) == TRANSPARENT && primary.pixels().contains(&0) {
                Direction::FromEe
            } else {
                Direction::ToEe
            }
        }
    }
}

// Both outputs are built from the primary record, split along the secondary
// input's mask. A transparent palette entry is reused if the primary already
// has one; otherwise the two most mergeable slots are folded together to
// free slot 0 for it.
pub fn tile_to_ee(pri_in: &TileData, sec_in: &TileData) -> (TileData, TileData) {
    let mut pri_out = pri_in.clone();
    let transparent_idx = match pri_out.find_color(TRANSPARENT) {
        Some(slot) => slot as u8,
        None => {
            let (search, replace) = palette::mergeable_pair(&pri_out);
            palette::free_slot_zero(&mut pri_out, search, replace);
            0
        }
    };
    let mut sec_out = pri_out.clone();

    for p in 0..PIXEL_COUNT {
        if sec_in.pixel(p) == 0 {
            pri_out.set_pixel(p, transparent_idx);
        } else {
            sec_out.set_pixel(p, transparent_idx);
        }
    }
    (pri_out, sec_out)
}

// Rebuilds the visible composite in true color (primary wins, then
// secondary, then transparent green), requantizes it with green pinned
// whenever any pixel was transparent, and normalizes the transparent entry
// into slot 0.
pub fn tile_from_ee(
    pri_in: &TileData,
    sec_in: &TileData,
) -> std::result::Result<(TileData, TileData), imagequant::Error> {
    let mut composite = Vec::with_capacity(PIXEL_COUNT);
    let mut used_transparent = false;
    for p in 0..PIXEL_COUNT {
        let color = if pri_in.pixel(p) != 0 {
            pri_in.palette_color(pri_in.pixel(p) as usize)
        } else if sec_in.pixel(p) != 0 {
            sec_in.palette_color(sec_in.pixel(p) as usize)
        } else {
            used_transparent = true;
            TRANSPARENT
        };
        composite.push(RGBA {
            r: (color >> 16) as u8,
            g: (color >> 8) as u8,
            b: color as u8,
            a: 255,
        });
    }

    let mut pri_out = quant::remapped_tile(composite, used_transparent)?;

    // The green entry can land anywhere in the fresh palette; swap it into
    // slot 0 and relabel the affected pixels.
    if let Some(slot) = pri_out.find_color(TRANSPARENT) {
        if slot > 0 {
            let displaced = pri_out.palette_color(0);
            pri_out.set_palette_color(0, TRANSPARENT);
            pri_out.set_palette_color(slot, displaced);
            for p in 0..PIXEL_COUNT {
                let v = pri_out.pixel(p) as usize;
                if v == 0 {
                    pri_out.set_pixel(p, slot as u8);
                } else if v == slot {
                    pri_out.set_pixel(p, 0);
                }
            }
        }
    }

    // The classic secondary is a verbatim copy of the EE primary record.
    Ok((pri_out, pri_in.clone()))
}

// Returns how many tile pairs were processed.
pub fn convert_wed(wed_path: &Path, options: &Options) -> Result<usize> {
    info!("Parsing WED file {}", wed_path.display());
    let wed = wed::parse(wed_path)?;

    let tis_path = find_tis(&options.search_paths, &wed.tis_name)?;
    let tis_path = match &options.output_dir {
        Some(dir) => stage_output(&tis_path, dir, &wed.tis_name)?,
        None => tis_path,
    };

    info!("Processing TIS file {}", tis_path.display());
    let mut tis = Tis::open(&tis_path)?;
    let mut processed = 0;
    for pair in &wed.pairs {
        for index in [pair.primary, pair.secondary] {
            if index >= tis.tile_count() {
                return Err(Error::Conversion(format!(
                    "{}: tile reference {} exceeds the {} tiles in {}",
                    wed_path.display(),
                    index,
                    tis.tile_count(),
                    tis_path.display(),
                )));
            }
        }
        let pri_in = tis.read_tile(pair.primary)?;
        let sec_in = tis.read_tile(pair.secondary)?;

        let direction = detect(options.mode, &pri_in);
        if options.mode == Mode::Auto {
            debug!(
                "Tiles ({}, {}): converting {}",
                pair.primary,
                pair.secondary,
                match direction {
                    Direction::ToEe => "classic to EE",
                    Direction::FromEe => "EE to classic",
                },
            );
        }
        let (pri_out, sec_out) = match direction {
            Direction::ToEe => tile_to_ee(&pri_in, &sec_in),
            Direction::FromEe => {
                tile_from_ee(&pri_in, &sec_in).map_err(|source| Error::Quantization {
                    path: tis_path.clone(),
                    primary: pair.primary,
                    secondary: pair.secondary,
                    source,
                })?
            }
        };

        tis.write_tile(pair.primary, &pri_out)?;
        tis.write_tile(pair.secondary, &sec_out)?;
        processed += 1;
    }
    Ok(processed)
}

fn find_tis(search_paths: &[PathBuf], tis_name: &str) -> Result<PathBuf> {
    for dir in search_paths {
        let candidate = dir.join(tis_name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(Error::io(
        format!("could not find TIS file {tis_name} in any search path"),
        io::Error::from(io::ErrorKind::NotFound),
    ))
}

// Returns the path the conversion writes to.
fn stage_output(src: &Path, dir: &Path, tis_name: &str) -> Result<PathBuf> {
    let dst = dir.join(tis_name);
    if !same_file(src, &dst) {
        fs::copy(src, &dst).map_err(|e| {
            Error::io(format!("cannot create output TIS file {}", dst.display()), e)
        })?;
    }
    Ok(dst)
}

// Path comparison alone misses hardlinks, and copying a store onto its own
// inode truncates it before it can be read back.
#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    // The destination usually does not exist yet; a failed stat means the
    // paths cannot alias.
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
