use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

pub const SIGNATURE: &[u8; 8] = b"WED V1.3";

const OVERLAY_OFFSET_FIELD: usize = 0x10;
const TILEMAP_ENTRY_SIZE: usize = 10;

// Emitted only when both resolved indices are non-negative; range checks
// against the store happen later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePair {
    pub primary: u32,
    pub secondary: u32,
}

#[derive(Debug)]
pub struct Wed {
    // lower-cased, extension included
    pub tis_name: String,
    // tilemap order, duplicates kept as they appear
    pub pairs: Vec<TilePair>,
}

// Offsets within the overlay block are easy to mix up with absolute file
// offsets, so all reads go through this bounds-checked view and take
// absolute offsets only.
struct Bytes<'a> {
    data: &'a [u8],
    path: &'a Path,
}

impl Bytes<'_> {
    fn get(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.get(offset..offset + len).ok_or_else(|| {
            Error::io(
                format!(
                    "{}: unexpected end of file at offset {offset:#x}",
                    self.path.display()
                ),
                io::Error::from(io::ErrorKind::UnexpectedEof),
            )
        })
    }

    fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.get(offset, 1)?[0])
    }

    fn read_u16(&self, offset: usize) -> Result<u16> {
        let b = self.get(offset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_i16(&self, offset: usize) -> Result<i16> {
        Ok(self.read_u16(offset)? as i16)
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        let b = self.get(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

pub fn parse(path: &Path) -> Result<Wed> {
    let data = fs::read(path)
        .map_err(|e| Error::io(format!("cannot read WED file {}", path.display()), e))?;
    let wed = Bytes { data: &data, path };

    if wed.get(0, 8)? != SIGNATURE {
        return Err(Error::format(path, "not a valid WED file"));
    }
    let ovl = wed.read_u32(OVERLAY_OFFSET_FIELD)? as usize;

    // The first overlay describes the base tile grid; its resref names the
    // TIS store every tile index below refers to.
    let width = wed.read_u16(ovl)? as usize;
    let height = wed.read_u16(ovl + 2)? as usize;
    let resref = wed.get(ovl + 4, 8)?;
    let tis_name: String = resref
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| (b as char).to_ascii_lowercase())
        .collect();
    if tis_name.is_empty() {
        return Err(Error::format(path, "no TIS file referenced"));
    }
    let tis_name = format!("{tis_name}.tis");

    let tilemap = wed.read_u32(ovl + 0x10)? as usize;
    let lookup = wed.read_u32(ovl + 0x14)? as usize;

    let mut pairs = Vec::new();
    for cell in 0..width * height {
        let entry = tilemap + cell * TILEMAP_ENTRY_SIZE;
        if wed.read_u8(entry + 6)? == 0 {
            continue; // cell carries no overlay
        }
        let secondary = wed.read_i16(entry + 4)?;
        // The entry holds an index into the lookup table, which in turn
        // holds the primary tile index.
        let start = wed.read_u16(entry)? as usize;
        let primary = wed.read_i16(lookup + start * 2)?;
        if primary >= 0 && secondary >= 0 {
            pairs.push(TilePair {
                primary: primary as u32,
                secondary: secondary as u32,
            });
        }
    }

    Ok(Wed { tis_name, pairs })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_prelude::WedBuilder;

    #[test]
    fn reads_tis_name_and_flagged_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AR0002.WED");
        WedBuilder::new("AR0002")
            .cell(1, 7, 0x02) // flagged, primary via lookup[1]
            .cell(0, 9, 0x00) // unflagged, skipped
            .cell(0, 12, 0x01) // flagged, primary via lookup[0]
            .lookup(&[20, 3])
            .write(&path);

        let wed = parse(&path).unwrap();
        assert_eq!(wed.tis_name, "ar0002.tis");
        assert_eq!(
            wed.pairs,
            vec![
                TilePair {
                    primary: 3,
                    secondary: 7
                },
                TilePair {
                    primary: 20,
                    secondary: 12
                },
            ]
        );
    }

    #[test]
    fn duplicate_pairs_are_kept_in_tilemap_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.wed");
        WedBuilder::new("area")
            .cell(0, 5, 0x02)
            .cell(1, 9, 0x02)
            .cell(0, 5, 0x02)
            .lookup(&[4, 2])
            .write(&path);

        let wed = parse(&path).unwrap();
        assert_eq!(
            wed.pairs,
            vec![
                TilePair {
                    primary: 4,
                    secondary: 5
                },
                TilePair {
                    primary: 2,
                    secondary: 9
                },
                TilePair {
                    primary: 4,
                    secondary: 5
                },
            ]
        );
    }

    #[test]
    fn negative_indices_drop_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.wed");
        WedBuilder::new("area")
            .cell(0, -1, 0x02) // no secondary tile
            .cell(1, 4, 0x02) // lookup resolves to -1
            .cell(2, 5, 0x02)
            .lookup(&[8, 0xffff, 6])
            .write(&path);

        let wed = parse(&path).unwrap();
        assert_eq!(
            wed.pairs,
            vec![TilePair {
                primary: 6,
                secondary: 5
            }]
        );
    }

    #[test]
    fn rejects_bad_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.wed");
        let mut bytes = WedBuilder::new("area").lookup(&[0]).bytes();
        bytes[..8].copy_from_slice(b"WED V1.4");
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(parse(&path), Err(Error::Format { .. })));
    }

    #[test]
    fn rejects_missing_tis_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.wed");
        WedBuilder::new("").cell(0, 1, 0x02).lookup(&[0]).write(&path);

        let err = parse(&path).unwrap_err();
        assert!(err.to_string().contains("no TIS file referenced"));
    }

    #[test]
    fn truncated_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.wed");
        let bytes = WedBuilder::new("area")
            .cell(0, 1, 0x02)
            .lookup(&[0])
            .bytes();
        fs::write(&path, &bytes[..bytes.len() - 6]).unwrap();

        assert!(matches!(parse(&path), Err(Error::Io { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parse(&dir.path().join("gone.wed")),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn resref_shorter_than_field_is_nul_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.wed");
        WedBuilder::new("AR1").cell(0, 1, 0x02).lookup(&[2]).write(&path);

        let wed = parse(&path).unwrap();
        assert_eq!(wed.tis_name, "ar1.tis");
    }
}
