use crate::tis::{TileData, PALETTE_ENTRIES, PIXEL_COUNT, TRANSPARENT};

// Channel deltas are scaled by the luma weights before squaring; the maximum
// value is around 292 million, inside i32 range.
fn weighted_distance(c1: u32, c2: u32) -> i32 {
    let dr = (((c1 >> 16) & 0xff) as i32 - ((c2 >> 16) & 0xff) as i32) * 30;
    let dg = (((c1 >> 8) & 0xff) as i32 - ((c2 >> 8) & 0xff) as i32) * 59;
    let db = ((c1 & 0xff) as i32 - (c2 & 0xff) as i32) * 11;
    dr * dr + dg * dg + db * db
}

// An unreferenced slot comes back twice and needs no pixel rewrite;
// otherwise the closest pair in ascending (i, j) scan order, ties to the
// first one found.
pub fn mergeable_pair(tile: &TileData) -> (u8, u8) {
    let mut used = [false; PALETTE_ENTRIES];
    for &p in tile.pixels() {
        used[p as usize] = true;
    }
    if let Some(free) = used.iter().position(|&u| !u) {
        return (free as u8, free as u8);
    }

    let mut best = (0u8, 0u8);
    let mut best_dist = i32::MAX;
    'scan: for i in 0..PALETTE_ENTRIES - 1 {
        let c1 = tile.palette_color(i);
        for j in i + 1..PALETTE_ENTRIES {
            let dist = weighted_distance(c1, tile.palette_color(j));
            if dist < best_dist {
                best = (i as u8, j as u8);
                best_dist = dist;
                if dist == 0 {
                    break 'scan;
                }
            }
        }
    }
    best
}

// Merges slot `search` into slot `replace` and shifts the entries before
// `search` up by one, so slot 0 is free for the transparent entry. The pixel
// pass must never revisit a value it wrote, hence the normalization. Equal
// arguments mean the slot is unused and only the shift happens.
pub fn free_slot_zero(tile: &mut TileData, search: u8, replace: u8) {
    let (search, replace) = if search > replace {
        (replace, search)
    } else {
        (search, replace)
    };

    for p in 0..PIXEL_COUNT {
        let v = tile.pixel(p);
        if v == search && search != replace {
            tile.set_pixel(p, replace);
        } else if v < search {
            tile.set_pixel(p, v + 1);
        }
    }

    // Descending, so each entry is copied before it is overwritten.
    for i in (1..=search as usize).rev() {
        tile.set_palette_color(i, tile.palette_color(i - 1));
    }
    tile.set_palette_color(0, TRANSPARENT);
}
