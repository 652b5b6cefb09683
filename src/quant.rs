use imagequant::RGBA;

use crate::tis::{TileData, PALETTE_ENTRIES, PIXEL_COUNT, TILE_DIM};

// the reserved transparent color as the quantizer sees it
pub const TRANSPARENT_RGBA: RGBA = RGBA {
    r: 0,
    g: 255,
    b: 0,
    a: 255,
};

// With `reserve_transparent` set, opaque green is pinned into the palette so
// transparent regions survive remapping exactly.
pub fn remapped_tile(
    pixels: Vec<RGBA>,
    reserve_transparent: bool,
) -> Result<TileData, imagequant::Error> {
    debug_assert_eq!(pixels.len(), PIXEL_COUNT);
    let attr = imagequant::new();
    let mut image = attr.new_image(pixels, TILE_DIM, TILE_DIM, 0.0)?;
    if reserve_transparent {
        image.add_fixed_color(TRANSPARENT_RGBA)?;
    }
    let mut result = attr.quantize(&mut image)?;
    let (colors, indices) = result.remapped(&mut image)?;

    let mut tile = TileData::new();
    for (slot, color) in colors.iter().take(PALETTE_ENTRIES).enumerate() {
        let entry = (color.r as u32) << 16 | (color.g as u32) << 8 | color.b as u32;
        tile.set_palette_color(slot, entry);
    }
    for (p, &index) in indices.iter().take(PIXEL_COUNT).enumerate() {
        tile.set_pixel(p, index);
    }
    Ok(tile)
}
