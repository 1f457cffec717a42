//! DDS decoding to RGBA8, block formats via `bcdec_rs`.

use ddsfile::{D3DFormat, Dds, DxgiFormat};

use crate::error::{Error, Result};

/// Decode the top mip of `dds` to tightly packed RGBA8.
///
/// # Errors
/// `DdsError` if the pixel format is unsupported or the surface has no data.
pub fn decode_dds_to_rgba(dds: &Dds) -> Result<Vec<u8>> {
    let width = dds.get_width() as usize;
    let height = dds.get_height() as usize;
    let data = dds
        .get_data(0)
        .map_err(|e| Error::DdsError(format!("No DDS data: {e}")))?;

    let format = if let Some(dxgi) = dds.get_dxgi_format() {
        dxgi_pixels(dxgi)?
    } else if let Some(d3d) = dds.get_d3d_format() {
        d3d_pixels(d3d)?
    } else {
        return Err(Error::DdsError("Unknown DDS format".to_string()));
    };

    match format {
        Pixels::Rgba => take_pixels(data, width, height),
        Pixels::Bgra => {
            let mut rgba = take_pixels(data, width, height)?;
            for px in rgba.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            Ok(rgba)
        }
        Pixels::Block(bc) => Ok(decode_blocks(data, width, height, bc)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pixels {
    Rgba,
    Bgra,
    Block(BcFormat),
}

fn dxgi_pixels(format: DxgiFormat) -> Result<Pixels> {
    Ok(match format {
        DxgiFormat::R8G8B8A8_UNorm | DxgiFormat::R8G8B8A8_UNorm_sRGB => Pixels::Rgba,
        DxgiFormat::B8G8R8A8_UNorm | DxgiFormat::B8G8R8A8_UNorm_sRGB => Pixels::Bgra,
        DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => Pixels::Block(BcFormat::Bc1),
        DxgiFormat::BC2_UNorm | DxgiFormat::BC2_UNorm_sRGB => Pixels::Block(BcFormat::Bc2),
        DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => Pixels::Block(BcFormat::Bc3),
        DxgiFormat::BC4_UNorm => Pixels::Block(BcFormat::Bc4),
        DxgiFormat::BC5_UNorm => Pixels::Block(BcFormat::Bc5),
        DxgiFormat::BC7_UNorm | DxgiFormat::BC7_UNorm_sRGB => Pixels::Block(BcFormat::Bc7),
        _ => return Err(Error::DdsError(format!("Unsupported DXGI format: {format:?}"))),
    })
}

fn d3d_pixels(format: D3DFormat) -> Result<Pixels> {
    Ok(match format {
        // Little-endian ARGB dwords are B, G, R, A in memory.
        D3DFormat::A8R8G8B8 => Pixels::Bgra,
        D3DFormat::A8B8G8R8 => Pixels::Rgba,
        D3DFormat::DXT1 => Pixels::Block(BcFormat::Bc1),
        D3DFormat::DXT3 => Pixels::Block(BcFormat::Bc2),
        D3DFormat::DXT5 => Pixels::Block(BcFormat::Bc3),
        _ => return Err(Error::DdsError(format!("Unsupported D3D format: {format:?}"))),
    })
}

fn take_pixels(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let len = width * height * 4;
    data.get(..len)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| Error::DdsError(format!("{} bytes of pixel data, need {len}", data.len())))
}

// ============================================================================
// Block Compression (BC) formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BcFormat {
    Bc1,
    Bc2,
    Bc3,
    /// Single channel, expanded to grey.
    Bc4,
    /// Two channels, expanded to RG.
    Bc5,
    Bc7,
}

impl BcFormat {
    const fn block_size(self) -> usize {
        match self {
            Self::Bc1 | Self::Bc4 => 8,
            Self::Bc2 | Self::Bc3 | Self::Bc5 | Self::Bc7 => 16,
        }
    }

    /// Decode one 4x4 block into 16 RGBA pixels.
    fn decode_block(self, block: &[u8], out: &mut [u8; 64]) {
        match self {
            Self::Bc1 => bcdec_rs::bc1(block, out, 16),
            Self::Bc2 => bcdec_rs::bc2(block, out, 16),
            Self::Bc3 => bcdec_rs::bc3(block, out, 16),
            Self::Bc7 => bcdec_rs::bc7(block, out, 16),
            Self::Bc4 => {
                let mut r = [0u8; 16];
                bcdec_rs::bc4(block, &mut r, 4, false);
                for (px, &v) in out.chunks_exact_mut(4).zip(&r) {
                    px.copy_from_slice(&[v, v, v, 255]);
                }
            }
            Self::Bc5 => {
                let mut rg = [0u8; 32];
                bcdec_rs::bc5(block, &mut rg, 8, false);
                for (px, c) in out.chunks_exact_mut(4).zip(rg.chunks_exact(2)) {
                    px.copy_from_slice(&[c[0], c[1], 0, 255]);
                }
            }
        }
    }
}

fn decode_blocks(data: &[u8], width: usize, height: usize, format: BcFormat) -> Vec<u8> {
    let mut rgba = vec![0u8; width * height * 4];
    let blocks_x = width.div_ceil(4);
    let block_size = format.block_size();
    let mut block_rgba = [0u8; 64];

    for (index, block) in data
        .chunks_exact(block_size)
        .take(blocks_x * height.div_ceil(4))
        .enumerate()
    {
        let (bx, by) = (index % blocks_x, index / blocks_x);
        format.decode_block(block, &mut block_rgba);

        for py in 0..4 {
            let fy = by * 4 + py;
            if fy >= height {
                break;
            }
            for px in 0..4 {
                let fx = bx * 4 + px;
                if fx >= width {
                    break;
                }
                let src = (py * 4 + px) * 4;
                let dst = (fy * width + fx) * 4;
                rgba[dst..dst + 4].copy_from_slice(&block_rgba[src..src + 4]);
            }
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bc1_solid_block() {
        // color0 = color1 = pure red (565), all indices 0.
        let block = [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0];
        let rgba = decode_blocks(&block, 2, 2, BcFormat::Bc1);
        assert_eq!(rgba.len(), 16);
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, &[255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_short_uncompressed_data() {
        assert!(take_pixels(&[0; 12], 2, 2).is_err());
        assert_eq!(take_pixels(&[7; 20], 2, 2).unwrap().len(), 16);
    }
}
