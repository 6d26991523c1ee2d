use rayon::prelude::*;

use crate::assets::decode::ImageAsset;
use crate::foundation::core::FrameBuffer;
use crate::foundation::error::{MontageError, MontageResult};
use crate::foundation::math::lerp_u8;

/// Top-left offset that centers a `fg_w x fg_h` image inside a `bg_w x bg_h` frame.
///
/// Fails with [`MontageError::Geometry`] when the foreground is larger than the background on
/// either axis.
pub fn centered_offset(bg_w: u32, bg_h: u32, fg_w: u32, fg_h: u32) -> MontageResult<(u32, u32)> {
    if fg_w > bg_w || fg_h > bg_h {
        return Err(MontageError::geometry(format!(
            "foreground {fg_w}x{fg_h} does not fit background {bg_w}x{bg_h}"
        )));
    }
    Ok(((bg_w - fg_w) / 2, (bg_h - fg_h) / 2))
}

/// Check that `fg` can be composited onto frames of `bg_w x bg_h` and that its buffers are sane.
pub fn check_fits(bg_w: u32, bg_h: u32, fg: &ImageAsset) -> MontageResult<(u32, u32)> {
    let px = fg.width as usize * fg.height as usize;
    if fg.rgb.len() != px * 3 || fg.alpha.len() != px {
        return Err(MontageError::decode(format!(
            "foreground buffers do not match its {}x{} size",
            fg.width, fg.height
        )));
    }
    centered_offset(bg_w, bg_h, fg.width, fg.height)
}

/// Blend `fg` onto `frame` in place, centered.
///
/// Every covered pixel becomes `a * fg + (1 - a) * bg`; pixels outside the footprint are left
/// untouched. `fg` is only read.
pub fn composite_in_place(frame: &mut FrameBuffer, fg: &ImageAsset) -> MontageResult<()> {
    if frame.data.len() != FrameBuffer::byte_len(frame.width, frame.height) {
        return Err(MontageError::invalid_argument(
            "background frame size mismatch with width*height*3",
        ));
    }
    let (x, y) = check_fits(frame.width, frame.height, fg)?;
    if fg.width == 0 || fg.height == 0 {
        return Ok(());
    }

    let stride = frame.stride();
    let fg_w = fg.width as usize;
    let x0 = x as usize * FrameBuffer::CHANNELS;

    frame
        .data
        .par_chunks_exact_mut(stride)
        .skip(y as usize)
        .take(fg.height as usize)
        .enumerate()
        .for_each(|(i, row)| {
            let fg_rgb = &fg.rgb[i * fg_w * 3..(i + 1) * fg_w * 3];
            let fg_a = &fg.alpha[i * fg_w..(i + 1) * fg_w];
            let dst = &mut row[x0..x0 + fg_w * 3];
            for ((d, s), &a) in dst
                .chunks_exact_mut(3)
                .zip(fg_rgb.chunks_exact(3))
                .zip(fg_a)
            {
                d[0] = lerp_u8(d[0], s[0], a);
                d[1] = lerp_u8(d[1], s[1], a);
                d[2] = lerp_u8(d[2], s[2], a);
            }
        });
    Ok(())
}

/// Blend `fg` over a copy of `background`, returning the new frame.
pub fn composite(background: &FrameBuffer, fg: &ImageAsset) -> MontageResult<FrameBuffer> {
    let mut out = background.clone();
    composite_in_place(&mut out, fg)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/composite.rs"]
mod tests;
