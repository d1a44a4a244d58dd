// Slides a display-sized window across the canvas, one canvas column per frame,
// and shrinks each window down to the LED resolution.

use image::{RgbImage, imageops};

use crate::types::Canvas;

pub struct FrameSampler {
    canvas: Canvas,
    window_width: u32,    // display width x virtual scale
    display_width: u32,
    display_height: u32,
    vertical_smooth: bool, // false = antialias horizontally only
}

impl FrameSampler {
    pub fn new(
        canvas: Canvas,
        display_width: u32,
        display_height: u32,
        virtual_scale: u32,
        vertical_smooth: bool,
    ) -> Self {
        let window_width = display_width * virtual_scale;

        // A canvas narrower than the window still has to yield a frame.
        let canvas = if canvas.width() < window_width {
            let mut padded = RgbImage::new(window_width + 1, canvas.height());
            imageops::replace(&mut padded, &canvas, 0, 0);
            padded
        } else {
            canvas
        };

        Self { canvas, window_width, display_width, display_height, vertical_smooth }
    }

    pub fn frame_count(&self) -> usize {
        (self.canvas.width() - self.window_width + 1) as usize
    }

    /// Lazy; call again to start over from the first offset.
    pub fn frames(&self) -> impl Iterator<Item = RgbImage> + '_ {
        (0..self.frame_count() as u32).map(move |offset| self.frame_at(offset))
    }

    pub fn frame_at(&self, offset: u32) -> RgbImage {
        let window =
            imageops::crop_imm(&self.canvas, offset, 0, self.window_width, self.canvas.height())
                .to_image();

        if self.vertical_smooth {
            return resize_if_needed(window, self.display_width, self.display_height, imageops::FilterType::Lanczos3);
        }

        // Drop rows first without filtering, so only the horizontal axis gets smoothed.
        let rows_only =
            resize_if_needed(window, self.window_width, self.display_height, imageops::FilterType::Nearest);
        resize_if_needed(rows_only, self.display_width, self.display_height, imageops::FilterType::Lanczos3)
    }
}

fn resize_if_needed(img: RgbImage, width: u32, height: u32, filter: imageops::FilterType) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img;
    }
    imageops::resize(&img, width, height, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn striped_canvas(width: u32, height: u32) -> Canvas {
        // each column's red channel is its x coordinate
        RgbImage::from_fn(width, height, |x, _| Rgb([x as u8, 0, 0]))
    }

    #[rstest]
    #[case(20, 8, 1, 13)]
    #[case(8, 8, 1, 1)]
    #[case(40, 8, 2, 25)]
    #[case(3, 8, 1, 2)] // narrower than the window: padded to window + 1
    fn frame_count_is_inclusive_offsets(
        #[case] canvas_width: u32,
        #[case] display_width: u32,
        #[case] virtual_scale: u32,
        #[case] expected: usize,
    ) {
        let sampler = FrameSampler::new(
            striped_canvas(canvas_width, 4 * virtual_scale),
            display_width,
            4,
            virtual_scale,
            false,
        );
        assert_eq!(sampler.frame_count(), expected);
        assert_eq!(sampler.frames().count(), expected);
    }

    #[test]
    fn every_frame_is_display_sized() {
        let sampler = FrameSampler::new(striped_canvas(50, 12), 8, 4, 3, true);
        assert!(sampler.frames().all(|f| f.dimensions() == (8, 4)));
    }

    #[test]
    fn window_moves_one_column_per_frame() {
        let sampler = FrameSampler::new(striped_canvas(12, 4), 4, 4, 1, false);
        let firsts: Vec<u8> = sampler.frames().map(|f| f.get_pixel(0, 0)[0]).collect();
        assert_eq!(firsts, (0..9).collect::<Vec<u8>>());
    }

    #[test]
    fn frames_restart_from_the_beginning() {
        let sampler = FrameSampler::new(striped_canvas(10, 4), 4, 4, 1, false);
        let first: Vec<RgbImage> = sampler.frames().take(2).collect();
        let again: Vec<RgbImage> = sampler.frames().take(2).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn unit_virtual_scale_is_pixel_exact() {
        let canvas = striped_canvas(6, 2);
        let sampler = FrameSampler::new(canvas.clone(), 3, 2, 1, false);
        let frame = sampler.frame_at(2);
        assert_eq!(frame, imageops::crop_imm(&canvas, 2, 0, 3, 2).to_image());
    }

    #[test]
    fn horizontal_only_smoothing_keeps_hard_row_edges() {
        // top half white, bottom half black at 2x virtual height
        let canvas = RgbImage::from_fn(16, 8, |_, y| if y < 4 { Rgb([255; 3]) } else { Rgb([0; 3]) });
        let sharp = FrameSampler::new(canvas.clone(), 4, 4, 2, false).frame_at(0);
        for x in 0..4 {
            assert_eq!(*sharp.get_pixel(x, 1), Rgb([255; 3]));
            assert_eq!(*sharp.get_pixel(x, 2), Rgb([0; 3]));
        }
    }
}
