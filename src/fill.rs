// Foreground/background fills: a flat color or a slanted rainbow.
// Colors come in as text (config file), so parsing lives here too.

use image::{Rgb, RgbImage};

use crate::error::Error;

pub const RAINBOW_BANDWIDTH: f64 = 60.0; // pixels (virtual screen) per full hue cycle
pub const RAINBOW_ANGLE: f64 = 45.0; // degrees

#[derive(Clone, Debug, PartialEq)]
pub enum ColorSpec {
    Flat(Rgb<u8>),
    Rainbow { bandwidth: f64, angle: f64 },
}

impl ColorSpec {
    /// Accepts `rainbow[(bandwidth[,angle])]`, `#rgb`, `#rrggbb`, `rgb(r,g,b)`,
    /// `rgb(r%,g%,b%)`, `hsl(h,s%,l%)` and color names (any case).
    pub fn parse(text: &str) -> Result<Self, Error> {
        let spec = text.trim().to_ascii_lowercase();
        let unknown = || Error::Config(format!("unknown color specification '{text}'"));

        if let Some(rest) = spec.strip_prefix("rainbow") {
            let args = if rest.is_empty() { Vec::new() } else { call_args(rest).ok_or_else(unknown)? };
            let bandwidth = match args.first() {
                Some(arg) => arg.parse::<f64>().map_err(|_| unknown())?,
                None => RAINBOW_BANDWIDTH,
            };
            let angle = match args.get(1) {
                Some(arg) => arg.parse::<f64>().map_err(|_| unknown())?,
                None => RAINBOW_ANGLE,
            };
            if !(bandwidth > 0.0) || args.len() > 2 {
                return Err(unknown());
            }
            return Ok(ColorSpec::Rainbow { bandwidth, angle });
        }

        if let Some(hex) = spec.strip_prefix('#') {
            return parse_hex(hex).map(ColorSpec::Flat).ok_or_else(unknown);
        }
        if let Some(rest) = spec.strip_prefix("rgb") {
            let args = call_args(rest).ok_or_else(unknown)?;
            return parse_rgb_args(&args).map(ColorSpec::Flat).ok_or_else(unknown);
        }
        if let Some(rest) = spec.strip_prefix("hsl") {
            let args = call_args(rest).ok_or_else(unknown)?;
            return parse_hsl_args(&args).map(ColorSpec::Flat).ok_or_else(unknown);
        }

        named_color(&spec).map(ColorSpec::Flat).ok_or_else(unknown)
    }
}

/// Produce a fully opaque RGB image of the requested size.
pub fn fill(width: u32, height: u32, spec: &ColorSpec) -> RgbImage {
    match *spec {
        ColorSpec::Flat(color) => RgbImage::from_pixel(width, height, color),
        ColorSpec::Rainbow { bandwidth, angle } => {
            let (sin, cos) = angle.to_radians().sin_cos();
            RgbImage::from_fn(width, height, |x, y| {
                let offset = sin * f64::from(x) + cos * f64::from(y);
                rainbow_at(offset / bandwidth)
            })
        }
    }
}

/// One sixth of the hue wheel. Each stage ramps one channel while the others hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HueStage {
    RedToYellow,
    YellowToGreen,
    GreenToCyan,
    CyanToBlue,
    BlueToMagenta,
    MagentaToRed,
}

impl HueStage {
    const WHEEL: [HueStage; 6] = [
        HueStage::RedToYellow,
        HueStage::YellowToGreen,
        HueStage::GreenToCyan,
        HueStage::CyanToBlue,
        HueStage::BlueToMagenta,
        HueStage::MagentaToRed,
    ];

    fn channels(self, rising: u8) -> [u8; 3] {
        let falling = 255 - rising;
        match self {
            HueStage::RedToYellow => [255, rising, 0],
            HueStage::YellowToGreen => [falling, 255, 0],
            HueStage::GreenToCyan => [0, 255, rising],
            HueStage::CyanToBlue => [0, falling, 255],
            HueStage::BlueToMagenta => [rising, 0, 255],
            HueStage::MagentaToRed => [255, 0, falling],
        }
    }
}

/// Color at a cyclic position along the rainbow; one full cycle per unit.
pub fn rainbow_at(position: f64) -> Rgb<u8> {
    // rem_euclid of a tiny negative value rounds up to exactly 1.0, which is red again
    let scaled = position.rem_euclid(1.0) * 6.0;
    let stage = HueStage::WHEEL[scaled.floor() as usize % HueStage::WHEEL.len()];
    let phase = scaled.fract();
    let rising = ((phase * 256.0) as u32).min(255) as u8;
    Rgb(stage.channels(rising))
}

// "(a, b, c)" -> ["a", "b", "c"]
fn call_args(rest: &str) -> Option<Vec<String>> {
    let inner = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').map(|part| part.trim().to_string()).collect())
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
            Some(Rgb([digit(0)?, digit(1)?, digit(2)?]))
        }
        6 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb([byte(0)?, byte(2)?, byte(4)?]))
        }
        _ => None,
    }
}

fn parse_rgb_args(args: &[String]) -> Option<Rgb<u8>> {
    if args.len() != 3 {
        return None;
    }
    let mut out = [0u8; 3];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = match arg.strip_suffix('%') {
            Some(pct) => {
                let pct = pct.trim().parse::<f64>().ok()?;
                if !(0.0..=100.0).contains(&pct) {
                    return None;
                }
                (pct * 255.0 / 100.0 + 0.5) as u8
            }
            None => arg.parse::<u8>().ok()?,
        };
    }
    Some(Rgb(out))
}

fn parse_hsl_args(args: &[String]) -> Option<Rgb<u8>> {
    if args.len() != 3 {
        return None;
    }
    let hue = args[0].parse::<f64>().ok()?.rem_euclid(360.0) / 360.0;
    let sat = args[1].strip_suffix('%')?.trim().parse::<f64>().ok()? / 100.0;
    let light = args[2].strip_suffix('%')?.trim().parse::<f64>().ok()? / 100.0;
    if !(0.0..=1.0).contains(&sat) || !(0.0..=1.0).contains(&light) {
        return None;
    }

    let to_u8 = |c: f64| (c * 255.0 + 0.5) as u8;
    if sat == 0.0 {
        let v = to_u8(light);
        return Some(Rgb([v, v, v]));
    }
    let m2 = if light <= 0.5 { light * (1.0 + sat) } else { light + sat - light * sat };
    let m1 = 2.0 * light - m2;
    let channel = |h: f64| {
        let h = h.rem_euclid(1.0);
        if h < 1.0 / 6.0 {
            m1 + (m2 - m1) * h * 6.0
        } else if h < 0.5 {
            m2
        } else if h < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
        } else {
            m1
        }
    };
    Some(Rgb([
        to_u8(channel(hue + 1.0 / 3.0)),
        to_u8(channel(hue)),
        to_u8(channel(hue - 1.0 / 3.0)),
    ]))
}

// CSS color keywords, sorted for binary search.
const NAMED_COLORS: [(&str, [u8; 3]); 148] = [
    ("aliceblue", [240, 248, 255]),
    ("antiquewhite", [250, 235, 215]),
    ("aqua", [0, 255, 255]),
    ("aquamarine", [127, 255, 212]),
    ("azure", [240, 255, 255]),
    ("beige", [245, 245, 220]),
    ("bisque", [255, 228, 196]),
    ("black", [0, 0, 0]),
    ("blanchedalmond", [255, 235, 205]),
    ("blue", [0, 0, 255]),
    ("blueviolet", [138, 43, 226]),
    ("brown", [165, 42, 42]),
    ("burlywood", [222, 184, 135]),
    ("cadetblue", [95, 158, 160]),
    ("chartreuse", [127, 255, 0]),
    ("chocolate", [210, 105, 30]),
    ("coral", [255, 127, 80]),
    ("cornflowerblue", [100, 149, 237]),
    ("cornsilk", [255, 248, 220]),
    ("crimson", [220, 20, 60]),
    ("cyan", [0, 255, 255]),
    ("darkblue", [0, 0, 139]),
    ("darkcyan", [0, 139, 139]),
    ("darkgoldenrod", [184, 134, 11]),
    ("darkgray", [169, 169, 169]),
    ("darkgreen", [0, 100, 0]),
    ("darkgrey", [169, 169, 169]),
    ("darkkhaki", [189, 183, 107]),
    ("darkmagenta", [139, 0, 139]),
    ("darkolivegreen", [85, 107, 47]),
    ("darkorange", [255, 140, 0]),
    ("darkorchid", [153, 50, 204]),
    ("darkred", [139, 0, 0]),
    ("darksalmon", [233, 150, 122]),
    ("darkseagreen", [143, 188, 143]),
    ("darkslateblue", [72, 61, 139]),
    ("darkslategray", [47, 79, 79]),
    ("darkslategrey", [47, 79, 79]),
    ("darkturquoise", [0, 206, 209]),
    ("darkviolet", [148, 0, 211]),
    ("deeppink", [255, 20, 147]),
    ("deepskyblue", [0, 191, 255]),
    ("dimgray", [105, 105, 105]),
    ("dimgrey", [105, 105, 105]),
    ("dodgerblue", [30, 144, 255]),
    ("firebrick", [178, 34, 34]),
    ("floralwhite", [255, 250, 240]),
    ("forestgreen", [34, 139, 34]),
    ("fuchsia", [255, 0, 255]),
    ("gainsboro", [220, 220, 220]),
    ("ghostwhite", [248, 248, 255]),
    ("gold", [255, 215, 0]),
    ("goldenrod", [218, 165, 32]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("greenyellow", [173, 255, 47]),
    ("grey", [128, 128, 128]),
    ("honeydew", [240, 255, 240]),
    ("hotpink", [255, 105, 180]),
    ("indianred", [205, 92, 92]),
    ("indigo", [75, 0, 130]),
    ("ivory", [255, 255, 240]),
    ("khaki", [240, 230, 140]),
    ("lavender", [230, 230, 250]),
    ("lavenderblush", [255, 240, 245]),
    ("lawngreen", [124, 252, 0]),
    ("lemonchiffon", [255, 250, 205]),
    ("lightblue", [173, 216, 230]),
    ("lightcoral", [240, 128, 128]),
    ("lightcyan", [224, 255, 255]),
    ("lightgoldenrodyellow", [250, 250, 210]),
    ("lightgray", [211, 211, 211]),
    ("lightgreen", [144, 238, 144]),
    ("lightgrey", [211, 211, 211]),
    ("lightpink", [255, 182, 193]),
    ("lightsalmon", [255, 160, 122]),
    ("lightseagreen", [32, 178, 170]),
    ("lightskyblue", [135, 206, 250]),
    ("lightslategray", [119, 136, 153]),
    ("lightslategrey", [119, 136, 153]),
    ("lightsteelblue", [176, 196, 222]),
    ("lightyellow", [255, 255, 224]),
    ("lime", [0, 255, 0]),
    ("limegreen", [50, 205, 50]),
    ("linen", [250, 240, 230]),
    ("magenta", [255, 0, 255]),
    ("maroon", [128, 0, 0]),
    ("mediumaquamarine", [102, 205, 170]),
    ("mediumblue", [0, 0, 205]),
    ("mediumorchid", [186, 85, 211]),
    ("mediumpurple", [147, 112, 219]),
    ("mediumseagreen", [60, 179, 113]),
    ("mediumslateblue", [123, 104, 238]),
    ("mediumspringgreen", [0, 250, 154]),
    ("mediumturquoise", [72, 209, 204]),
    ("mediumvioletred", [199, 21, 133]),
    ("midnightblue", [25, 25, 112]),
    ("mintcream", [245, 255, 250]),
    ("mistyrose", [255, 228, 225]),
    ("moccasin", [255, 228, 181]),
    ("navajowhite", [255, 222, 173]),
    ("navy", [0, 0, 128]),
    ("oldlace", [253, 245, 230]),
    ("olive", [128, 128, 0]),
    ("olivedrab", [107, 142, 35]),
    ("orange", [255, 165, 0]),
    ("orangered", [255, 69, 0]),
    ("orchid", [218, 112, 214]),
    ("palegoldenrod", [238, 232, 170]),
    ("palegreen", [152, 251, 152]),
    ("paleturquoise", [175, 238, 238]),
    ("palevioletred", [219, 112, 147]),
    ("papayawhip", [255, 239, 213]),
    ("peachpuff", [255, 218, 185]),
    ("peru", [205, 133, 63]),
    ("pink", [255, 192, 203]),
    ("plum", [221, 160, 221]),
    ("powderblue", [176, 224, 230]),
    ("purple", [128, 0, 128]),
    ("rebeccapurple", [102, 51, 153]),
    ("red", [255, 0, 0]),
    ("rosybrown", [188, 143, 143]),
    ("royalblue", [65, 105, 225]),
    ("saddlebrown", [139, 69, 19]),
    ("salmon", [250, 128, 114]),
    ("sandybrown", [244, 164, 96]),
    ("seagreen", [46, 139, 87]),
    ("seashell", [255, 245, 238]),
    ("sienna", [160, 82, 45]),
    ("silver", [192, 192, 192]),
    ("skyblue", [135, 206, 235]),
    ("slateblue", [106, 90, 205]),
    ("slategray", [112, 128, 144]),
    ("slategrey", [112, 128, 144]),
    ("snow", [255, 250, 250]),
    ("springgreen", [0, 255, 127]),
    ("steelblue", [70, 130, 180]),
    ("tan", [210, 180, 140]),
    ("teal", [0, 128, 128]),
    ("thistle", [216, 191, 216]),
    ("tomato", [255, 99, 71]),
    ("turquoise", [64, 224, 208]),
    ("violet", [238, 130, 238]),
    ("wheat", [245, 222, 179]),
    ("white", [255, 255, 255]),
    ("whitesmoke", [245, 245, 245]),
    ("yellow", [255, 255, 0]),
    ("yellowgreen", [154, 205, 50]),
];

fn named_color(name: &str) -> Option<Rgb<u8>> {
    NAMED_COLORS
        .binary_search_by(|(known, _)| (*known).cmp(name))
        .ok()
        .map(|i| Rgb(NAMED_COLORS[i].1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("#ff0000")]
    #[case("#f00")]
    #[case("rgb(255,0,0)")]
    #[case("rgb(100%,0%,0%)")]
    #[case("hsl(0,100%,50%)")]
    #[case("red")]
    #[case("Red")]
    fn all_forms_of_pure_red(#[case] text: &str) {
        assert_eq!(ColorSpec::parse(text).unwrap(), ColorSpec::Flat(Rgb([255, 0, 0])));
    }

    #[rstest]
    #[case("rainbow", 60.0, 45.0)]
    #[case("rainbow(200)", 200.0, 45.0)]
    #[case("rainbow(200,30)", 200.0, 30.0)]
    #[case("Rainbow( 90 , 0 )", 90.0, 0.0)]
    fn rainbow_defaults_fill_in(#[case] text: &str, #[case] bandwidth: f64, #[case] angle: f64) {
        assert_eq!(ColorSpec::parse(text).unwrap(), ColorSpec::Rainbow { bandwidth, angle });
    }

    #[rstest]
    #[case("darkred", [139, 0, 0])]
    #[case("lightblue", [173, 216, 230])]
    #[case("beige", [245, 245, 220])]
    #[case("tomato", [255, 99, 71])]
    #[case("lavender", [230, 230, 250])]
    #[case("DarkGreen", [0, 100, 0])]
    #[case("rebeccapurple", [102, 51, 153])]
    #[case("slategrey", [112, 128, 144])]
    fn css_color_names(#[case] text: &str, #[case] rgb: [u8; 3]) {
        assert_eq!(ColorSpec::parse(text).unwrap(), ColorSpec::Flat(Rgb(rgb)));
    }

    #[test]
    fn color_table_is_sorted_for_lookup() {
        assert!(NAMED_COLORS.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert_eq!(NAMED_COLORS.len(), 148);
    }

    #[rstest]
    #[case("chartreuse-ish")]
    #[case("#12345")]
    #[case("rgb(300,0,0)")]
    #[case("rgb(1,2)")]
    #[case("rainbow(0)")]
    #[case("rainbow(abc)")]
    fn unknown_specs_are_configuration_errors(#[case] text: &str) {
        assert!(matches!(ColorSpec::parse(text), Err(Error::Config(_))));
    }

    #[test]
    fn flat_fill_is_uniform() {
        let img = fill(5, 3, &ColorSpec::Flat(Rgb([1, 2, 3])));
        assert_eq!(img.dimensions(), (5, 3));
        assert!(img.pixels().all(|p| *p == Rgb([1, 2, 3])));
    }

    #[test]
    fn stage_boundaries_are_continuous() {
        // The end of each stage meets the start of the next within one ramp step.
        for stage in 0..6 {
            let end = rainbow_at((f64::from(stage) + 0.999) / 6.0);
            let start = rainbow_at(f64::from((stage + 1) % 6) / 6.0);
            for c in 0..3 {
                let diff = (i16::from(end[c]) - i16::from(start[c])).abs();
                assert!(diff <= 1, "jump of {diff} after stage {stage}, channel {c}");
            }
        }
    }

    #[test]
    fn rainbow_starts_red() {
        assert_eq!(rainbow_at(0.0), Rgb([255, 0, 0]));
        assert_eq!(rainbow_at(0.5), Rgb([0, 255, 255]));
    }

    #[test]
    fn wheel_end_is_red_again() {
        assert_eq!(rainbow_at(1.0), Rgb([255, 0, 0]));
        assert_eq!(rainbow_at(-1.0e-17), Rgb([255, 0, 0]));
        assert_eq!(rainbow_at(2.5), rainbow_at(0.5));
    }

    #[rstest]
    #[case(90.0)]
    #[case(270.0)]
    #[case(-90.0)]
    fn zero_line_of_a_vertical_rainbow_is_red(#[case] angle: f64) {
        // cos() of these angles is a tiny nonzero value, so y leaks into the projection
        let img = fill(1, 10, &ColorSpec::Rainbow { bandwidth: 60.0, angle });
        for y in 0..10 {
            assert_eq!(*img.get_pixel(0, y), Rgb([255, 0, 0]), "row {y}");
        }
    }

    #[test]
    fn negative_projection_wraps_instead_of_going_black() {
        let img = fill(4, 4, &ColorSpec::Rainbow { bandwidth: 60.0, angle: -45.0 });
        assert!(img.pixels().all(|p| *p != Rgb([0, 0, 0])));
    }

    proptest! {
        #[test]
        fn rainbow_repeats_every_bandwidth(y in 0u32..200, shift in 1u32..4) {
            // angle 0 projects onto y exactly, so one bandwidth further is the same hue
            let bandwidth = 64u32;
            let spec = ColorSpec::Rainbow { bandwidth: f64::from(bandwidth), angle: 0.0 };
            let img = fill(1, y + shift * bandwidth + 1, &spec);
            prop_assert_eq!(img.get_pixel(0, y), img.get_pixel(0, y + shift * bandwidth));
        }

        #[test]
        fn rainbow_has_no_jumps_at_any_angle(angle in -720.0f64..720.0, x in 0u32..100, y in 0u32..100) {
            // neighbours are at most one pixel apart along the projection: 6/64 of a stage ramp
            let spec = ColorSpec::Rainbow { bandwidth: 64.0, angle };
            let img = fill(x + 2, y + 2, &spec);
            let here = img.get_pixel(x, y);
            for next in [img.get_pixel(x + 1, y), img.get_pixel(x, y + 1)] {
                for c in 0..3 {
                    let diff = (i16::from(here[c]) - i16::from(next[c])).abs();
                    prop_assert!(diff <= 26, "jump of {} in channel {} at angle {}", diff, c, angle);
                }
            }
        }
    }
}
