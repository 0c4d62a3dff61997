use image::Rgb;
use palette::{FromColor, Hsl, Srgb};
use rand::Rng;

/// Generates `n` visually distinct, contrasting colors spread around the hue wheel.
pub fn contrasting_colors(n: usize) -> Vec<Rgb<u8>> {
    let mut colors = Vec::with_capacity(n);

    for i in 0..n {
        let hue = (i as f32 * 360.0) / n as f32;

        let saturation = 0.9;
        let lightness = 0.5;

        let hsl_color = Hsl::new(hue, saturation, lightness);
        let srgb_linear = Srgb::from_color(hsl_color);
        let srgb_u8: Srgb<u8> = srgb_linear.into_format();

        colors.push(Rgb([srgb_u8.red, srgb_u8.green, srgb_u8.blue]));
    }

    colors
}

/// Draws `n` uniformly random colors from `rng`.
///
/// Pass a seeded generator (e.g. `StdRng::seed_from_u64`) for reproducible output.
pub fn random_colors<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Rgb<u8>> {
    (0..n).map(|_| Rgb(rng.r#gen::<[u8; 3]>())).collect()
}
