//! Size planning: which target boxes an image gets.

use crate::types::{Classification, VariantSpec};

/// Square boxes every avatar is rendered at.
pub const AVATAR_SIZES: [u32; 6] = [16, 32, 64, 128, 256, 512];

/// Square boxes every piece of audio art is rendered at.
pub const AUDIO_ART_SIZES: [u32; 3] = [50, 100, 200];

/// Edge length an art post's full-size box never goes below.
pub const ART_MIN_EDGE: u32 = 8192;

/// Downsizing ladder for generic images, widest first.
pub const GENERIC_LADDER: [VariantSpec; 4] = [
    VariantSpec::new(1280, 4096),
    VariantSpec::new(810, 4096),
    VariantSpec::new(540, 4096),
    VariantSpec::new(300, 4096),
];

/// Maps a classification and source dimensions to target boxes.
pub struct SizePlanner;

impl SizePlanner {
    /// Plan the target boxes for an image.
    ///
    /// The result is never empty, and widths within one plan are unique.
    ///
    /// The art box takes the *larger* of each source dimension and
    /// [`ART_MIN_EDGE`]. The first ladder rung is always planned; every
    /// later rung only when the source is strictly wider than that rung.
    /// For art this means 1280 is planned even for sources narrower than
    /// 1280, which older upload handlers skipped.
    pub fn plan(classification: Classification, dimensions: (u32, u32)) -> Vec<VariantSpec> {
        let (width, height) = dimensions;

        match classification {
            Classification::Avatar => AVATAR_SIZES.iter().map(|&e| VariantSpec::square(e)).collect(),
            Classification::AudioArt => AUDIO_ART_SIZES
                .iter()
                .map(|&e| VariantSpec::square(e))
                .collect(),
            Classification::Art => {
                let mut plan = vec![VariantSpec::new(
                    width.max(ART_MIN_EDGE),
                    height.max(ART_MIN_EDGE),
                )];
                plan.extend(Self::ladder(width));
                plan
            }
            Classification::GenericImage => Self::ladder(width),
        }
    }

    fn ladder(width: u32) -> Vec<VariantSpec> {
        GENERIC_LADDER
            .iter()
            .enumerate()
            .filter(|(i, rung)| *i == 0 || width > rung.max_width)
            .map(|(_, rung)| *rung)
            .collect()
    }
}
