//! Team color palette
//!
//! This module provides the fixed palette of CSS color names used to tag
//! teams, and the sampling that hands each team of a test a distinct
//! color.

use thiserror::Error;

/// CSS color names a team can be tagged with
pub const COLORS: [&str; 22] = [
    "STEELBLUE",
    "CADETBLUE",
    "LIGHTSEAGREEN",
    "OLIVEDRAB",
    "YELLOWGREEN",
    "FORESTGREEN",
    "MEDIUMSEAGREEN",
    "LIGHTGREEN",
    "LIMEGREEN",
    "DARKMAGENTA",
    "DARKORCHID",
    "MEDIUMORCHID",
    "ORCHID",
    "ORANGE",
    "ORANGERED",
    "CORAL",
    "LIGHTSALMON",
    "PALEVIOLETRED",
    "MEDIUMVIOLETRED",
    "DEEPPINK",
    "CRIMSON",
    "SALMON",
];

/// Error returned when a test wants more distinct colors than exist
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{teams} teams need {teams} distinct colors, the palette has {available}")]
pub struct InsufficientColors {
    /// How many teams asked for a color
    pub teams: usize,
    /// How many colors the palette offers
    pub available: usize,
}

/// Samples `teams` distinct colors from the palette
///
/// The palette is shuffled and the first `teams` entries are taken, so
/// every team gets a different color.
///
/// # Errors
///
/// Returns [`InsufficientColors`] if `teams` exceeds the palette size.
pub fn pick_colors(teams: usize) -> Result<Vec<String>, InsufficientColors> {
    if teams > COLORS.len() {
        return Err(InsufficientColors {
            teams,
            available: COLORS.len(),
        });
    }
    let mut pool = COLORS.to_vec();
    fastrand::shuffle(&mut pool);
    Ok(pool.into_iter().take(teams).map(str::to_owned).collect())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_pick_colors_distinct() {
        let colors = pick_colors(10).unwrap();
        assert_eq!(colors.len(), 10);
        let unique: HashSet<&String> = colors.iter().collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_pick_colors_come_from_palette() {
        for color in pick_colors(22).unwrap() {
            assert!(COLORS.contains(&color.as_str()));
        }
    }

    #[test]
    fn test_pick_colors_too_many_teams() {
        assert_eq!(
            pick_colors(23),
            Err(InsufficientColors {
                teams: 23,
                available: 22,
            })
        );
    }

    #[test]
    fn test_pick_colors_zero_teams() {
        assert!(pick_colors(0).unwrap().is_empty());
    }
}
