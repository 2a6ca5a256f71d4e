use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{ReachPosterError, Result};
use crate::store::ThemeMode;

/// Picks the theme for the next generation of a schedule.
///
/// `generated` is the number of posts plus pending items already produced for
/// the schedule and only matters for `different`.
pub fn select_theme<'a, R: Rng + ?Sized>(
    mode: ThemeMode,
    themes: &'a [String],
    generated: u64,
    rng: &mut R,
) -> Result<&'a str> {
    if themes.is_empty() {
        return Err(ReachPosterError::Validation(
            "schedule has no themes to choose from".to_string(),
        ));
    }
    let theme = match mode {
        ThemeMode::Same => &themes[0],
        ThemeMode::Different => &themes[(generated % themes.len() as u64) as usize],
        ThemeMode::Mixed => themes.choose(rng).unwrap_or(&themes[0]),
    };
    Ok(theme.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn themes() -> Vec<String> {
        ["Hope", "Healing", "Strength"]
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn same_always_returns_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let themes = themes();
        for count in [0, 1, 2, 17, 1000] {
            assert_eq!(
                select_theme(ThemeMode::Same, &themes, count, &mut rng).expect("theme"),
                "Hope"
            );
        }
    }

    #[test]
    fn different_rotates_by_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let themes = themes();
        let picks: Vec<&str> = (0..7)
            .map(|count| select_theme(ThemeMode::Different, &themes, count, &mut rng).expect("theme"))
            .collect();
        assert_eq!(
            picks,
            vec!["Hope", "Healing", "Strength", "Hope", "Healing", "Strength", "Hope"]
        );
    }

    #[test]
    fn mixed_eventually_covers_every_theme() {
        let mut rng = StdRng::seed_from_u64(42);
        let themes = themes();
        let seen: HashSet<&str> = (0..50)
            .map(|_| select_theme(ThemeMode::Mixed, &themes, 0, &mut rng).expect("theme"))
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn empty_theme_list_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        for mode in [ThemeMode::Same, ThemeMode::Different, ThemeMode::Mixed] {
            assert!(select_theme(mode, &[], 3, &mut rng).is_err());
        }
    }
}
