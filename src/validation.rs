//! Checks a level must pass before it is handed to a solver.
//!
//! The solvers themselves assume these hold and never re-check them.

use crate::error::PuzzleError;
use crate::model::{Palette, PuzzleState};

pub const MIN_BOTTLES: usize = 3;
pub const MIN_CAPACITY: usize = 2;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Every non-helper bottle must be full.
    #[default]
    Strict,
    /// Non-helper bottles may be empty or partially filled.
    Lenient,
}

pub fn validate(state: &PuzzleState, palette: &Palette, strictness: Strictness) -> Result<(), PuzzleError> {
    let capacity = state.get_capacity();
    if state.bottle_count() < MIN_BOTTLES {
        return Err(PuzzleError::TooFewBottles { min: MIN_BOTTLES });
    }
    if capacity < MIN_CAPACITY {
        return Err(PuzzleError::CapacityTooSmall { min: MIN_CAPACITY });
    }

    let colors = state.get_available_colors_with_count();
    if colors.is_empty() {
        return Err(PuzzleError::NoColors);
    }

    let helpers = state.helper_indices();
    for index in helpers.clone() {
        if state.get_bottle(index).is_some_and(|bottle| !bottle.is_empty()) {
            return Err(PuzzleError::HelperNotEmpty { bottle: index + 1 });
        }
    }

    for (index, bottle) in state.get_bottles().iter().enumerate() {
        if bottle.len() > capacity {
            return Err(PuzzleError::OverCapacity { bottle: index + 1 });
        }
        if strictness == Strictness::Lenient || helpers.contains(&index) {
            continue;
        }
        if bottle.is_empty() {
            return Err(PuzzleError::EmptyBottle { bottle: index + 1 });
        }
        if !bottle.is_full(capacity) {
            return Err(PuzzleError::PartialBottle { bottle: index + 1 });
        }
    }

    // Bottles all share one capacity, so a colour can only end up sorted if
    // its layers fill a whole number of bottles.
    for (color, count) in colors {
        if count % capacity != 0 {
            return Err(PuzzleError::ColorCount {
                color: palette.label(color),
                count,
                capacity,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;

    const R: Color = Color::new(0);
    const B: Color = Color::new(6);

    fn state(layers: Vec<Vec<Color>>, capacity: usize) -> PuzzleState {
        PuzzleState::from_layers(layers, capacity).unwrap()
    }

    fn check(current: &PuzzleState, strictness: Strictness) -> Result<(), PuzzleError> {
        validate(current, &Palette::default(), strictness)
    }

    #[test]
    fn test_valid_level() {
        let current = state(vec![vec![R, B], vec![B, R], vec![], vec![]], 2);
        assert_eq!(check(&current, Strictness::Strict), Ok(()));
    }

    #[test]
    fn test_too_few_bottles() {
        let current = state(vec![vec![R, R], vec![]], 2);
        assert_eq!(
            check(&current, Strictness::Lenient),
            Err(PuzzleError::TooFewBottles { min: 3 })
        );
    }

    #[test]
    fn test_capacity_too_small() {
        let current = state(vec![vec![R], vec![], vec![]], 1);
        assert_eq!(
            check(&current, Strictness::Lenient),
            Err(PuzzleError::CapacityTooSmall { min: 2 })
        );
    }

    #[test]
    fn test_no_colors() {
        let current = state(vec![vec![], vec![], vec![]], 4);
        assert_eq!(check(&current, Strictness::Lenient), Err(PuzzleError::NoColors));
    }

    #[test]
    fn test_helpers_must_be_empty() {
        let current = state(vec![vec![R, R], vec![], vec![B, B]], 2);
        assert_eq!(
            check(&current, Strictness::Lenient),
            Err(PuzzleError::HelperNotEmpty { bottle: 3 })
        );
    }

    #[test]
    fn test_partial_bottles_only_when_lenient() {
        let current = state(vec![vec![R, R, R], vec![R], vec![], vec![]], 4);
        assert_eq!(
            check(&current, Strictness::Strict),
            Err(PuzzleError::PartialBottle { bottle: 1 })
        );
        assert_eq!(check(&current, Strictness::Lenient), Ok(()));
    }

    #[test]
    fn test_empty_bottles_only_when_lenient() {
        let current = state(vec![vec![R, R], vec![], vec![B, B], vec![], vec![]], 2);
        assert_eq!(
            check(&current, Strictness::Strict),
            Err(PuzzleError::EmptyBottle { bottle: 2 })
        );
        assert_eq!(check(&current, Strictness::Lenient), Ok(()));
    }

    #[test]
    fn test_color_count_must_fill_bottles() {
        let current = state(vec![vec![R, R, B], vec![B, B, R], vec![R], vec![], vec![]], 3);
        let err = check(&current, Strictness::Lenient).unwrap_err();
        assert_eq!(
            err,
            PuzzleError::ColorCount {
                color: "Red".to_string(),
                count: 4,
                capacity: 3,
            }
        );
        assert!(err.to_string().contains("not a multiple of capacity (3)"));
    }
}
