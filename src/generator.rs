//! Level sources: the bundled sample level and seeded random deals.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::PuzzleError;
use crate::model::{Bottle, Color, HELPER_BOTTLES, MAX_COLORS, PuzzleState};
use crate::validation::MIN_CAPACITY;

/// Sample level, bottom to top, as ids into the default palette.
const EXAMPLE_LAYERS: [[u8; 4]; 9] = [
    [6, 6, 0, 8],
    [5, 6, 2, 1],
    [8, 0, 1, 4],
    [1, 4, 9, 5],
    [5, 5, 9, 2],
    [0, 9, 7, 1],
    [6, 0, 7, 8],
    [7, 9, 8, 4],
    [4, 2, 2, 7],
];

/// Nine colours in eleven bottles of four, the last two empty.
pub fn example_puzzle() -> PuzzleState {
    let mut bottles: Vec<Bottle> = EXAMPLE_LAYERS
        .iter()
        .map(|layers| Bottle::from_layers(layers.iter().map(|&id| Color::new(id)).collect()))
        .collect();
    bottles.extend((0..HELPER_BOTTLES).map(|_| Bottle::new()));
    PuzzleState::from_parts(bottles, EXAMPLE_LAYERS[0].len())
}

/// Deal `colors` colours, `capacity` layers each, into full bottles followed
/// by the empty helpers. The same seed always deals the same level.
pub fn random_puzzle(colors: usize, capacity: usize, seed: u64) -> Result<PuzzleState, PuzzleError> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_puzzle_with_rng(colors, capacity, &mut rng)
}

pub fn random_puzzle_with_rng<R: Rng + ?Sized>(
    colors: usize,
    capacity: usize,
    rng: &mut R,
) -> Result<PuzzleState, PuzzleError> {
    if capacity < MIN_CAPACITY {
        return Err(PuzzleError::CapacityTooSmall { min: MIN_CAPACITY });
    }
    if colors == 0 {
        return Err(PuzzleError::NoColors);
    }
    if colors > MAX_COLORS {
        return Err(PuzzleError::PaletteFull { max: MAX_COLORS });
    }

    let mut layers: Vec<Color> = (0..colors)
        .flat_map(|id| std::iter::repeat_n(Color::new(id as u8), capacity))
        .collect();
    layers.shuffle(rng);

    let mut bottles: Vec<Bottle> = layers
        .chunks(capacity)
        .map(|chunk| Bottle::from_layers(chunk.to_vec()))
        .collect();
    bottles.extend((0..HELPER_BOTTLES).map(|_| Bottle::new()));
    PuzzleState::new(bottles, capacity)
}
