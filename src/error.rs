use thiserror::Error;

/// Problems with a puzzle as handed to the solver, or with a move replayed
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    #[error("Capacity must be positive.")]
    ZeroCapacity,
    #[error("Capacity must be >= {min}.")]
    CapacityTooSmall { min: usize },
    #[error("Number of bottles must be >= {min}.")]
    TooFewBottles { min: usize },
    #[error("Select at least 1 color.")]
    NoColors,
    #[error("Bottle {bottle} exceeds capacity.")]
    OverCapacity { bottle: usize },
    #[error("Last 2 bottles must be empty (they are helper bottles); bottle {bottle} is not.")]
    HelperNotEmpty { bottle: usize },
    #[error("Bottle {bottle} is partially filled; every bottle must be empty or full.")]
    PartialBottle { bottle: usize },
    #[error("Bottle {bottle} is empty; only the last 2 bottles may start empty.")]
    EmptyBottle { bottle: usize },
    #[error(
        "Color \"{color}\" appears {count} times, not a multiple of capacity ({capacity}). \
         This often means the level was entered incorrectly."
    )]
    ColorCount {
        color: String,
        count: usize,
        capacity: usize,
    },
    #[error("Unknown color \"{0}\".")]
    UnknownColor(String),
    #[error("Palette cannot hold more than {max} colors.")]
    PaletteFull { max: usize },
    #[error("Bottle {bottle} holds color id {id}, above the largest id {max}.")]
    ColorOutOfRange { bottle: usize, id: u8, max: u8 },
    #[error("Bottle {index} does not exist.")]
    BottleIndex { index: usize },
    #[error("Cannot pour bottle {from} into bottle {to}.")]
    IllegalMove { from: usize, to: usize },
    #[error("Move {from} -> {to} does not match the pour it describes.")]
    MoveMismatch { from: usize, to: usize },
}

/// Why a search stopped without a solution. Both variants are ordinary
/// outcomes, not bugs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("State limit reached ({limit}). Try selecting fewer colors or reducing bottles.")]
    StateLimit { limit: usize, explored: usize },
    #[error("No solution found (this input may be invalid).")]
    NoSolution { explored: usize },
}

impl SolveError {
    pub fn explored(&self) -> usize {
        match self {
            SolveError::StateLimit { explored, .. } | SolveError::NoSolution { explored } => {
                *explored
            }
        }
    }
}
