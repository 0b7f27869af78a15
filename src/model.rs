use std::collections::BTreeMap;
use std::fmt;

use crate::error::PuzzleError;

pub const DEFAULT_COLORS: [&str; 13] = [
    "Red",
    "Pink",
    "Orange",
    "Yellow",
    "Green",
    "Light Green",
    "Blue",
    "Light Blue",
    "Purple",
    "Gray",
    "Brown",
    "Black",
    "White",
];

/// Colour ids are stored as `id + 1` inside a `StateKey`, so one value of the
/// byte range is reserved for the bottle separator.
pub const MAX_COLORS: usize = u8::MAX as usize;

/// The last two bottles of every puzzle start and finish empty.
pub const HELPER_BOTTLES: usize = 2;

pub const DEFAULT_CAPACITY: usize = 4;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Color {
    id: u8,
}
impl Color {
    pub const fn new(id: u8) -> Self {
        Color { id }
    }

    pub fn get_id(&self) -> u8 {
        self.id
    }

    /// Parse a spreadsheet-style label ("A", "Z", "AA", ...) into a colour.
    pub fn from_letters(repr: &str) -> Option<Self> {
        let id = Self::letters_to_color_id(repr.trim())?;
        u8::try_from(id).ok().map(Color::new)
    }

    /// Convert a single letter (A-Z) into a 0-based id.
    fn letter_to_color_id(ch: char) -> Option<usize> {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let up = ch.to_ascii_uppercase();
        Some((up as u8 - b'A') as usize)
    }

    /// Excel-style base-26 numbering: A=0, B=1, ..., Z=25, AA=26, AB=27, ...
    fn letters_to_color_id(s: &str) -> Option<usize> {
        let mut acc: usize = 0;
        let mut saw_any = false;

        for ch in s.chars() {
            let digit = Self::letter_to_color_id(ch)?;
            acc = acc.checked_mul(26)?.checked_add(digit + 1)?;
            saw_any = true;
        }

        if !saw_any {
            return None;
        }
        acc.checked_sub(1)
    }

    pub fn get_letter_representation(&self) -> String {
        let mut chars = Vec::new();
        // 1-based for easier calculation
        let mut id = usize::from(self.id) + 1;
        while id > 0 {
            let rem = (id - 1) % 26;
            chars.push((b'A' + rem as u8) as char);
            id = (id - 1) / 26;
        }
        chars.iter().rev().collect()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_letter_representation())
    }
}

/// Maps caller-facing colour names onto interned [`Color`] ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    names: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            names: DEFAULT_COLORS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Palette {
    pub fn new<I, S>(names: I) -> Result<Self, PuzzleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() > MAX_COLORS {
            return Err(PuzzleError::PaletteFull { max: MAX_COLORS });
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive name lookup, falling back to letter labels for ids the
    /// palette knows about.
    pub fn resolve(&self, name: &str) -> Result<Color, PuzzleError> {
        let wanted = name.trim();
        if let Some(id) = self
            .names
            .iter()
            .position(|known| known.eq_ignore_ascii_case(wanted))
        {
            return Ok(Color::new(id as u8));
        }
        match Color::from_letters(wanted) {
            Some(color) if usize::from(color.get_id()) < self.names.len() => Ok(color),
            _ => Err(PuzzleError::UnknownColor(wanted.to_string())),
        }
    }

    /// Resolve `name`, adding it to the palette if it is new.
    pub fn intern(&mut self, name: &str) -> Result<Color, PuzzleError> {
        if let Ok(color) = self.resolve(name) {
            return Ok(color);
        }
        if self.names.len() >= MAX_COLORS {
            return Err(PuzzleError::PaletteFull { max: MAX_COLORS });
        }
        self.names.push(name.trim().to_string());
        Ok(Color::new((self.names.len() - 1) as u8))
    }

    pub fn name(&self, color: Color) -> Option<&str> {
        self.names.get(usize::from(color.get_id())).map(String::as_str)
    }

    pub fn label(&self, color: Color) -> String {
        match self.name(color) {
            Some(name) => name.to_string(),
            None => color.get_letter_representation(),
        }
    }
}

/// A stack of colour layers, stored bottom to top.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bottle {
    layers: Vec<Color>,
}
impl Bottle {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn from_layers(layers: Vec<Color>) -> Self {
        Self { layers }
    }

    pub fn get_layers(&self) -> &[Color] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn is_full(&self, capacity: usize) -> bool {
        self.layers.len() >= capacity
    }

    pub fn get_empty_space(&self, capacity: usize) -> usize {
        capacity.saturating_sub(self.layers.len())
    }

    pub fn get_top_fluid(&self) -> Option<Color> {
        self.layers.last().copied()
    }

    /// Colour on top and how many consecutive layers of it end at the top.
    pub fn get_top_run(&self) -> Option<(Color, usize)> {
        let top = self.get_top_fluid()?;
        let run = self
            .layers
            .iter()
            .rev()
            .take_while(|&&layer| layer == top)
            .count();
        Some((top, run))
    }

    pub fn is_uniform(&self) -> bool {
        self.layers.windows(2).all(|pair| pair[0] == pair[1])
    }

    /// Full and a single colour.
    pub fn is_complete(&self, capacity: usize) -> bool {
        self.layers.len() == capacity && self.is_uniform()
    }

    /// Number of colour changes going up the stack.
    pub fn get_color_breaks(&self) -> usize {
        self.layers
            .windows(2)
            .filter(|pair| pair[0] != pair[1])
            .count()
    }

    pub fn could_pour_into(&self, other: &Bottle, capacity: usize) -> bool {
        let Some(top) = self.get_top_fluid() else {
            return false;
        };
        if other.is_full(capacity) {
            return false;
        }
        match other.get_top_fluid() {
            None => true,
            Some(other_top) => other_top == top,
        }
    }

    pub fn get_pourable_amount(&self, other: &Bottle, capacity: usize) -> usize {
        if !self.could_pour_into(other, capacity) {
            return 0;
        }
        let run = self.get_top_run().map_or(0, |(_, run)| run);
        run.min(other.get_empty_space(capacity))
    }

    /// Pour the top run into `other`, limited by its free space. Returns the
    /// amount and colour moved, or `None` when the pour is not legal.
    pub fn pour_into(&mut self, other: &mut Bottle, capacity: usize) -> Option<(usize, Color)> {
        let amount = self.get_pourable_amount(other, capacity);
        if amount == 0 {
            return None;
        }
        let color = self.get_top_fluid()?;
        let remaining = self.layers.len() - amount;
        self.layers.truncate(remaining);
        other.layers.extend(std::iter::repeat_n(color, amount));
        Some((amount, color))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from_bottle: usize,
    pub to_bottle: usize,
    pub amount: usize,
    pub color: Color,
}
impl Move {
    /// True when `self` pours straight back along `previous`.
    pub fn is_reverse_of(&self, previous: &Move) -> bool {
        self.from_bottle == previous.to_bottle && self.to_bottle == previous.from_bottle
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} x {})",
            self.from_bottle + 1,
            self.to_bottle + 1,
            self.amount,
            self.color
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PuzzleState {
    bottles: Vec<Bottle>,
    capacity: usize,
}

impl PuzzleState {
    pub fn new(bottles: Vec<Bottle>, capacity: usize) -> Result<Self, PuzzleError> {
        if capacity == 0 {
            return Err(PuzzleError::ZeroCapacity);
        }
        if let Some(index) = bottles.iter().position(|b| b.len() > capacity) {
            return Err(PuzzleError::OverCapacity { bottle: index + 1 });
        }
        // `StateKey` stores `id + 1` per layer, so the top id is reserved.
        for (index, bottle) in bottles.iter().enumerate() {
            let reserved = bottle
                .get_layers()
                .iter()
                .find(|color| usize::from(color.get_id()) >= MAX_COLORS);
            if let Some(color) = reserved {
                return Err(PuzzleError::ColorOutOfRange {
                    bottle: index + 1,
                    id: color.get_id(),
                    max: (MAX_COLORS - 1) as u8,
                });
            }
        }
        Ok(Self { bottles, capacity })
    }

    /// For callers that build bottles no longer than `capacity` themselves.
    pub(crate) fn from_parts(bottles: Vec<Bottle>, capacity: usize) -> Self {
        debug_assert!(capacity > 0 && bottles.iter().all(|b| b.len() <= capacity));
        debug_assert!(
            bottles
                .iter()
                .flat_map(Bottle::get_layers)
                .all(|color| usize::from(color.get_id()) < MAX_COLORS)
        );
        Self { bottles, capacity }
    }

    pub fn from_layers(layers: Vec<Vec<Color>>, capacity: usize) -> Result<Self, PuzzleError> {
        Self::new(layers.into_iter().map(Bottle::from_layers).collect(), capacity)
    }

    /// Parse one bottle per line, colour names separated by commas, bottom to
    /// top. A line holding only `-` or `.` is an empty bottle; lines starting
    /// with `#` are ignored.
    pub fn from_text(text: &str, capacity: usize, palette: &Palette) -> Result<Self, PuzzleError> {
        let mut bottles = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line == "-" || line == "." {
                bottles.push(Bottle::new());
                continue;
            }
            let layers = line
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| palette.resolve(token))
                .collect::<Result<Vec<_>, _>>()?;
            bottles.push(Bottle::from_layers(layers));
        }
        Self::new(bottles, capacity)
    }

    pub fn to_text(&self, palette: &Palette) -> String {
        let mut repr = String::new();
        for bottle in &self.bottles {
            if bottle.is_empty() {
                repr.push('-');
            } else {
                let names: Vec<String> = bottle
                    .get_layers()
                    .iter()
                    .map(|&color| palette.label(color))
                    .collect();
                repr.push_str(&names.join(", "));
            }
            repr.push('\n');
        }
        repr
    }

    pub fn display<'a>(&'a self, palette: &'a Palette) -> StateDisplay<'a> {
        StateDisplay {
            state: self,
            palette,
        }
    }

    pub fn get_bottles(&self) -> &[Bottle] {
        &self.bottles
    }

    pub fn get_bottle(&self, index: usize) -> Option<&Bottle> {
        self.bottles.get(index)
    }

    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    pub fn bottle_count(&self) -> usize {
        self.bottles.len()
    }

    pub fn helper_indices(&self) -> std::ops::Range<usize> {
        self.bottles.len().saturating_sub(HELPER_BOTTLES)..self.bottles.len()
    }

    pub fn is_solved(&self) -> bool {
        self.bottles
            .iter()
            .all(|bottle| bottle.is_empty() || bottle.is_complete(self.capacity))
    }

    pub fn get_available_colors_with_count(&self) -> Vec<(Color, usize)> {
        let mut counts: BTreeMap<Color, usize> = BTreeMap::new();
        for bottle in &self.bottles {
            for &color in bottle.get_layers() {
                *counts.entry(color).or_insert(0) += 1;
            }
        }
        counts.into_iter().collect()
    }

    pub fn could_pour(&self, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }
        match (self.bottles.get(from), self.bottles.get(to)) {
            (Some(src), Some(dst)) => src.could_pour_into(dst, self.capacity),
            _ => false,
        }
    }

    fn get_pair_mut(&mut self, from: usize, to: usize) -> Option<(&mut Bottle, &mut Bottle)> {
        if from == to || from >= self.bottles.len() || to >= self.bottles.len() {
            return None;
        }
        if from < to {
            let (left, right) = self.bottles.split_at_mut(to);
            Some((&mut left[from], &mut right[0]))
        } else {
            let (left, right) = self.bottles.split_at_mut(from);
            Some((&mut right[0], &mut left[to]))
        }
    }

    /// Pour bottle `from` into bottle `to` in place.
    pub fn apply_pour(&mut self, from: usize, to: usize) -> Option<Move> {
        let capacity = self.capacity;
        let (src, dst) = self.get_pair_mut(from, to)?;
        let (amount, color) = src.pour_into(dst, capacity)?;
        Some(Move {
            from_bottle: from,
            to_bottle: to,
            amount,
            color,
        })
    }

    /// The state reached by pouring `from` into `to`, leaving `self` untouched.
    pub fn after_pour(&self, from: usize, to: usize) -> Option<(PuzzleState, Move)> {
        if !self.could_pour(from, to) {
            return None;
        }
        let mut next = self.clone();
        let mv = next.apply_pour(from, to)?;
        Some((next, mv))
    }

    /// Replay a move produced by a solver, checking that it still describes
    /// the pour it would perform here.
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), PuzzleError> {
        for index in [mv.from_bottle, mv.to_bottle] {
            if index >= self.bottles.len() {
                return Err(PuzzleError::BottleIndex { index });
            }
        }
        if !self.could_pour(mv.from_bottle, mv.to_bottle) {
            return Err(PuzzleError::IllegalMove {
                from: mv.from_bottle,
                to: mv.to_bottle,
            });
        }
        let src = &self.bottles[mv.from_bottle];
        let expected_amount = src.get_pourable_amount(&self.bottles[mv.to_bottle], self.capacity);
        if src.get_top_fluid() != Some(mv.color) || expected_amount != mv.amount {
            return Err(PuzzleError::MoveMismatch {
                from: mv.from_bottle,
                to: mv.to_bottle,
            });
        }
        self.apply_pour(mv.from_bottle, mv.to_bottle)
            .map(|_| ())
            .ok_or(PuzzleError::IllegalMove {
                from: mv.from_bottle,
                to: mv.to_bottle,
            })
    }
}

/// Human readable dump of a state: one row per bottle, top layer first, empty
/// slots shown as `·`.
pub struct StateDisplay<'a> {
    state: &'a PuzzleState,
    palette: &'a Palette,
}

impl fmt::Display for StateDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capacity = self.state.get_capacity();
        for (index, bottle) in self.state.get_bottles().iter().enumerate() {
            let mut cells: Vec<String> = bottle
                .get_layers()
                .iter()
                .rev()
                .map(|&color| self.palette.label(color))
                .collect();
            let width = capacity.max(cells.len());
            cells.resize(width, "·".to_string());
            writeln!(f, "{:>2}: {}", index + 1, cells.join("  "))?;
        }
        Ok(())
    }
}

/// Hashable identity of a state used by the visited and best-cost maps.
///
/// Each layer is stored as `color id + 1` and every bottle is terminated by a
/// `0`, so the encoding is unambiguous without building strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Box<[u8]>);

impl StateKey {
    /// Bottle order is significant.
    pub fn exact(state: &PuzzleState) -> Self {
        Self::encode(state.get_bottles().iter().map(Bottle::get_layers), state)
    }

    /// Bottles are sorted first, so states that only differ by which physical
    /// bottle holds which contents share a key. Layer order is kept.
    pub fn canonical(state: &PuzzleState) -> Self {
        let mut bottles: Vec<&[Color]> = state.get_bottles().iter().map(Bottle::get_layers).collect();
        bottles.sort_unstable();
        Self::encode(bottles.into_iter(), state)
    }

    fn encode<'a>(bottles: impl Iterator<Item = &'a [Color]>, state: &PuzzleState) -> Self {
        let layer_count = state.get_bottles().iter().map(Bottle::len).sum::<usize>();
        let mut bytes = Vec::with_capacity(layer_count + state.bottle_count());
        for layers in bottles {
            bytes.extend(layers.iter().map(|color| color.get_id() + 1));
            bytes.push(0);
        }
        StateKey(bytes.into_boxed_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    const R: Color = Color::new(0);
    const B: Color = Color::new(6);
    const G: Color = Color::new(4);

    fn state(layers: Vec<Vec<Color>>, capacity: usize) -> PuzzleState {
        PuzzleState::from_layers(layers, capacity).unwrap()
    }

    #[test]
    fn test_top_run() {
        assert_eq!(Bottle::new().get_top_run(), None);
        let bottle = Bottle::from_layers(vec![B, R, R]);
        assert_eq!(bottle.get_top_run(), Some((R, 2)));
        let bottle = Bottle::from_layers(vec![R, R, B]);
        assert_eq!(bottle.get_top_run(), Some((B, 1)));
    }

    #[test]
    fn test_could_pour_into() {
        let empty = Bottle::new();
        let red = Bottle::from_layers(vec![R]);
        let blue_top = Bottle::from_layers(vec![R, B]);
        let full = Bottle::from_layers(vec![R, R, R, R]);

        assert!(!empty.could_pour_into(&red, 4));
        assert!(red.could_pour_into(&empty, 4));
        assert!(!red.could_pour_into(&blue_top, 4));
        assert!(!red.could_pour_into(&full, 4));
        assert!(full.could_pour_into(&red, 4));
    }

    #[test]
    fn test_pour_limited_by_space() {
        let mut src = Bottle::from_layers(vec![B, R, R, R]);
        let mut dst = Bottle::from_layers(vec![G, R]);
        assert_eq!(src.pour_into(&mut dst, 4), Some((2, R)));
        assert_eq!(src.get_layers(), &[B, R]);
        assert_eq!(dst.get_layers(), &[G, R, R, R]);
        assert_eq!(src.pour_into(&mut dst, 4), None);
    }

    #[test]
    fn test_pour_moves_whole_run() {
        let mut src = Bottle::from_layers(vec![G, B, B]);
        let mut dst = Bottle::new();
        assert_eq!(src.pour_into(&mut dst, 4), Some((2, B)));
        assert_eq!(src.get_layers(), &[G]);
        assert_eq!(dst.get_layers(), &[B, B]);
    }

    #[test]
    fn test_is_solved() {
        assert!(state(vec![vec![R, R], vec![], vec![B, B]], 2).is_solved());
        assert!(!state(vec![vec![R], vec![R], vec![]], 2).is_solved());
        assert!(!state(vec![vec![R, B], vec![B, R], vec![]], 2).is_solved());
    }

    #[test]
    fn test_new_rejects_over_capacity() {
        let result = PuzzleState::from_layers(vec![vec![R, R, R], vec![]], 2);
        assert_eq!(result, Err(PuzzleError::OverCapacity { bottle: 1 }));
        assert_eq!(
            PuzzleState::from_layers(vec![vec![]], 0),
            Err(PuzzleError::ZeroCapacity)
        );
    }

    #[test]
    fn test_after_pour_leaves_original() {
        let start = state(vec![vec![R, R], vec![R, R], vec![]], 4);
        let (next, mv) = start.after_pour(0, 1).unwrap();
        assert_eq!(mv, Move { from_bottle: 0, to_bottle: 1, amount: 2, color: R });
        assert!(next.is_solved());
        assert_eq!(start.get_bottle(0).unwrap().len(), 2);
        assert!(start.after_pour(2, 0).is_none());
        assert!(start.after_pour(0, 0).is_none());
        assert!(start.after_pour(0, 9).is_none());
    }

    #[test]
    fn test_apply_move_checks_description() {
        let mut current = state(vec![vec![B, R], vec![R], vec![]], 3);
        let wrong_amount = Move { from_bottle: 0, to_bottle: 1, amount: 2, color: R };
        assert_eq!(
            current.apply_move(&wrong_amount),
            Err(PuzzleError::MoveMismatch { from: 0, to: 1 })
        );
        let illegal = Move { from_bottle: 2, to_bottle: 1, amount: 1, color: R };
        assert_eq!(
            current.apply_move(&illegal),
            Err(PuzzleError::IllegalMove { from: 2, to: 1 })
        );
        let out_of_range = Move { from_bottle: 5, to_bottle: 1, amount: 1, color: R };
        assert_eq!(
            current.apply_move(&out_of_range),
            Err(PuzzleError::BottleIndex { index: 5 })
        );
        let good = Move { from_bottle: 0, to_bottle: 1, amount: 1, color: R };
        assert_eq!(current.apply_move(&good), Ok(()));
        assert_eq!(current.get_bottle(1).unwrap().get_layers(), &[R, R]);
    }

    #[test]
    fn test_canonical_key_ignores_bottle_permutation() {
        let a = state(vec![vec![R, B], vec![B, R], vec![]], 2);
        let b = state(vec![vec![B, R], vec![], vec![R, B]], 2);
        assert_eq!(StateKey::canonical(&a), StateKey::canonical(&b));
        assert_ne!(StateKey::exact(&a), StateKey::exact(&b));
    }

    #[test]
    fn test_reserved_color_id_rejected() {
        let top = Color::new(u8::MAX);
        assert_eq!(
            PuzzleState::from_layers(vec![vec![R], vec![top], vec![]], 2),
            Err(PuzzleError::ColorOutOfRange { bottle: 2, id: 255, max: 254 })
        );

        let highest = Color::new(u8::MAX - 1);
        let merged = state(vec![vec![highest, highest], vec![], vec![]], 2);
        let split = state(vec![vec![highest], vec![highest], vec![]], 2);
        assert_ne!(StateKey::exact(&merged), StateKey::exact(&split));
        assert_ne!(StateKey::canonical(&merged), StateKey::canonical(&split));
    }

    #[test]
    fn test_canonical_key_keeps_layer_order() {
        let a = state(vec![vec![R, B], vec![]], 2);
        let b = state(vec![vec![B, R], vec![]], 2);
        assert_ne!(StateKey::canonical(&a), StateKey::canonical(&b));
    }

    #[test]
    fn test_key_separates_bottles() {
        let a = state(vec![vec![R, R], vec![]], 2);
        let b = state(vec![vec![R], vec![R]], 2);
        assert_ne!(StateKey::exact(&a), StateKey::exact(&b));
        assert_ne!(StateKey::canonical(&a), StateKey::canonical(&b));
    }

    #[test]
    fn test_letter_representation() {
        assert_eq!(Color::new(0).get_letter_representation(), "A");
        assert_eq!(Color::new(25).get_letter_representation(), "Z");
        assert_eq!(Color::new(26).get_letter_representation(), "AA");
        assert_eq!(Color::from_letters("ab"), Some(Color::new(27)));
        assert_eq!(Color::from_letters("A1"), None);
        assert_eq!(Color::from_letters(""), None);
    }

    #[test]
    fn test_palette_resolve_and_intern() {
        let mut palette = Palette::default();
        assert_eq!(palette.resolve("light green"), Ok(Color::new(5)));
        assert_eq!(palette.resolve("C"), Ok(Color::new(2)));
        assert_eq!(
            palette.resolve("Teal"),
            Err(PuzzleError::UnknownColor("Teal".to_string()))
        );
        let teal = palette.intern("Teal").unwrap();
        assert_eq!(teal, Color::new(13));
        assert_eq!(palette.intern("teal"), Ok(teal));
        assert_eq!(palette.label(teal), "Teal");
        assert_eq!(palette.label(Color::new(40)), "AO");
    }

    #[test]
    fn test_text_round_trip() {
        let palette = Palette::default();
        let text = "# sample\nRed, Blue\nBlue, red\n-\n.\n";
        let parsed = PuzzleState::from_text(text, 2, &palette).unwrap();
        assert_eq!(parsed.bottle_count(), 4);
        assert_eq!(parsed.get_bottle(1).unwrap().get_layers(), &[B, R]);
        assert_eq!(parsed.to_text(&palette), "Red, Blue\nBlue, Red\n-\n-\n");
        let reparsed = PuzzleState::from_text(&parsed.to_text(&palette), 2, &palette).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn test_text_unknown_color() {
        let result = PuzzleState::from_text("Red, Mauve\n-\n-", 4, &Palette::default());
        assert_eq!(result, Err(PuzzleError::UnknownColor("Mauve".to_string())));
    }

    #[test]
    fn test_display_top_first_with_padding() {
        let palette = Palette::default();
        let current = state(vec![vec![R, B], vec![]], 3);
        let rendered = current.display(&palette).to_string();
        assert_eq!(rendered, " 1: Blue  Red  ·\n 2: ·  ·  ·\n");
    }

    fn shuffled_state(colors: usize, capacity: usize, seed: u64) -> PuzzleState {
        let mut layers: Vec<Color> = (0..colors)
            .flat_map(|id| std::iter::repeat_n(Color::new(id as u8), capacity))
            .collect();
        layers.shuffle(&mut StdRng::seed_from_u64(seed));
        let mut bottles: Vec<Vec<Color>> = layers.chunks(capacity).map(<[Color]>::to_vec).collect();
        bottles.push(Vec::new());
        bottles.push(Vec::new());
        state(bottles, capacity)
    }

    proptest! {
        #[test]
        fn is_solved_matches_definition(colors in 1usize..5, capacity in 2usize..6, seed in any::<u64>()) {
            let current = shuffled_state(colors, capacity, seed);
            let expected = current.get_bottles().iter().all(|bottle| {
                bottle.is_empty()
                    || (bottle.len() == capacity
                        && bottle.get_layers().iter().all(|&c| c == bottle.get_layers()[0]))
            });
            prop_assert_eq!(current.is_solved(), expected);
        }

        #[test]
        fn pour_respects_capacity_and_run(colors in 1usize..5, capacity in 2usize..6, seed in any::<u64>()) {
            let current = shuffled_state(colors, capacity, seed);
            for from in 0..current.bottle_count() {
                for to in 0..current.bottle_count() {
                    let Some((next, mv)) = current.after_pour(from, to) else { continue };
                    let (_, run) = current.get_bottle(from).unwrap().get_top_run().unwrap();
                    prop_assert!(mv.amount >= 1 && mv.amount <= run);
                    prop_assert!(next.get_bottle(to).unwrap().len() <= capacity);
                    prop_assert_eq!(
                        next.get_bottle(from).unwrap().len() + mv.amount,
                        current.get_bottle(from).unwrap().len()
                    );
                }
            }
        }

        #[test]
        fn canonical_key_survives_shuffle(colors in 1usize..5, capacity in 2usize..6, seed in any::<u64>()) {
            let current = shuffled_state(colors, capacity, seed);
            let mut bottles: Vec<Vec<Color>> = current
                .get_bottles()
                .iter()
                .map(|bottle| bottle.get_layers().to_vec())
                .collect();
            bottles.shuffle(&mut StdRng::seed_from_u64(seed.wrapping_add(1)));
            let permuted = state(bottles, capacity);
            prop_assert_eq!(StateKey::canonical(&current), StateKey::canonical(&permuted));
        }
    }
}
