use std::{fmt::Display, ops::Deref};
use rand::Rng;
use tracing::trace;


/// Smallest number of dice a term rolls, smaller requests are raised to it.
pub const MIN_COUNT: u32 = 1;

/// Largest number of dice a term rolls, larger requests are clamped to it.
pub const MAX_COUNT: u32 = 20;

/// Die size used when a term never names one, as in `2d` or `d!`.
pub const DEFAULT_SIDES: u32 = 6;

/// Extra draws a single exploding die may take before its chain is cut off.
pub const MAX_EXPLOSIONS: usize = 100;


/// A source of die faces.
///
/// Every [`rand::Rng`] is a `FaceSource`, so a seeded [`rand::rngs::StdRng`] or the
/// thread local generator from [`rand::rng()`] can be handed to the evaluator directly.
/// Implement it by hand to script the faces a roll sees.
///
/// # Examples
/// ```
/// use chatroll::{FaceSource, evaluate};
///
/// struct AlwaysMax;
///
/// impl FaceSource for AlwaysMax {
///     fn face(&mut self, sides: u32) -> u32 {
///         sides
///     }
/// }
///
/// let outcome = evaluate("2d8", &mut AlwaysMax);
/// assert_eq!(outcome.value, 16.0);
/// assert_eq!(outcome.trace, "[8] [8]");
/// ```
pub trait FaceSource {
    /// Returns a face in `1..=sides`. `sides` is never zero.
    fn face(&mut self, sides: u32) -> u32;
}

impl<R: Rng + ?Sized> FaceSource for R {
    fn face(&mut self, sides: u32) -> u32 {
        self.random_range(1..=sides)
    }
}


/// A keep or drop clause of dice notation, such as `kh3` or `dl1`.
///
/// Clauses are translated into the `drop_low`/`drop_high` counts of a [`DiceTerm`]
/// when the term is built: keeping the `n` highest drops `count - n` from the low end,
/// keeping the `n` lowest drops `count - n` from the high end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Keep `n` dice and discard the rest.
    Keep {
        /// If `true`, the `n` highest dice are kept.
        /// If `false`, the `n` lowest dice are kept.
        highest: bool,
        /// The number of dice to keep.
        n: u32
    },

    /// Discard `n` dice.
    Drop {
        /// If `true`, the `n` highest dice are dropped.
        /// If `false`, the `n` lowest dice are dropped.
        highest: bool,
        /// The number of dice to drop.
        n: u32,
    }
}

impl Mode {
    /// Creates a [`Mode::Keep`] mode to keep the `n` highest dice.
    pub fn kh(n: u32) -> Self {
        Mode::Keep { highest: true, n }
    }

    /// Creates a [`Mode::Keep`] mode to keep the `n` lowest dice.
    pub fn kl(n: u32) -> Self {
        Mode::Keep { highest: false, n }
    }

    /// Creates a [`Mode::Drop`] mode to drop the `n` highest dice.
    pub fn dh(n: u32) -> Self {
        Mode::Drop { highest: true, n }
    }

    /// Creates a [`Mode::Drop`] mode to drop the `n` lowest dice.
    pub fn dl(n: u32) -> Self {
        Mode::Drop { highest: false, n }
    }

    /// Folds this clause into `(drop_low, drop_high)` for a term of `count` dice.
    fn apply(self, count: u32, drops: (u32, u32)) -> (u32, u32) {
        let (drop_low, drop_high) = drops;
        match self {
            Mode::Drop { highest: false, n } => (n, drop_high),
            Mode::Drop { highest: true, n } => (drop_low, n),
            Mode::Keep { highest: true, n } => (count.saturating_sub(n), drop_high),
            Mode::Keep { highest: false, n } => (drop_low, count.saturating_sub(n))
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            Mode::Keep { highest, n } => format!("k{}{}", if *highest { "h" } else { "l" }, n),
            Mode::Drop { highest, n } => format!("d{}{}", if *highest { "h" } else { "l" }, n)
        };

        write!(f, "{}", mode)
    }
}


/// One physical die after rolling, including every extra draw it exploded into.
///
/// A die renders itself as its trace fragment: `[4]` for a plain draw,
/// `[6] [6] [2]` for an exploding chain, `{14}` for a compounded chain.
/// Discarded dice render with their faces replaced by `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Die {
    faces: Vec<u32>,
    compound: bool,
    discarded: bool
}

impl Die {
    /// The first face drawn for this die.
    pub fn face(&self) -> u32 {
        self.faces.first().copied().unwrap_or_default()
    }

    /// Every face drawn for this die, in draw order.
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    /// The die's combined value: the sum of its whole chain of draws.
    pub fn value(&self) -> u64 {
        self.faces.iter().map(|&face| u64::from(face)).sum()
    }

    /// `true` if the die showed its maximum face and drew again.
    pub fn is_exploded(&self) -> bool {
        self.faces.len() > 1
    }

    /// `true` if a keep or drop clause removed this die from the sum.
    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Returns `Some(value)` for a kept die and `None` for a discarded one.
    pub fn kept(&self) -> Option<u64> {
        (!self.discarded).then(|| self.value())
    }
}

impl Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.compound {
            return match self.discarded {
                true => write!(f, "{{x}}"),
                false => write!(f, "{{{}}}", self.value())
            };
        }

        let faces: Vec<String> = self.faces.iter()
            .map(|face| if self.discarded { "x".to_string() } else { face.to_string() })
            .collect();

        write!(f, "[{}]", faces.join("] ["))
    }
}


/// A single `NdT` term of dice notation with its modifiers.
///
/// Terms are usually produced by [`crate::parse_factor`], or built by hand with
/// [`DiceTerm::builder()`] or the [`crate::dice!`] macro.
/// Use [`DiceTerm::roll()`] to roll it against a [`FaceSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceTerm {
    count: u32,
    sides: u32,
    drop_low: u32,
    drop_high: u32,
    explode: bool,
    compound: bool
}

impl DiceTerm {
    /// Creates a new [`DiceTermBuilder`] for dice with `sides` faces.
    ///
    /// # Examples
    /// ```
    /// use chatroll::{DiceTerm, Mode};
    ///
    /// let term = DiceTerm::builder(6)     // d6
    ///              .count(4)             // 4d6
    ///              .mode(Mode::kh(3))    // keep the highest 3
    ///              .build();
    ///
    /// assert_eq!(term.drop_low(), 1);
    /// assert_eq!(term.drop_high(), 0);
    /// assert_eq!(format!("{term}"), "4d6dl1");
    /// ```
    pub fn builder(sides: u32) -> DiceTermBuilder {
        DiceTermBuilder::new(sides)
    }

    /// Number of dice rolled, always within [`MIN_COUNT`]`..=`[`MAX_COUNT`].
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of faces on each die, at least 1.
    pub fn sides(&self) -> u32 {
        self.sides
    }

    /// How many of the lowest dice are discarded.
    pub fn drop_low(&self) -> u32 {
        self.drop_low
    }

    /// How many of the highest dice are discarded, after the low discards.
    pub fn drop_high(&self) -> u32 {
        self.drop_high
    }

    /// Whether a maximum face draws again.
    pub fn explode(&self) -> bool {
        self.explode
    }

    /// Whether exploding chains are summed into one die.
    pub fn compound(&self) -> bool {
        self.compound
    }

    /// Rolls every die of the term, then marks discarded dice.
    ///
    /// Low discards are always resolved before high discards. Each pass picks among
    /// the dice still kept, breaking ties by roll order.
    ///
    /// # Examples
    /// ```
    /// use chatroll::{DiceTerm, Mode};
    /// use rand::{SeedableRng, rngs::StdRng};
    ///
    /// let term = DiceTerm::builder(6).count(3).mode(Mode::dl(1)).build();
    /// let result = term.roll(&mut StdRng::seed_from_u64(3));
    ///
    /// assert_eq!(result.len(), 3);
    /// assert_eq!(result.iter().filter(|die| die.is_discarded()).count(), 1);
    /// assert!(result.total() >= 2 && result.total() <= 12);
    /// ```
    pub fn roll<S: FaceSource + ?Sized>(&self, source: &mut S) -> RollResult {
        let mut dice: Vec<Die> = (0..self.count)
            .map(|_| self.roll_die(source))
            .collect();

        discard(&mut dice, self.drop_low, self.drop_high);

        let result = RollResult::new(dice);
        trace!(term = %self, total = result.total(), "rolled dice term");
        result
    }

    /// Smallest and largest possible sum of the term.
    ///
    /// Exploding terms have no upper bound worth reporting, so they return `None`.
    ///
    /// # Examples
    /// ```
    /// use chatroll::{DiceTerm, Mode};
    ///
    /// let term = DiceTerm::builder(20).count(3).mode(Mode::kh(1)).build();
    /// assert_eq!(term.possible_values(), Some((1, 20)));
    ///
    /// let exploding = DiceTerm::builder(6).explode(true).build();
    /// assert_eq!(exploding.possible_values(), None);
    /// ```
    pub fn possible_values(&self) -> Option<(u64, u64)> {
        if self.explode {
            return None;
        }

        let kept = u64::from(self.count.saturating_sub(self.drop_low.saturating_add(self.drop_high)));
        Some((kept, kept * u64::from(self.sides)))
    }

    fn roll_die<S: FaceSource + ?Sized>(&self, source: &mut S) -> Die {
        let mut faces = vec![source.face(self.sides)];

        if self.explode {
            while faces.last() == Some(&self.sides) && faces.len() <= MAX_EXPLOSIONS {
                faces.push(source.face(self.sides));
            }
        }

        Die {
            faces,
            compound: self.explode && self.compound,
            discarded: false
        }
    }
}

impl Display for DiceTerm {
    /// Formats the term in canonical notation, with keep clauses already
    /// translated into drop clauses.
    ///
    /// # Examples
    /// ```
    /// use chatroll::{DiceTerm, Mode};
    ///
    /// let term = DiceTerm::builder(20).build();
    /// assert_eq!(format!("{term}"), "1d20");
    ///
    /// let term = DiceTerm::builder(6).count(4).mode(Mode::kl(3)).explode(true).compound(true).build();
    /// assert_eq!(format!("{term}"), "4d6dh1!!");
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;

        if self.drop_low > 0 {
            write!(f, "{}", Mode::dl(self.drop_low))?;
        }

        if self.drop_high > 0 {
            write!(f, "{}", Mode::dh(self.drop_high))?;
        }

        match (self.explode, self.compound) {
            (true, true) => write!(f, "!!"),
            (true, false) => write!(f, "!"),
            _ => Ok(())
        }
    }
}


/// A builder for [`DiceTerm`] instances with a fluent API.
///
/// Start with [`DiceTerm::builder()`], chain the setters and finish with
/// [`DiceTermBuilder::build()`]. Building never fails: out of range values are clamped.
#[derive(Debug, Clone)]
pub struct DiceTermBuilder {
    sides: u32,
    count: u32,
    modes: Vec<Mode>,
    explode: bool,
    compound: bool
}

impl DiceTermBuilder {
    fn new(sides: u32) -> Self {
        Self {
            sides,
            count: 1,
            modes: Vec::new(),
            explode: false,
            compound: false
        }
    }

    /// Sets the number of dice to roll, clamped to [`MIN_COUNT`]`..=`[`MAX_COUNT`] on build.
    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Adds a keep or drop clause. Clauses apply in the order they were added,
    /// a later clause overwriting the count an earlier one set.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.modes.push(mode);
        self
    }

    /// Adds a clause dropping the `n` lowest dice.
    pub fn dl(self, n: u32) -> Self {
        self.mode(Mode::dl(n))
    }

    /// Adds a clause dropping the `n` highest dice.
    pub fn dh(self, n: u32) -> Self {
        self.mode(Mode::dh(n))
    }

    /// Adds a clause keeping the `n` highest dice.
    pub fn kh(self, n: u32) -> Self {
        self.mode(Mode::kh(n))
    }

    /// Adds a clause keeping the `n` lowest dice.
    pub fn kl(self, n: u32) -> Self {
        self.mode(Mode::kl(n))
    }

    /// Sets whether a maximum face draws again.
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    /// Sets whether exploding chains are summed into one die.
    pub fn compound(mut self, compound: bool) -> Self {
        self.compound = compound;
        self
    }

    /// Finalizes the configuration.
    ///
    /// The count is clamped to [`MIN_COUNT`]`..=`[`MAX_COUNT`] before keep clauses are
    /// translated, and a die size of zero becomes 1.
    ///
    /// # Examples
    /// ```
    /// use chatroll::DiceTerm;
    ///
    /// let term = DiceTerm::builder(0).count(500).kh(3).build();
    ///
    /// assert_eq!(term.count(), 20);
    /// assert_eq!(term.sides(), 1);
    /// assert_eq!(term.drop_low(), 17);
    /// ```
    pub fn build(self) -> DiceTerm {
        let count = self.count.clamp(MIN_COUNT, MAX_COUNT);
        let (drop_low, drop_high) = self.modes.iter()
            .fold((0, 0), |drops, mode| mode.apply(count, drops));

        DiceTerm {
            count,
            sides: self.sides.max(1),
            drop_low,
            drop_high,
            explode: self.explode,
            compound: self.compound
        }
    }
}


/// The dice of one rolled [`DiceTerm`], in roll order.
///
/// Its `Display` output is the term's trace: every die fragment joined by a space.
/// It dereferences to `Vec<Die>` for direct slice/vector operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollResult(Vec<Die>);

impl RollResult {
    /// Creates a new `RollResult` from already rolled dice.
    pub fn new(dice: Vec<Die>) -> Self {
        Self(dice)
    }

    /// Sums the combined value of every kept die.
    pub fn total(&self) -> u64 {
        self.iter()
            .flat_map(Die::kept)
            .sum()
    }
}

impl Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fragments: Vec<String> = self.iter().map(Die::to_string).collect();
        write!(f, "{}", fragments.join(" "))
    }
}

impl FromIterator<Die> for RollResult {
    fn from_iter<T: IntoIterator<Item = Die>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Deref for RollResult {
    type Target = Vec<Die>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}


fn discard(dice: &mut [Die], drop_low: u32, drop_high: u32) {
    let mut order: Vec<usize> = (0..dice.len()).collect();

    // stable sorts, equal values stay in roll order
    order.sort_by_key(|&i| dice[i].value());
    for &i in order.iter().take(drop_low as usize) {
        dice[i].discarded = true;
    }

    order.sort_by(|&a, &b| dice[b].value().cmp(&dice[a].value()));
    let highest: Vec<usize> = order.into_iter()
        .filter(|&i| !dice[i].discarded)
        .take(drop_high as usize)
        .collect();

    for i in highest {
        dice[i].discarded = true;
    }
}


/// A macro for conveniently creating [`DiceTerm`] instances.
///
/// # Syntax
/// - `dice!(SIDES)`: one die of `SIDES` faces (e.g., `dice!(6)` for 1d6).
/// - `dice!(SIDES, COUNT)`: `COUNT` dice of `SIDES` faces (e.g., `dice!(10, 3)` for 3d10).
/// - `dice!(SIDES, COUNT, MODE_FN, N)`: with a keep or drop clause.
///   `MODE_FN` must be one of `kh`, `kl`, `dh`, `dl`.
///   (e.g., `dice!(20, 4, kh, 1)` for 4d20kh1).
///
/// # Examples
/// ```
/// use chatroll::dice;
///
/// assert_eq!(dice!(6).to_string(), "1d6");
/// assert_eq!(dice!(10, 3).to_string(), "3d10");
/// assert_eq!(dice!(20, 4, kh, 1).to_string(), "4d20dl3");
/// assert_eq!(dice!(8, 3, dh, 2).to_string(), "3d8dh2");
/// ```
#[macro_export]
macro_rules! dice {
    ($sides:literal) => {
        $crate::DiceTerm::builder($sides)
            .build()
    };

    ($sides:literal, $count:literal) => {
        $crate::DiceTerm::builder($sides)
            .count($count)
            .build()
    };

    ($sides:literal, $count:literal, $mode:ident, $n:literal) => {
        $crate::DiceTerm::builder($sides)
            .count($count)
            .mode($crate::Mode::$mode($n))
            .build()
    }
}
