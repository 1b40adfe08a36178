use anyhow::{Result, anyhow, ensure};
use logos::Logos;
use std::{fmt, str};

/// A simulation-time tick.
///
/// Both logs express time as a plain integer tick counter. The manifest
/// additionally encodes the intended start tick with `.` group separators
/// (see [`Tick::parse_dotted`]); the trace uses bare integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u64);

impl Tick {
    pub const ZERO: Self = Tick(0);

    pub const fn new(tick: u64) -> Self {
        Self(tick)
    }

    #[inline]
    pub fn into_u64(self) -> u64 {
        self.0
    }

    /// the tick immediately after this one.
    ///
    /// The manifest records a flow's scheduled tick one unit before the
    /// tick at which the matching `Send` event is observed, so the
    /// correlator compares `scheduled.next()` against event times rather
    /// than subtracting one from an event time (which could underflow).
    #[must_use = "function does not modify the current value"]
    #[inline]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// elapsed ticks since `earlier`.
    ///
    /// Callers guarantee `earlier <= self`: trace timestamps are
    /// monotonic non-decreasing and a flow's completion is never observed
    /// before its start.
    pub fn since(self, earlier: Self) -> u64 {
        debug_assert!(earlier <= self);
        self.0 - earlier.0
    }

    /// parse a manifest start tick.
    ///
    /// ## Contract
    ///
    /// The field is a decimal integer whose digits may be grouped with `.`
    /// separators and prefixed with `+` (e.g. `1.000.000` parses as
    /// `1000000`, `+5` as `5`). Separators carry no meaning and are
    /// stripped before parsing. Any other character, or a field with no
    /// digits at all, is a fatal parse error.
    pub fn parse_dotted(s: &str) -> Result<Self> {
        let mut lex = Token::lexer(s);

        let mut digits = String::new();
        while let Some(next) = lex.next() {
            let Ok(Token::Digits) = next else {
                return Err(anyhow!("invalid character in start tick: {s}"));
            };
            digits.push_str(lex.slice());
        }
        ensure!(!digits.is_empty(), "empty start tick: {s}");

        Ok(Self(digits.parse()?))
    }
}

impl str::FromStr for Tick {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self).map_err(|error| anyhow!("{error}"))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[.+]")] // group separators, stripped before parsing
enum Token {
    #[regex("[0-9]+")]
    Digits,
}
