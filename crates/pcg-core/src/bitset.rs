//! Preference sets packed into a single machine word.
//!
//! Preference levels live in [1,31], so a set of them fits in one `u32`
//! with bit `i` standing for level `i`. Bit 0 is never used.

/// A set of preference levels in [1,31] backed by a single `u32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Preferences(u32);

impl Preferences {
    pub const MAX_LEVEL: u32 = 31;

    #[inline]
    pub fn empty() -> Self {
        Preferences(0)
    }

    /// The one-element set `{i}`. `i` must be in [1,31].
    #[inline]
    pub fn singleton(i: u32) -> Self {
        debug_assert!(i >= 1 && i <= Self::MAX_LEVEL);
        Preferences(1 << i)
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Preferences(self.0 | other.0)
    }

    #[inline]
    pub fn intersect(self, other: Self) -> Self {
        Preferences(self.0 & other.0)
    }

    #[inline]
    pub fn difference(self, other: Self) -> Self {
        Preferences(self.0 & !other.0)
    }

    #[inline]
    pub fn contains(self, i: u32) -> bool {
        i >= 1 && i <= Self::MAX_LEVEL && self.0 & (1 << i) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// The smallest level in the set, or `None` when empty.
    /// Lower levels are stronger preferences.
    #[inline]
    pub fn min(self) -> Option<u32> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros())
        }
    }

    /// Levels in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        let bits = self.0;
        (1..=Self::MAX_LEVEL).filter(move |i| bits & (1 << i) != 0)
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for i in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", i)?;
            first = false;
        }
        write!(f, "}}")
    }
}

impl std::fmt::Display for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
