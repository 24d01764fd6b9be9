//! Seasonal buckets used to place observations on a monthly time axis

/// A meteorological season. Each covers three consecutive months and the
/// order of those months is the sub-index within the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    /// December, January, February
    Winter,
    /// March, April, May
    Spring,
    /// June, July, August
    Summer,
    /// September, October, November
    Autumn,
}

/// Number of time steps a season change moves the time cursor
pub const MONTHS_PER_SEASON: usize = 3;

impl Season {
    /// Map an observation season code (1-4) to a season
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Winter),
            2 => Some(Self::Spring),
            3 => Some(Self::Summer),
            4 => Some(Self::Autumn),
            _ => None,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::Winter => 1,
            Self::Spring => 2,
            Self::Summer => 3,
            Self::Autumn => 4,
        }
    }

    /// Calendar months of the season, in time-axis order
    pub const fn months(self) -> [u32; 3] {
        match self {
            Self::Winter => [12, 1, 2],
            Self::Spring => [3, 4, 5],
            Self::Summer => [6, 7, 8],
            Self::Autumn => [9, 10, 11],
        }
    }

    /// Position of `month` within the season, if it belongs to it
    pub fn month_offset(self, month: u32) -> Option<usize> {
        self.months().iter().position(|&m| m == month)
    }
}
