use chrono::NaiveDate;

/// Company age ranges in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBucket {
    UnderOne,
    OneToTwo,
    ThreeToFour,
    FiveToNine,
    TenToNineteen,
    TwentyPlus,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 6] = [
        AgeBucket::UnderOne,
        AgeBucket::OneToTwo,
        AgeBucket::ThreeToFour,
        AgeBucket::FiveToNine,
        AgeBucket::TenToNineteen,
        AgeBucket::TwentyPlus,
    ];

    pub fn for_age(years: u32) -> Self {
        match years {
            0 => AgeBucket::UnderOne,
            1..=2 => AgeBucket::OneToTwo,
            3..=4 => AgeBucket::ThreeToFour,
            5..=9 => AgeBucket::FiveToNine,
            10..=19 => AgeBucket::TenToNineteen,
            _ => AgeBucket::TwentyPlus,
        }
    }

    /// Inclusive lower and exclusive upper bound in years.
    pub fn bounds(&self) -> (u32, Option<u32>) {
        match self {
            AgeBucket::UnderOne => (0, Some(1)),
            AgeBucket::OneToTwo => (1, Some(3)),
            AgeBucket::ThreeToFour => (3, Some(5)),
            AgeBucket::FiveToNine => (5, Some(10)),
            AgeBucket::TenToNineteen => (10, Some(20)),
            AgeBucket::TwentyPlus => (20, None),
        }
    }

    pub fn contains(&self, years: u32) -> bool {
        let (lo, hi) = self.bounds();
        years >= lo && hi.is_none_or(|hi| years < hi)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::UnderOne => "< 1",
            AgeBucket::OneToTwo => "1-2",
            AgeBucket::ThreeToFour => "3-4",
            AgeBucket::FiveToNine => "5-9",
            AgeBucket::TenToNineteen => "10-19",
            AgeBucket::TwentyPlus => "20+",
        }
    }
}

/// Full years elapsed since incorporation. `None` for dates after `today`.
pub fn age_in_years(incorporated: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(incorporated)
}

/// Age as a fraction of years, for averaging.
pub fn age_in_fractional_years(incorporated: NaiveDate, today: NaiveDate) -> Option<f64> {
    let days = (today - incorporated).num_days();
    if days < 0 {
        None
    } else {
        Some(days as f64 / 365.25)
    }
}
