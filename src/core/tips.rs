//! Energy-saving suggestions, ordered by where a footprint comes from.

use crate::core::scoring::FootprintBreakdown;
use serde::Serialize;

/// Suggestion group matching one footprint category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TipCategory {
    /// Transport emissions
    Transportation,
    /// Electricity emissions
    Home,
    /// Diet emissions
    Diet,
    /// Waste emissions
    Waste,
}

impl TipCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [Self::Transportation, Self::Home, Self::Diet, Self::Waste];

    /// Heading shown above the tips.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Transportation => "Transportation",
            Self::Home => "Home Energy",
            Self::Diet => "Diet",
            Self::Waste => "Waste",
        }
    }

    /// The static suggestions for this category.
    #[must_use]
    pub const fn tips(self) -> &'static [&'static str] {
        match self {
            Self::Transportation => &[
                "Use public transportation when possible",
                "Consider carpooling for regular commutes",
                "Maintain proper tire pressure to improve fuel efficiency",
                "Combine errands to reduce total travel distance",
                "Consider switching to an electric or hybrid vehicle",
            ],
            Self::Home => &[
                "Switch to LED light bulbs",
                "Unplug electronics when not in use",
                "Use a programmable thermostat",
                "Wash clothes in cold water",
                "Air dry clothes instead of using a dryer",
            ],
            Self::Diet => &[
                "Reduce meat consumption, especially red meat",
                "Buy local and seasonal produce",
                "Grow your own herbs and vegetables",
                "Plan meals to reduce food waste",
                "Compost food scraps",
            ],
            Self::Waste => &[
                "Recycle paper, plastic, glass, and metal",
                "Use reusable shopping bags",
                "Avoid single-use plastics",
                "Repair items instead of replacing them",
                "Donate or sell unwanted items instead of throwing them away",
            ],
        }
    }

    const fn emission(self, breakdown: &FootprintBreakdown) -> f64 {
        match self {
            Self::Transportation => breakdown.transport,
            Self::Home => breakdown.electricity,
            Self::Diet => breakdown.diet,
            Self::Waste => breakdown.waste,
        }
    }
}

/// Tip categories ordered by emission share, largest first.
///
/// Categories with equal emissions keep their display order.
#[must_use]
pub fn tips_for(breakdown: &FootprintBreakdown) -> Vec<TipCategory> {
    let mut categories = TipCategory::ALL.to_vec();
    categories.sort_by(|a, b| b.emission(breakdown).total_cmp(&a.emission(breakdown)));
    categories
}
