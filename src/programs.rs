//! Static program catalog.
//!
//! The admission programs on offer change once a year at most, so they live
//! as an inline literal catalog rather than a database table. Both the HTML
//! `/programs` page and the JSON `/api/programs` endpoint read from here.

use serde::Serialize;
use utoipa::ToSchema;

/// Program
///
/// One admission program as shown on the public programs page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Program {
    /// Stable identifier referenced by applications.
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub duration_years: u8,
    /// Seats available in the upcoming intake.
    pub intake: u16,
}

pub const CATALOG: [Program; 4] = [
    Program {
        slug: "general",
        name: "General Studies",
        description: "Broad foundation across humanities, sciences and arts for students still exploring their direction.",
        duration_years: 4,
        intake: 120,
    },
    Program {
        slug: "stem",
        name: "STEM Track",
        description: "Accelerated mathematics, physics and computing with laboratory work from the first year.",
        duration_years: 4,
        intake: 60,
    },
    Program {
        slug: "arts",
        name: "Creative Arts",
        description: "Studio practice in visual arts, music and drama alongside the core curriculum.",
        duration_years: 4,
        intake: 40,
    },
    Program {
        slug: "ib",
        name: "International Baccalaureate",
        description: "The IB Diploma Programme for the final two years, taught in English.",
        duration_years: 2,
        intake: 50,
    },
];

/// Looks up a program by its slug. Used to validate application submissions.
pub fn find(slug: &str) -> Option<&'static Program> {
    CATALOG.iter().find(|program| program.slug == slug)
}
