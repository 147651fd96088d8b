/// Supply zone registry for the daily water quality page.
///
/// Defines the zones the daily page can be queried for. Each zone is fed by
/// a different treatment plant, so its daily pH/alkalinity differ; the
/// monthly laboratory summary covers the city as a whole. This is the
/// single source of truth for zone codes; the CLI validates against it.

// ---------------------------------------------------------------------------
// Zone metadata
// ---------------------------------------------------------------------------

/// A supply zone selectable on the daily page.
pub struct Zone {
    /// Code used in the daily page's `zone` query parameter.
    pub code: &'static str,
    /// Treatment plant serving the zone.
    pub name: &'static str,
}

/// All zones published on the daily page. The first entry is the default.
pub static ZONE_REGISTRY: &[Zone] = &[
    Zone {
        code: "ELS",
        name: "E.L. Smith Water Treatment Plant",
    },
    Zone {
        code: "Rossdale",
        name: "Rossdale Water Treatment Plant",
    },
];

pub fn default_zone() -> &'static Zone {
    &ZONE_REGISTRY[0]
}

/// Looks up a zone by code, ignoring case. Returns `None` if not found.
pub fn find_zone(code: &str) -> Option<&'static Zone> {
    ZONE_REGISTRY
        .iter()
        .find(|z| z.code.eq_ignore_ascii_case(code.trim()))
}

pub fn all_zone_codes() -> Vec<&'static str> {
    ZONE_REGISTRY.iter().map(|z| z.code).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
