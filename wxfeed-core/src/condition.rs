//! Normalization of provider condition ids into the shared icon code set.
//!
//! OpenWeatherMap and Weatherbit both use the same numeric families
//! (2xx thunderstorm, 3xx drizzle, 5xx rain, 6xx snow, 7xx atmosphere,
//! 80x clouds, 90x extreme), so one table serves both.

/// Code reported when a condition id has no icon.
pub const UNKNOWN_CONDITION: i32 = -1;

/// Map a provider condition id to an icon code, or [`UNKNOWN_CONDITION`].
///
/// The icon hint is accepted for providers that send one but does not
/// change the result.
pub fn map_condition_icon_to_code(_icon: &str, condition_id: i32) -> i32 {
    match condition_id {
        // thunderstorm
        202 | 232 | 211 => 4,
        212 => 3,
        221 | 231 | 201 => 38,
        230 | 200 | 210 => 37,

        // drizzle
        300 | 301 | 302 | 310 | 311 | 312 | 313 | 314 | 321 => 9,

        // rain
        500 | 501 | 520 | 521 | 531 => 11,
        502 | 503 | 504 | 522 => 12,
        511 => 10,

        // snow
        600 | 620 => 14,
        601 | 621 => 16,
        602 | 622 => 41,
        611 | 612 => 18,
        615 | 616 => 5,

        // atmosphere
        741 => 20,
        711 | 762 => 22,
        701 | 721 => 21,
        731 | 751 | 761 => 19,
        771 => 23,
        781 => 0,

        // clouds
        800 => 32,
        801 => 34,
        802 => 28,
        803 | 804 => 30,

        // extreme
        900 => 0,
        901 => 1,
        902 => 2,
        903 => 25,
        904 => 36,
        905 => 24,
        906 => 17,

        _ => UNKNOWN_CONDITION,
    }
}
