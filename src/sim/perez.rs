//! Perez (1990) decomposition of the diffuse irradiance.
//!
//! Splits the diffuse horizontal irradiance into an isotropic part, a
//! circumsolar part and a horizon-band part using the all-sites composite
//! brightening coefficients. References: Perez et al. (1990), "Modeling
//! daylight availability and irradiance components from direct and global
//! irradiance", Solar Energy 44(5); Kasten and Young (1989) for the air mass.

use crate::pvarray::sun::{DiffuseComponents, SunState};

/// Upper bounds of the sky clearness bins (the last bin is open).
const CLEARNESS_BINS: [f64; 7] = [1.065, 1.23, 1.5, 1.95, 2.8, 4.5, 6.2];

/// Circumsolar brightening coefficients `F11, F12, F13` per clearness bin.
const F1_COEFFS: [[f64; 3]; 8] = [
    [-0.0080, 0.5880, -0.0620],
    [0.1300, 0.6830, -0.1510],
    [0.3300, 0.4870, -0.2210],
    [0.5680, 0.1870, -0.2950],
    [0.8730, -0.3920, -0.3620],
    [1.1320, -1.2370, -0.4120],
    [1.0600, -1.6000, -0.3590],
    [0.6780, -0.3270, -0.2500],
];

/// Horizon brightening coefficients `F21, F22, F23` per clearness bin.
const F2_COEFFS: [[f64; 3]; 8] = [
    [-0.0600, 0.0720, -0.0220],
    [-0.0190, 0.0660, -0.0290],
    [0.0550, -0.0640, -0.0260],
    [0.1090, -0.1520, -0.0140],
    [0.2260, -0.4620, 0.0010],
    [0.2880, -0.8230, 0.0560],
    [0.2640, -1.1270, 0.1310],
    [0.1560, -1.3770, 0.2510],
];

/// Zenith-angle weighting in the clearness formula [rad^-3].
const KAPPA: f64 = 1.041;

/// Relative optical air mass (Kasten and Young, 1989). `zenith` in degrees.
pub fn relative_airmass(zenith: f64) -> f64 {
    1.0 / (zenith.to_radians().cos() + 0.50572 * (96.07995 - zenith).powf(-1.6364))
}

/// Sky clearness `epsilon`. Requires `dhi > 0`.
pub fn sky_clearness(dhi: f64, dni: f64, zenith: f64) -> f64 {
    let z3 = KAPPA * zenith.to_radians().powi(3);
    ((dhi + dni) / dhi + z3) / (1.0 + z3)
}

/// Sky brightness `delta`.
pub fn sky_brightness(dhi: f64, airmass: f64, dni_extra: f64) -> f64 {
    dhi * airmass / dni_extra
}

/// Index of the clearness bin of `epsilon`, in `0..8`.
pub fn clearness_bin(epsilon: f64) -> usize {
    CLEARNESS_BINS
        .iter()
        .position(|&upper| epsilon <= upper)
        .unwrap_or(CLEARNESS_BINS.len())
}

/// Circumsolar and horizon brightening coefficients `(F1, F2)`.
///
/// Both are clipped at zero (Perez et al., 1990, clip `F1` only).
pub fn brightening_coefficients(epsilon: f64, delta: f64, zenith: f64) -> (f64, f64) {
    let bin = clearness_bin(epsilon);
    let z = zenith.to_radians();
    let [f11, f12, f13] = F1_COEFFS[bin];
    let [f21, f22, f23] = F2_COEFFS[bin];
    let f1 = (f11 + f12 * delta + f13 * z).max(0.0);
    let f2 = (f21 + f22 * delta + f23 * z).max(0.0);
    (f1, f2)
}

/// Circumsolar and horizon intensities of a timestep [W/m²].
///
/// Zero when the sun is down or there is no diffuse light. The circumsolar
/// part never exceeds `dhi`.
pub fn decompose(sun: &SunState, dni_extra: f64) -> DiffuseComponents {
    if !sun.is_up() || sun.dhi <= 0.0 {
        return DiffuseComponents::default();
    }
    let epsilon = sky_clearness(sun.dhi, sun.dni, sun.zenith);
    let delta = sky_brightness(sun.dhi, relative_airmass(sun.zenith), dni_extra);
    let (f1, f2) = brightening_coefficients(epsilon, delta, sun.zenith);
    DiffuseComponents {
        circumsolar: sun.dhi * f1.min(1.0),
        horizon: sun.dhi * f2,
    }
}
