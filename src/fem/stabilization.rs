use russell_lab::Matrix;
use serde::{Deserialize, Serialize};

/// Holds the SUPG/PSPG/LSIC stabilization coefficients of an element
///
/// The coefficients follow Tezduyar's element-level definitions:
///
/// ```text
///            2 |u|                   h_ugn         Δt          h²
/// h_ugn = ────────────      t1 = ───────    t2 = ──    t3 = ───
///         Σ |u · ∇Nᵢ|               2 |u|         2           4 ν
///
/// t_supg = t_pspg = (t1⁻² + t2⁻² + t3⁻²)^(-1/2)
///
///       |u| h_ugn          ⎧ Re/3  if Re ≤ 3               h_ugn |u| z
/// Re = ─────────      z = ⎨                      t_lsic = ───────────
///          2 ν             ⎩ 1     otherwise                     2
/// ```
///
/// A zero velocity drops `t1` and makes `t_lsic` zero; `t2` is only present in transient analyses.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Stabilization {
    /// SUPG coefficient (momentum balance)
    pub t_supg: f64,

    /// PSPG coefficient (continuity)
    pub t_pspg: f64,

    /// LSIC coefficient (least-squares on incompressibility)
    pub t_lsic: f64,
}

impl Stabilization {
    /// Returns zero coefficients
    pub fn new() -> Self {
        Stabilization {
            t_supg: 0.0,
            t_pspg: 0.0,
            t_lsic: 0.0,
        }
    }

    /// Computes the coefficients
    ///
    /// * `h` -- element size
    /// * `gradient` -- gradients of the shape functions (nnode × 2)
    /// * `velocity` -- representative element velocity
    /// * `nu` -- kinematic viscosity
    /// * `dt` -- time step size (transient analyses only)
    pub fn tezduyar(h: f64, gradient: &Matrix, velocity: &[f64; 2], nu: f64, dt: Option<f64>) -> Self {
        let norm_u = f64::sqrt(velocity[0] * velocity[0] + velocity[1] * velocity[1]);
        let mut sum = 0.0;
        if norm_u > 0.0 {
            let (nnode, _) = gradient.dims();
            for i in 0..nnode {
                sum += f64::abs(velocity[0] * gradient.get(i, 0) + velocity[1] * gradient.get(i, 1));
            }
        }
        let mut inv_sq = 0.0;
        let mut t_lsic = 0.0;
        if sum > 0.0 {
            let h_ugn = 2.0 * norm_u / sum;
            let t1 = h_ugn / (2.0 * norm_u);
            inv_sq += 1.0 / (t1 * t1);
            let re = norm_u * h_ugn / (2.0 * nu);
            let z = if re <= 3.0 { re / 3.0 } else { 1.0 };
            t_lsic = h_ugn * norm_u * z / 2.0;
        }
        if let Some(dt) = dt {
            let t2 = dt / 2.0;
            inv_sq += 1.0 / (t2 * t2);
        }
        let t3 = h * h / (4.0 * nu);
        inv_sq += 1.0 / (t3 * t3);
        let tau = 1.0 / f64::sqrt(inv_sq);
        Stabilization {
            t_supg: tau,
            t_pspg: tau,
            t_lsic,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
