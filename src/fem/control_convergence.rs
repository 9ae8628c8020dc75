use crate::base::Config;
use crate::StrError;
use russell_lab::{vec_copy, vec_max_scaled, vec_norm, Norm, Vector};

/// Controls the convergence of the Newton iterations
///
/// The iterations converge when either:
///
/// 1. the max-norm of the residual vector (`norm_rr`) is below `tol_rr_abs`, or
/// 2. the relative correction (`rel_mdu`) is below `tol_mdu_rel` after the first iteration
///
/// The relative correction is scaled by the correction of the first iteration:
///
/// ```text
///                 /    |mduᵢ|    \
/// rel_mdu = max_i | ──────────── |
///                 \ 1 + |mdu0ᵢ| /
/// ```
pub struct ControlConvergence<'a> {
    config: &'a Config,
    iteration: usize,
    norm_rr_prev: f64,
    norm_rr: f64,
    mdu0: Vector,
    norm_mdu: f64,
    rel_mdu_prev: f64,
    rel_mdu: f64,
    converged_on_norm_rr: bool,
    diverging_on_norm_rr: bool,
    converged_on_rel_mdu: bool,
    diverging_on_rel_mdu: bool,
}

impl<'a> ControlConvergence<'a> {
    /// Allocates a new instance
    ///
    /// * `config` -- configuration parameters including the tolerances
    /// * `n_equation` -- total number of equations
    pub fn new(config: &'a Config, n_equation: usize) -> Self {
        ControlConvergence {
            config,
            iteration: 0,
            norm_rr_prev: 0.0,
            norm_rr: 0.0,
            mdu0: Vector::new(n_equation),
            norm_mdu: 0.0,
            rel_mdu_prev: 0.0,
            rel_mdu: 0.0,
            converged_on_norm_rr: false,
            diverging_on_norm_rr: false,
            converged_on_rel_mdu: false,
            diverging_on_rel_mdu: false,
        }
    }

    /// Resets the flags for a new solution (time step)
    pub fn reset(&mut self) {
        self.iteration = 0;
        self.converged_on_norm_rr = false;
        self.diverging_on_norm_rr = false;
        self.converged_on_rel_mdu = false;
        self.diverging_on_rel_mdu = false;
    }

    /// Returns true if any criterion has been satisfied
    pub fn converged(&self) -> bool {
        self.converged_on_norm_rr || self.converged_on_rel_mdu
    }

    /// Returns true if the relative correction criterion has been satisfied
    pub fn converged_on_rel_mdu(&self) -> bool {
        self.converged_on_rel_mdu
    }

    /// Returns the max-norm of the last residual vector
    pub fn norm_rr(&self) -> f64 {
        self.norm_rr
    }

    /// Analyzes the residual vector
    ///
    /// Returns an error if NaN or Inf values are found.
    pub(crate) fn analyze_rr(&mut self, iteration: usize, rr: &Vector) -> Result<(), StrError> {
        self.iteration = iteration;
        self.norm_rr = vec_norm(rr, Norm::Max);
        let found_nan_or_inf = !self.norm_rr.is_finite();

        self.converged_on_norm_rr = if found_nan_or_inf {
            false
        } else {
            self.norm_rr <= self.config.tol_rr_abs
        };

        self.diverging_on_norm_rr = if found_nan_or_inf || iteration == 0 {
            false
        } else {
            self.norm_rr > self.norm_rr_prev
        };

        self.norm_rr_prev = self.norm_rr;
        if found_nan_or_inf {
            Err("Found NaN or Inf")
        } else {
            Ok(())
        }
    }

    /// Analyzes the correction vector (the solution of K mdu = R)
    ///
    /// Returns an error if NaN or Inf values are found.
    pub(crate) fn analyze_mdu(&mut self, iteration: usize, mdu: &Vector) -> Result<(), StrError> {
        self.norm_mdu = vec_norm(mdu, Norm::Max);
        let found_nan_or_inf = !self.norm_mdu.is_finite();

        if iteration == 0 {
            vec_copy(&mut self.mdu0, mdu)?;
            self.rel_mdu = 1.0;
        }

        self.converged_on_rel_mdu = if found_nan_or_inf || iteration == 0 {
            false
        } else {
            self.rel_mdu = vec_max_scaled(mdu, &self.mdu0);
            self.rel_mdu <= self.config.tol_mdu_rel
        };

        self.diverging_on_rel_mdu = if found_nan_or_inf || iteration < 2 {
            false
        } else {
            self.rel_mdu > self.rel_mdu_prev
        };

        self.rel_mdu_prev = self.rel_mdu;
        if found_nan_or_inf {
            Err("Found NaN or Inf in mdu")
        } else {
            Ok(())
        }
    }

    /// Prints the header before the time stepping
    pub fn print_header(&self) {
        if self.config.verbose_timesteps || self.config.verbose_iterations {
            println!("\nFMSIM === TIME STEPPING AND CONVERGENCE STATISTICS ============================");
            println!("\nLegend:");
            println!("➖ ─ unknown");
            println!("✅ ─ converged");
            println!("🔹 ─ converging");
            println!("🎈 ─ diverging");
            println!("\"iter\" means iteration\n");
            println!("{}", "─".repeat(79));
            println!(
                "{:8} {:>11} {:>11} {:>5} {:>9} {:>9} ➖ {:>9} ➖",
                "timestep", "t", "Δt", "iter", "‖mdu‖∞", "rel(mdu)", "‖R‖∞"
            );
            println!("{}", "─".repeat(79));
        }
    }

    /// Prints the time step information
    pub fn print_timestep(&self, number: i64, t: f64, dt: f64) {
        if self.config.verbose_timesteps {
            println!("{:>8} {:>11.6e} {:>11.6e}", number, t, dt);
        }
    }

    /// Prints the iteration information
    pub(crate) fn print_iteration(&self) {
        if self.config.verbose_iterations {
            let it = self.iteration;
            let icon_rr = if self.converged_on_norm_rr {
                "✅"
            } else if self.diverging_on_norm_rr {
                "🎈"
            } else {
                "🔹"
            };
            if it == 0 {
                println!(
                    "{:>8} {:>11} {:>11} {:>5} {:>9.2e} {:>9} ➖ {:>9.2e} {}",
                    "·", "·", "·", it, self.norm_mdu, "·", self.norm_rr, icon_rr
                );
            } else {
                let icon_mdu = if self.converged_on_rel_mdu {
                    "✅"
                } else if self.diverging_on_rel_mdu {
                    "🎈"
                } else {
                    "🔹"
                };
                println!(
                    "{:>8} {:>11} {:>11} {:>5} {:>9.2e} {:>9.2e} {} {:>9.2e} {}",
                    "·", "·", "·", it, self.norm_mdu, self.rel_mdu, icon_mdu, self.norm_rr, icon_rr
                );
            }
        }
    }

    /// Prints the horizontal line at the end of the analysis
    pub fn print_footer(&self) {
        if self.config.verbose_timesteps || self.config.verbose_iterations {
            println!("{}", "─".repeat(79));
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ControlConvergence;
    use crate::base::Config;
    use russell_lab::{approx_eq, Vector};

    #[test]
    fn analyze_rr_works() {
        let mut config = Config::new();
        config.tol_rr_abs = 1e-6;
        let mut control = ControlConvergence::new(&config, 2);
        control.analyze_rr(0, &Vector::from(&[1.0, -2.0])).unwrap();
        assert_eq!(control.norm_rr(), 2.0);
        assert!(!control.converged());
        control.analyze_rr(1, &Vector::from(&[3.0, 0.0])).unwrap();
        assert!(control.diverging_on_norm_rr);
        control.analyze_rr(2, &Vector::from(&[1e-7, 0.0])).unwrap();
        assert!(control.converged());
        assert!(!control.diverging_on_norm_rr);
        control.reset();
        assert!(!control.converged());
    }

    #[test]
    fn analyze_rr_captures_nan() {
        let config = Config::new();
        let mut control = ControlConvergence::new(&config, 2);
        assert_eq!(
            control.analyze_rr(0, &Vector::from(&[f64::NAN, 0.0])).err(),
            Some("Found NaN or Inf")
        );
        assert_eq!(
            control.analyze_rr(0, &Vector::from(&[f64::INFINITY, 0.0])).err(),
            Some("Found NaN or Inf")
        );
        assert!(!control.converged());
    }

    #[test]
    fn analyze_mdu_works() {
        let mut config = Config::new();
        config.tol_mdu_rel = 1e-3;
        let mut control = ControlConvergence::new(&config, 2);

        // the first correction never converges
        control.analyze_mdu(0, &Vector::from(&[1e-9, 0.0])).unwrap();
        assert!(!control.converged_on_rel_mdu());
        assert_eq!(control.rel_mdu, 1.0);

        // scaled by the first correction
        control.analyze_mdu(1, &Vector::from(&[0.01, 0.0])).unwrap();
        approx_eq(control.rel_mdu, 0.01 / (1.0 + 1e-9), 1e-15);
        assert!(!control.converged_on_rel_mdu());
        control.analyze_mdu(2, &Vector::from(&[0.02, 0.0])).unwrap();
        assert!(control.diverging_on_rel_mdu);
        control.analyze_mdu(3, &Vector::from(&[1e-4, 0.0])).unwrap();
        assert!(control.converged_on_rel_mdu());
        assert!(control.converged());

        assert_eq!(
            control.analyze_mdu(4, &Vector::from(&[f64::NAN, 0.0])).err(),
            Some("Found NaN or Inf in mdu")
        );
    }
}
