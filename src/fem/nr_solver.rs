use super::{ControlConvergence, LinearSystem};
use crate::base::Config;
use crate::StrError;
use russell_lab::Vector;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Holds the status of the nonlinear solver as a set of flags
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NmStatus(u8);

impl NmStatus {
    /// The iterations have converged
    pub const SUCCESS: NmStatus = NmStatus(1);

    /// The iterations have failed
    pub const NO_SUCCESS: NmStatus = NmStatus(2);

    /// NaN or Inf values have been found
    pub const DIVERGENCE: NmStatus = NmStatus(4);

    /// The maximum number of iterations has been reached
    pub const ITERATION_CAP: NmStatus = NmStatus(8);

    /// Returns true if all flags in `other` are set
    pub fn contains(self, other: NmStatus) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NmStatus {
    type Output = NmStatus;
    fn bitor(self, rhs: NmStatus) -> NmStatus {
        NmStatus(self.0 | rhs.0)
    }
}

impl BitOrAssign for NmStatus {
    fn bitor_assign(&mut self, rhs: NmStatus) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for NmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (NmStatus::SUCCESS, "SUCCESS"),
            (NmStatus::NO_SUCCESS, "NO_SUCCESS"),
            (NmStatus::DIVERGENCE, "DIVERGENCE"),
            (NmStatus::ITERATION_CAP, "ITERATION_CAP"),
        ];
        let set: Vec<_> = names.iter().filter(|(s, _)| self.contains(*s)).map(|(_, n)| *n).collect();
        write!(f, "{}", set.join(" | "))
    }
}

/// Defines a nonlinear problem R(U) = 0 solved by the Newton-Raphson method
pub trait NonlinearProblem {
    /// Returns the flags indicating the prescribed equations
    fn prescribed(&self) -> &[bool];

    /// Computes the residual vector R = F_int(U) - F_ext
    ///
    /// The entries of prescribed equations must be zero.
    fn update_residual(&mut self, uu: &Vector, rr: &mut Vector) -> Result<(), StrError>;

    /// Assembles the tangent matrix K = dR/dU (including ones on the prescribed diagonal)
    ///
    /// The residual is always updated before the tangent at the same U. The global matrix
    /// has been reset beforehand.
    fn update_tangent(&mut self, uu: &Vector, lin_sys: &mut LinearSystem) -> Result<(), StrError>;
}

/// Implements the Newton-Raphson solver
///
/// ```text
/// K(Uᵢ) mdu = R(Uᵢ)
/// Uᵢ₊₁ = Uᵢ - mdu
/// ```
pub struct NrSolver<'a> {
    /// Holds the configuration parameters
    config: &'a Config,

    /// Holds the convergence control
    pub control: ControlConvergence<'a>,
}

impl<'a> NrSolver<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config, n_equation: usize) -> Self {
        NrSolver {
            config,
            control: ControlConvergence::new(config, n_equation),
        }
    }

    /// Solves the nonlinear problem
    ///
    /// On input `uu` holds the initial guess (with the prescribed values already set).
    /// Errors from the problem itself are propagated; numerical failures are reported
    /// by a status without [NmStatus::SUCCESS].
    pub fn solve<P: NonlinearProblem>(
        &mut self,
        problem: &mut P,
        uu: &mut Vector,
        lin_sys: &mut LinearSystem,
    ) -> Result<NmStatus, StrError> {
        self.control.reset();
        let neq = lin_sys.n_equation;
        for iteration in 0..self.config.n_max_iterations {
            // residual
            problem.update_residual(uu, &mut lin_sys.rr)?;
            if self.control.analyze_rr(iteration, &lin_sys.rr).is_err() {
                self.control.print_iteration();
                return Ok(NmStatus::NO_SUCCESS | NmStatus::DIVERGENCE);
            }
            if self.control.converged() {
                self.control.print_iteration();
                return Ok(NmStatus::SUCCESS);
            }

            // tangent
            lin_sys.zero()?;
            problem.update_tangent(uu, lin_sys)?;

            // solve the linear system
            if let Err(message) = lin_sys.solve(self.config.verbose_lin_sys_solve) {
                if self.config.verbose_iterations {
                    println!("ERROR: {}", message);
                }
                return Ok(NmStatus::NO_SUCCESS);
            }

            // update U (prescribed values are kept)
            let prescribed = problem.prescribed();
            for i in 0..neq {
                if !prescribed[i] {
                    uu[i] -= lin_sys.mdu[i];
                }
            }

            // check the correction
            if self.control.analyze_mdu(iteration, &lin_sys.mdu).is_err() {
                self.control.print_iteration();
                return Ok(NmStatus::NO_SUCCESS | NmStatus::DIVERGENCE);
            }
            self.control.print_iteration();
            if self.control.converged_on_rel_mdu() {
                return Ok(NmStatus::SUCCESS);
            }
        }
        Ok(NmStatus::NO_SUCCESS | NmStatus::ITERATION_CAP)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
