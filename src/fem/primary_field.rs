use crate::base::TimeStep;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};

/// Holds the global vector of unknowns (velocities and pressures) at three instants
///
/// * `solution` -- working solution of the current step
/// * `committed` -- converged solution of the last completed step
/// * `previous` -- converged solution of the step before the current one
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrimaryField {
    /// Holds the working solution
    pub solution: Vector,

    /// Holds the last converged solution
    pub committed: Vector,

    /// Holds the solution at the previous step (used by the transient terms)
    pub previous: Vector,

    /// Holds the number of the step the field was last advanced to
    pub step_number: i64,
}

impl PrimaryField {
    /// Allocates a new (zero) field
    pub fn new(n_equation: usize) -> Self {
        PrimaryField {
            solution: Vector::new(n_equation),
            committed: Vector::new(n_equation),
            previous: Vector::new(n_equation),
            step_number: 0,
        }
    }

    /// Returns the number of equations
    pub fn dim(&self) -> usize {
        self.solution.dim()
    }

    /// Advances the field to a new step
    ///
    /// The committed solution becomes the previous solution.
    pub fn advance(&mut self, step: &TimeStep) {
        for i in 0..self.committed.dim() {
            self.previous[i] = self.committed[i];
        }
        self.step_number = step.number;
    }

    /// Commits the working solution
    pub fn commit(&mut self) {
        for i in 0..self.solution.dim() {
            self.committed[i] = self.solution[i];
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
