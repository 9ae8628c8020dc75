use serde::{Deserialize, Serialize};

/// Holds one solution increment
///
/// Only the solution-state counter may change after creation.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct TimeStep {
    /// Sequence number
    pub number: i64,

    /// Target time
    pub time: f64,

    /// Time increment
    pub dt: f64,

    /// Solution-state counter
    pub solution_counter: usize,
}

impl TimeStep {
    /// Allocates a new instance
    pub fn new(number: i64, time: f64, dt: f64, solution_counter: usize) -> Self {
        TimeStep {
            number,
            time,
            dt,
            solution_counter,
        }
    }

    /// Returns the step following this one with the given time increment
    pub fn next(&self, dt: f64) -> Self {
        TimeStep {
            number: self.number + 1,
            time: self.time + dt,
            dt,
            solution_counter: self.solution_counter + 1,
        }
    }

    /// Increments the solution-state counter (e.g., after each nonlinear iteration)
    pub fn increment_counter(&mut self) {
        self.solution_counter += 1;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::TimeStep;

    #[test]
    fn next_works() {
        let mut step = TimeStep::new(1, 0.0, 0.5, 1);
        let next = step.next(0.5);
        assert_eq!(next, TimeStep::new(2, 0.5, 0.5, 2));
        step.increment_counter();
        assert_eq!(step.solution_counter, 2);
        assert_eq!(step.number, 1);
    }
}
