use crate::base::{Equations, Essential};
use crate::{FnTime, StrError};
use russell_lab::Vector;

/// Holds a collection of prescribed (primary) values
pub struct PrescribedValues {
    /// Holds the equation numbers and functions of time of all prescribed values
    pub all: Vec<(usize, FnTime)>,

    /// An array indicating which DOFs (equations) are prescribed
    ///
    /// The length of `flags` is equal to `n_equation`, the total number of DOFs (total number of equations).
    pub flags: Vec<bool>,

    /// Array with only the DOFs numbers of the prescribed equations (sorted)
    pub equations: Vec<usize>,
}

impl PrescribedValues {
    /// Allocates new instance
    pub fn new(equations: &Equations, essential: &Essential) -> Result<Self, StrError> {
        let mut all = Vec::new();
        let mut flags = vec![false; equations.n_equation];
        for ((point_id, dof), f) in &essential.all {
            let eq = equations.eq(*point_id, *dof)?;
            all.push((eq, *f));
            flags[eq] = true;
        }
        all.sort_by_key(|(eq, _)| *eq);
        let equations = all.iter().map(|(eq, _)| *eq).collect();
        Ok(PrescribedValues { all, flags, equations })
    }

    /// Sets all prescribed values in the solution vector
    #[inline]
    pub fn apply(&self, uu: &mut Vector, time: f64) {
        self.all.iter().for_each(|(eq, f)| uu[*eq] = f(time));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
