use super::Dof;
use crate::FnTime;
use std::collections::HashMap;
use std::fmt;

/// Holds essential boundary conditions (prescribed velocities, pressures, or displacements)
pub struct Essential {
    pub all: HashMap<(usize, Dof), FnTime>,
}

impl Essential {
    /// Allocates a new instance
    pub fn new() -> Self {
        Essential { all: HashMap::new() }
    }

    /// Sets essential boundary condition at points
    pub fn at(&mut self, points: &[usize], dof: Dof, f: FnTime) -> &mut Self {
        for point_id in points {
            self.all.insert((*point_id, dof), f);
        }
        self
    }

    /// Returns the prescribed value at (point, DOF) and time t, if any
    pub fn value(&self, point_id: usize, dof: Dof, t: f64) -> Option<f64> {
        self.all.get(&(point_id, dof)).map(|f| f(t))
    }
}

impl fmt::Display for Essential {
    /// Prints a formatted summary of Boundary Conditions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Essential boundary conditions\n").unwrap();
        write!(f, "=============================\n").unwrap();
        let mut pairs: Vec<_> = self.all.iter().collect();
        pairs.sort_by_key(|(key, _)| **key);
        for (key, func) in pairs {
            write!(f, "{:?} : {:?}(0) = {:?}, {:?}(1) = {:?}\n", key.0, key.1, func(0.0), key.1, func(1.0)).unwrap();
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Essential;
    use crate::base::Dof;

    #[test]
    fn essential_works() {
        let mut essential = Essential::new();
        essential
            .at(&[0, 1], Dof::Vx, |_| 0.0)
            .at(&[1], Dof::Vy, |t| t)
            .at(&[2], Dof::Pl, |t| t / 2.0);
        assert_eq!(essential.value(1, Dof::Vy, 3.0), Some(3.0));
        assert_eq!(essential.value(2, Dof::Vy, 3.0), None);
        assert_eq!(
            format!("{}", essential),
            "Essential boundary conditions\n\
             =============================\n\
             0 : Vx(0) = 0.0, Vx(1) = 0.0\n\
             1 : Vx(0) = 0.0, Vx(1) = 0.0\n\
             1 : Vy(0) = 0.0, Vy(1) = 1.0\n\
             2 : Pl(0) = 0.0, Pl(1) = 0.5\n"
        );
    }
}
