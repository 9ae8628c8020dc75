use crate::StrError;
use std::fmt;

/// Holds configuration parameters for the time stepping and the nonlinear iterations
pub struct Config {
    /// Initial time
    pub t_ini: f64,

    /// Final time
    pub t_fin: f64,

    /// Time increment Δt
    pub dt: f64,

    /// Maximum number of time steps
    pub n_max_time_steps: usize,

    /// Maximum number of Newton iterations per time step
    pub n_max_iterations: usize,

    /// Absolute tolerance for the (max) norm of the residual vector
    pub tol_rr_abs: f64,

    /// Relative tolerance for the (scaled) norm of the corrective increment
    pub tol_mdu_rel: f64,

    /// Includes the advection terms (Navier-Stokes); otherwise Stokes flow
    pub advection: bool,

    /// Includes the acceleration terms (backward Euler); otherwise steady flow
    pub transient: bool,

    /// Thickness of 2D elements
    pub thickness: f64,

    /// Shows the time steps
    pub verbose_timesteps: bool,

    /// Shows the Newton iterations
    pub verbose_iterations: bool,

    /// Shows the linear solver messages
    pub verbose_lin_sys_solve: bool,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            t_ini: 0.0,
            t_fin: 1.0,
            dt: 1.0,
            n_max_time_steps: 1000,
            n_max_iterations: 20,
            tol_rr_abs: 1e-10,
            tol_mdu_rel: 1e-10,
            advection: false,
            transient: false,
            thickness: 1.0,
            verbose_timesteps: false,
            verbose_iterations: false,
            verbose_lin_sys_solve: false,
        }
    }

    /// Sets the initial time
    pub fn set_t_ini(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("t_ini must be ≥ 0.0");
        }
        self.t_ini = value;
        Ok(self)
    }

    /// Sets the final time
    pub fn set_t_fin(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("t_fin must be ≥ 0.0");
        }
        self.t_fin = value;
        Ok(self)
    }

    /// Sets the time increment
    pub fn set_dt(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("dt must be > 0.0");
        }
        self.dt = value;
        Ok(self)
    }

    /// Sets the maximum number of time steps
    pub fn set_n_max_time_steps(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("n_max_time_steps must be ≥ 1");
        }
        self.n_max_time_steps = value;
        Ok(self)
    }

    /// Sets the maximum number of iterations
    pub fn set_n_max_iterations(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("n_max_iterations must be ≥ 1");
        }
        self.n_max_iterations = value;
        Ok(self)
    }

    /// Sets the absolute tolerance for the residual vector
    pub fn set_tol_rr_abs(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= f64::EPSILON {
            return Err("tol_rr_abs must be > f64::EPSILON");
        }
        self.tol_rr_abs = value;
        Ok(self)
    }

    /// Sets the relative tolerance for the corrective increment
    pub fn set_tol_mdu_rel(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= f64::EPSILON {
            return Err("tol_mdu_rel must be > f64::EPSILON");
        }
        self.tol_mdu_rel = value;
        Ok(self)
    }

    /// Enables the advection terms (Navier-Stokes flow)
    pub fn set_advection(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.advection = flag;
        Ok(self)
    }

    /// Enables the acceleration terms (transient flow)
    pub fn set_transient(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.transient = flag;
        Ok(self)
    }

    /// Sets the thickness of 2D elements
    pub fn set_thickness(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("thickness must be > 0.0");
        }
        self.thickness = value;
        Ok(self)
    }

    /// Sets the verbose mode of time steps, iterations, and linear solver
    pub fn set_verbose(&mut self, timesteps: bool, iterations: bool, lin_sys_solve: bool) -> &mut Self {
        self.verbose_timesteps = timesteps;
        self.verbose_iterations = iterations;
        self.verbose_lin_sys_solve = lin_sys_solve;
        self
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.t_fin < self.t_ini {
            return Some(format!(
                "t_fin = {:?} must be ≥ t_ini = {:?}",
                self.t_fin, self.t_ini
            ));
        }
        if self.dt <= 0.0 {
            return Some(format!("dt = {:?} must be > 0.0", self.dt));
        }
        if self.n_max_iterations < 1 {
            return Some(format!(
                "n_max_iterations = {:?} must be ≥ 1",
                self.n_max_iterations
            ));
        }
        None
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration data\n").unwrap();
        write!(f, "==================\n").unwrap();
        write!(f, "t_ini = {:?}\n", self.t_ini).unwrap();
        write!(f, "t_fin = {:?}\n", self.t_fin).unwrap();
        write!(f, "dt = {:?}\n", self.dt).unwrap();
        write!(f, "n_max_time_steps = {:?}\n", self.n_max_time_steps).unwrap();
        write!(f, "n_max_iterations = {:?}\n", self.n_max_iterations).unwrap();
        write!(f, "tol_rr_abs = {:?}\n", self.tol_rr_abs).unwrap();
        write!(f, "tol_mdu_rel = {:?}\n", self.tol_mdu_rel).unwrap();
        write!(f, "advection = {:?}\n", self.advection).unwrap();
        write!(f, "transient = {:?}\n", self.transient).unwrap();
        write!(f, "thickness = {:?}\n", self.thickness).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::StrError;

    #[test]
    fn new_works() {
        let config = Config::new();
        assert_eq!(config.dt, 1.0);
        assert_eq!(config.n_max_iterations, 20);
        assert!(!config.advection);
        assert!(!config.transient);
        assert_eq!(config.validate(), None);
    }

    #[test]
    fn setters_work() -> Result<(), StrError> {
        let mut config = Config::new();
        config
            .set_t_ini(1.0)?
            .set_t_fin(3.0)?
            .set_dt(0.5)?
            .set_n_max_time_steps(10)?
            .set_n_max_iterations(5)?
            .set_tol_rr_abs(1e-8)?
            .set_tol_mdu_rel(1e-7)?
            .set_advection(true)?
            .set_transient(true)?
            .set_thickness(2.0)?
            .set_verbose(false, false, false);
        assert_eq!(
            format!("{}", config),
            "Configuration data\n\
             ==================\n\
             t_ini = 1.0\n\
             t_fin = 3.0\n\
             dt = 0.5\n\
             n_max_time_steps = 10\n\
             n_max_iterations = 5\n\
             tol_rr_abs = 1e-8\n\
             tol_mdu_rel = 1e-7\n\
             advection = true\n\
             transient = true\n\
             thickness = 2.0\n"
        );
        Ok(())
    }

    #[test]
    fn setters_capture_errors() {
        let mut config = Config::new();
        assert_eq!(config.set_t_ini(-1.0).err(), Some("t_ini must be ≥ 0.0"));
        assert_eq!(config.set_t_fin(-1.0).err(), Some("t_fin must be ≥ 0.0"));
        assert_eq!(config.set_dt(0.0).err(), Some("dt must be > 0.0"));
        assert_eq!(config.set_n_max_time_steps(0).err(), Some("n_max_time_steps must be ≥ 1"));
        assert_eq!(config.set_n_max_iterations(0).err(), Some("n_max_iterations must be ≥ 1"));
        assert_eq!(config.set_tol_rr_abs(0.0).err(), Some("tol_rr_abs must be > f64::EPSILON"));
        assert_eq!(config.set_tol_mdu_rel(0.0).err(), Some("tol_mdu_rel must be > f64::EPSILON"));
        assert_eq!(config.set_thickness(0.0).err(), Some("thickness must be > 0.0"));
    }

    #[test]
    fn validate_works() {
        let mut config = Config::new();
        config.t_ini = 2.0;
        assert_eq!(config.validate(), Some("t_fin = 1.0 must be ≥ t_ini = 2.0".to_string()));
        config.t_ini = 0.0;
        config.dt = -1.0;
        assert_eq!(config.validate(), Some("dt = -1.0 must be > 0.0".to_string()));
    }
}
