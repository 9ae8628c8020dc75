use super::TwoPhase;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};

/// Holds the state of the isotropic damage model at an integration point
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DamageState {
    /// Stress-dependent part of the strain (total strain minus eigenstrain)
    pub strain: Vector,

    /// Stress σ = (1 - ω) De ε
    pub stress: Vector,

    /// Equivalent strain (local or nonlocal) driving the damage
    pub equiv_strain: f64,

    /// Largest equivalent strain reached so far (history variable κ)
    pub kappa: f64,

    /// Damage ω ∈ [0, 1)
    pub damage: f64,
}

/// Holds one edge of the nonlocal interaction graph
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct LocalIntegrationRecord {
    /// Index of the neighbor integration point
    pub point: usize,

    /// Weight = kernel(distance) × volume around the neighbor
    pub weight: f64,
}

/// Holds the status of the (local or nonlocal) isotropic damage model at an integration point
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DamageStatus {
    /// Trial and committed states
    pub state: TwoPhase<DamageState>,

    /// Neighbors sorted by the x-coordinate (None until first needed)
    pub integration_list: Option<Vec<LocalIntegrationRecord>>,

    /// Sum of the weights in the integration list
    pub integration_scale: f64,

    /// Local variable subject to averaging (equivalent strain or compliance parameter)
    pub local_variable: f64,
}

impl DamageState {
    /// Allocates a new (virgin) state
    pub fn new(n_strain: usize) -> Self {
        DamageState {
            strain: Vector::new(n_strain),
            stress: Vector::new(n_strain),
            equiv_strain: 0.0,
            kappa: 0.0,
            damage: 0.0,
        }
    }
}

impl DamageStatus {
    /// Allocates a new instance
    pub fn new(n_strain: usize) -> Self {
        DamageStatus {
            state: TwoPhase::new(DamageState::new(n_strain)),
            integration_list: None,
            integration_scale: 0.0,
            local_variable: 0.0,
        }
    }

    /// Returns the trial damage or the committed damage if the trial damage is zero
    pub fn current_damage(&self) -> f64 {
        let damage = self.state.trial().damage;
        if damage == 0.0 {
            self.state.committed().damage
        } else {
            damage
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
