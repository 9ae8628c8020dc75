use fmsim::prelude::*;
use fmsim::StrError;
use russell_lab::*;

// Plane Couette flow of a power-law fluid
//
// TEST GOAL
//
// This test verifies the nonlinear (power-law) viscosity model within the Newton iterations
// and the internal forces of the elements (shear force on the moving wall)
//
// MESH
//
// Structured Tri3 mesh over [0, 1] × [0, 1] with 4 × 4 divisions
//
// BOUNDARY CONDITIONS
//
// v = (U y, 0) on the whole boundary with U = 1
//
// CONFIGURATION AND PARAMETERS
//
// Steady Stokes flow (single step)
// Power-law fluid: σ = 2 μ (1 + c ‖ε̇‖^α) ε̇ with μ = 1, c = 0.5, α = 0.8
// The exact shear stress is σxy = μ (1 + c (γ̇/√2)^α) γ̇ with γ̇ = U

/// Runs the simulation and returns the shear force on the top wall
fn run(param: ParamFluid) -> Result<f64, StrError> {
    let n = 4;
    let mesh = SampleMeshes::rectangle_tri3(n, n, 1.0, 1.0);
    let id = |i: usize, j: usize| j * (n + 1) + i;
    let bottom: Vec<_> = (0..(n + 1)).map(|i| id(i, 0)).collect();
    let top: Vec<_> = (0..(n + 1)).map(|i| id(i, n)).collect();
    let sides: Vec<_> = (1..n).map(|j| [id(0, j), id(n, j)]).collect();
    let rows: [fn(f64) -> f64; 3] = [|_| 0.25, |_| 0.5, |_| 0.75];
    let mut essential = Essential::new();
    essential
        .at(&bottom, Dof::Vx, |_| 0.0)
        .at(&bottom, Dof::Vy, |_| 0.0)
        .at(&top, Dof::Vx, |_| 1.0)
        .at(&top, Dof::Vy, |_| 0.0)
        .at(&[0], Dof::Pl, |_| 0.0);
    for (k, pair) in sides.iter().enumerate() {
        essential.at(pair, Dof::Vx, rows[k]).at(pair, Dof::Vy, |_| 0.0);
    }

    let attributes = Attributes::from([(1, Elem::SupgTri3(param))]);
    let mut config = Config::new();
    config.set_t_fin(0.0)?.set_n_max_iterations(30)?;
    let mut sim = StokesFlow::new(&config, mesh, attributes, essential, Natural::new())?;
    sim.solve_yourself()?;

    // the linear profile is reproduced
    for p in 0..sim.mesh.points.len() {
        let y = sim.mesh.points[p].coords[1];
        approx_eq(sim.field.solution[sim.equations.eq(p, Dof::Vx)?], y, 1e-9);
    }

    // sum of the element forces at the top wall
    sim.update_component(fmsim::base::Component::InternalRhs)?;
    let top_eqs: Vec<_> = top
        .iter()
        .map(|p| sim.equations.eq(*p, Dof::Vx))
        .collect::<Result<_, _>>()?;
    let mut force = 0.0;
    for e in &sim.elements.all {
        for (i, eq) in e.local_to_global.iter().enumerate() {
            if top_eqs.contains(eq) {
                force += e.internal[i];
            }
        }
    }
    Ok(force)
}

#[test]
fn test_power_law_channel() -> Result<(), StrError> {
    let newtonian = run(ParamFluid::sample_newtonian())?;
    approx_eq(newtonian, 1.0, 1e-8);

    let param = ParamFluid::sample_power_law();
    let shear_rate: f64 = 1.0;
    let correct = shear_rate * (1.0 + 0.5 * f64::powf(shear_rate / f64::sqrt(2.0), 0.8));
    let power_law = run(param)?;
    approx_eq(power_law, correct, 1e-8);
    assert!(power_law > newtonian);
    Ok(())
}
