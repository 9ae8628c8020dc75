use fmsim::prelude::*;
use fmsim::StrError;
use russell_lab::*;

// Plane Couette and Poiseuille flows in a rectangular channel
//
// TEST GOAL
//
// This test verifies the Stokes flow driver with the SUPG/PSPG element and the MINI element
//
// MESH
//
// Structured Tri3 mesh over [0, lx] × [0, h] with nx × ny divisions
//
// BOUNDARY CONDITIONS
//
// Couette: v = (U y / h, 0) on the whole boundary
// Poiseuille: no-slip walls (y = 0 and y = h) and the parabolic profile at the inlet
// (x = 0) and outlet (x = lx):
//
// vx = 4 vmax y (h - y) / h²
//
// CONFIGURATION AND PARAMETERS
//
// Steady Stokes flow (single step)
// Newtonian fluid with μ = 1 and ρ = 1
// The pressure is zero at the lower-left corner

/// Returns the ids of the points at the boundary, sorted by side (bottom, right, top, left)
fn boundary(nx: usize, ny: usize) -> (Vec<usize>, Vec<usize>, Vec<usize>, Vec<usize>) {
    let id = |i: usize, j: usize| j * (nx + 1) + i;
    let bottom = (0..(nx + 1)).map(|i| id(i, 0)).collect();
    let right = (1..ny).map(|j| id(nx, j)).collect();
    let top = (0..(nx + 1)).map(|i| id(i, ny)).collect();
    let left = (1..ny).map(|j| id(0, j)).collect();
    (bottom, right, top, left)
}

#[test]
fn test_stokes_couette() -> Result<(), StrError> {
    let (nx, ny) = (4, 4);
    for elem in [
        Elem::SupgTri3(ParamFluid::sample_newtonian()),
        Elem::BubbleTri3(ParamFluid::sample_newtonian()),
    ] {
        let mesh = SampleMeshes::rectangle_tri3(nx, ny, 2.0, 1.0);
        let (bottom, right, top, left) = boundary(nx, ny);

        // the function of time is a plain function; thus, each row needs its own value
        let mut essential = Essential::new();
        let rows: [fn(f64) -> f64; 3] = [|_| 0.25, |_| 0.5, |_| 0.75];
        essential
            .at(&bottom, Dof::Vx, |_| 0.0)
            .at(&top, Dof::Vx, |_| 1.0)
            .at(&bottom, Dof::Vy, |_| 0.0)
            .at(&top, Dof::Vy, |_| 0.0)
            .at(&left, Dof::Vy, |_| 0.0)
            .at(&right, Dof::Vy, |_| 0.0)
            .at(&[0], Dof::Pl, |_| 0.0);
        for j in 1..ny {
            essential.at(&[left[j - 1], right[j - 1]], Dof::Vx, rows[j - 1]);
        }

        let attributes = Attributes::from([(1, elem)]);
        let mut config = Config::new();
        config.set_t_fin(0.0)?;
        let mut sim = StokesFlow::new(&config, mesh, attributes, essential, Natural::new())?;
        sim.solve_yourself()?;

        for p in 0..sim.mesh.points.len() {
            let y = sim.mesh.points[p].coords[1];
            let vx = sim.field.solution[sim.equations.eq(p, Dof::Vx)?];
            let vy = sim.field.solution[sim.equations.eq(p, Dof::Vy)?];
            let pl = sim.field.solution[sim.equations.eq(p, Dof::Pl)?];
            approx_eq(vx, y, 1e-10);
            approx_eq(vy, 0.0, 1e-10);
            approx_eq(pl, 0.0, 1e-10);
        }
    }
    Ok(())
}

#[test]
fn test_stokes_poiseuille() -> Result<(), StrError> {
    let (nx, ny) = (4, 8);
    let (lx, h) = (1.0, 1.0);
    let vmax = 1.0;
    for elem in [
        Elem::SupgTri3(ParamFluid::sample_newtonian()),
        Elem::BubbleTri3(ParamFluid::sample_newtonian()),
    ] {
        let mesh = SampleMeshes::rectangle_tri3(nx, ny, lx, h);
        let (bottom, right, top, left) = boundary(nx, ny);

        // parabolic profile at y = j/8
        let rows: [fn(f64) -> f64; 7] = [
            |_| 4.0 * (1.0 / 8.0) * (7.0 / 8.0),
            |_| 4.0 * (2.0 / 8.0) * (6.0 / 8.0),
            |_| 4.0 * (3.0 / 8.0) * (5.0 / 8.0),
            |_| 4.0 * (4.0 / 8.0) * (4.0 / 8.0),
            |_| 4.0 * (5.0 / 8.0) * (3.0 / 8.0),
            |_| 4.0 * (6.0 / 8.0) * (2.0 / 8.0),
            |_| 4.0 * (7.0 / 8.0) * (1.0 / 8.0),
        ];
        let mut essential = Essential::new();
        essential
            .at(&bottom, Dof::Vx, |_| 0.0)
            .at(&top, Dof::Vx, |_| 0.0)
            .at(&bottom, Dof::Vy, |_| 0.0)
            .at(&top, Dof::Vy, |_| 0.0)
            .at(&left, Dof::Vy, |_| 0.0)
            .at(&right, Dof::Vy, |_| 0.0)
            .at(&[0], Dof::Pl, |_| 0.0);
        for j in 1..ny {
            essential.at(&[left[j - 1], right[j - 1]], Dof::Vx, rows[j - 1]);
        }

        let attributes = Attributes::from([(1, elem)]);
        let mut config = Config::new();
        config.set_t_fin(0.0)?;
        let mut sim = StokesFlow::new(&config, mesh, attributes, essential, Natural::new())?;
        sim.solve_yourself()?;

        // velocity profile at the middle of the channel
        let i = nx / 2;
        for j in 1..ny {
            let p = j * (nx + 1) + i;
            let y = sim.mesh.points[p].coords[1];
            let correct = 4.0 * vmax * y * (h - y) / (h * h);
            let vx = sim.field.solution[sim.equations.eq(p, Dof::Vx)?];
            let vy = sim.field.solution[sim.equations.eq(p, Dof::Vy)?];
            assert!(f64::abs(vx - correct) < 0.05 * vmax);
            assert!(f64::abs(vy) < 0.05 * vmax);
        }

        // the pressure drops along the channel (exact gradient: -8 μ vmax / h²)
        let p_left = sim.field.solution[sim.equations.eq(ny / 2 * (nx + 1), Dof::Pl)?];
        let p_right = sim.field.solution[sim.equations.eq(ny / 2 * (nx + 1) + nx, Dof::Pl)?];
        assert!(p_right < p_left);
    }
    Ok(())
}
