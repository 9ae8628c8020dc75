use fmsim::prelude::*;
use fmsim::StrError;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "fmsim_cavity",
    about = "Solves the lid-driven cavity flow with stabilized triangles"
)]
struct Options {
    /// Number of divisions along each side of the unit square
    #[structopt(short = "n", long, default_value = "8")]
    ndiv: usize,

    /// Dynamic viscosity
    #[structopt(long, default_value = "1.0")]
    mu: f64,

    /// Uses the power-law viscosity model with the given exponent
    #[structopt(long)]
    alpha: Option<f64>,

    /// Uses the MINI (bubble) element instead of the SUPG/PSPG element
    #[structopt(long)]
    bubble: bool,

    /// Includes the advection term (Navier-Stokes)
    #[structopt(long)]
    advection: bool,

    /// Shows the convergence statistics
    #[structopt(short, long)]
    verbose: bool,

    /// Writes the results (JSON) to this directory
    #[structopt(long)]
    out_dir: Option<String>,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();
    if options.ndiv < 2 {
        return Err("ndiv must be ≥ 2");
    }

    // mesh and parameters
    let n = options.ndiv;
    let mesh = SampleMeshes::rectangle_tri3(n, n, 1.0, 1.0);
    let viscosity = match options.alpha {
        Some(alpha) => ParamViscosity::PowerLaw {
            mu: options.mu,
            c: 1.0,
            alpha,
        },
        None => ParamViscosity::Newtonian { mu: options.mu },
    };
    let param = ParamFluid {
        density: 1.0,
        viscosity,
    };
    param.validate()?;
    let elem = if options.bubble {
        Elem::BubbleTri3(param)
    } else {
        Elem::SupgTri3(param)
    };
    let attributes = Attributes::from([(1, elem)]);

    // boundary conditions: the lid (top side without the corners) moves with unit velocity
    let id = |i: usize, j: usize| j * (n + 1) + i;
    let mut walls = Vec::new();
    let mut lid = Vec::new();
    for i in 0..(n + 1) {
        walls.push(id(i, 0));
    }
    for j in 1..n {
        walls.push(id(0, j));
        walls.push(id(n, j));
    }
    walls.push(id(0, n));
    walls.push(id(n, n));
    for i in 1..n {
        lid.push(id(i, n));
    }
    let mut essential = Essential::new();
    essential
        .at(&walls, Dof::Vx, |_| 0.0)
        .at(&walls, Dof::Vy, |_| 0.0)
        .at(&lid, Dof::Vx, |_| 1.0)
        .at(&lid, Dof::Vy, |_| 0.0)
        .at(&[0], Dof::Pl, |_| 0.0);

    // configuration
    let mut config = Config::new();
    config
        .set_t_fin(0.0)?
        .set_advection(options.advection)?
        .set_n_max_iterations(50)?
        .set_tol_rr_abs(1e-8)?
        .set_verbose(options.verbose, options.verbose, false);

    // simulation
    let mut sim = StokesFlow::new(&config, mesh, attributes, essential, Natural::new())?;
    if let Some(dir) = &options.out_dir {
        sim.set_export(Box::new(JsonExport::new("cavity", Some(dir))))?;
    }
    sim.solve_yourself()?;

    // horizontal velocity along the vertical centerline
    if n % 2 == 0 {
        println!("\n{:>8} {:>14}", "y", "vx(0.5, y)");
        for j in 0..(n + 1) {
            let p = id(n / 2, j);
            let eq = sim.equations.eq(p, Dof::Vx)?;
            println!("{:>8.4} {:>14.6e}", sim.mesh.points[p].coords[1], sim.field.solution[eq]);
        }
    }
    Ok(())
}
