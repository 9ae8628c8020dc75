use super::{compose_characteristic_matrix, compose_characteristic_vector};
use super::{DofLayout, EdgeTri3, FluidContext, FluidElementTrait, ShapeTri3, Stabilization, SupgTerms};
use crate::base::{integ_points_tri, CharMatrix, CharVector, IntegPoint, Load, Natural, ParamFluid};
use crate::material::{restore_context, save_context, FluidModel, FluidStatus};
use crate::StrError;
use gemlab::mesh::{Cell, Mesh};
use russell_lab::{Matrix, Vector};
use std::io::{Read, Write};

/// Implements the SUPG/PSPG/LSIC stabilized linear triangle with equal-order velocity and pressure
///
/// The velocity block is ordered as `[vx0, vy0, vx1, vy1, vx2, vy2]`; thus, the velocity
/// component `k` of node `a` is at position `2 a + k`. The pressure block is `[p0, p1, p2]`.
pub struct ElementSupgTri3 {
    /// Geometry
    shape: ShapeTri3,

    /// Viscosity model and density
    model: FluidModel,

    /// Local DOF layout
    layout: DofLayout,

    /// Edge loads with the geometry of the corresponding sides
    edges: Vec<(EdgeTri3, Load)>,

    /// Body loads
    bodies: Vec<Load>,

    /// Integration points
    ips: Vec<IntegPoint>,

    /// Strain-rate matrix B (3 × 6), constant over the element
    bb: Matrix,

    /// Material status at each integration point
    pub statuses: Vec<FluidStatus>,

    /// Stabilization coefficients
    pub stabilization: Stabilization,
}

/// Holds the kinematics of the velocity field at an integration point
struct Kinematics {
    /// Shape functions
    nn: [f64; 3],

    /// Velocity
    u: [f64; 2],

    /// Velocity gradient ∂uₖ/∂xₗ stored as grad_u[k][l]
    grad_u: [[f64; 2]; 2],

    /// u · ∇Nₐ
    u_grad_n: [f64; 3],

    /// Acceleration (u - u_prev)/Δt (zero in steady analyses)
    accel: [f64; 2],

    /// Volume weight (weight × area × thickness)
    dv: f64,
}

impl ElementSupgTri3 {
    /// Allocates a new instance
    pub fn new(mesh: &Mesh, cell: &Cell, param: &ParamFluid, layout: DofLayout, natural: &Natural) -> Result<Self, StrError> {
        let shape = ShapeTri3::from_cell(mesh, cell)?;
        let model = FluidModel::new(param)?;
        let mut edges = Vec::new();
        for (side, load) in natural.cell_edges(cell.id) {
            edges.push((shape.edge(side)?, load));
        }
        let bodies = natural.cell_bodies(cell.attribute);
        let ips = integ_points_tri(3)?;
        let mut bb = Matrix::new(3, 6);
        for a in 0..3 {
            let (dx, dy) = (shape.gradient.get(a, 0), shape.gradient.get(a, 1));
            bb.set(0, 2 * a, dx);
            bb.set(1, 2 * a + 1, dy);
            bb.set(2, 2 * a, dy);
            bb.set(2, 2 * a + 1, dx);
        }
        let statuses = (0..ips.len()).map(|_| FluidStatus::new_fluid()).collect();
        Ok(ElementSupgTri3 {
            shape,
            model,
            layout,
            edges,
            bodies,
            ips,
            bb,
            statuses,
            stabilization: Stabilization::new(),
        })
    }

    /// Returns ∂Nₐ/∂xₖ
    fn dn(&self, a: usize, k: usize) -> f64 {
        self.shape.gradient.get(a, k)
    }

    /// Computes the velocity kinematics at an integration point
    fn kinematics(&self, ip: &IntegPoint, ctx: &FluidContext) -> Kinematics {
        let nn = ip.coords;
        let mut u = [0.0; 2];
        let mut grad_u = [[0.0; 2]; 2];
        let mut accel = [0.0; 2];
        for a in 0..3 {
            for k in 0..2 {
                let ua = ctx.uu[2 * a + k];
                u[k] += nn[a] * ua;
                if ctx.transient {
                    accel[k] += nn[a] * (ua - ctx.uu_prev[2 * a + k]) / ctx.dt;
                }
                for l in 0..2 {
                    grad_u[k][l] += self.dn(a, l) * ua;
                }
            }
        }
        let mut u_grad_n = [0.0; 3];
        for a in 0..3 {
            u_grad_n[a] = u[0] * self.dn(a, 0) + u[1] * self.dn(a, 1);
        }
        Kinematics {
            nn,
            u,
            grad_u,
            u_grad_n,
            accel,
            dv: ip.weight * self.shape.area * ctx.thickness,
        }
    }

    /// Computes the strain-rate ε̇ = B u
    fn strain_rate(&self, ctx: &FluidContext) -> Vector {
        let mut eps = Vector::new(3);
        for i in 0..3 {
            for j in 0..6 {
                eps[i] += self.bb.get(i, j) * ctx.uu[j];
            }
        }
        eps
    }

    /// Returns the pressure gradient (constant over the element)
    fn pressure_gradient(&self, ctx: &FluidContext) -> [f64; 2] {
        let mut grad_p = [0.0; 2];
        for b in 0..3 {
            for k in 0..2 {
                grad_p[k] += self.dn(b, k) * ctx.pp[b];
            }
        }
        grad_p
    }

    /// Returns the representative velocity for the stabilization (mean nodal velocity)
    fn mean_velocity(&self, ctx: &FluidContext) -> [f64; 2] {
        if !ctx.advection {
            return [0.0, 0.0];
        }
        let mut u = [0.0; 2];
        for a in 0..3 {
            u[0] += ctx.uu[2 * a] / 3.0;
            u[1] += ctx.uu[2 * a + 1] / 3.0;
        }
        u
    }
}

impl SupgTerms for ElementSupgTri3 {
    fn dof_layout(&self) -> &DofLayout {
        &self.layout
    }

    fn acceleration_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let rho = self.model.density;
        let tau = self.stabilization.t_supg;
        for ip in &self.ips {
            let kin = self.kinematics(ip, ctx);
            for a in 0..3 {
                let wa = if ctx.advection {
                    kin.nn[a] + tau * kin.u_grad_n[a]
                } else {
                    kin.nn[a]
                };
                for b in 0..3 {
                    let val = rho * wa * kin.nn[b] * kin.dv;
                    answer.add(2 * a, 2 * b, val);
                    answer.add(2 * a + 1, 2 * b + 1, val);
                }
            }
        }
        Ok(())
    }

    fn advection_mb(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let rho = self.model.density;
        let tau = self.stabilization.t_supg;
        for ip in &self.ips {
            let kin = self.kinematics(ip, ctx);
            for a in 0..3 {
                let wa = kin.nn[a] + tau * kin.u_grad_n[a];
                for k in 0..2 {
                    let conv = kin.u[0] * kin.grad_u[k][0] + kin.u[1] * kin.grad_u[k][1];
                    answer[2 * a + k] += rho * wa * conv * kin.dv;
                }
            }
        }
        Ok(())
    }

    fn advection_derivative_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let rho = self.model.density;
        let tau = self.stabilization.t_supg;
        let grad_p = self.pressure_gradient(ctx);
        for ip in &self.ips {
            let kin = self.kinematics(ip, ctx);
            // strong residual whose weight depends on u
            let mut res = [0.0; 2];
            for k in 0..2 {
                let conv = kin.u[0] * kin.grad_u[k][0] + kin.u[1] * kin.grad_u[k][1];
                res[k] = rho * kin.accel[k] + rho * conv + grad_p[k];
            }
            for a in 0..3 {
                let wa = kin.nn[a] + tau * kin.u_grad_n[a];
                for k in 0..2 {
                    for b in 0..3 {
                        for l in 0..2 {
                            let delta = if k == l { 1.0 } else { 0.0 };
                            let val = rho * wa * (kin.nn[b] * kin.grad_u[k][l] + kin.u_grad_n[b] * delta)
                                + tau * kin.nn[b] * self.dn(a, l) * res[k];
                            answer.add(2 * a + k, 2 * b + l, val * kin.dv);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn diffusion_mb(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let eps = self.strain_rate(ctx);
        for (p, ip) in self.ips.iter().enumerate() {
            let dv = ip.weight * self.shape.area * ctx.thickness;
            let status = &mut self.statuses[p];
            status.init_trial();
            self.model.actual.update_stress(status.trial_mut(), &eps)?;
            let sig = &status.trial().stress;
            for j in 0..6 {
                for i in 0..3 {
                    answer[j] += self.bb.get(i, j) * sig[i] * dv;
                }
            }
        }
        Ok(())
    }

    fn diffusion_derivative_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let eps = self.strain_rate(ctx);
        let mut dd = Matrix::new(3, 3);
        for (p, ip) in self.ips.iter().enumerate() {
            let dv = ip.weight * self.shape.area * ctx.thickness;
            let status = &mut self.statuses[p];
            status.init_trial();
            self.model.actual.update_stress(status.trial_mut(), &eps)?;
            self.model.actual.stiffness(&mut dd, status.trial())?;
            for r in 0..6 {
                for c in 0..6 {
                    let mut sum = 0.0;
                    for i in 0..3 {
                        for j in 0..3 {
                            sum += self.bb.get(i, r) * dd.get(i, j) * self.bb.get(j, c);
                        }
                    }
                    answer.add(r, c, sum * dv);
                }
            }
        }
        for r in 0..6 {
            for c in (r + 1)..6 {
                let mean = 0.5 * (answer.get(r, c) + answer.get(c, r));
                answer.set(r, c, mean);
                answer.set(c, r, mean);
            }
        }
        Ok(())
    }

    fn pressure_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let tau = self.stabilization.t_supg;
        for ip in &self.ips {
            let kin = self.kinematics(ip, ctx);
            for a in 0..3 {
                for k in 0..2 {
                    for b in 0..3 {
                        let mut val = -self.dn(a, k) * kin.nn[b];
                        if ctx.advection {
                            val += tau * kin.u_grad_n[a] * self.dn(b, k);
                        }
                        answer.add(2 * a + k, b, val * kin.dv);
                    }
                }
            }
        }
        Ok(())
    }

    fn lsic_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let coef = self.model.density * self.stabilization.t_lsic * self.shape.area * ctx.thickness;
        for a in 0..3 {
            for k in 0..2 {
                for b in 0..3 {
                    for l in 0..2 {
                        answer.set(2 * a + k, 2 * b + l, coef * self.dn(a, k) * self.dn(b, l));
                    }
                }
            }
        }
        Ok(())
    }

    fn linear_advection_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        for ip in &self.ips {
            let dv = ip.weight * self.shape.area * ctx.thickness;
            for a in 0..3 {
                for b in 0..3 {
                    for l in 0..2 {
                        answer.add(a, 2 * b + l, -ip.coords[a] * self.dn(b, l) * dv);
                    }
                }
            }
        }
        Ok(())
    }

    fn advection_mc(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let tau = self.stabilization.t_pspg;
        for ip in &self.ips {
            let kin = self.kinematics(ip, ctx);
            for a in 0..3 {
                for k in 0..2 {
                    let conv = kin.u[0] * kin.grad_u[k][0] + kin.u[1] * kin.grad_u[k][1];
                    answer[a] -= tau * self.dn(a, k) * conv * kin.dv;
                }
            }
        }
        Ok(())
    }

    fn advection_derivative_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let tau = self.stabilization.t_pspg;
        for ip in &self.ips {
            let kin = self.kinematics(ip, ctx);
            for a in 0..3 {
                for b in 0..3 {
                    for l in 0..2 {
                        let mut val = kin.u_grad_n[b] * self.dn(a, l);
                        for k in 0..2 {
                            val += kin.nn[b] * self.dn(a, k) * kin.grad_u[k][l];
                        }
                        answer.add(a, 2 * b + l, -tau * val * kin.dv);
                    }
                }
            }
        }
        Ok(())
    }

    fn diffusion_mc(&mut self, answer: &mut Vector, _ctx: &FluidContext) -> Result<(), StrError> {
        // second derivatives of linear functions vanish
        answer.fill(0.0);
        Ok(())
    }

    fn diffusion_derivative_mc(&mut self, answer: &mut Matrix, _ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        Ok(())
    }

    fn acceleration_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let tau = self.stabilization.t_pspg;
        for ip in &self.ips {
            let dv = ip.weight * self.shape.area * ctx.thickness;
            for a in 0..3 {
                for b in 0..3 {
                    for l in 0..2 {
                        answer.add(a, 2 * b + l, -tau * self.dn(a, l) * ip.coords[b] * dv);
                    }
                }
            }
        }
        Ok(())
    }

    fn pressure_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        let coef = -self.stabilization.t_pspg / self.model.density * self.shape.area * ctx.thickness;
        for a in 0..3 {
            for b in 0..3 {
                let dot = self.dn(a, 0) * self.dn(b, 0) + self.dn(a, 1) * self.dn(b, 1);
                answer.set(a, b, coef * dot);
            }
        }
        Ok(())
    }

    fn bc_rhs_mb(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        for (edge, load) in &self.edges {
            if let Load::Traction { tx, ty } = load {
                let half = 0.5 * edge.length * ctx.thickness;
                for a in edge.nodes {
                    answer[2 * a] += half * tx;
                    answer[2 * a + 1] += half * ty;
                }
            }
        }
        for load in &self.bodies {
            if let Load::BodyForce { gx, gy } = load {
                let third = self.model.density * self.shape.area * ctx.thickness / 3.0;
                for a in 0..3 {
                    answer[2 * a] += third * gx;
                    answer[2 * a + 1] += third * gy;
                }
            }
        }
        Ok(())
    }

    fn bc_rhs_mc(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let tau = self.stabilization.t_pspg;
        for load in &self.bodies {
            if let Load::BodyForce { gx, gy } = load {
                let vol = self.shape.area * ctx.thickness;
                for a in 0..3 {
                    answer[a] -= tau * (self.dn(a, 0) * gx + self.dn(a, 1) * gy) * vol;
                }
            }
        }
        Ok(())
    }

    fn bc_lhs_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        for (edge, load) in &self.edges {
            let (coef, dir) = match load {
                Load::SlipWithFriction { beta } => (*beta, edge.tangent),
                Load::PenetrationWithResistance { alpha } => (1.0 / alpha, edge.normal),
                _ => continue,
            };
            let mm = edge.mass();
            for (i, a) in edge.nodes.iter().enumerate() {
                for (j, b) in edge.nodes.iter().enumerate() {
                    for k in 0..2 {
                        for l in 0..2 {
                            let val = coef * mm[i][j] * dir[k] * dir[l] * ctx.thickness;
                            answer.add(2 * a + k, 2 * b + l, val);
                        }
                    }
                }
            }
        }
        let mm = self.shape.mass();
        let mu = self.model.actual.effective_viscosity();
        for load in &self.bodies {
            if let Load::HomogenizedReinforce { kx, ky } = load {
                let drag = [mu / kx, mu / ky];
                for a in 0..3 {
                    for b in 0..3 {
                        for k in 0..2 {
                            answer.add(2 * a + k, 2 * b + k, drag[k] * mm.get(a, b) * ctx.thickness);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn bc_lhs_pressure_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        for (edge, load) in &self.edges {
            if let Load::OutFlow = load {
                let mm = edge.mass();
                for (i, a) in edge.nodes.iter().enumerate() {
                    for (j, b) in edge.nodes.iter().enumerate() {
                        for k in 0..2 {
                            answer.add(2 * a + k, *b, mm[i][j] * edge.normal[k] * ctx.thickness);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn bc_lhs_pressure_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        answer.fill(0.0);
        let coef = -self.stabilization.t_pspg / self.model.density;
        let mu = self.model.actual.effective_viscosity();
        for load in &self.bodies {
            if let Load::HomogenizedReinforce { kx, ky } = load {
                let drag = [mu / kx, mu / ky];
                let vol = self.shape.area * ctx.thickness;
                for a in 0..3 {
                    for b in 0..3 {
                        for l in 0..2 {
                            // ∫ Nb dA = A/3
                            answer.add(a, 2 * b + l, coef * self.dn(a, l) * drag[l] * vol / 3.0);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl FluidElementTrait for ElementSupgTri3 {
    fn layout(&self) -> &DofLayout {
        &self.layout
    }

    fn characteristic_vector(&mut self, answer: &mut Vector, kind: CharVector, ctx: &FluidContext) -> Result<(), StrError> {
        compose_characteristic_vector(self, answer, kind, ctx)
    }

    fn characteristic_matrix(&mut self, answer: &mut Matrix, kind: CharMatrix, ctx: &FluidContext) -> Result<(), StrError> {
        compose_characteristic_matrix(self, answer, kind, ctx)
    }

    fn update_stabilization(&mut self, ctx: &FluidContext) -> Result<(), StrError> {
        let velocity = self.mean_velocity(ctx);
        let nu = self.model.kinematic_viscosity();
        let dt = if ctx.transient { Some(ctx.dt) } else { None };
        self.stabilization = Stabilization::tezduyar(self.shape.size(), &self.shape.gradient, &velocity, nu, dt);
        Ok(())
    }

    fn critical_time_step(&self, ctx: &FluidContext) -> f64 {
        let mut u = [0.0; 2];
        for a in 0..3 {
            u[0] += ctx.uu[2 * a] / 3.0;
            u[1] += ctx.uu[2 * a + 1] / 3.0;
        }
        self.shape.critical_time_step(&u, self.model.kinematic_viscosity())
    }

    fn update_internal_state(&mut self, ctx: &FluidContext) -> Result<(), StrError> {
        let eps = self.strain_rate(ctx);
        for status in &mut self.statuses {
            status.init_trial();
            self.model.actual.update_stress(status.trial_mut(), &eps)?;
            status.commit();
        }
        Ok(())
    }

    fn save_context(&self, writer: &mut dyn Write) -> Result<(), StrError> {
        let mut w = writer;
        save_context(&self.statuses, &mut w)
    }

    fn restore_context(&mut self, reader: &mut dyn Read) -> Result<(), StrError> {
        let mut r = reader;
        let statuses: Vec<FluidStatus> = restore_context(&mut r)?;
        if statuses.len() != self.statuses.len() {
            return Err("cannot read context");
        }
        self.statuses = statuses;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
