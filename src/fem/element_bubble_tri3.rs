use super::{DofLayout, EdgeTri3, FluidContext, FluidElementTrait, ShapeTri3};
use crate::base::{integ_points_tri, scatter_block_matrix, scatter_block_vector, CharMatrix, CharVector, Load};
use crate::base::{Natural, ParamFluid};
use crate::material::{restore_context, save_context, FluidModel, FluidStatus};
use crate::StrError;
use gemlab::mesh::{Cell, Mesh};
use russell_lab::{Matrix, Vector};
use std::io::{Read, Write};

/// Number of velocity shape functions (three corners and the bubble)
const NV_NODE: usize = 4;

/// Implements the MINI element: linear velocity enriched by a cubic bubble and linear pressure
///
/// The bubble function is `N₃ = 27 L₀ L₁ L₂`, which is one at the centroid and vanishes on the
/// sides; thus, the bubble DOFs are element-internal. The velocity block is ordered as
/// `[vx0, vy0, vx1, vy1, vx2, vy2, bx, by]`. The element is integrated with the 7-point rule
/// and yields the mixed system:
///
/// ```text
/// ┌              ┐ ┌   ┐   ┌         ┐
/// │ K       G+Dp │ │ u │   │ f_ext   │
/// │              │ │   │ = │         │
/// │ Gᵀ+Dvᵀ  C    │ │ p │   │ 0       │
/// └              ┘ └   ┘   └         ┘
/// ```
///
/// where K = ∫ Bᵀ D B dV is symmetrized and Dp, Dv, C come from the mixed interface of the
/// viscosity model (zero for incompressible fluids). This is a Stokes element: the advection
/// and transient flags of the analysis are ignored.
pub struct ElementBubbleTri3 {
    shape: ShapeTri3,
    model: FluidModel,
    layout: DofLayout,
    edges: Vec<(EdgeTri3, Load)>,
    bodies: Vec<Load>,

    /// Integration weights multiplied by the area (without the thickness)
    weights: Vec<f64>,

    /// Velocity shape functions at each integration point
    nns: Vec<[f64; NV_NODE]>,

    /// Pressure shape functions at each integration point
    pps: Vec<[f64; 3]>,

    /// Strain-rate matrices (3 × 8) at each integration point
    bbs: Vec<Matrix>,

    /// Material status at each integration point
    pub statuses: Vec<FluidStatus>,
}

impl ElementBubbleTri3 {
    /// Allocates a new instance
    pub fn new(mesh: &Mesh, cell: &Cell, param: &ParamFluid, layout: DofLayout, natural: &Natural) -> Result<Self, StrError> {
        let shape = ShapeTri3::from_cell(mesh, cell)?;
        let model = FluidModel::new(param)?;
        let mut edges = Vec::new();
        for (side, load) in natural.cell_edges(cell.id) {
            edges.push((shape.edge(side)?, load));
        }
        let bodies = natural.cell_bodies(cell.attribute);
        let ips = integ_points_tri(7)?;
        let mut weights = Vec::with_capacity(ips.len());
        let mut nns = Vec::with_capacity(ips.len());
        let mut pps = Vec::with_capacity(ips.len());
        let mut bbs = Vec::with_capacity(ips.len());
        for ip in &ips {
            let ll = ip.coords;
            let mut gradient = [[0.0; 2]; NV_NODE];
            for a in 0..3 {
                gradient[a][0] = shape.gradient.get(a, 0);
                gradient[a][1] = shape.gradient.get(a, 1);
            }
            for k in 0..2 {
                gradient[3][k] = 27.0
                    * (gradient[0][k] * ll[1] * ll[2] + ll[0] * gradient[1][k] * ll[2] + ll[0] * ll[1] * gradient[2][k]);
            }
            let mut bb = Matrix::new(3, 2 * NV_NODE);
            for a in 0..NV_NODE {
                let (dx, dy) = (gradient[a][0], gradient[a][1]);
                bb.set(0, 2 * a, dx);
                bb.set(1, 2 * a + 1, dy);
                bb.set(2, 2 * a, dy);
                bb.set(2, 2 * a + 1, dx);
            }
            weights.push(ip.weight * shape.area);
            nns.push([ll[0], ll[1], ll[2], 27.0 * ll[0] * ll[1] * ll[2]]);
            pps.push(ll);
            bbs.push(bb);
        }
        let statuses = (0..ips.len()).map(|_| FluidStatus::new_fluid()).collect();
        Ok(ElementBubbleTri3 {
            shape,
            model,
            layout,
            edges,
            bodies,
            weights,
            nns,
            pps,
            bbs,
            statuses,
        })
    }

    /// Computes the strain-rate ε̇ = B u at an integration point
    fn strain_rate(&self, p: usize, uu: &Vector) -> Vector {
        let mut eps = Vector::new(3);
        for i in 0..3 {
            for j in 0..(2 * NV_NODE) {
                eps[i] += self.bbs[p].get(i, j) * uu[j];
            }
        }
        eps
    }

    /// Interpolates the pressure at an integration point
    fn pressure(&self, p: usize, pp: &Vector) -> f64 {
        (0..3).map(|b| self.pps[p][b] * pp[b]).sum()
    }

    /// Computes the boundary and drag terms acting on the velocity (nv × nv)
    fn boundary_velocity_block(&self, kvv: &mut Matrix, thickness: f64) {
        kvv.fill(0.0);
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
                            kvv.add(2 * a + k, 2 * b + l, coef * mm[i][j] * dir[k] * dir[l] * thickness);
                        }
                    }
                }
            }
        }
        let mu = self.model.actual.effective_viscosity();
        for load in &self.bodies {
            if let Load::HomogenizedReinforce { kx, ky } = load {
                let drag = [mu / kx, mu / ky];
                for (p, nn) in self.nns.iter().enumerate() {
                    let dv = self.weights[p] * thickness;
                    for a in 0..NV_NODE {
                        for b in 0..NV_NODE {
                            for k in 0..2 {
                                kvv.add(2 * a + k, 2 * b + k, drag[k] * nn[a] * nn[b] * dv);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Computes the outflow term acting on the pressure (nv × np)
    fn boundary_pressure_block(&self, kvp: &mut Matrix, thickness: f64) {
        kvp.fill(0.0);
        for (edge, load) in &self.edges {
            if let Load::OutFlow = load {
                let mm = edge.mass();
                for (i, a) in edge.nodes.iter().enumerate() {
                    for (j, b) in edge.nodes.iter().enumerate() {
                        for k in 0..2 {
                            kvp.add(2 * a + k, *b, mm[i][j] * edge.normal[k] * thickness);
                        }
                    }
                }
            }
        }
    }

    /// Computes the internal forces split into the velocity and pressure blocks
    fn internal_forces(&mut self, rv: &mut Vector, rp: &mut Vector, ctx: &FluidContext) -> Result<(), StrError> {
        let nv = 2 * NV_NODE;
        rv.fill(0.0);
        rp.fill(0.0);
        for p in 0..self.weights.len() {
            let dv = self.weights[p] * ctx.thickness;
            let eps = self.strain_rate(p, ctx.uu);
            let pressure = self.pressure(p, ctx.pp);
            let status = &mut self.statuses[p];
            status.init_trial();
            self.model.actual.update_stress(status.trial_mut(), &eps)?;
            let sig = &status.trial().stress;
            for j in 0..nv {
                for i in 0..3 {
                    rv[j] += self.bbs[p].get(i, j) * sig[i] * dv;
                }
            }
            for a in 0..NV_NODE {
                for k in 0..2 {
                    // -∫ ∂Nₐ/∂xₖ p dV
                    rv[2 * a + k] -= self.bbs[p].get(k, 2 * a + k) * pressure * dv;
                }
            }
            let r_vol = self.model.actual.volumetric_rate(&eps, pressure);
            for b in 0..3 {
                rp[b] += self.pps[p][b] * r_vol * dv;
            }
        }

        // boundary terms
        let mut kvv = Matrix::new(nv, nv);
        let mut kvp = Matrix::new(nv, 3);
        self.boundary_velocity_block(&mut kvv, ctx.thickness);
        self.boundary_pressure_block(&mut kvp, ctx.thickness);
        for i in 0..nv {
            for j in 0..nv {
                rv[i] += kvv.get(i, j) * ctx.uu[j];
            }
            for j in 0..3 {
                rv[i] += kvp.get(i, j) * ctx.pp[j];
            }
        }
        Ok(())
    }

    /// Computes the tangent blocks
    fn tangent(&mut self, kvv: &mut Matrix, kvp: &mut Matrix, kpv: &mut Matrix, kpp: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError> {
        let nv = 2 * NV_NODE;
        kvv.fill(0.0);
        kvp.fill(0.0);
        kpv.fill(0.0);
        kpp.fill(0.0);
        let mut dd = Matrix::new(3, 3);
        let mut ep = Vector::new(3);
        let mut cd = Vector::new(3);
        self.model.actual.deviatoric_pressure_stiffness(&mut ep);
        self.model.actual.volumetric_deviatoric_stiffness(&mut cd);
        let cvp = self.model.actual.volumetric_pressure_stiffness();
        // d(r_vol)/dε̇ = cd - m with m = [1, 1, 0]
        let dr_vol = [cd[0] - 1.0, cd[1] - 1.0, cd[2]];
        for p in 0..self.weights.len() {
            let dv = self.weights[p] * ctx.thickness;
            let eps = self.strain_rate(p, ctx.uu);
            let status = &mut self.statuses[p];
            status.init_trial();
            self.model.actual.update_stress(status.trial_mut(), &eps)?;
            self.model.actual.stiffness(&mut dd, status.trial())?;
            let bb = &self.bbs[p];
            for r in 0..nv {
                for c in 0..nv {
                    let mut sum = 0.0;
                    for i in 0..3 {
                        for j in 0..3 {
                            sum += bb.get(i, r) * dd.get(i, j) * bb.get(j, c);
                        }
                    }
                    kvv.add(r, c, sum * dv);
                }
                let mut bt_ep = 0.0;
                let mut dr_b = 0.0;
                for i in 0..3 {
                    bt_ep += bb.get(i, r) * ep[i];
                    dr_b += dr_vol[i] * bb.get(i, r);
                }
                // G = -∫ ∂Nₐ/∂xₖ N_b dV is the row of B picked by the velocity component
                let k = r % 2;
                for b in 0..3 {
                    let nb = self.pps[p][b];
                    kvp.add(r, b, (-bb.get(k, r) + bt_ep) * nb * dv);
                    kpv.add(b, r, nb * dr_b * dv);
                }
            }
            for a in 0..3 {
                for b in 0..3 {
                    kpp.add(a, b, self.pps[p][a] * cvp * self.pps[p][b] * dv);
                }
            }
        }
        for r in 0..nv {
            for c in (r + 1)..nv {
                let mean = 0.5 * (kvv.get(r, c) + kvv.get(c, r));
                kvv.set(r, c, mean);
                kvv.set(c, r, mean);
            }
        }

        // boundary terms
        let mut bc_vv = Matrix::new(nv, nv);
        let mut bc_vp = Matrix::new(nv, 3);
        self.boundary_velocity_block(&mut bc_vv, ctx.thickness);
        self.boundary_pressure_block(&mut bc_vp, ctx.thickness);
        for i in 0..nv {
            for j in 0..nv {
                kvv.add(i, j, bc_vv.get(i, j));
            }
            for j in 0..3 {
                kvp.add(i, j, bc_vp.get(i, j));
            }
        }
        Ok(())
    }
}

impl FluidElementTrait for ElementBubbleTri3 {
    fn layout(&self) -> &DofLayout {
        &self.layout
    }

    fn characteristic_vector(&mut self, answer: &mut Vector, kind: CharVector, ctx: &FluidContext) -> Result<(), StrError> {
        let mut rv = Vector::new(2 * NV_NODE);
        let mut rp = Vector::new(3);
        match kind {
            CharVector::InternalForces => self.internal_forces(&mut rv, &mut rp, ctx)?,
            CharVector::ExternalForces => {
                for (edge, load) in &self.edges {
                    if let Load::Traction { tx, ty } = load {
                        let half = 0.5 * edge.length * ctx.thickness;
                        for a in edge.nodes {
                            rv[2 * a] += half * tx;
                            rv[2 * a + 1] += half * ty;
                        }
                    }
                }
                for load in &self.bodies {
                    if let Load::BodyForce { gx, gy } = load {
                        for (p, nn) in self.nns.iter().enumerate() {
                            let dv = self.weights[p] * ctx.thickness;
                            for a in 0..NV_NODE {
                                rv[2 * a] += self.model.density * gx * nn[a] * dv;
                                rv[2 * a + 1] += self.model.density * gy * nn[a] * dv;
                            }
                        }
                    }
                }
            }
            _ => return Err("unknown characteristic vector type"),
        }
        answer.fill(0.0);
        scatter_block_vector(answer, 1.0, &rv, &self.layout.velocity);
        scatter_block_vector(answer, 1.0, &rp, &self.layout.pressure);
        Ok(())
    }

    fn characteristic_matrix(&mut self, answer: &mut Matrix, kind: CharMatrix, ctx: &FluidContext) -> Result<(), StrError> {
        if kind != CharMatrix::TangentStiffness {
            return Err("unknown characteristic matrix type");
        }
        let nv = 2 * NV_NODE;
        let mut kvv = Matrix::new(nv, nv);
        let mut kvp = Matrix::new(nv, 3);
        let mut kpv = Matrix::new(3, nv);
        let mut kpp = Matrix::new(3, 3);
        self.tangent(&mut kvv, &mut kvp, &mut kpv, &mut kpp, ctx)?;
        let (vl, pl) = (&self.layout.velocity, &self.layout.pressure);
        answer.fill(0.0);
        scatter_block_matrix(answer, 1.0, &kvv, vl, vl);
        scatter_block_matrix(answer, 1.0, &kvp, vl, pl);
        scatter_block_matrix(answer, 1.0, &kpv, pl, vl);
        scatter_block_matrix(answer, 1.0, &kpp, pl, pl);
        Ok(())
    }

    fn update_stabilization(&mut self, _ctx: &FluidContext) -> Result<(), StrError> {
        // the bubble stabilizes the element
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
        for p in 0..self.statuses.len() {
            let eps = self.strain_rate(p, ctx.uu);
            let status = &mut self.statuses[p];
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

#[cfg(test)]
mod tests {
    use super::ElementBubbleTri3;
    use crate::base::{CharMatrix, CharVector, Elem, Load, Natural, ParamFluid, SampleMeshes};
    use crate::fem::{DofLayout, FluidContext, FluidElementTrait};
    use russell_lab::{approx_eq, deriv1_central5, mat_approx_eq, vec_approx_eq, Matrix, Vector};

    fn new_element(param: &ParamFluid, natural: &Natural) -> ElementBubbleTri3 {
        let mesh = SampleMeshes::one_tri3();
        let layout = DofLayout::new(&Elem::BubbleTri3(*param)).unwrap();
        ElementBubbleTri3::new(&mesh, &mesh.cells[0], param, layout, natural).unwrap()
    }

    struct Args {
        uu: Vector,
        pp: Vector,
        uu_prev: Vector,
        residual: Vector,
    }

    fn tangent(element: &mut ElementBubbleTri3, uu: &Vector, pp: &Vector) -> Matrix {
        let uu_prev = Vector::new(8);
        let ctx = FluidContext {
            advection: false,
            transient: false,
            dt: 1.0,
            thickness: 1.0,
            uu,
            pp,
            uu_prev: &uu_prev,
        };
        let mut kk = Matrix::new(11, 11);
        element
            .characteristic_matrix(&mut kk, CharMatrix::TangentStiffness, &ctx)
            .unwrap();
        kk
    }

    #[test]
    fn unknown_requests_are_rejected() {
        let mut element = new_element(&ParamFluid::sample_newtonian(), &Natural::new());
        let (uu, pp) = (Vector::new(8), Vector::new(3));
        let ctx = FluidContext {
            advection: false,
            transient: false,
            dt: 1.0,
            thickness: 1.0,
            uu: &uu,
            pp: &pp,
            uu_prev: &uu,
        };
        let mut r = Vector::new(11);
        let mut kk = Matrix::new(11, 11);
        assert_eq!(
            element.characteristic_vector(&mut r, CharVector::LumpedMass, &ctx).err(),
            Some("unknown characteristic vector type")
        );
        assert_eq!(
            element.characteristic_matrix(&mut kk, CharMatrix::Mass, &ctx).err(),
            Some("unknown characteristic matrix type")
        );
    }

    #[test]
    fn tangent_matches_numerical_derivative() {
        let mut natural = Natural::new();
        natural
            .on_side(0, 0, Load::SlipWithFriction { beta: 3.0 })
            .unwrap()
            .on_side(0, 1, Load::OutFlow)
            .unwrap()
            .on_body(1, Load::HomogenizedReinforce { kx: 2.0, ky: 4.0 })
            .unwrap();
        for param in [ParamFluid::sample_newtonian(), ParamFluid::sample_power_law()] {
            let mut element = new_element(&param, &natural);
            let mut args = Args {
                uu: Vector::from(&[0.3, -0.2, 0.5, 0.1, -0.4, 0.6, 0.2, -0.1]),
                pp: Vector::from(&[1.0, -0.5, 0.25]),
                uu_prev: Vector::new(8),
                residual: Vector::new(11),
            };
            let kk = tangent(&mut element, &args.uu.clone(), &args.pp.clone());
            let layout = element.layout().clone();
            let mut num = Matrix::new(11, 11);
            for j in 0..11 {
                let velocity = layout.velocity.iter().position(|m| *m == j);
                let pressure = layout.pressure.iter().position(|m| *m == j);
                for i in 0..11 {
                    let at = match velocity {
                        Some(pos) => args.uu[pos],
                        None => args.pp[pressure.unwrap()],
                    };
                    let res = deriv1_central5(at, &mut args, |x, a| {
                        let original = at;
                        match velocity {
                            Some(pos) => a.uu[pos] = x,
                            None => a.pp[pressure.unwrap()] = x,
                        }
                        let ctx = FluidContext {
                            advection: false,
                            transient: false,
                            dt: 1.0,
                            thickness: 1.0,
                            uu: &a.uu,
                            pp: &a.pp,
                            uu_prev: &a.uu_prev,
                        };
                        element
                            .characteristic_vector(&mut a.residual, CharVector::InternalForces, &ctx)
                            .unwrap();
                        match velocity {
                            Some(pos) => a.uu[pos] = original,
                            None => a.pp[pressure.unwrap()] = original,
                        }
                        Ok(a.residual[i])
                    })
                    .unwrap();
                    num.set(i, j, res);
                }
            }
            mat_approx_eq(&kk, &num, 1e-7);
        }
    }

    #[test]
    fn tangent_is_symmetric() {
        let mut element = new_element(&ParamFluid::sample_power_law(), &Natural::new());
        let uu = Vector::from(&[0.3, -0.2, 0.5, 0.1, -0.4, 0.6, 0.2, -0.1]);
        let pp = Vector::from(&[1.0, 2.0, 3.0]);
        let kk = tangent(&mut element, &uu, &pp);
        for i in 0..11 {
            for j in 0..11 {
                approx_eq(kk.get(i, j), kk.get(j, i), 1e-14);
            }
        }
        // incompressible: no pressure-pressure coupling
        for i in [2, 5, 8] {
            for j in [2, 5, 8] {
                assert_eq!(kk.get(i, j), 0.0);
            }
        }
    }

    #[test]
    fn uniform_flow_produces_no_internal_forces() {
        let mut element = new_element(&ParamFluid::sample_newtonian(), &Natural::new());
        let (uu, pp) = (
            Vector::from(&[1.0, -2.0, 1.0, -2.0, 1.0, -2.0, 0.0, 0.0]),
            Vector::new(3),
        );
        let ctx = FluidContext {
            advection: false,
            transient: false,
            dt: 1.0,
            thickness: 1.0,
            uu: &uu,
            pp: &pp,
            uu_prev: &uu,
        };
        let mut r = Vector::new(11);
        element
            .characteristic_vector(&mut r, CharVector::InternalForces, &ctx)
            .unwrap();
        vec_approx_eq(&r, &[0.0; 11], 1e-15);
    }

    #[test]
    fn body_force_is_distributed_to_the_bubble() {
        let mut natural = Natural::new();
        natural.on_body(1, Load::BodyForce { gx: 0.0, gy: -10.0 }).unwrap();
        let mut element = new_element(&ParamFluid::sample_newtonian(), &natural);
        let (uu, pp) = (Vector::new(8), Vector::new(3));
        let ctx = FluidContext {
            advection: false,
            transient: false,
            dt: 1.0,
            thickness: 1.0,
            uu: &uu,
            pp: &pp,
            uu_prev: &uu,
        };
        let mut f = Vector::new(11);
        element
            .characteristic_vector(&mut f, CharVector::ExternalForces, &ctx)
            .unwrap();
        // ∫ Nₐ dA = A/3 for the corners and ∫ 27 L₀L₁L₂ dA = 9A/20 for the bubble (A = 1/2)
        approx_eq(f[1], -10.0 / 6.0, 1e-13);
        approx_eq(f[4], -10.0 / 6.0, 1e-13);
        approx_eq(f[7], -10.0 / 6.0, 1e-13);
        approx_eq(f[10], -10.0 * 9.0 / 40.0, 1e-13);
        assert_eq!(f[9], 0.0);
        assert_eq!(f[2], 0.0);
    }

    #[test]
    fn update_internal_state_and_context_work() {
        let mut element = new_element(&ParamFluid::sample_newtonian(), &Natural::new());
        let uu = Vector::from(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let pp = Vector::new(3);
        let ctx = FluidContext {
            advection: false,
            transient: false,
            dt: 1.0,
            thickness: 1.0,
            uu: &uu,
            pp: &pp,
            uu_prev: &uu,
        };
        element.update_internal_state(&ctx).unwrap();
        // vy1 = 1 gives γ̇xy = ∂N₁/∂x = 1 → σxy = μ
        for status in &element.statuses {
            vec_approx_eq(&status.committed().stress, &[0.0, 0.0, 1.0], 1e-15);
        }
        assert_eq!(element.critical_time_step(&ctx), 0.5);

        let mut buffer: Vec<u8> = Vec::new();
        element.save_context(&mut buffer).unwrap();
        let mut other = new_element(&ParamFluid::sample_newtonian(), &Natural::new());
        other.restore_context(&mut buffer.as_slice()).unwrap();
        assert_eq!(
            other.statuses[6].committed().stress.as_data(),
            element.statuses[6].committed().stress.as_data()
        );
    }
}
