use super::{LinearSystem, ShapeTri3};
use crate::base::{assemble_vector, Attributes, Elem, Equations};
use crate::material::{restore_context, save_context, DamageMaterial, DamageStatus, NonlocalPoint};
use crate::StrError;
use gemlab::mesh::{Cell, Mesh};
use gemlab::shapes::GeoKind;
use russell_lab::{Matrix, Vector};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Holds the structural integration points taking part in the nonlocal averaging
///
/// Each `Lin2` bar (1D mesh) or `Tri3` plane-stress cell (2D mesh) contributes one
/// (constant-strain) integration point located at its center.
pub struct NonlocalDomain {
    /// Holds the geometric data of all integration points
    pub points: Vec<NonlocalPoint>,

    /// Holds the state of all integration points
    pub statuses: Vec<DamageStatus>,

    /// Holds one material per cell attribute
    pub materials: Vec<DamageMaterial>,
}

/// Computes the integration point of a bar
fn bar_point(mesh: &Mesh, cell: &Cell, area: f64) -> Result<(Vec<f64>, f64, Matrix), StrError> {
    if cell.kind != GeoKind::Lin2 {
        return Err("bar elements require Lin2 cells");
    }
    if mesh.ndim != 1 {
        return Err("bar elements require a one-dimensional mesh");
    }
    let (a, b) = (cell.points[0], cell.points[1]);
    if a >= mesh.points.len() || b >= mesh.points.len() {
        return Err("cell has a point id out of bounds");
    }
    let (xa, xb) = (mesh.points[a].coords[0], mesh.points[b].coords[0]);
    let length = xb - xa;
    if length <= 0.0 {
        return Err("cell has zero or negative length");
    }
    let bb = Matrix::from(&[[-1.0 / length, 1.0 / length]]);
    Ok((vec![0.5 * (xa + xb)], length * area, bb))
}

/// Computes the integration point of a plane-stress triangle
fn plane_stress_point(mesh: &Mesh, cell: &Cell, thickness: f64) -> Result<(Vec<f64>, f64, Matrix), StrError> {
    if mesh.ndim != 2 {
        return Err("plane-stress elements require a two-dimensional mesh");
    }
    let shape = ShapeTri3::from_cell(mesh, cell)?;
    let mut bb = Matrix::new(3, 6);
    for m in 0..3 {
        let (dx, dy) = (shape.gradient.get(m, 0), shape.gradient.get(m, 1));
        bb.set(0, 2 * m, dx);
        bb.set(1, 2 * m + 1, dy);
        bb.set(2, 2 * m, dy);
        bb.set(2, 2 * m + 1, dx);
    }
    let x = shape.position(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
    Ok((x.to_vec(), shape.area * thickness, bb))
}

impl NonlocalDomain {
    /// Allocates a new instance
    pub fn new(mesh: &Mesh, attributes: &Attributes, equations: &Equations) -> Result<Self, StrError> {
        let mut material_ids = BTreeMap::new();
        let mut materials = Vec::new();
        let mut points = Vec::new();
        let mut statuses = Vec::new();
        for cell in &mesh.cells {
            let elem = attributes.get(cell)?;
            let (param, ndim) = match elem {
                Elem::Bar(param) => (param, 1),
                Elem::PlaneStress(param) => (param, 2),
                _ => return Err("element is not a structural element"),
            };
            let (coords, volume, bb) = match elem {
                Elem::Bar(..) => bar_point(mesh, cell, param.area)?,
                _ => plane_stress_point(mesh, cell, param.area)?,
            };
            let material = match material_ids.get(&cell.attribute) {
                Some(index) => *index,
                None => {
                    materials.push(DamageMaterial::new(param, ndim)?);
                    material_ids.insert(cell.attribute, materials.len() - 1);
                    materials.len() - 1
                }
            };
            let l2g = match equations.cells.get(cell.id) {
                Some(l2g) if l2g.len() == bb.dims().1 => l2g.clone(),
                _ => return Err("local-to-global map is inconsistent with the element"),
            };
            statuses.push(DamageStatus::new(bb.dims().0));
            points.push(NonlocalPoint {
                coords,
                volume,
                material,
                bb,
                l2g,
            });
        }
        Ok(NonlocalDomain {
            points,
            statuses,
            materials,
        })
    }

    /// Returns the number of integration points
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Returns the supremum of the number of nonzero values of the (non-symmetric) tangent
    ///
    /// Each point contributes its local block and one coupling block per neighbor
    /// within the support of the weight function.
    pub fn nnz_sup(&self) -> usize {
        let mut nnz = 0;
        for p in &self.points {
            let n = p.l2g.len();
            nnz += n * n;
            if let Some(model) = self.materials[p.material].as_nonlocal() {
                let support = model.support_radius();
                for q in &self.points {
                    let mut sum = 0.0;
                    for i in 0..p.coords.len() {
                        sum += (q.coords[i] - p.coords[i]) * (q.coords[i] - p.coords[i]);
                    }
                    if f64::sqrt(sum) < support {
                        nnz += n * q.l2g.len();
                    }
                }
            }
        }
        nnz
    }

    /// Computes the strain at a point from the global displacements
    fn strain(&self, p: usize, uu: &Vector) -> Vector {
        let point = &self.points[p];
        let (nrow, ncol) = point.bb.dims();
        let mut strain = Vector::new(nrow);
        for i in 0..nrow {
            for j in 0..ncol {
                strain[i] += point.bb.get(i, j) * uu[point.l2g[j]];
            }
        }
        strain
    }

    /// Updates the trial strain and the local variable of all points
    pub fn update_local(&mut self, uu: &Vector) -> Result<(), StrError> {
        for p in 0..self.points.len() {
            let strain = self.strain(p, uu);
            let material = &self.materials[self.points[p].material];
            material.update_before_nonlocal_average(p, &strain, &self.points, &mut self.statuses)?;
        }
        Ok(())
    }

    /// Updates the damage and the stress of all points
    ///
    /// [NonlocalDomain::update_local] must be called beforehand.
    pub fn update_stress(&mut self) -> Result<(), StrError> {
        for p in 0..self.points.len() {
            let material = &self.materials[self.points[p].material];
            material.update_stress(p, &self.points, &mut self.statuses)?;
        }
        Ok(())
    }

    /// Updates the trial state of all points (local step followed by the nonlocal averaging)
    pub fn update_state(&mut self, uu: &Vector) -> Result<(), StrError> {
        self.update_local(uu)?;
        self.update_stress()
    }

    /// Assembles the internal forces vector
    ///
    /// The global vector is cleared (with zeros) at the beginning.
    pub fn assemble_internal_forces(&self, ff_int: &mut Vector, prescribed: &[bool]) {
        ff_int.fill(0.0); // << important
        for (point, status) in self.points.iter().zip(&self.statuses) {
            let stress = &status.state.trial().stress;
            let (nrow, ncol) = point.bb.dims();
            let mut local = Vector::new(ncol);
            for j in 0..ncol {
                for i in 0..nrow {
                    local[j] += point.bb.get(i, j) * stress[i] * point.volume;
                }
            }
            assemble_vector(ff_int, &local, &point.l2g, prescribed);
        }
    }

    /// Assembles the secant stiffness (1 - ω) Bᵀ De B V of all points
    ///
    /// **Note:** The global matrix must be reset beforehand
    pub fn assemble_secant_stiffness(&self, lin_sys: &mut LinearSystem, prescribed: &[bool]) -> Result<(), StrError> {
        for (point, status) in self.points.iter().zip(&self.statuses) {
            let dd = self.materials[point.material].local().elastic.modulus();
            let factor = (1.0 - status.state.trial().damage) * point.volume;
            let (nrow, ncol) = point.bb.dims();
            let mut db = Matrix::new(nrow, ncol);
            for i in 0..nrow {
                for j in 0..ncol {
                    for k in 0..nrow {
                        db.add(i, j, dd.get(i, k) * point.bb.get(k, j));
                    }
                }
            }
            let mut kk_local = Matrix::new(ncol, ncol);
            for i in 0..ncol {
                for j in 0..ncol {
                    for k in 0..nrow {
                        kk_local.add(i, j, factor * point.bb.get(k, i) * db.get(k, j));
                    }
                }
            }
            lin_sys.assemble(&kk_local, &point.l2g, &point.l2g, prescribed)?;
        }
        Ok(())
    }

    /// Assembles the nonlocal coupling of all points with a nonlocal material
    pub fn assemble_nonlocal_stiffness(&mut self, lin_sys: &mut LinearSystem, prescribed: &[bool]) -> Result<(), StrError> {
        let kk = lin_sys.kk.get_coo_mut()?;
        for p in 0..self.points.len() {
            if let Some(model) = self.materials[self.points[p].material].as_nonlocal() {
                model.add_ip_contribution(kk, p, &self.points, &mut self.statuses, &self.materials, prescribed)?;
            }
        }
        Ok(())
    }

    /// Commits the trial state of all points
    pub fn commit(&mut self) {
        self.statuses.iter_mut().for_each(|s| s.state.commit());
    }

    /// Returns the committed damage of all points
    pub fn damage(&self) -> Vec<f64> {
        self.statuses.iter().map(|s| s.state.committed().damage).collect()
    }

    /// Writes the state of all points to a stream
    pub fn save_context(&self, writer: &mut dyn Write) -> Result<(), StrError> {
        let mut w = writer;
        save_context(&self.statuses, &mut w)
    }

    /// Reads the state of all points from a stream
    pub fn restore_context(&mut self, reader: &mut dyn Read) -> Result<(), StrError> {
        let mut r = reader;
        let statuses: Vec<DamageStatus> = restore_context(&mut r)?;
        if statuses.len() != self.statuses.len() {
            return Err("cannot read context");
        }
        self.statuses = statuses;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
