use super::ShapeTri3;
use crate::base::TimeStep;
use crate::StrError;
use gemlab::mesh::Mesh;
use gemlab::shapes::GeoKind;

/// Maximum admissible value of the global mesh quality metric before remeshing
pub const MAX_MESH_DEFORMATION: f64 = 25.0;

/// Holds the state reported by a mesh topology after a step
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TopologyState {
    /// The mesh can be used in the next step
    Ok,

    /// The mesh must be replaced before the next step
    NeedsRemeshing,
}

/// Defines a provider of meshes (e.g., a free-surface tracker or a remesher)
pub trait MeshTopology {
    /// Returns the number of elements of the current topology (zero means not yet meshed)
    fn n_elements(&self) -> usize;

    /// Generates a new finite element mesh
    fn replace_fe_mesh(&mut self) -> Result<Mesh, StrError>;

    /// Updates the topology at the end of a converged step
    fn update_yourself(&mut self, step: &TimeStep) -> TopologyState;
}

/// Estimates the quality of a triangular mesh
///
/// The global metric is the largest radius ratio `R/(2r)` among all Tri3 cells; it equals
/// one for a mesh of equilateral triangles and grows without bounds as cells degenerate.
/// Cells of other kinds are ignored.
pub struct MeshQualityEstimator {
    /// Holds the last computed global metric
    pub last_error: f64,
}

impl MeshQualityEstimator {
    /// Allocates a new instance
    pub fn new() -> Self {
        MeshQualityEstimator { last_error: 0.0 }
    }

    /// Computes the global quality metric of the mesh
    pub fn global_error(&mut self, mesh: &Mesh) -> f64 {
        let mut worst: f64 = 0.0;
        for cell in &mesh.cells {
            if cell.kind != GeoKind::Tri3 {
                continue;
            }
            let mut xx = [[0.0; 2]; 3];
            for m in 0..3 {
                match mesh.points.get(cell.points[m]) {
                    Some(point) => xx[m] = [point.coords[0], point.coords[1]],
                    None => return f64::INFINITY,
                }
            }
            worst = f64::max(worst, ShapeTri3::radius_ratio(&xx));
        }
        self.last_error = worst;
        worst
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{MeshQualityEstimator, MAX_MESH_DEFORMATION};
    use crate::base::SampleMeshes;
    use russell_lab::approx_eq;

    #[test]
    fn global_error_works() {
        let mut estimator = MeshQualityEstimator::new();
        let mesh = SampleMeshes::two_tri3();
        let error = estimator.global_error(&mesh);
        approx_eq(error, (1.0 + f64::sqrt(2.0)) / 2.0, 1e-14);
        assert_eq!(estimator.last_error, error);
        assert!(error < MAX_MESH_DEFORMATION);

        // squash the top of the square
        let mut mesh = SampleMeshes::two_tri3();
        mesh.points[2].coords[1] = 0.001;
        mesh.points[3].coords[1] = 0.001;
        assert!(estimator.global_error(&mesh) > MAX_MESH_DEFORMATION);

        // bars are ignored
        let mesh = SampleMeshes::bar_lin2(2, 1.0);
        assert_eq!(estimator.global_error(&mesh), 0.0);
    }
}
