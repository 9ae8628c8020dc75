use gemlab::mesh::{Cell, Mesh, Point};
use gemlab::shapes::GeoKind;

/// Holds sample meshes for tests and demonstrations
pub struct SampleMeshes {}

impl SampleMeshes {
    /// Returns a mesh with one Tri3 (right triangle with unit legs)
    #[rustfmt::skip]
    pub fn one_tri3() -> Mesh {
        // 1.0  2
        //      |`.
        //      |  `.
        //      | [0]`.
        // 0.0  0------1
        //     0.0    1.0
        Mesh {
            ndim: 2,
            points: vec![
                Point { id: 0, marker: 0, coords: vec![0.0, 0.0] },
                Point { id: 1, marker: 0, coords: vec![1.0, 0.0] },
                Point { id: 2, marker: 0, coords: vec![0.0, 1.0] },
            ],
            cells: vec![
                Cell { id: 0, attribute: 1, kind: GeoKind::Tri3, points: vec![0, 1, 2] },
            ],
        }
    }

    /// Returns a unit square divided into two Tri3
    #[rustfmt::skip]
    pub fn two_tri3() -> Mesh {
        //      y
        //      ^
        // 1.0  3------------2
        //      |`.      [1] |    [#] indicates id
        //      |  `.    (1) |    (#) indicates attribute
        //      |    `.      |
        //      |      `.    |
        //      | [0]    `.  |
        //      | (1)      `.|
        // 0.0  0------------1 -> x
        //     0.0          1.0
        Mesh {
            ndim: 2,
            points: vec![
                Point { id: 0, marker: 0, coords: vec![0.0, 0.0] },
                Point { id: 1, marker: 0, coords: vec![1.0, 0.0] },
                Point { id: 2, marker: 0, coords: vec![1.0, 1.0] },
                Point { id: 3, marker: 0, coords: vec![0.0, 1.0] },
            ],
            cells: vec![
                Cell { id: 0, attribute: 1, kind: GeoKind::Tri3, points: vec![0, 1, 3] },
                Cell { id: 1, attribute: 1, kind: GeoKind::Tri3, points: vec![2, 3, 1] },
            ],
        }
    }

    /// Returns a structured mesh of Tri3 over the rectangle [0,lx] × [0,ly]
    ///
    /// Each of the nx × ny quadrilaterals is split along its (0,0)-(1,1) diagonal.
    /// Points are numbered row by row from the bottom; thus, the point at (i, j) has
    /// id = j (nx + 1) + i. All cells have attribute 1.
    pub fn rectangle_tri3(nx: usize, ny: usize, lx: f64, ly: f64) -> Mesh {
        let mut points = Vec::new();
        for j in 0..(ny + 1) {
            for i in 0..(nx + 1) {
                let id = points.len();
                let x = lx * (i as f64) / (nx as f64);
                let y = ly * (j as f64) / (ny as f64);
                points.push(Point {
                    id,
                    marker: 0,
                    coords: vec![x, y],
                });
            }
        }
        let mut cells = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let p0 = j * (nx + 1) + i;
                let p1 = p0 + 1;
                let p2 = p1 + nx + 1;
                let p3 = p0 + nx + 1;
                for pp in [vec![p0, p1, p2], vec![p0, p2, p3]] {
                    let id = cells.len();
                    cells.push(Cell {
                        id,
                        attribute: 1,
                        kind: GeoKind::Tri3,
                        points: pp,
                    });
                }
            }
        }
        Mesh { ndim: 2, points, cells }
    }

    /// Returns a one-dimensional mesh of n Lin2 cells over [0, length]
    ///
    /// All cells have attribute 1.
    pub fn bar_lin2(ncell: usize, length: f64) -> Mesh {
        let points = (0..(ncell + 1))
            .map(|id| Point {
                id,
                marker: 0,
                coords: vec![length * (id as f64) / (ncell as f64)],
            })
            .collect();
        let cells = (0..ncell)
            .map(|id| Cell {
                id,
                attribute: 1,
                kind: GeoKind::Lin2,
                points: vec![id, id + 1],
            })
            .collect();
        Mesh { ndim: 1, points, cells }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SampleMeshes;
    use gemlab::shapes::GeoKind;

    #[test]
    fn rectangle_tri3_works() {
        let mesh = SampleMeshes::rectangle_tri3(2, 1, 2.0, 1.0);
        assert_eq!(mesh.points.len(), 6);
        assert_eq!(mesh.cells.len(), 4);
        assert_eq!(mesh.cells[0].points, &[0, 1, 4]);
        assert_eq!(mesh.cells[1].points, &[0, 4, 3]);
        assert_eq!(mesh.cells[3].points, &[1, 5, 4]);
        assert_eq!(mesh.points[5].coords, &[2.0, 1.0]);
        assert_eq!(mesh.cells[2].kind, GeoKind::Tri3);
    }

    #[test]
    fn bar_lin2_works() {
        let mesh = SampleMeshes::bar_lin2(4, 2.0);
        assert_eq!(mesh.ndim, 1);
        assert_eq!(mesh.points.len(), 5);
        assert_eq!(mesh.points[3].coords, &[1.5]);
        assert_eq!(mesh.cells[3].points, &[3, 4]);
        assert_eq!(mesh.cells[3].kind, GeoKind::Lin2);
    }
}
