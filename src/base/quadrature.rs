use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the data of one integration (Gauss) point
///
/// The coordinates are area (barycentric) coordinates for triangles and `(s, 1-s, 0)`
/// for lines, with `s ∈ [0, 1]`. The weights sum up to one; thus they must be multiplied
/// by the area (or length) of the element.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct IntegPoint {
    pub coords: [f64; 3],
    pub weight: f64,
}

/// Returns the integration points for triangles
///
/// The available rules integrate exactly polynomials of degree 1 (1 point), 2 (3 points), and 5 (7 points).
pub fn integ_points_tri(n_integ_point: usize) -> Result<Vec<IntegPoint>, StrError> {
    match n_integ_point {
        1 => Ok(vec![IntegPoint {
            coords: [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            weight: 1.0,
        }]),
        3 => {
            let (a, b) = (2.0 / 3.0, 1.0 / 6.0);
            Ok(vec![
                IntegPoint { coords: [a, b, b], weight: 1.0 / 3.0 },
                IntegPoint { coords: [b, a, b], weight: 1.0 / 3.0 },
                IntegPoint { coords: [b, b, a], weight: 1.0 / 3.0 },
            ])
        }
        7 => {
            // Dunavant (1985)
            let (a1, b1, w1) = (0.059715871789770, 0.470142064105115, 0.132394152788506);
            let (a2, b2, w2) = (0.797426985353087, 0.101286507323456, 0.125939180544827);
            let c = 1.0 / 3.0;
            Ok(vec![
                IntegPoint { coords: [c, c, c], weight: 0.225 },
                IntegPoint { coords: [a1, b1, b1], weight: w1 },
                IntegPoint { coords: [b1, a1, b1], weight: w1 },
                IntegPoint { coords: [b1, b1, a1], weight: w1 },
                IntegPoint { coords: [a2, b2, b2], weight: w2 },
                IntegPoint { coords: [b2, a2, b2], weight: w2 },
                IntegPoint { coords: [b2, b2, a2], weight: w2 },
            ])
        }
        _ => Err("requested number of integration points is not available for Tri class"),
    }
}

/// Returns the integration points for lines
pub fn integ_points_lin(n_integ_point: usize) -> Result<Vec<IntegPoint>, StrError> {
    match n_integ_point {
        1 => Ok(vec![IntegPoint {
            coords: [0.5, 0.5, 0.0],
            weight: 1.0,
        }]),
        2 => {
            let d = 0.5 / f64::sqrt(3.0);
            Ok(vec![
                IntegPoint { coords: [0.5 - d, 0.5 + d, 0.0], weight: 0.5 },
                IntegPoint { coords: [0.5 + d, 0.5 - d, 0.0], weight: 0.5 },
            ])
        }
        _ => Err("requested number of integration points is not available for Lin class"),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{integ_points_lin, integ_points_tri};
    use russell_lab::approx_eq;

    #[test]
    fn captures_errors() {
        assert_eq!(
            integ_points_tri(2).err(),
            Some("requested number of integration points is not available for Tri class")
        );
        assert_eq!(
            integ_points_lin(3).err(),
            Some("requested number of integration points is not available for Lin class")
        );
    }

    #[test]
    fn weights_sum_to_one() {
        for n in [1, 3, 7] {
            let points = integ_points_tri(n).unwrap();
            let sum: f64 = points.iter().map(|p| p.weight).sum();
            approx_eq(sum, 1.0, 1e-14);
            for p in &points {
                approx_eq(p.coords[0] + p.coords[1] + p.coords[2], 1.0, 1e-14);
            }
        }
        for n in [1, 2] {
            let sum: f64 = integ_points_lin(n).unwrap().iter().map(|p| p.weight).sum();
            approx_eq(sum, 1.0, 1e-15);
        }
    }

    #[test]
    fn tri_rules_integrate_polynomials() {
        // ∫ L1^a L2^b L3^c dA = 2 A a! b! c! / (a+b+c+2)!  →  with A = 1/2 and normalized weights: 2 a! b! c! / (a+b+c+2)!
        let fact = |n: u32| (1..=n).fold(1.0, |acc, k| acc * k as f64);
        let exact = |a: u32, b: u32, c: u32| 2.0 * fact(a) * fact(b) * fact(c) / fact(a + b + c + 2);
        let integrate = |n: usize, a: i32, b: i32, c: i32| {
            integ_points_tri(n)
                .unwrap()
                .iter()
                .map(|p| p.weight * p.coords[0].powi(a) * p.coords[1].powi(b) * p.coords[2].powi(c))
                .sum::<f64>()
        };
        approx_eq(integrate(1, 1, 0, 0), exact(1, 0, 0), 1e-15);
        approx_eq(integrate(3, 1, 1, 0), exact(1, 1, 0), 1e-15);
        approx_eq(integrate(3, 2, 0, 0), exact(2, 0, 0), 1e-15);
        approx_eq(integrate(7, 2, 2, 1), exact(2, 2, 1), 1e-14);
        approx_eq(integrate(7, 4, 0, 0), exact(4, 0, 0), 1e-14);
        approx_eq(integrate(7, 1, 1, 1), exact(1, 1, 1), 1e-14);
    }

    #[test]
    fn lin_rules_integrate_polynomials() {
        // ∫₀¹ s³ ds = 1/4
        let sum: f64 = integ_points_lin(2)
            .unwrap()
            .iter()
            .map(|p| p.weight * p.coords[0].powi(3))
            .sum();
        approx_eq(sum, 0.25, 1e-15);
    }
}
