use super::InputRecord;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines boundary (edge) and body loads acting on fluid elements
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum Load {
    /// Prescribed traction on an edge (tx, ty)
    Traction { tx: f64, ty: f64 },

    /// Slip with friction on an edge: tangential traction = -β u·t
    SlipWithFriction { beta: f64 },

    /// Penetration with resistance on an edge: normal traction = -(1/α) u·n
    PenetrationWithResistance { alpha: f64 },

    /// Outflow edge where the pressure boundary integral is kept
    OutFlow,

    /// Body force per unit mass (e.g., gravity)
    BodyForce { gx: f64, gy: f64 },

    /// Homogenized reinforcement (Brinkman drag μ/k) with permeabilities (kx, ky)
    HomogenizedReinforce { kx: f64, ky: f64 },
}

impl Load {
    /// Returns whether the load acts on the body (area) or on edges
    pub fn is_body_load(&self) -> bool {
        match self {
            Load::BodyForce { .. } | Load::HomogenizedReinforce { .. } => true,
            _ => false,
        }
    }
}

/// Holds natural boundary conditions (edge loads) and body loads of fluid elements
///
/// Edges of triangles are numbered as: side 0 → (0,1), side 1 → (1,2), side 2 → (2,0).
pub struct Natural {
    /// Edge loads: (CellId, side, load)
    pub edges: Vec<(usize, usize, Load)>,

    /// Body loads: (CellAttribute, load)
    pub bodies: Vec<(usize, Load)>,
}

impl Natural {
    /// Allocates a new instance
    pub fn new() -> Self {
        Natural {
            edges: Vec::new(),
            bodies: Vec::new(),
        }
    }

    /// Sets a load on the side of a cell
    pub fn on_side(&mut self, cell_id: usize, side: usize, load: Load) -> Result<&mut Self, StrError> {
        if side > 2 {
            return Err("side index must be 0, 1, or 2");
        }
        if load.is_body_load() {
            return Err("body load cannot be applied to a side");
        }
        self.edges.push((cell_id, side, load));
        Ok(self)
    }

    /// Sets a load on all cells with a given attribute
    pub fn on_body(&mut self, attribute: usize, load: Load) -> Result<&mut Self, StrError> {
        if !load.is_body_load() {
            return Err("edge load cannot be applied to a body");
        }
        self.bodies.push((attribute, load));
        Ok(self)
    }

    /// Reads the boundary sides and codes of a cell from an input record
    ///
    /// The record contains the lists `bsides` (side indices) and `bcodes` (indices into
    /// `table`, the list of boundary loads). Both lists must have the same length.
    pub fn sides_from_input_record(
        &mut self,
        cell_id: usize,
        ir: &InputRecord,
        table: &[Load],
    ) -> Result<&mut Self, StrError> {
        let sides = ir.optional_int_array("bsides")?;
        if sides.is_empty() {
            return Ok(self);
        }
        if !ir.contains("bcodes") {
            return Err("bcodes must be given together with bsides");
        }
        let codes = ir.get_int_array("bcodes")?;
        if codes.len() != sides.len() {
            return Err("bcodes must have the same size as bsides");
        }
        for (side, code) in sides.iter().zip(codes.iter()) {
            if *side < 0 || *code < 0 || *code as usize >= table.len() {
                return Err("invalid boundary side or code");
            }
            self.on_side(cell_id, *side as usize, table[*code as usize])?;
        }
        Ok(self)
    }

    /// Returns the loads acting on the sides of a cell
    pub fn cell_edges(&self, cell_id: usize) -> Vec<(usize, Load)> {
        self.edges
            .iter()
            .filter(|(id, _, _)| *id == cell_id)
            .map(|(_, side, load)| (*side, *load))
            .collect()
    }

    /// Returns the loads acting on cells with the given attribute
    pub fn cell_bodies(&self, attribute: usize) -> Vec<Load> {
        self.bodies
            .iter()
            .filter(|(att, _)| *att == attribute)
            .map(|(_, load)| *load)
            .collect()
    }
}

impl fmt::Display for Natural {
    /// Prints a formatted summary of Boundary Conditions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge loads\n").unwrap();
        write!(f, "==========\n").unwrap();
        for (cell_id, side, load) in &self.edges {
            write!(f, "{:?}/{:?} : {:?}\n", cell_id, side, load).unwrap();
        }
        write!(f, "\nBody loads\n").unwrap();
        write!(f, "==========\n").unwrap();
        for (attribute, load) in &self.bodies {
            write!(f, "{:?} : {:?}\n", attribute, load).unwrap();
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Load, Natural};
    use crate::base::InputRecord;

    #[test]
    fn natural_works() {
        let mut natural = Natural::new();
        natural
            .on_side(0, 2, Load::OutFlow)
            .unwrap()
            .on_side(1, 0, Load::Traction { tx: 1.0, ty: 0.0 })
            .unwrap()
            .on_body(1, Load::BodyForce { gx: 0.0, gy: -10.0 })
            .unwrap();
        assert_eq!(natural.cell_edges(0), vec![(2, Load::OutFlow)]);
        assert_eq!(natural.cell_edges(2).len(), 0);
        assert_eq!(natural.cell_bodies(1), vec![Load::BodyForce { gx: 0.0, gy: -10.0 }]);
        assert_eq!(
            format!("{}", natural),
            "Edge loads\n\
             ==========\n\
             0/2 : OutFlow\n\
             1/0 : Traction { tx: 1.0, ty: 0.0 }\n\
             \n\
             Body loads\n\
             ==========\n\
             1 : BodyForce { gx: 0.0, gy: -10.0 }\n"
        );
    }

    #[test]
    fn setters_capture_errors() {
        let mut natural = Natural::new();
        assert_eq!(
            natural.on_side(0, 3, Load::OutFlow).err(),
            Some("side index must be 0, 1, or 2")
        );
        assert_eq!(
            natural.on_side(0, 0, Load::BodyForce { gx: 0.0, gy: 0.0 }).err(),
            Some("body load cannot be applied to a side")
        );
        assert_eq!(
            natural.on_body(1, Load::OutFlow).err(),
            Some("edge load cannot be applied to a body")
        );
    }

    #[test]
    fn sides_from_input_record_works() {
        let table = [Load::OutFlow, Load::SlipWithFriction { beta: 2.0 }];
        let mut natural = Natural::new();
        let ir = InputRecord::from_json(r#"{"bsides": [1, 2], "bcodes": [1, 0]}"#).unwrap();
        natural.sides_from_input_record(4, &ir, &table).unwrap();
        assert_eq!(
            natural.cell_edges(4),
            vec![(1, Load::SlipWithFriction { beta: 2.0 }), (2, Load::OutFlow)]
        );

        let ir = InputRecord::from_json(r#"{"mu": 1.0}"#).unwrap();
        natural.sides_from_input_record(5, &ir, &table).unwrap();
        assert_eq!(natural.cell_edges(5).len(), 0);
    }

    #[test]
    fn sides_from_input_record_captures_errors() {
        let table = [Load::OutFlow];
        let mut natural = Natural::new();
        let ir = InputRecord::from_json(r#"{"bsides": [1, 2]}"#).unwrap();
        assert_eq!(
            natural.sides_from_input_record(0, &ir, &table).err(),
            Some("bcodes must be given together with bsides")
        );
        let ir = InputRecord::from_json(r#"{"bsides": [1, 2], "bcodes": [0]}"#).unwrap();
        assert_eq!(
            natural.sides_from_input_record(0, &ir, &table).err(),
            Some("bcodes must have the same size as bsides")
        );
        let ir = InputRecord::from_json(r#"{"bsides": [1], "bcodes": [3]}"#).unwrap();
        assert_eq!(
            natural.sides_from_input_record(0, &ir, &table).err(),
            Some("invalid boundary side or code")
        );
    }
}
