use super::Elem;
use crate::StrError;
use gemlab::mesh::Cell;
use std::collections::HashMap;

/// Maps cell attributes to element types (and parameters)
pub struct Attributes {
    all: HashMap<usize, Elem>,
}

impl Attributes {
    /// Allocates a new instance from an array of (CellAttribute, Elem) pairs
    pub fn from<const N: usize>(arr: [(usize, Elem); N]) -> Self {
        Attributes {
            all: HashMap::from(arr),
        }
    }

    /// Returns the element associated with a cell
    pub fn get(&self, cell: &Cell) -> Result<&Elem, StrError> {
        self.all
            .get(&cell.attribute)
            .ok_or("cannot find CellAttribute in Attributes map")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
