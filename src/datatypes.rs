use nalgebra::{DVector, Vector2};

/// A mesh vertex in the reference configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    index: usize,
    initial_coordinate: Vector2<f64>,
}

impl Node {
    pub fn new(index: usize, initial_coordinate: Vector2<f64>) -> Node {
        Node {
            index,
            initial_coordinate,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn initial_coordinate(&self) -> Vector2<f64> {
        self.initial_coordinate
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn set_initial_coordinate(&mut self, initial_coordinate: Vector2<f64>) {
        self.initial_coordinate = initial_coordinate;
    }
}

/// A linear triangle, stored as the indexes of its three nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    index: usize,
    connectivity: [usize; 3],
}

impl Element {
    pub fn new(index: usize, connectivity: [usize; 3]) -> Element {
        Element {
            index,
            connectivity,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn connectivity(&self) -> [usize; 3] {
        self.connectivity
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn set_connectivity(&mut self, connectivity: [usize; 3]) {
        self.connectivity = connectivity;
    }
}

/// A set of material properties. The meaning of each entry is left to
/// whoever consumes the material (e.g. elasticity, then poisson ratio).
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    index: usize,
    properties: DVector<f64>,
}

impl Material {
    pub fn new(index: usize, properties: DVector<f64>) -> Material {
        Material { index, properties }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn properties(&self) -> &DVector<f64> {
        &self.properties
    }

    /// Returns a single property, or None if `i` is past the end
    pub fn property(&self, i: usize) -> Option<f64> {
        self.properties.get(i).copied()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn set_properties(&mut self, properties: DVector<f64>) {
        self.properties = properties;
    }
}
