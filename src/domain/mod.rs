pub mod geom;
pub mod graph;
