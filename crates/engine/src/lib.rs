pub mod animator;
pub mod evaluator;
pub mod grid;
pub mod problem;
pub mod render;
pub mod session;
pub mod verify;
