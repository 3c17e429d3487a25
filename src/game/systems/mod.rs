pub mod combat;
pub mod lifecycle;
pub mod steering;
pub mod targeting;
