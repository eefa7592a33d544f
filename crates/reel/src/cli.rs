pub mod simulate;
pub mod spin;
