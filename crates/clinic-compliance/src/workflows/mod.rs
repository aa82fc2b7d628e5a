pub mod compliance;
pub mod export;
pub mod intake;
pub mod refresh;
