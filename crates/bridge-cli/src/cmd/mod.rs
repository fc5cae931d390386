pub mod assets;
pub mod check;
pub mod serve;
