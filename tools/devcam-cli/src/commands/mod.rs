pub mod check;
pub mod negotiate;
pub mod rotation;
pub mod run;
