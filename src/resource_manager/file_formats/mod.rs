pub mod clipfile;
pub mod modelfile;
