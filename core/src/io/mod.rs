pub mod gmc;
pub mod prism;
pub mod writer;
