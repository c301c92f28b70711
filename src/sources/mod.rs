pub mod dpma;
