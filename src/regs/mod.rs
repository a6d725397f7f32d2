pub mod ads1256;
