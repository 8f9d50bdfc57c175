pub mod grid_writer;
