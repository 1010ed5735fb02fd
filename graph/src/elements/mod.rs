pub mod basic_lib;
