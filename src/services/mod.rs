pub mod round_driver;
