pub mod sales;
pub mod suggestion;
