pub mod elements;
pub mod uncertainty;
