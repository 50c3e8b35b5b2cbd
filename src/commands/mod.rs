pub mod drop_table;
pub mod split;
pub mod upload;
