pub mod ask;
pub mod embed;
