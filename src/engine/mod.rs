pub mod lifecycle;
pub mod visibility;
