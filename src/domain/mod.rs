pub mod ai;
pub mod cell;
pub mod collision;
pub mod entity;
pub mod grid;
pub mod player;
