pub mod background;
pub mod cuts;
pub mod reweight;
pub mod selection;
