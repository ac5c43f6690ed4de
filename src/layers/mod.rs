pub mod descriptor;
pub mod deriver;
pub mod registry;
