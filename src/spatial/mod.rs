pub mod hit;
