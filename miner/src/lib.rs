pub mod config;
pub mod hasher;
pub mod preimage;
pub mod reporter;
pub mod scheduler;
pub mod sink;
pub mod worker;


pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/build_info.rs"));
}
