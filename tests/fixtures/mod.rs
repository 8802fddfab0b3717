#![allow(dead_code)]

pub mod bpo;
pub mod repo;
pub mod store_dir;
