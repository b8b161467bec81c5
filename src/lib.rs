#![allow(async_fn_in_trait)]
pub mod config;
pub mod earth_explorer;
pub mod error;
pub mod scene_search;
