pub mod app;
pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod fs_util;
pub mod output;
pub mod registry;
pub mod scene;
pub mod store;
pub mod sync;
pub mod template;
