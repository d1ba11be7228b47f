extern crate serde;
extern crate serde_json;
extern crate thiserror;

mod error;
mod tsconfig;
mod tsconfig_json;

pub use error::TsConfigError;
pub use tsconfig::{PathAlias, TsConfig};
pub use tsconfig_json::{Extends, TsConfigCompilerOptions, TsConfigJson};
