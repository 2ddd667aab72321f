mod generator;
mod ini;

pub use generator::{
    BackendRequest, ConfigGenerationError, ConfigGenerator, TargetSpace, CONFIG_FILENAME,
    CPU_ONLY_GPU_ID,
};
pub use ini::{BackendConfig, IniParseError};
