//! Boundary DTOs for configuration management.

use super::memory::Config;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_CONFIG: &str = "/config";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRequest {
    pub module: String,
    pub cluster: String,
    pub config: Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfigRequest {
    pub module: String,
    pub cluster: String,
}
