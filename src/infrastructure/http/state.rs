//! Application State
//!
//! 朗读编排器与命令处理器

use crate::application::{
    ApplicationError, NarrationDefaults, Narrator, StartNarrationHandler, StopNarrationHandler,
    ToggleNarrationHandler,
};
use crate::config::NarrationConfig;

/// 应用状态
pub struct AppState {
    pub narrator: Narrator,

    // ========== Command Handlers ==========
    pub start_handler: StartNarrationHandler,
    pub stop_handler: StopNarrationHandler,
    pub toggle_handler: ToggleNarrationHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(narrator: Narrator, config: &NarrationConfig) -> Result<Self, ApplicationError> {
        let defaults = NarrationDefaults::from_config(config)?;

        Ok(Self {
            start_handler: StartNarrationHandler::new(narrator.clone(), defaults.clone()),
            stop_handler: StopNarrationHandler::new(narrator.clone()),
            toggle_handler: ToggleNarrationHandler::new(narrator.clone(), defaults),
            narrator,
        })
    }
}
