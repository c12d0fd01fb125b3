use callboard_core::{Config, Dispatcher, Registrar};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    dispatcher: Dispatcher,
    registrar: Registrar,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        dispatcher: Dispatcher,
        registrar: Registrar,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            dispatcher,
            registrar,
            ws_broadcaster,
        }
    }

    /// Build the dispatcher and registrar from `config`.
    pub fn from_config(config: Config, ws_broadcaster: WsBroadcaster) -> Self {
        let dispatcher = Dispatcher::new(config.dispatch.clone());
        let registrar = Registrar::new(config.registration.clone());
        Self::new(config, dispatcher, registrar, ws_broadcaster)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
