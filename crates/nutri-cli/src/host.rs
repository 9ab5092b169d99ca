//! Terminal implementations of the host capabilities.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{debug, info};

use nutri_core::auth::{FileTokenStore, KeyringTokenStore, TokenStore};
use nutri_core::config::TokenStorage;
use nutri_core::{ApiClient, Config, Navigator, Notifier, Redirector};

/// Navigator for a terminal: there are no pages, so "navigating" prints the
/// destination and moves the notional current page there.
pub struct TerminalNavigator {
    path: Mutex<String>,
}

impl TerminalNavigator {
    pub fn at(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_string()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn navigate(&self, target: &str) {
        eprintln!("-> {}", target);
        *self.path.lock().unwrap_or_else(|e| e.into_inner()) = target.to_string();
    }
}

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        eprintln!("! {}", message);
    }
}

/// Everything a command needs: the loaded config, the redirector for the
/// page it pretends to be on and a client sharing the stored credential.
pub struct Host {
    pub config: Config,
    pub redirector: Arc<Redirector>,
    pub api: ApiClient,
}

impl Host {
    pub fn new(config: Config, page: &str) -> Result<Self> {
        let navigator = Arc::new(TerminalNavigator::at(page));
        let redirector = Arc::new(Redirector::new(navigator, config.routes.clone()));
        let store = token_store(&config)?;
        let api = ApiClient::new(&config, store, redirector.clone())
            .context("Failed to create API client")?;
        debug!(page, base_url = api.base_url(), "Host ready");

        Ok(Self {
            config,
            redirector,
            api,
        })
    }
}

fn token_store(config: &Config) -> Result<Box<dyn TokenStore>> {
    match config.token_storage {
        TokenStorage::File => {
            let cache_dir = config.cache_dir()?;
            info!(dir = %cache_dir.display(), "Using file token store");
            Ok(Box::new(FileTokenStore::new(cache_dir)))
        }
        TokenStorage::Keyring => {
            info!("Using keyring token store");
            Ok(Box::new(
                KeyringTokenStore::new().context("Keyring is not available")?,
            ))
        }
    }
}
