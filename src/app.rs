use crate::config::Config;
use crate::controller::ViewController;
use crate::gateway::HttpGateway;
use crate::storage::FileStore;
use std::sync::Arc;

pub type App = ViewController<FileStore, HttpGateway>;

pub fn build(config: &Config) -> Arc<App> {
    let gateway = Arc::new(HttpGateway::new(config));
    let storage = FileStore::new(&config.session_path);
    Arc::new(ViewController::new(gateway, storage))
}
