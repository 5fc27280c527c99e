use code_runner::CodeRunner;
use crypto_core::SessionKeys;

use crate::config::Config;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub sessions: SessionKeys,
    pub runner: CodeRunner,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let sessions = SessionKeys::new(&config.session.secret);
        let runner = CodeRunner::new((&config.runner).into());

        Self {
            db,
            config,
            sessions,
            runner,
        }
    }
}
