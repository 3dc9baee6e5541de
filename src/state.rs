use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};

use crate::{errors::Result, utils::mail::Mailer};

#[derive(Debug, Clone)]
pub struct AppState {
    pub sdb: Surreal<Any>,
    pub mailer: Mailer,
}

impl AppState {
    pub async fn init() -> Result<Self> {
        let endpoint =
            std::env::var("TASKCAMP_DB").unwrap_or_else(|_| "ws://localhost:8000".to_string());
        let sdb = any::connect(endpoint.clone()).await?;
        if endpoint.starts_with("ws") || endpoint.starts_with("http") {
            sdb.signin(Root {
                username: &std::env::var("TASKCAMP_DB_USER").unwrap_or_else(|_| "root".to_string()),
                password: &std::env::var("TASKCAMP_DB_PASS")
                    .unwrap_or_else(|_| "secret".to_string()),
            })
            .await?;
        }
        sdb.use_ns("taskcamp").use_db("taskcamp").await?;

        Ok(Self {
            sdb,
            mailer: Mailer::from_env(),
        })
    }

    /// In-memory database, used by tests and local experimentation.
    pub async fn ephemeral() -> Result<Self> {
        let sdb = any::connect("mem://").await?;
        sdb.use_ns("taskcamp").use_db("taskcamp").await?;

        Ok(Self {
            sdb,
            mailer: Mailer::disabled(),
        })
    }
}
