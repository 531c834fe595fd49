//! Per-keyspace session provisioning

use async_trait::async_trait;
use helvetia_sql::{ConnectionConfig, EmbeddedClient, MySqlClient, SqlClient};
use std::sync::Arc;
use tracing::warn;

use crate::error::PipelineResult;
use crate::schema::Keyspace;

pub type Session = Arc<dyn SqlClient>;

/// Opens one session per target keyspace
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, keyspace: Keyspace) -> PipelineResult<Session>;
}

/// Sessions against a MySQL server or VTGate, one connection each
pub struct MySqlSessions {
    config: ConnectionConfig,
}

impl MySqlSessions {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for MySqlSessions {
    async fn open(&self, keyspace: Keyspace) -> PipelineResult<Session> {
        // Commits are explicit, once per batch
        let config = self.config.for_keyspace(keyspace.name()).with_autocommit(false);
        let client = MySqlClient::connect(&config).await?;
        Ok(Arc::new(client))
    }
}

#[async_trait]
impl SessionFactory for EmbeddedClient {
    async fn open(&self, _keyspace: Keyspace) -> PipelineResult<Session> {
        Ok(Arc::new(self.session().await))
    }
}

/// Sessions opened during one run, closed together at the end
#[derive(Default)]
pub(crate) struct OpenSessions {
    sessions: Vec<(Keyspace, Session)>,
}

impl OpenSessions {
    pub(crate) async fn open<F: SessionFactory + ?Sized>(
        &mut self,
        factory: &F,
        keyspace: Keyspace,
    ) -> PipelineResult<Session> {
        let session = factory.open(keyspace).await?;
        self.sessions.push((keyspace, Arc::clone(&session)));
        Ok(session)
    }

    /// Close one session early
    pub(crate) async fn close(&mut self, keyspace: Keyspace) {
        if let Some(pos) = self.sessions.iter().position(|(ks, _)| *ks == keyspace) {
            let (ks, session) = self.sessions.remove(pos);
            close_quietly(ks, &session).await;
        }
    }

    pub(crate) async fn close_all(&mut self) {
        for (ks, session) in self.sessions.drain(..) {
            close_quietly(ks, &session).await;
        }
    }
}

async fn close_quietly(keyspace: Keyspace, session: &Session) {
    if let Err(e) = session.close().await {
        warn!("Closing {} session failed: {}", keyspace, e);
    }
}
