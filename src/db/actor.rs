use crate::db::models::{DbComponentRow, rows_into_components};
use crate::db::schema::SQLITE_INIT;
use crate::error::EngineError;
use crate::model::{Component, ComponentType};
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug)]
pub enum CacheActorMessage {
    /// Upsert a batch of component rows (insert or field-level update).
    Upsert(Vec<Component>, RpcReplyPort<Result<(), EngineError>>),

    /// Look up a single row by its globally unique component name.
    GetByName(String, RpcReplyPort<Result<Option<Component>, EngineError>>),

    /// List all cached rows of a package.
    GetByPackage(String, RpcReplyPort<Result<Vec<Component>, EngineError>>),

    /// List cached rows of a package restricted to one component kind.
    GetByPackageAndType(
        String,
        ComponentType,
        RpcReplyPort<Result<Vec<Component>, EngineError>>,
    ),

    /// Substring match over component name, package name, and simple name.
    Search(String, RpcReplyPort<Result<Vec<Component>, EngineError>>),

    /// Delete rows by component name; missing names are a no-op.
    DeleteByNames(Vec<String>, RpcReplyPort<Result<(), EngineError>>),

    /// Drop every cached row of a package.
    DeleteByPackage(String, RpcReplyPort<Result<(), EngineError>>),
}

/// Cloneable handle for interacting with the component cache actor.
#[derive(Clone)]
pub struct CacheHandle {
    actor: ActorRef<CacheActorMessage>,
}

impl CacheHandle {
    pub async fn upsert(&self, components: Vec<Component>) -> Result<(), EngineError> {
        ractor::call!(self.actor, CacheActorMessage::Upsert, components)
            .map_err(|e| EngineError::Actor(format!("CacheActor Upsert RPC failed: {e}")))?
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Component>, EngineError> {
        ractor::call!(self.actor, CacheActorMessage::GetByName, name.to_string())
            .map_err(|e| EngineError::Actor(format!("CacheActor GetByName RPC failed: {e}")))?
    }

    pub async fn get_by_package(&self, package: &str) -> Result<Vec<Component>, EngineError> {
        ractor::call!(self.actor, CacheActorMessage::GetByPackage, package.to_string())
            .map_err(|e| EngineError::Actor(format!("CacheActor GetByPackage RPC failed: {e}")))?
    }

    pub async fn get_by_package_and_type(
        &self,
        package: &str,
        kind: ComponentType,
    ) -> Result<Vec<Component>, EngineError> {
        ractor::call!(
            self.actor,
            CacheActorMessage::GetByPackageAndType,
            package.to_string(),
            kind
        )
        .map_err(|e| EngineError::Actor(format!("CacheActor GetByPackageAndType RPC failed: {e}")))?
    }

    pub async fn search(&self, keyword: &str) -> Result<Vec<Component>, EngineError> {
        ractor::call!(self.actor, CacheActorMessage::Search, keyword.to_string())
            .map_err(|e| EngineError::Actor(format!("CacheActor Search RPC failed: {e}")))?
    }

    pub async fn delete_by_names(&self, names: Vec<String>) -> Result<(), EngineError> {
        ractor::call!(self.actor, CacheActorMessage::DeleteByNames, names)
            .map_err(|e| EngineError::Actor(format!("CacheActor DeleteByNames RPC failed: {e}")))?
    }

    pub async fn delete_by_package(&self, package: &str) -> Result<(), EngineError> {
        ractor::call!(
            self.actor,
            CacheActorMessage::DeleteByPackage,
            package.to_string()
        )
        .map_err(|e| EngineError::Actor(format!("CacheActor DeleteByPackage RPC failed: {e}")))?
    }
}

struct CacheActorState {
    pool: SqlitePool,
}

struct CacheActor;

#[ractor::async_trait]
impl Actor for CacheActor {
    type Msg = CacheActorMessage;
    type State = CacheActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("CacheActor initialized");
        Ok(CacheActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CacheActorMessage::Upsert(components, reply) => {
                let res = self.upsert(&state.pool, components).await;
                let _ = reply.send(res);
            }
            CacheActorMessage::GetByName(name, reply) => {
                let res = self.get_by_name(&state.pool, &name).await;
                let _ = reply.send(res);
            }
            CacheActorMessage::GetByPackage(package, reply) => {
                let res = self.get_by_package(&state.pool, &package).await;
                let _ = reply.send(res);
            }
            CacheActorMessage::GetByPackageAndType(package, kind, reply) => {
                let res = self
                    .get_by_package_and_type(&state.pool, &package, kind)
                    .await;
                let _ = reply.send(res);
            }
            CacheActorMessage::Search(keyword, reply) => {
                let res = self.search(&state.pool, &keyword).await;
                let _ = reply.send(res);
            }
            CacheActorMessage::DeleteByNames(names, reply) => {
                let res = self.delete_by_names(&state.pool, names).await;
                let _ = reply.send(res);
            }
            CacheActorMessage::DeleteByPackage(package, reply) => {
                let res = self.delete_by_package(&state.pool, &package).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl CacheActor {
    async fn upsert(
        &self,
        pool: &SqlitePool,
        components: Vec<Component>,
    ) -> Result<(), EngineError> {
        let now = Utc::now();
        for c in components {
            sqlx::query(
                r#"
            INSERT INTO app_component (
                component_name, package_name, simple_name, component_type,
                exported, pm_blocked, ifw_blocked, description, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(component_name) DO UPDATE SET
                package_name=excluded.package_name,
                simple_name=excluded.simple_name,
                component_type=excluded.component_type,
                exported=excluded.exported,
                pm_blocked=excluded.pm_blocked,
                ifw_blocked=excluded.ifw_blocked,
                description=excluded.description,
                updated_at=excluded.updated_at
            "#,
            )
            .bind(&c.component_name)
            .bind(&c.package_name)
            .bind(&c.simple_name)
            .bind(c.component_type.as_str())
            .bind(c.exported)
            .bind(c.pm_blocked)
            .bind(c.ifw_blocked)
            .bind(&c.description)
            .bind(now)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    async fn get_by_name(
        &self,
        pool: &SqlitePool,
        name: &str,
    ) -> Result<Option<Component>, EngineError> {
        let row = sqlx::query_as::<_, DbComponentRow>(
            r#"
        SELECT component_name, package_name, simple_name, component_type,
               exported, pm_blocked, ifw_blocked, description, updated_at
        FROM app_component
        WHERE component_name = ?
        "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(row.and_then(DbComponentRow::into_component))
    }

    async fn get_by_package(
        &self,
        pool: &SqlitePool,
        package: &str,
    ) -> Result<Vec<Component>, EngineError> {
        let rows = sqlx::query_as::<_, DbComponentRow>(
            r#"
        SELECT component_name, package_name, simple_name, component_type,
               exported, pm_blocked, ifw_blocked, description, updated_at
        FROM app_component
        WHERE package_name = ?
        ORDER BY component_name
        "#,
        )
        .bind(package)
        .fetch_all(pool)
        .await?;

        Ok(rows_into_components(rows))
    }

    async fn get_by_package_and_type(
        &self,
        pool: &SqlitePool,
        package: &str,
        kind: ComponentType,
    ) -> Result<Vec<Component>, EngineError> {
        let rows = sqlx::query_as::<_, DbComponentRow>(
            r#"
        SELECT component_name, package_name, simple_name, component_type,
               exported, pm_blocked, ifw_blocked, description, updated_at
        FROM app_component
        WHERE package_name = ? AND component_type = ?
        ORDER BY component_name
        "#,
        )
        .bind(package)
        .bind(kind.as_str())
        .fetch_all(pool)
        .await?;

        Ok(rows_into_components(rows))
    }

    async fn search(&self, pool: &SqlitePool, keyword: &str) -> Result<Vec<Component>, EngineError> {
        let rows = sqlx::query_as::<_, DbComponentRow>(
            r#"
        SELECT component_name, package_name, simple_name, component_type,
               exported, pm_blocked, ifw_blocked, description, updated_at
        FROM app_component
        WHERE component_name LIKE '%' || ? || '%'
           OR package_name LIKE '%' || ? || '%'
           OR simple_name LIKE '%' || ? || '%'
        ORDER BY component_name
        "#,
        )
        .bind(keyword)
        .bind(keyword)
        .bind(keyword)
        .fetch_all(pool)
        .await?;

        Ok(rows_into_components(rows))
    }

    async fn delete_by_names(
        &self,
        pool: &SqlitePool,
        names: Vec<String>,
    ) -> Result<(), EngineError> {
        for name in names {
            sqlx::query("DELETE FROM app_component WHERE component_name = ?")
                .bind(name)
                .execute(pool)
                .await?;
        }
        Ok(())
    }

    async fn delete_by_package(&self, pool: &SqlitePool, package: &str) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM app_component WHERE package_name = ?")
            .bind(package)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Spawn the component cache actor and return a cloneable handle. The
/// actor is anonymous so several engines can coexist in one process.
pub async fn spawn(database_url: &str) -> Result<CacheHandle, EngineError> {
    let (actor, _jh) = ractor::Actor::spawn(None, CacheActor, database_url.to_string())
        .await
        .map_err(|e| EngineError::Actor(format!("failed to spawn CacheActor: {e}")))?;

    Ok(CacheHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), EngineError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
