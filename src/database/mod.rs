use crate::config::Config;
use crate::error::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECT_ATTEMPTS: u32 = 5;

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// 커넥션 풀 생성 (DB가 늦게 뜨는 경우를 위해 몇 번 재시도)
    pub async fn new(config: &Config) -> Result<Self> {
        let mut attempt = 1;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect(&config.database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    warn!(
                        "{:<12} --> 연결 실패, 재시도 ({}/{}): {}",
                        "Database", attempt, CONNECT_ATTEMPTS, e
                    );
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };
        info!(
            "{:<12} --> 커넥션 풀 생성 (max_connections={})",
            "Database", config.database_max_connections
        );
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn get_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 트랜잭션 실행: 클로저가 Err를 반환하면 롤백
    pub async fn transaction<F, R, E>(&self, f: F) -> std::result::Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = std::result::Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error> + std::fmt::Debug,
    {
        let mut tx = self.pool.begin().await?;
        match f(&mut tx).await {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                debug!("{:<12} --> 롤백: {:?}", "Database", e);
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 스키마 생성 (기존 데이터 유지)
    pub async fn initialize_database(&self) -> Result<()> {
        let applied = self
            .execute_script(include_str!("../../sql/01-create-schema.sql"))
            .await?;
        info!("{:<12} --> 스키마 확인 ({}개 구문)", "Database", applied);
        Ok(())
    }

    /// 모든 테이블을 지우고 다시 생성
    pub async fn reset_database(&self) -> Result<()> {
        warn!("{:<12} --> 모든 정산 테이블 삭제", "Database");
        self.execute_script(include_str!("../../sql/00-recreate-db.sql"))
            .await?;
        self.initialize_database().await
    }

    async fn execute_script(&self, sql: &str) -> Result<usize> {
        let statements = split_statements(sql);
        for statement in &statements {
            sqlx::query(statement).execute(self.pool()).await?;
        }
        Ok(statements.len())
    }
}

/// `;` 단위로 나누고 주석만 있는 구문은 버린다
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|statement| !statement.is_empty())
        .collect()
}
