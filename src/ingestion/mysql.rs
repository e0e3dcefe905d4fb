//! MySQL data source

use super::DataSource;
use crate::error::{PipelineError, Result};
use crate::pipeline::DatabaseConfig;
use polars::prelude::*;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as _, Row};
use std::time::Duration;
use tracing::{debug, info};

/// Reads the training table from a MySQL database.
///
/// sqlx is async; the source owns a current-thread runtime and blocks on it so
/// callers stay synchronous.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    config: DatabaseConfig,
}

impl MySqlSource {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Structured options; credentials never pass through URL parsing
    fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .database(&self.config.database);
        if self.config.password.is_empty() {
            options
        } else {
            options.password(&self.config.password)
        }
    }

    async fn fetch(&self, query: &str) -> Result<Vec<MySqlRow>> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .connect_with(self.connect_options())
            .await
            .map_err(|e| PipelineError::data_access(format!("cannot connect to {}", self.describe()), e))?;

        let rows = sqlx::query(query)
            .fetch_all(&pool)
            .await
            .map_err(|e| PipelineError::data_access(format!("query failed: {}", query), e));

        pool.close().await;
        rows
    }
}

impl DataSource for MySqlSource {
    fn load(&self, query: &str) -> Result<DataFrame> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PipelineError::data_access("cannot start database runtime", e))?;

        let rows = runtime.block_on(self.fetch(query))?;
        if rows.is_empty() {
            return Err(PipelineError::data_access(
                format!("query returned no rows: {}", query),
                "empty result set",
            ));
        }

        let df = rows_to_frame(&rows)?;
        info!(source = %self.describe(), rows = df.height(), columns = df.width(), "Loaded dataset from MySQL");
        Ok(df)
    }

    fn describe(&self) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            self.config.user, self.config.host, self.config.port, self.config.database
        )
    }
}

/// Build a frame column by column from the first row's layout
fn rows_to_frame(rows: &[MySqlRow]) -> Result<DataFrame> {
    let Some(first) = rows.first() else {
        return DataFrame::new(Vec::new())
            .map_err(|e| PipelineError::data_access("cannot build empty frame", e));
    };

    let columns = first
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| decode_column(rows, idx, col.name()))
        .collect::<Result<Vec<_>>>()?;

    DataFrame::new(columns).map_err(|e| PipelineError::data_access("cannot assemble frame", e))
}

/// Decode one result column as integers, then floats, then text
fn decode_column(rows: &[MySqlRow], idx: usize, name: &str) -> Result<Column> {
    if let Ok(values) = rows
        .iter()
        .map(|r| r.try_get::<Option<i64>, _>(idx))
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        debug!(column = name, kind = "i64", "Decoded column");
        return Ok(Column::new(name.into(), values));
    }

    if let Ok(values) = rows
        .iter()
        .map(|r| r.try_get::<Option<f64>, _>(idx))
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        debug!(column = name, kind = "f64", "Decoded column");
        return Ok(Column::new(name.into(), values));
    }

    rows.iter()
        .map(|r| r.try_get::<Option<String>, _>(idx))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(|values| {
            debug!(column = name, kind = "str", "Decoded column");
            Column::new(name.into(), values)
        })
        .map_err(|e| PipelineError::data_access(format!("cannot decode column '{}'", name), e))
}
