//! PostGIS layer backend
//!
//! Features are selected with the source fields renamed to their output
//! attribute names and the geometry returned as WKB under the geometry
//! field's own name, so the result set feeds straight into
//! [`materialize`](crate::rows::materialize). Geometries are assumed to be
//! stored in Web Mercator (EPSG:3857), the SRID of the query envelope.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tokio::sync::OnceCell;

use crate::config::PostgisConfig;
use crate::error::{LayerError, RowError, RowSourceError};
use crate::rows::{materialize, AttributeMap, PgRowSource};

/// Connections kept per layer pool
const MAX_POOL_CONNECTIONS: u32 = 5;

/// Query bounds in EPSG:3857
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl FromStr for Envelope {
    type Err = String;

    /// Parse `minx,miny,maxx,maxy`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid envelope '{}': {}", s, e))?;

        match parts.as_slice() {
            [min_x, min_y, max_x, max_y] => Ok(Self {
                min_x: *min_x,
                min_y: *min_y,
                max_x: *max_x,
                max_y: *max_y,
            }),
            _ => Err(format!(
                "invalid envelope '{}': expected minx,miny,maxx,maxy",
                s
            )),
        }
    }
}

/// Layer backed by a PostGIS table or subquery
#[derive(Debug)]
pub struct PostgisBackend {
    connect_options: PgConnectOptions,
    /// Created on the first query
    pool: OnceCell<PgPool>,
    table_expression: String,
    geometry_field: String,
    source_fields: HashMap<String, String>,
}

impl PostgisBackend {
    /// Validate the descriptor and parse its DSN (no connection yet)
    pub fn from_config(layer: &str, config: &PostgisConfig) -> Result<Self, LayerError> {
        for (field, value) in [
            ("tableExpression", &config.table_expression),
            ("geometryField", &config.geometry_field),
        ] {
            if value.trim().is_empty() {
                return Err(LayerError::EmptyField {
                    layer: layer.to_string(),
                    field,
                });
            }
        }

        let connect_options =
            PgConnectOptions::from_str(&config.dsn).map_err(|source| LayerError::InvalidDsn {
                layer: layer.to_string(),
                source,
            })?;

        Ok(Self {
            connect_options,
            pool: OnceCell::new(),
            table_expression: config.table_expression.clone(),
            geometry_field: config.geometry_field.clone(),
            source_fields: config.source_fields.clone(),
        })
    }

    pub fn table_expression(&self) -> &str {
        &self.table_expression
    }

    pub fn geometry_field(&self) -> &str {
        &self.geometry_field
    }

    pub fn source_fields(&self) -> &HashMap<String, String> {
        &self.source_fields
    }

    /// Feature query with the envelope bound as `$1..$4`
    pub fn features_sql(&self) -> String {
        let mut fields: Vec<(&String, &String)> = self.source_fields.iter().collect();
        fields.sort();

        let geometry = quote_ident(&self.geometry_field);
        let mut columns: Vec<String> = fields
            .into_iter()
            .map(|(name, column)| format!("{} AS {}", quote_ident(column), quote_ident(name)))
            .collect();
        columns.push(format!("ST_AsBinary({0}) AS {0}", geometry));

        format!(
            "SELECT {} FROM {} AS features WHERE {} && ST_MakeEnvelope($1, $2, $3, $4, 3857)",
            columns.join(", "),
            self.table_expression,
            geometry
        )
    }

    async fn pool(&self) -> Result<&PgPool, sqlx::Error> {
        self.pool
            .get_or_try_init(|| async {
                tracing::info!(
                    host = self.connect_options.get_host(),
                    table = %self.table_expression,
                    "Connecting to PostGIS"
                );
                PgPoolOptions::new()
                    .max_connections(MAX_POOL_CONNECTIONS)
                    .connect_with(self.connect_options.clone())
                    .await
            })
            .await
    }

    /// Fetch and normalize every feature intersecting `envelope`
    pub async fn fetch_features(&self, envelope: &Envelope) -> Result<Vec<AttributeMap>, RowError> {
        let pool = self.pool().await.map_err(RowSourceError::from)?;
        let sql = self.features_sql();

        let rows = sqlx::query(&sql)
            .bind(envelope.min_x)
            .bind(envelope.min_y)
            .bind(envelope.max_x)
            .bind(envelope.max_y)
            .fetch_all(pool)
            .await
            .map_err(RowSourceError::from)?;

        tracing::debug!(rows = rows.len(), table = %self.table_expression, "Fetched features");
        let mut source = PgRowSource::new(rows);
        materialize(&mut source, &self.geometry_field)
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
