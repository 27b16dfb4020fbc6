//! Postgres-backed pallet store.
//!
//! Schema lives in `migrations/0001_init.sql` and is applied by
//! [`PostgresWarehouseStore::migrate`]. Deleting a pallet cascades to its boxes
//! through the `boxes.pallet_id` foreign key.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (foreign key violation) | `23503` | `Missing` |
//! | Database (other) | any other | `Database` |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` |
//! | Other | N/A | `Database` |

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use warehouse_core::{BoxId, Entity, PalletId};
use warehouse_inventory::{Dimensions, Pallet, StorageBox, StorageItem};

use super::r#trait::{StoreError, StoreResult, WarehouseStore};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Pallets come back in insertion order; ids are random and cannot order them.
const LIST_PALLETS_SQL: &str = r#"
    SELECT id, width, height, depth
    FROM pallets
    ORDER BY seq ASC
"#;

/// Postgres-backed pallet store.
///
/// `PostgresWarehouseStore` is `Send + Sync` and cheap to clone; all operations
/// go through the SQLx connection pool. Multi-row writes run in a transaction.
#[derive(Debug, Clone)]
pub struct PostgresWarehouseStore {
    pool: Arc<PgPool>,
}

impl PostgresWarehouseStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self, operation: &str) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

async fn update_derived(
    tx: &mut Transaction<'static, Postgres>,
    pallet: &Pallet,
    operation: &str,
) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE pallets
        SET weight = $2, expiration_date = $3
        WHERE id = $1
        "#,
    )
    .bind(*pallet.id().as_uuid())
    .bind(pallet.weight())
    .bind(pallet.expiration_date())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(result.rows_affected())
}

#[async_trait]
impl WarehouseStore for PostgresWarehouseStore {
    #[instrument(skip(self, pallet), fields(pallet_id = %pallet.id()), err)]
    async fn insert_pallet(&self, pallet: &Pallet) -> StoreResult<()> {
        let dims = pallet.dimensions();
        sqlx::query(
            r#"
            INSERT INTO pallets (id, width, height, depth, weight, expiration_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*pallet.id().as_uuid())
        .bind(dims.width)
        .bind(dims.height)
        .bind(dims.depth)
        .bind(pallet.weight())
        .bind(pallet.expiration_date())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_pallet", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(pallet_id = %id), err)]
    async fn get_pallet(&self, id: PalletId) -> StoreResult<Option<Pallet>> {
        let row = sqlx::query(
            r#"
            SELECT id, width, height, depth
            FROM pallets
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_pallet", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let pallet_row = PalletRow::try_from_row(&row)?;

        let box_rows = sqlx::query(
            r#"
            SELECT id, pallet_id, width, height, depth, weight, manufacture_date, expiration_date
            FROM boxes
            WHERE pallet_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_pallet_boxes", e))?;

        let boxes = box_rows
            .iter()
            .map(BoxRow::try_from_row)
            .map(|r| r.map(BoxRow::into_box))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Some(pallet_row.into_pallet(boxes)?))
    }

    #[instrument(skip(self), fields(pallet_count = tracing::field::Empty), err)]
    async fn list_pallets(&self) -> StoreResult<Vec<Pallet>> {
        let pallet_rows = sqlx::query(LIST_PALLETS_SQL)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_pallets", e))?;

        let box_rows = sqlx::query(
            r#"
            SELECT id, pallet_id, width, height, depth, weight, manufacture_date, expiration_date
            FROM boxes
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_boxes", e))?;

        let mut by_pallet: HashMap<Uuid, Vec<StorageBox>> = HashMap::new();
        for row in &box_rows {
            let box_row = BoxRow::try_from_row(row)?;
            by_pallet
                .entry(box_row.pallet_id)
                .or_default()
                .push(box_row.into_box());
        }

        let mut pallets = Vec::with_capacity(pallet_rows.len());
        for row in &pallet_rows {
            let pallet_row = PalletRow::try_from_row(row)?;
            let boxes = by_pallet.remove(&pallet_row.id).unwrap_or_default();
            pallets.push(pallet_row.into_pallet(boxes)?);
        }

        tracing::Span::current().record("pallet_count", pallets.len());
        Ok(pallets)
    }

    #[instrument(skip(self), fields(pallet_id = %id), err)]
    async fn delete_pallet(&self, id: PalletId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM pallets WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_pallet", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, pallet, item), fields(pallet_id = %pallet.id(), box_id = %item.id()), err)]
    async fn save_box(&self, pallet: &Pallet, item: &StorageBox) -> StoreResult<()> {
        let mut tx = self.begin("save_box").await?;
        let dims = item.dimensions();

        sqlx::query(
            r#"
            INSERT INTO boxes (
                id, pallet_id, width, height, depth, weight, manufacture_date, expiration_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*item.id().as_uuid())
        .bind(*pallet.id().as_uuid())
        .bind(dims.width)
        .bind(dims.height)
        .bind(dims.depth)
        .bind(item.weight())
        .bind(item.manufacture_date())
        .bind(item.expiration_date())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_box", e))?;

        update_derived(&mut tx, pallet, "save_box_pallet").await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("save_box_commit", e))
    }

    #[instrument(skip(self), fields(box_id = %id), err)]
    async fn find_box_pallet(&self, id: BoxId) -> StoreResult<Option<PalletId>> {
        let row = sqlx::query("SELECT pallet_id FROM boxes WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_box_pallet", e))?;

        row.map(|r| {
            r.try_get::<Uuid, _>("pallet_id")
                .map(PalletId::from_uuid)
                .map_err(|e| StoreError::Corrupt(format!("boxes.pallet_id: {e}")))
        })
        .transpose()
    }

    #[instrument(skip(self, pallet), fields(pallet_id = %pallet.id(), box_id = %id), err)]
    async fn delete_box(&self, pallet: &Pallet, id: BoxId) -> StoreResult<()> {
        let mut tx = self.begin("delete_box").await?;

        sqlx::query("DELETE FROM boxes WHERE id = $1 AND pallet_id = $2")
            .bind(*id.as_uuid())
            .bind(*pallet.id().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_box", e))?;

        if update_derived(&mut tx, pallet, "delete_box_pallet").await? == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Missing(format!("pallet {}", pallet.id())));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_box_commit", e))
    }
}

struct PalletRow {
    id: Uuid,
    width: f64,
    height: f64,
    depth: f64,
}

impl PalletRow {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(PalletRow {
            id: get(row, "id")?,
            width: get(row, "width")?,
            height: get(row, "height")?,
            depth: get(row, "depth")?,
        })
    }

    fn into_pallet(self, boxes: Vec<StorageBox>) -> StoreResult<Pallet> {
        let pallet = Pallet::from_parts(
            PalletId::from_uuid(self.id),
            Dimensions::new(self.width, self.height, self.depth),
            boxes,
        )?;
        Ok(pallet)
    }
}

struct BoxRow {
    id: Uuid,
    pallet_id: Uuid,
    width: f64,
    height: f64,
    depth: f64,
    weight: f64,
    manufacture_date: Option<DateTime<Utc>>,
    expiration_date: Option<DateTime<Utc>>,
}

impl BoxRow {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(BoxRow {
            id: get(row, "id")?,
            pallet_id: get(row, "pallet_id")?,
            width: get(row, "width")?,
            height: get(row, "height")?,
            depth: get(row, "depth")?,
            weight: get(row, "weight")?,
            manufacture_date: get(row, "manufacture_date")?,
            expiration_date: get(row, "expiration_date")?,
        })
    }

    /// Stored expiration dates are taken as-is, even when absent.
    fn into_box(self) -> StorageBox {
        let mut item = StorageBox::new(
            BoxId::from_uuid(self.id),
            self.width,
            self.height,
            self.depth,
            self.weight,
            PalletId::from_uuid(self.pallet_id),
            None,
            self.expiration_date,
        );
        item.set_manufacture_date(self.manufacture_date);
        item
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("column {column}: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") => StoreError::Missing(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
