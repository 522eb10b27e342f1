use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::path::Path;
use uuid::Uuid;

use super::{GatewayError, PersistenceGateway};
use crate::db::init_db;
use crate::models::{
    BackendId, Cost, CostType, Product, RecordData, RecordKind, RecordPayload, Sale,
    StoredRecord,
};

/// Local durable table store backed by SQLite.
#[derive(Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: Option<String>,
    purchase_price: f64,
    sell_price: f64,
    created_at: String,
}

#[derive(sqlx::FromRow)]
struct CostRow {
    id: String,
    cost_type: String,
    amount: f64,
    cost_date: String,
    created_at: String,
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: String,
    product_name: String,
    quantity: f64,
    unit_price: f64,
    created_at: String,
}

fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Product => "products",
        RecordKind::Cost => "costs",
        RecordKind::Sale => "sales",
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(e.into()))
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (and migrates) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, GatewayError> {
        let pool = init_db(path).await?;
        Ok(Self::new(pool))
    }

    pub async fn insert(&self, payload: &RecordPayload) -> Result<BackendId, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let created_at = payload.created_at.to_rfc3339();

        match &payload.data {
            RecordData::Product(p) => {
                sqlx::query(
                    r#"
                    INSERT INTO products (id, name, category, purchase_price, sell_price, created_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(&p.name)
                .bind(&p.category)
                .bind(p.purchase_price)
                .bind(p.sell_price)
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
            RecordData::Cost(c) => {
                sqlx::query(
                    r#"
                    INSERT INTO costs (id, cost_type, amount, cost_date, created_at)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(c.cost_type.to_string())
                .bind(c.amount)
                .bind(c.cost_date.to_string())
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
            RecordData::Sale(s) => {
                sqlx::query(
                    r#"
                    INSERT INTO sales (id, product_name, quantity, unit_price, total, created_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(&s.product_name)
                .bind(s.quantity)
                .bind(s.unit_price)
                .bind(s.computed_total())
                .bind(&created_at)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(BackendId(id))
    }

    /// Deletes a record, returning whether a row was removed.
    pub async fn remove(&self, kind: RecordKind, id: &BackendId) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table(kind));
        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn fetch_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, sqlx::Error> {
        match kind {
            RecordKind::Product => {
                let rows: Vec<ProductRow> = sqlx::query_as(
                    "SELECT id, name, category, purchase_price, sell_price, created_at FROM products ORDER BY seq",
                )
                .fetch_all(&self.pool)
                .await?;

                rows.into_iter()
                    .map(|row| -> Result<StoredRecord, sqlx::Error> {
                        Ok(StoredRecord {
                            id: BackendId(row.id),
                            created_at: parse_timestamp(&row.created_at)?,
                            data: RecordData::Product(Product {
                                name: row.name,
                                category: row.category,
                                purchase_price: row.purchase_price,
                                sell_price: row.sell_price,
                            }),
                        })
                    })
                    .collect()
            }
            RecordKind::Cost => {
                let rows: Vec<CostRow> = sqlx::query_as(
                    "SELECT id, cost_type, amount, cost_date, created_at FROM costs ORDER BY seq",
                )
                .fetch_all(&self.pool)
                .await?;

                rows.into_iter()
                    .map(|row| -> Result<StoredRecord, sqlx::Error> {
                        let cost_date = NaiveDate::parse_from_str(&row.cost_date, "%Y-%m-%d")
                            .map_err(|e| sqlx::Error::Decode(e.into()))?;
                        let cost_type: CostType = row
                            .cost_type
                            .parse()
                            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
                        Ok(StoredRecord {
                            id: BackendId(row.id),
                            created_at: parse_timestamp(&row.created_at)?,
                            data: RecordData::Cost(Cost {
                                cost_type,
                                amount: row.amount,
                                cost_date,
                            }),
                        })
                    })
                    .collect()
            }
            RecordKind::Sale => {
                let rows: Vec<SaleRow> = sqlx::query_as(
                    "SELECT id, product_name, quantity, unit_price, created_at FROM sales ORDER BY seq",
                )
                .fetch_all(&self.pool)
                .await?;

                rows.into_iter()
                    .map(|row| -> Result<StoredRecord, sqlx::Error> {
                        Ok(StoredRecord {
                            id: BackendId(row.id),
                            created_at: parse_timestamp(&row.created_at)?,
                            data: RecordData::Sale(Sale::new(
                                row.product_name,
                                row.quantity,
                                row.unit_price,
                            )),
                        })
                    })
                    .collect()
            }
        }
    }
}

impl PersistenceGateway for SqliteGateway {
    async fn create(&self, payload: &RecordPayload) -> Result<BackendId, GatewayError> {
        Ok(self.insert(payload).await?)
    }

    async fn delete(&self, kind: RecordKind, id: &BackendId) -> Result<(), GatewayError> {
        if !self.remove(kind, id).await? {
            tracing::debug!("{} {} was already absent", kind, id);
        }
        Ok(())
    }

    async fn list_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, GatewayError> {
        Ok(self.fetch_all(kind).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct TestContext {
        gateway: SqliteGateway,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let gateway = SqliteGateway::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        TestContext {
            gateway,
            _temp_dir: temp_dir,
        }
    }

    fn payload(data: RecordData) -> RecordPayload {
        RecordPayload {
            created_at: Utc::now(),
            data,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_products_in_order() {
        let ctx = setup().await;

        let first = ctx
            .gateway
            .create(&payload(RecordData::Product(
                Product::new("Milho").with_category("Grãos"),
            )))
            .await
            .unwrap();
        let second = ctx
            .gateway
            .create(&payload(RecordData::Product(Product::new("Feijão"))))
            .await
            .unwrap();
        assert_ne!(first, second);

        let products = ctx.gateway.list_all(RecordKind::Product).await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, first);
        assert_eq!(products[1].id, second);
        match &products[0].data {
            RecordData::Product(p) => {
                assert_eq!(p.name, "Milho");
                assert_eq!(p.category.as_deref(), Some("Grãos"));
            }
            other => panic!("expected product, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cost_roundtrip_keeps_amount_and_date() {
        let ctx = setup().await;
        let cost = Cost {
            cost_type: CostType::MaoDeObra,
            amount: 1234.56,
            cost_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        };

        ctx.gateway
            .create(&payload(RecordData::Cost(cost.clone())))
            .await
            .unwrap();

        let costs = ctx.gateway.list_all(RecordKind::Cost).await.unwrap();
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].data, RecordData::Cost(cost));
    }

    #[tokio::test]
    async fn test_sale_total_matches_after_reload() {
        let ctx = setup().await;
        ctx.gateway
            .create(&payload(RecordData::Sale(Sale::new("Milho", 12.0, 2.75))))
            .await
            .unwrap();

        let sales = ctx.gateway.list_all(RecordKind::Sale).await.unwrap();
        match &sales[0].data {
            RecordData::Sale(s) => assert_eq!(s.total, s.quantity * s.unit_price),
            other => panic!("expected sale, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_only_touches_its_kind() {
        let ctx = setup().await;
        let product_id = ctx
            .gateway
            .create(&payload(RecordData::Product(Product::new("Milho"))))
            .await
            .unwrap();

        // Same id against another table removes nothing.
        assert!(!ctx
            .gateway
            .remove(RecordKind::Cost, &product_id)
            .await
            .unwrap());
        assert!(ctx
            .gateway
            .remove(RecordKind::Product, &product_id)
            .await
            .unwrap());
        assert!(ctx
            .gateway
            .list_all(RecordKind::Product)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_record_succeeds() {
        let ctx = setup().await;
        let result = ctx
            .gateway
            .delete(RecordKind::Sale, &BackendId("nope".to_string()))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_cost_type_is_a_storage_error() {
        let ctx = setup().await;
        sqlx::query(
            "INSERT INTO costs (id, cost_type, amount, cost_date, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("corrupt")
        .bind("fertilizante")
        .bind(10.0)
        .bind("2024-01-05")
        .bind(Utc::now().to_rfc3339())
        .execute(&ctx.gateway.pool)
        .await
        .unwrap();

        let result = ctx.gateway.list_all(RecordKind::Cost).await;
        assert!(matches!(result, Err(GatewayError::Storage(_))));
    }
}
