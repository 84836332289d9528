//! Postgres-backed catalog.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | DomainError |
//! |------------|----------------------|-------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (numeric out of range, e.g. stock overflow) | `22003` | `Conflict` |
//! | Database (other) | Any other | `Storage` |
//! | Other | N/A | `Storage` |
//!
//! Deletes are soft (`deleted_at`). Listings and by-id reads skip deleted
//! rows; the validation lookups do not.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockroom_contacts::{
    Contact, ContactOrder, ContactQuery, ContactSummary, ContactUpdate, ContactsService, NewContact,
};
use stockroom_core::page::offset_start;
use stockroom_core::{
    CategoryId, ContactId, DomainError, DomainResult, PAGE_SIZE, Page, ProductHistoryId, ProductId,
    RecordLookup, Relation, UniqueKey,
};
use stockroom_products::{
    NewProduct, Product, ProductCategory, ProductOrder, ProductQuery, ProductSummary, ProductUpdate,
    ProductsService,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS product_categories (
    category_id BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at  TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS products (
    product_id         BIGSERIAL PRIMARY KEY,
    product_history_id BIGINT NOT NULL DEFAULT 0,
    category_id        BIGINT NOT NULL REFERENCES product_categories (category_id),
    name               TEXT NOT NULL,
    sell_price         DOUBLE PRECISION NOT NULL,
    buy_price          DOUBLE PRECISION NOT NULL,
    stock              BIGINT NOT NULL DEFAULT 0,
    created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at         TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS product_history (
    product_history_id BIGSERIAL PRIMARY KEY,
    product_id         BIGINT NOT NULL REFERENCES products (product_id),
    sell_price         DOUBLE PRECISION NOT NULL,
    buy_price          DOUBLE PRECISION NOT NULL,
    created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id BIGSERIAL PRIMARY KEY,
    name       TEXT NOT NULL,
    phone      TEXT NOT NULL UNIQUE,
    address    TEXT NOT NULL,
    role       TEXT NOT NULL,
    money      DOUBLE PRECISION NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at TIMESTAMPTZ
);
"#;

const PRODUCT_COLUMNS: &str = "product_id, product_history_id, category_id, name, sell_price, \
                               buy_price, stock, created_at, updated_at, deleted_at";

const CONTACT_COLUMNS: &str =
    "contact_id, name, phone, address, role, money, created_at, updated_at, deleted_at";

/// Catalog stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the catalog tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> DomainResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn begin(&self, operation: &str) -> DomainResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("22003") => DomainError::conflict(msg),
                _ => DomainError::storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            DomainError::storage(format!("connection pool closed in {}", operation))
        }
        _ => DomainError::storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        product_id: ProductId::new(row.try_get("product_id")?),
        product_history_id: ProductHistoryId::new(row.try_get("product_history_id")?),
        category_id: CategoryId::new(row.try_get("category_id")?),
        name: row.try_get("name")?,
        sell_price: row.try_get("sell_price")?,
        buy_price: row.try_get("buy_price")?,
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn contact_from_row(row: &PgRow) -> Result<Contact, sqlx::Error> {
    Ok(Contact {
        contact_id: ContactId::new(row.try_get("contact_id")?),
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        role: row.try_get("role")?,
        money: row.try_get("money")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<ProductCategory, sqlx::Error> {
    Ok(ProductCategory {
        category_id: CategoryId::new(row.try_get("category_id")?),
        name: row.try_get("name")?,
    })
}

fn limit_offset(offset: i64) -> (i64, i64) {
    let start = i64::try_from(offset_start(offset)).unwrap_or(i64::MAX);
    (PAGE_SIZE as i64, start)
}

async fn record_history(
    tx: &mut Transaction<'static, Postgres>,
    product_id: ProductId,
    sell_price: f64,
    buy_price: f64,
) -> Result<i64, sqlx::Error> {
    let history_id: i64 = sqlx::query(
        "INSERT INTO product_history (product_id, sell_price, buy_price) \
         VALUES ($1, $2, $3) RETURNING product_history_id",
    )
    .bind(product_id.get())
    .bind(sell_price)
    .bind(buy_price)
    .fetch_one(&mut **tx)
    .await?
    .try_get("product_history_id")?;
    Ok(history_id)
}

#[async_trait]
impl ProductsService for PostgresCatalog {
    #[instrument(skip(self), err)]
    async fn get_products(&self, query: ProductQuery) -> DomainResult<Page<Product>> {
        // The column comes from a closed enum, never from raw input.
        let order = ProductOrder::parse_lenient(&query.order).as_str();
        let category = query.category_filter().map(CategoryId::get);
        let (limit, offset) = limit_offset(query.offset);

        let filter = "deleted_at IS NULL \
                      AND ($1::BIGINT IS NULL OR category_id = $1) \
                      AND strpos(lower(name), lower($2)) > 0";

        let count: i64 = sqlx::query(&format!("SELECT COUNT(*) AS n FROM products WHERE {filter}"))
            .bind(category)
            .bind(&query.search)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get("n"))
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {filter} \
             ORDER BY {order} ASC, product_id ASC LIMIT $3 OFFSET $4"
        ))
        .bind(category)
        .bind(&query.search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_products", e))?;

        let items = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("get_products", e))?;
        Ok(Page::new(items, count.max(0) as u64))
    }

    async fn get_product_categories(&self) -> DomainResult<Vec<ProductCategory>> {
        let rows = sqlx::query(
            "SELECT category_id, name FROM product_categories \
             WHERE deleted_at IS NULL ORDER BY lower(name) ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_categories", e))?;

        rows.iter()
            .map(category_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("get_product_categories", e))
    }

    async fn get_products_list(&self) -> DomainResult<Vec<ProductSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL ORDER BY lower(name) ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_products_list", e))?;

        rows.iter()
            .map(|row| product_from_row(row).map(|p| p.summary()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("get_products_list", e))
    }

    async fn get_product_by_id(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_by_id", e))?;

        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_product_by_id", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product_by_id(&self, id: ProductId) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW() WHERE product_id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_product_by_id", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    async fn post_product(&self, new: NewProduct) -> DomainResult<Product> {
        let op = "post_product";
        let mut tx = self.begin(op).await?;

        let product_id: i64 = sqlx::query(
            "INSERT INTO products (category_id, name, sell_price, buy_price, stock) \
             VALUES ($1, $2, $3, $4, $5) RETURNING product_id",
        )
        .bind(new.category_id.get())
        .bind(&new.name)
        .bind(new.sell_price)
        .bind(new.buy_price)
        .bind(new.stock)
        .fetch_one(&mut *tx)
        .await
        .and_then(|row| row.try_get("product_id"))
        .map_err(|e| map_sqlx_error(op, e))?;
        let product_id = ProductId::new(product_id);

        let history_id = record_history(&mut tx, product_id, new.sell_price, new.buy_price)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;

        let row = sqlx::query(&format!(
            "UPDATE products SET product_history_id = $2 WHERE product_id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product_id.get())
        .bind(history_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(op, e))?;
        let product = product_from_row(&row).map_err(|e| map_sqlx_error(op, e))?;

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;
        Ok(product)
    }

    #[instrument(skip(self, update), fields(product_id = %update.product_id), err)]
    async fn update_product(&self, update: ProductUpdate) -> DomainResult<Product> {
        let op = "update_product";
        let mut tx = self.begin(op).await?;

        let current = sqlx::query(
            "SELECT sell_price, buy_price, product_history_id FROM products \
             WHERE product_id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(update.product_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(op, e))?
        .ok_or(DomainError::NotFound)?;

        let (sell, buy, mut history_id): (f64, f64, i64) = (
            current.try_get("sell_price").map_err(|e| map_sqlx_error(op, e))?,
            current.try_get("buy_price").map_err(|e| map_sqlx_error(op, e))?,
            current.try_get("product_history_id").map_err(|e| map_sqlx_error(op, e))?,
        );
        if sell != update.sell_price || buy != update.buy_price {
            history_id = record_history(&mut tx, update.product_id, update.sell_price, update.buy_price)
                .await
                .map_err(|e| map_sqlx_error(op, e))?;
        }

        let row = sqlx::query(&format!(
            "UPDATE products SET name = $2, category_id = $3, sell_price = $4, buy_price = $5, \
             stock = $6, product_history_id = $7, updated_at = NOW() \
             WHERE product_id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(update.product_id.get())
        .bind(&update.name)
        .bind(update.category_id.get())
        .bind(update.sell_price)
        .bind(update.buy_price)
        .bind(update.stock)
        .bind(history_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(op, e))?;
        let product = product_from_row(&row).map_err(|e| map_sqlx_error(op, e))?;

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn update_product_stock(&self, id: ProductId, amount: i64) -> DomainResult<Product> {
        let row = sqlx::query(&format!(
            "UPDATE products SET stock = stock + $2, updated_at = NOW() \
             WHERE product_id = $1 AND deleted_at IS NULL RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.get())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product_stock", e))?
        .ok_or(DomainError::NotFound)?;

        product_from_row(&row).map_err(|e| map_sqlx_error("update_product_stock", e))
    }

    async fn post_product_category(&self, name: String) -> DomainResult<ProductCategory> {
        let row = sqlx::query(
            "INSERT INTO product_categories (name) VALUES ($1) RETURNING category_id, name",
        )
        .bind(&name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("post_product_category", e))?;

        category_from_row(&row).map_err(|e| map_sqlx_error("post_product_category", e))
    }

    async fn update_product_category(
        &self,
        name: String,
        id: CategoryId,
    ) -> DomainResult<ProductCategory> {
        let row = sqlx::query(
            "UPDATE product_categories SET name = $2, updated_at = NOW() \
             WHERE category_id = $1 AND deleted_at IS NULL RETURNING category_id, name",
        )
        .bind(id.get())
        .bind(&name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product_category", e))?
        .ok_or(DomainError::NotFound)?;

        category_from_row(&row).map_err(|e| map_sqlx_error("update_product_category", e))
    }

    async fn delete_product_category_by_id(&self, id: CategoryId) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE product_categories SET deleted_at = NOW() \
             WHERE category_id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_product_category_by_id", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ContactsService for PostgresCatalog {
    #[instrument(skip(self), err)]
    async fn get_contacts(&self, query: ContactQuery) -> DomainResult<Page<Contact>> {
        let order = ContactOrder::parse_lenient(&query.order).as_str();
        let (limit, offset) = limit_offset(query.offset);

        let filter = "deleted_at IS NULL AND role = $1 \
                      AND (strpos(lower(name), lower($2)) > 0 OR strpos(phone, $2) > 0)";

        let count: i64 = sqlx::query(&format!("SELECT COUNT(*) AS n FROM contacts WHERE {filter}"))
            .bind(&query.role)
            .bind(&query.search)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get("n"))
            .map_err(|e| map_sqlx_error("count_contacts", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE {filter} \
             ORDER BY {order} ASC, contact_id ASC LIMIT $3 OFFSET $4"
        ))
        .bind(&query.role)
        .bind(&query.search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_contacts", e))?;

        let items = rows
            .iter()
            .map(contact_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("get_contacts", e))?;
        Ok(Page::new(items, count.max(0) as u64))
    }

    async fn get_contacts_minified(&self) -> DomainResult<Vec<ContactSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE deleted_at IS NULL ORDER BY lower(name) ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_contacts_minified", e))?;

        rows.iter()
            .map(|row| contact_from_row(row).map(|c| c.summary()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("get_contacts_minified", e))
    }

    async fn get_contact_by_id(&self, id: ContactId) -> DomainResult<Option<Contact>> {
        let row = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_contact_by_id", e))?;

        row.as_ref()
            .map(contact_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_contact_by_id", e))
    }

    #[instrument(skip(self), fields(contact_id = %id), err)]
    async fn delete_contact_by_id(&self, id: ContactId) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE contacts SET deleted_at = NOW() WHERE contact_id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_contact_by_id", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, new), fields(role = %new.role), err)]
    async fn post_contact(&self, new: NewContact) -> DomainResult<Contact> {
        let row = sqlx::query(&format!(
            "INSERT INTO contacts (name, phone, address, role, money) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.role)
        .bind(new.money)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("post_contact", e))?;

        contact_from_row(&row).map_err(|e| map_sqlx_error("post_contact", e))
    }

    #[instrument(skip(self, update), fields(contact_id = %update.contact_id), err)]
    async fn update_contact(&self, update: ContactUpdate) -> DomainResult<Contact> {
        let row = sqlx::query(&format!(
            "UPDATE contacts SET name = $2, phone = $3, address = $4, money = $5, updated_at = NOW() \
             WHERE contact_id = $1 AND deleted_at IS NULL RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(update.contact_id.get())
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(update.money)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_contact", e))?
        .ok_or(DomainError::NotFound)?;

        contact_from_row(&row).map_err(|e| map_sqlx_error("update_contact", e))
    }
}

#[async_trait]
impl RecordLookup for PostgresCatalog {
    async fn exists(&self, relation: Relation, id: i64) -> DomainResult<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1) AS found",
            relation.table(),
            relation.id_column()
        );
        sqlx::query(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get("found"))
            .map_err(|e| map_sqlx_error("exists", e))
    }

    async fn is_unique(&self, key: UniqueKey, value: &str, except: Option<i64>) -> DomainResult<bool> {
        let relation = key.relation();
        let sql = format!(
            "SELECT NOT EXISTS (SELECT 1 FROM {table} WHERE {column} = $1 \
             AND ($2::BIGINT IS NULL OR {id} <> $2)) AS free",
            table = relation.table(),
            column = key.column(),
            id = relation.id_column(),
        );
        sqlx::query(&sql)
            .bind(value)
            .bind(except)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get("free"))
            .map_err(|e| map_sqlx_error("is_unique", e))
    }
}
