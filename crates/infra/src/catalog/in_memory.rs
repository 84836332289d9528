use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

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

use super::matches_search;

#[derive(Debug, Clone)]
struct CategoryRow {
    category: ProductCategory,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    categories: BTreeMap<CategoryId, CategoryRow>,
    contacts: BTreeMap<ContactId, Contact>,
    last_product_id: i64,
    last_history_id: i64,
    last_category_id: i64,
    last_contact_id: i64,
}

impl Tables {
    fn next_history_id(&mut self) -> ProductHistoryId {
        self.last_history_id += 1;
        ProductHistoryId::new(self.last_history_id)
    }

    fn live_product_mut(&mut self, id: ProductId) -> DomainResult<&mut Product> {
        self.products
            .get_mut(&id)
            .filter(|p| !p.is_deleted())
            .ok_or(DomainError::NotFound)
    }

    fn live_category_mut(&mut self, id: CategoryId) -> DomainResult<&mut CategoryRow> {
        self.categories
            .get_mut(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or(DomainError::NotFound)
    }

    fn live_contact_mut(&mut self, id: ContactId) -> DomainResult<&mut Contact> {
        self.contacts
            .get_mut(&id)
            .filter(|c| !c.is_deleted())
            .ok_or(DomainError::NotFound)
    }
}

/// In-memory catalog for tests/dev.
///
/// Ids are assigned sequentially from 1. Deletes are soft: rows keep their id
/// and unique values, and disappear from listings and by-id reads.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<Tables>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| DomainError::storage("catalog lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("catalog lock poisoned"))
    }
}

fn paginate<T>(mut rows: Vec<T>, offset: i64) -> Page<T> {
    let count = rows.len() as u64;
    let start = offset_start(offset).min(rows.len());
    let items = rows.drain(start..).take(PAGE_SIZE).collect();
    Page::new(items, count)
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_products(order: ProductOrder, a: &Product, b: &Product) -> Ordering {
    let primary = match order {
        ProductOrder::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        ProductOrder::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductOrder::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ProductOrder::BuyPrice => cmp_f64(a.buy_price, b.buy_price),
        ProductOrder::SellPrice => cmp_f64(a.sell_price, b.sell_price),
        ProductOrder::Stock => a.stock.cmp(&b.stock),
    };
    primary.then(a.product_id.cmp(&b.product_id))
}

fn compare_contacts(order: ContactOrder, a: &Contact, b: &Contact) -> Ordering {
    let primary = match order {
        ContactOrder::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        ContactOrder::CreatedAt => a.created_at.cmp(&b.created_at),
        ContactOrder::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ContactOrder::Money => cmp_f64(a.money, b.money),
    };
    primary.then(a.contact_id.cmp(&b.contact_id))
}

#[async_trait]
impl ProductsService for InMemoryCatalog {
    async fn get_products(&self, query: ProductQuery) -> DomainResult<Page<Product>> {
        let order = ProductOrder::parse_lenient(&query.order);
        let category = query.category_filter();
        let tables = self.read()?;

        let mut rows: Vec<Product> = tables
            .products
            .values()
            .filter(|p| !p.is_deleted())
            .filter(|p| category.is_none_or(|c| p.category_id == c))
            .filter(|p| matches_search(&p.name, &query.search))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_products(order, a, b));

        Ok(paginate(rows, query.offset))
    }

    async fn get_product_categories(&self) -> DomainResult<Vec<ProductCategory>> {
        let tables = self.read()?;
        let mut categories: Vec<ProductCategory> = tables
            .categories
            .values()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.category.clone())
            .collect();
        categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(categories)
    }

    async fn get_products_list(&self) -> DomainResult<Vec<ProductSummary>> {
        let tables = self.read()?;
        let mut list: Vec<ProductSummary> = tables
            .products
            .values()
            .filter(|p| !p.is_deleted())
            .map(Product::summary)
            .collect();
        list.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(list)
    }

    async fn get_product_by_id(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let tables = self.read()?;
        Ok(tables.products.get(&id).filter(|p| !p.is_deleted()).cloned())
    }

    async fn delete_product_by_id(&self, id: ProductId) -> DomainResult<u64> {
        let mut tables = self.write()?;
        match tables.live_product_mut(id) {
            Ok(product) => {
                product.deleted_at = Some(Utc::now());
                tracing::info!(product_id = %id, "product deleted");
                Ok(1)
            }
            Err(DomainError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn post_product(&self, new: NewProduct) -> DomainResult<Product> {
        let mut tables = self.write()?;
        tables.last_product_id += 1;
        let product_id = ProductId::new(tables.last_product_id);
        let product_history_id = tables.next_history_id();
        let now = Utc::now();

        let product = Product {
            product_id,
            product_history_id,
            category_id: new.category_id,
            name: new.name,
            sell_price: new.sell_price,
            buy_price: new.buy_price,
            stock: new.stock,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.products.insert(product_id, product.clone());
        tracing::info!(product_id = %product_id, "product created");
        Ok(product)
    }

    async fn update_product(&self, update: ProductUpdate) -> DomainResult<Product> {
        let mut tables = self.write()?;
        let price_changed = {
            let current = tables.live_product_mut(update.product_id)?;
            current.sell_price != update.sell_price || current.buy_price != update.buy_price
        };
        let history_id = price_changed.then(|| tables.next_history_id());

        let product = tables.live_product_mut(update.product_id)?;
        if let Some(history_id) = history_id {
            product.product_history_id = history_id;
        }
        product.name = update.name;
        product.category_id = update.category_id;
        product.sell_price = update.sell_price;
        product.buy_price = update.buy_price;
        product.stock = update.stock;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn update_product_stock(&self, id: ProductId, amount: i64) -> DomainResult<Product> {
        let mut tables = self.write()?;
        let product = tables.live_product_mut(id)?;
        product.stock = product
            .stock
            .checked_add(amount)
            .ok_or_else(|| DomainError::conflict("stock adjustment overflows"))?;
        product.updated_at = Utc::now();
        tracing::debug!(product_id = %id, amount, stock = product.stock, "stock adjusted");
        Ok(product.clone())
    }

    async fn post_product_category(&self, name: String) -> DomainResult<ProductCategory> {
        let mut tables = self.write()?;
        if tables.categories.values().any(|row| row.category.name == name) {
            return Err(DomainError::conflict(format!("category name taken: {name}")));
        }
        tables.last_category_id += 1;
        let category = ProductCategory {
            category_id: CategoryId::new(tables.last_category_id),
            name,
        };
        tables.categories.insert(
            category.category_id,
            CategoryRow {
                category: category.clone(),
                deleted_at: None,
            },
        );
        Ok(category)
    }

    async fn update_product_category(
        &self,
        name: String,
        id: CategoryId,
    ) -> DomainResult<ProductCategory> {
        let mut tables = self.write()?;
        let taken = tables
            .categories
            .values()
            .any(|row| row.category.name == name && row.category.category_id != id);
        if taken {
            return Err(DomainError::conflict(format!("category name taken: {name}")));
        }
        let row = tables.live_category_mut(id)?;
        row.category.name = name;
        Ok(row.category.clone())
    }

    async fn delete_product_category_by_id(&self, id: CategoryId) -> DomainResult<u64> {
        let mut tables = self.write()?;
        match tables.live_category_mut(id) {
            Ok(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(1)
            }
            Err(DomainError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ContactsService for InMemoryCatalog {
    async fn get_contacts(&self, query: ContactQuery) -> DomainResult<Page<Contact>> {
        let order = ContactOrder::parse_lenient(&query.order);
        let tables = self.read()?;

        let mut rows: Vec<Contact> = tables
            .contacts
            .values()
            .filter(|c| !c.is_deleted() && c.role == query.role)
            .filter(|c| matches_search(&c.name, &query.search) || matches_search(&c.phone, &query.search))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_contacts(order, a, b));

        Ok(paginate(rows, query.offset))
    }

    async fn get_contacts_minified(&self) -> DomainResult<Vec<ContactSummary>> {
        let tables = self.read()?;
        let mut list: Vec<ContactSummary> = tables
            .contacts
            .values()
            .filter(|c| !c.is_deleted())
            .map(Contact::summary)
            .collect();
        list.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(list)
    }

    async fn get_contact_by_id(&self, id: ContactId) -> DomainResult<Option<Contact>> {
        let tables = self.read()?;
        Ok(tables.contacts.get(&id).filter(|c| !c.is_deleted()).cloned())
    }

    async fn delete_contact_by_id(&self, id: ContactId) -> DomainResult<u64> {
        let mut tables = self.write()?;
        match tables.live_contact_mut(id) {
            Ok(contact) => {
                contact.deleted_at = Some(Utc::now());
                tracing::info!(contact_id = %id, "contact deleted");
                Ok(1)
            }
            Err(DomainError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn post_contact(&self, new: NewContact) -> DomainResult<Contact> {
        let mut tables = self.write()?;
        if tables.contacts.values().any(|c| c.phone == new.phone) {
            return Err(DomainError::conflict(format!("phone taken: {}", new.phone)));
        }
        tables.last_contact_id += 1;
        let now = Utc::now();
        let contact = Contact {
            contact_id: ContactId::new(tables.last_contact_id),
            name: new.name,
            phone: new.phone,
            address: new.address,
            role: new.role,
            money: new.money,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.contacts.insert(contact.contact_id, contact.clone());
        tracing::info!(contact_id = %contact.contact_id, "contact created");
        Ok(contact)
    }

    async fn update_contact(&self, update: ContactUpdate) -> DomainResult<Contact> {
        let mut tables = self.write()?;
        let taken = tables
            .contacts
            .values()
            .any(|c| c.phone == update.phone && c.contact_id != update.contact_id);
        if taken {
            return Err(DomainError::conflict(format!("phone taken: {}", update.phone)));
        }
        let contact = tables.live_contact_mut(update.contact_id)?;
        contact.name = update.name;
        contact.phone = update.phone;
        contact.address = update.address;
        contact.money = update.money;
        contact.updated_at = Utc::now();
        Ok(contact.clone())
    }
}

#[async_trait]
impl RecordLookup for InMemoryCatalog {
    async fn exists(&self, relation: Relation, id: i64) -> DomainResult<bool> {
        let tables = self.read()?;
        Ok(match relation {
            Relation::Products => tables.products.contains_key(&ProductId::new(id)),
            Relation::ProductCategories => tables.categories.contains_key(&CategoryId::new(id)),
            Relation::Contacts => tables.contacts.contains_key(&ContactId::new(id)),
        })
    }

    async fn is_unique(&self, key: UniqueKey, value: &str, except: Option<i64>) -> DomainResult<bool> {
        let tables = self.read()?;
        let taken = match key {
            UniqueKey::CategoryName => tables.categories.values().any(|row| {
                row.category.name == value && Some(row.category.category_id.get()) != except
            }),
            UniqueKey::ContactPhone => tables
                .contacts
                .values()
                .any(|c| c.phone == value && Some(c.contact_id.get()) != except),
        };
        Ok(!taken)
    }
}
