use crate::entities::{category, product};
use crate::errors::StoreError;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: u64 = 12;
pub const RELATED_LIMIT: u64 = 4;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Storefront product listing: active products in active categories,
/// filtered, sorted and paginated in pages of [`PAGE_SIZE`].
pub async fn list_products(
    db: &DatabaseConnection,
    query: &ProductListQuery,
) -> Result<ProductPage, StoreError> {
    let mut condition = Condition::all()
        .add(product::Column::IsActive.eq(true))
        .add(category::Column::IsActive.eq(true));

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(product::Column::Name.contains(term))
                .add(product::Column::Description.contains(term))
                .add(category::Column::Name.contains(term)),
        );
    }
    if let Some(slug) = query.category.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(category::Column::Slug.eq(slug));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(product::Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(product::Column::Price.lte(max_price));
    }

    let mut finder = product_rows().filter(condition);

    //Sorting zone
    finder = match query.sort.as_deref() {
        Some("price_low") => finder.order_by_asc(product::Column::Price),
        Some("price_high") => finder.order_by_desc(product::Column::Price),
        Some("newest") => finder.order_by_desc(product::Column::CreatedAt),
        Some("featured") => finder
            .order_by_desc(product::Column::IsFeatured)
            .order_by_asc(product::Column::Name),
        _ => finder.order_by_asc(product::Column::Name),
    };

    let page = query.page.unwrap_or(1).max(1);
    let paginator = finder.into_model::<ProductRow>().paginate(db, PAGE_SIZE);
    let counts = paginator.num_items_and_pages().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(ProductPage {
        products: rows.into_iter().map(summary_from_row).collect(),
        page,
        page_size: PAGE_SIZE,
        total_items: counts.number_of_items,
        total_pages: counts.number_of_pages,
    })
}

/// Product detail by slug, with up to [`RELATED_LIMIT`] other active
/// products of the same category.
pub async fn get_product(db: &DatabaseConnection, slug: &str) -> Result<ProductDetail, StoreError> {
    let row = product_rows()
        .filter(product::Column::Slug.eq(slug))
        .filter(product::Column::IsActive.eq(true))
        .filter(category::Column::IsActive.eq(true))
        .into_model::<ProductRow>()
        .one(db)
        .await?
        .ok_or(StoreError::NotFound)?;

    let related = product_rows()
        .filter(product::Column::CategoryId.eq(row.category_id))
        .filter(product::Column::IsActive.eq(true))
        .filter(product::Column::Id.ne(row.id))
        .order_by_asc(product::Column::Name)
        .limit(RELATED_LIMIT)
        .into_model::<ProductRow>()
        .all(db)
        .await?;

    Ok(ProductDetail {
        id: row.id,
        name: row.name,
        slug: row.slug,
        description: row.description,
        price: row.price,
        stock: row.stock,
        in_stock: row.stock > 0,
        is_featured: row.is_featured,
        category: CategoryRef {
            name: row.category_name,
            slug: row.category_slug,
        },
        related: related.into_iter().map(summary_from_row).collect(),
    })
}

pub async fn list_categories(
    db: &DatabaseConnection,
) -> Result<Vec<category::Model>, StoreError> {
    Ok(category::Entity::find()
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?)
}

/// Listing scoped to one category. Unknown or inactive slugs are a
/// NotFound, not an empty page.
pub async fn category_products(
    db: &DatabaseConnection,
    slug: &str,
    query: &ProductListQuery,
) -> Result<ProductPage, StoreError> {
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .filter(category::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or(StoreError::NotFound)?;

    let mut scoped = query.clone();
    scoped.category = Some(slug.to_string());
    list_products(db, &scoped).await
}

fn product_rows() -> Select<product::Entity> {
    product::Entity::find()
        .join(JoinType::InnerJoin, product::Relation::Category.def())
        .select_only()
        .column_as(product::Column::Id, "id")
        .column_as(product::Column::Name, "name")
        .column_as(product::Column::Slug, "slug")
        .column_as(product::Column::Description, "description")
        .column_as(product::Column::Price, "price")
        .column_as(product::Column::Stock, "stock")
        .column_as(product::Column::CategoryId, "category_id")
        .column_as(product::Column::IsFeatured, "is_featured")
        .column_as(category::Column::Name, "category_name")
        .column_as(category::Column::Slug, "category_slug")
}

fn summary_from_row(row: ProductRow) -> ProductSummary {
    ProductSummary {
        id: row.id,
        name: row.name,
        slug: row.slug,
        price: row.price,
        stock: row.stock,
        in_stock: row.stock > 0,
        is_featured: row.is_featured,
        category_name: row.category_name,
    }
}

//Structs
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductSummary>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub in_stock: bool,
    pub is_featured: bool,
    pub category_name: String,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub in_stock: bool,
    pub is_featured: bool,
    pub category: CategoryRef,
    pub related: Vec<ProductSummary>,
}

#[derive(Debug, Serialize)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, FromQueryResult)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    stock: i32,
    category_id: i32,
    is_featured: bool,
    category_name: String,
    category_slug: String,
}
