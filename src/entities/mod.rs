pub mod cart;
pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod profile;
pub mod user;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};

/// Creates every table the storefront needs. Statements are idempotent,
/// an already populated database is left untouched.
pub async fn setup_schema(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = vec![
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(profile::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(cart::Entity),
        schema.create_table_from_entity(cart_item::Entity),
        schema.create_table_from_entity(order::Entity),
        schema.create_table_from_entity(order_item::Entity),
    ];

    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table))
            .await
            .expect("Failed to create table");
    }

    // One row per product within a cart; additions merge into it.
    let mut cart_item_unique = Index::create();
    cart_item_unique
        .name("idx_cart_items_cart_id_product_id")
        .table(cart_item::Entity)
        .col(cart_item::Column::CartId)
        .col(cart_item::Column::ProductId)
        .unique()
        .if_not_exists();

    db.execute(backend.build(&cart_item_unique))
        .await
        .expect("Failed to create cart item index");
}
