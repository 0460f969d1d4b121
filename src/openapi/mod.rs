use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Backend API for a storefront: product catalog, categories, \
carts, orders, reviews, coupons, address book and homepage content. All \
responses share the `{success, data?, message?, pagination?}` envelope. \
Authenticated endpoints expect `Authorization: Bearer <token>` issued by the \
configured identity provider.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        handlers::products::list_products,
        handlers::products::search_products,
        handlers::products::products_by_category,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::categories::list_categories,
        handlers::categories::get_category,
        handlers::categories::get_category_by_slug,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::remove_item,
        handlers::cart::clear_cart,
        handlers::orders::create_order,
        handlers::orders::my_orders,
        handlers::orders::get_order,
        handlers::orders::admin_list_orders,
        handlers::orders::update_order_status,
        handlers::orders::cancel_order,
        handlers::orders::delete_order,
        handlers::offline_orders::create_offline_order,
        handlers::offline_orders::list_offline_orders,
        handlers::offline_orders::get_offline_order,
        handlers::offline_orders::update_offline_order_status,
        handlers::offline_orders::delete_offline_order,
        handlers::reviews::product_reviews,
        handlers::reviews::create_review,
        handlers::reviews::my_reviews,
        handlers::reviews::admin_list_reviews,
        handlers::reviews::update_review,
        handlers::reviews::moderate_review,
        handlers::reviews::delete_review,
        handlers::reviews::toggle_helpful,
        handlers::reviews::report_review,
        handlers::coupons::create_coupon,
        handlers::coupons::list_coupons,
        handlers::coupons::get_coupon,
        handlers::coupons::update_coupon,
        handlers::coupons::delete_coupon,
        handlers::coupons::validate_coupon,
        handlers::addresses::list_addresses,
        handlers::addresses::add_address,
        handlers::addresses::update_address,
        handlers::addresses::set_default_address,
        handlers::addresses::delete_address,
        handlers::users::sync_user,
        handlers::users::my_profile,
        handlers::users::update_my_profile,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user_role,
        handlers::users::delete_user,
        handlers::homepage::get_settings,
        handlers::homepage::update_settings,
        handlers::homepage::add_hero_slide,
        handlers::homepage::update_hero_slide,
        handlers::homepage::delete_hero_slide,
        handlers::homepage::add_nav_link,
        handlers::homepage::delete_nav_link,
    ),
    tags(
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Category tree"),
        (name = "Cart", description = "Per-user shopping cart"),
        (name = "Orders", description = "Order lifecycle"),
        (name = "Offline Orders", description = "Manually recorded sales"),
        (name = "Reviews", description = "Product reviews and moderation"),
        (name = "Coupons", description = "Discount coupons"),
        (name = "Addresses", description = "Saved shipping addresses"),
        (name = "Users", description = "Accounts and roles"),
        (name = "Homepage", description = "Storefront homepage content")
    )
)]
pub struct ApiDoc;

/// Swagger UI router serving the generated document. Mounted outside
/// production only.
pub fn swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_delete_endpoints() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/v1/products/{id}",
            "/api/v1/orders/{id}",
            "/api/v1/addresses/{id}",
            "/api/v1/cart",
        ] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }

        doc.to_json().unwrap();
    }

    #[test]
    fn homepage_paths_match_the_mounted_prefix() {
        let doc = ApiDoc::openapi();
        assert!(doc
            .paths
            .paths
            .keys()
            .any(|p| p.starts_with("/api/v1/homepage-settings")));
        assert!(!doc.paths.paths.keys().any(|p| p.starts_with("/api/v1/homepage/")));
    }
}
