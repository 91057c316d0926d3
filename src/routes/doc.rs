use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    models::{AdminOrder, AdminOrderItem, CartLine, OrderStatus, Product, RecentPurchase, User},
    routes::{MessageResponse, admin, auth, health, shop, user},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("id"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::steam_login,
        auth::steam_return,
        auth::current_user,
        auth::logout,
        auth::auth_status,
        shop::list_products,
        shop::get_product,
        shop::recent_purchases,
        shop::create_order,
        user::get_profile,
        user::update_profile,
        user::get_cart,
        user::add_to_cart,
        user::remove_from_cart,
        admin::list_products,
        admin::create_product,
        admin::delete_product,
        admin::list_orders,
        admin::update_order_status,
        admin::check_admin,
    ),
    components(
        schemas(
            User,
            Product,
            CartLine,
            RecentPurchase,
            OrderStatus,
            AdminOrder,
            AdminOrderItem,
            MessageResponse,
            auth::AuthStatusResponse,
            shop::CreateOrderRequest,
            shop::OrderCreatedResponse,
            user::UpdateProfileRequest,
            user::AddToCartRequest,
            admin::UpdateOrderStatusRequest,
            admin::CreateProductForm,
            admin::ProductCreatedResponse,
            admin::AdminCheckResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Steam login and session endpoints"),
        (name = "Shop", description = "Public storefront endpoints"),
        (name = "User", description = "Profile and cart endpoints"),
        (name = "Admin", description = "Product and order management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
