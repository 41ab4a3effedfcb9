//! Route handlers for the shopping API.
//!
//! Handlers are generic over the backing database trait so that tests can swap the storage
//! layer out. Since actix-web takes concrete functions, the [`route!`] macro generates a
//! unit struct per handler that implements [`HttpServiceFactory`] and pins the generics
//! down at registration time:
//!
//! `route!(my_orders => Get "/orders" impl StorefrontDatabase)` produces `MyOrdersRoute<B>`,
//! and `.service(MyOrdersRoute::<SqliteDatabase>::new())` mounts it.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use sfg_common::DEFAULT_CURRENCY_CODE;
use storefront_engine::{
    db_types::{OrderId, OrderStatus},
    OrderFlowApi,
    ReconciliationApi,
    StorefrontDatabase,
};

use crate::{
    auth::JwtClaims,
    data_objects::{CartLineRequest, CheckoutRequest, CheckoutResponse, JsonResponse, OrderStatusUpdateRequest},
    errors::ServerError,
    integrations::stripe::CheckoutProvider,
};

//--------------------------------------   route! macro     ----------------------------------------------------------
/// Generates a `{Name}Route` struct implementing `HttpServiceFactory` for a handler
/// function, optionally generic over one or more trait bounds.
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! {
            #[doc = "A handle to the `" $name "` route, for mounting with `.service(...)`."]
            pub struct [<$name:camel Route>];
            impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self {
                    Self
                }
            }
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! {
            #[doc = "A handle to the `" $name "` route, for mounting with `.service(...)`."]
            pub struct [<$name:camel Route>]<$([<T $bounds>]: $bounds + 'static),+> {
                _data: std::marker::PhantomData<($([<T $bounds>]),+,)>,
            }
            impl<$([<T $bounds>]: $bounds + 'static),+> [<$name:camel Route>]<$([<T $bounds>]),+> {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self {
                    Self { _data: std::marker::PhantomData }
                }
            }
            impl<$([<T $bounds>]: $bounds + 'static),+> actix_web::dev::HttpServiceFactory
                for [<$name:camel Route>]<$([<T $bounds>]),+>
            {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name::<$([<T $bounds>]),+>);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };
}
pub(crate) use route;

//--------------------------------------      Routes        ----------------------------------------------------------
route!(products => Get "/products" impl StorefrontDatabase);
route!(list_product => Post "/products" impl StorefrontDatabase);
route!(my_cart => Get "/cart" impl StorefrontDatabase);
route!(add_to_cart => Post "/cart" impl StorefrontDatabase);
route!(remove_from_cart => Delete "/cart/{product_id}" impl StorefrontDatabase);
route!(place_order => Post "/orders" impl StorefrontDatabase);
route!(my_orders => Get "/orders" impl StorefrontDatabase);
route!(order_by_id => Get "/orders/{id}" impl StorefrontDatabase);
route!(update_order_status => Post "/orders/{id}/status" impl StorefrontDatabase);
route!(checkout => Post "/checkout" impl StorefrontDatabase, CheckoutProvider);

//--------------------------------------     Handlers       ----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

pub async fn products<B: StorefrontDatabase>(
    _claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let products = api.products().await?;
    Ok(HttpResponse::Ok().json(products))
}

/// Adds a product to the catalogue. Admin only.
pub async fn list_product<B: StorefrontDatabase>(
    claims: JwtClaims,
    body: web::Json<storefront_engine::db_types::NewProduct>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let product = api.list_product(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn my_cart<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart = api.cart_for_user(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

/// Sets the quantity for a product in the caller's cart, replacing any existing line.
pub async fn add_to_cart<B: StorefrontDatabase>(
    claims: JwtClaims,
    body: web::Json<CartLineRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CartLineRequest { product_id, quantity } = body.into_inner();
    let line = api.add_to_cart(claims.user_id, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(line))
}

pub async fn remove_from_cart<B: StorefrontDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let removed = api.remove_from_cart(claims.user_id, product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Removed {removed} cart line(s)"))))
}

/// Converts the caller's cart into a `Pending` order. Fails with a 400 on an empty cart and
/// a 409 when any line exceeds the available stock; in the latter case nothing is decremented.
pub async fn place_order<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.place_order(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn my_orders<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let orders = api.orders_for_user(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

/// The order with its price-snapshot lines. Accessible to the order's owner and admins.
pub async fn order_by_id<B: StorefrontDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let result = api.order_with_lines(&order_id).await?.ok_or(ServerError::NoRecordFound)?;
    claims.check_access_for(result.order.user_id)?;
    Ok(HttpResponse::Ok().json(result))
}

/// Admin fulfilment transitions (`Processing`, `Shipped`, `Delivered`). Payment-driven
/// transitions come exclusively through the webhook channel, never through this route.
pub async fn update_order_status<B: StorefrontDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<OrderStatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let order_id = OrderId(path.into_inner());
    let order = api.update_order_status(&order_id, body.status).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Creates a hosted checkout session for a pending order and registers the attempt with
/// the reconciliation engine. Re-invoking this for the same order (an abandoned or failed
/// checkout) resets its payment record to `Pending` against the new session.
pub async fn checkout<B: StorefrontDatabase, P: CheckoutProvider>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    orders: web::Data<OrderFlowApi<B>>,
    reconciliation: web::Data<ReconciliationApi<B>>,
    provider: web::Data<P>,
) -> Result<HttpResponse, ServerError> {
    let order_id = body.order_id;
    let order = orders.fetch_order(&order_id).await?.ok_or(ServerError::NoRecordFound)?;
    claims.check_access_for(order.user_id)?;
    if order.status != OrderStatus::Pending {
        return Err(ServerError::UnsupportedOrderState(format!(
            "Order {order_id} is {} and cannot be checked out",
            order.status
        )));
    }
    let description = format!("Order {order_id}");
    let session = provider
        .create_checkout_session(order.total_amount, DEFAULT_CURRENCY_CODE, &order_id.value().to_string(), &description)
        .await?;
    reconciliation.register_checkout(&order, &session.id, order.total_amount, DEFAULT_CURRENCY_CODE).await?;
    info!("💻️💳️ Checkout session {} created for order {order_id}", session.id);
    Ok(HttpResponse::Ok().json(CheckoutResponse { session_id: session.id, url: session.url }))
}
