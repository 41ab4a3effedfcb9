use std::time::Duration;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use log::*;
use storefront_engine::{events::EventProducers, OrderFlowApi, ReconciliationApi, SqliteDatabase, StorefrontDatabase};
use stripe_tools::StripeApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::stripe::StripeWebhookRoute,
    routes::{
        health,
        AddToCartRoute,
        CheckoutRoute,
        ListProductRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        ProductsRoute,
        RemoveFromCartRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not open the database. {e}")))?;
    debug!("💻️ Database opened at {}", db.url());
    let srv = create_server_instance(config, db, EventProducers::default())?;
    srv.await?;
    Ok(())
}

/// Builds the actix server. The event producers are injected so that a caller can attach
/// order-paid and order-annulled subscribers before the server starts.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let stripe_api = StripeApi::new(config.stripe_config.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not build the provider client. {e}")))?;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), producers.clone());
        let api_scope = web::scope("/api")
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(ListProductRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(RemoveFromCartRoute::<SqliteDatabase>::new())
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase, StripeApi>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("storefront_server::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(config.auth.clone()))
            .app_data(web::Data::new(config.stripe_config.clone()))
            .app_data(web::Data::new(stripe_api.clone()))
            .service(health)
            .service(api_scope)
            .service(StripeWebhookRoute::<SqliteDatabase>::new())
    })
    .keep_alive(Duration::from_secs(600))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Server is running on {host}:{port}");
    Ok(srv)
}
