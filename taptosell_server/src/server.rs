use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use taptosell_engine::{
    db_types::Role,
    events::{EventHandlers, EventHooks, EventProducers},
    AuthApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};

use crate::{
    auth::TokenAuthMiddlewareFactory,
    config::ServerConfig,
    errors::ServerError,
    middleware::AclMiddlewareFactory,
    routes::{
        approve_price_change,
        balance_for_user,
        create_product,
        create_withdrawal,
        fulfill_order,
        get_commission,
        health,
        issue_token,
        my_balance,
        my_history,
        my_orders,
        my_withdrawals,
        pay_order,
        place_order,
        process_withdrawal,
        record_deposit,
        reject_price_change,
        release_order,
        request_price_change,
        search_orders,
        set_commission,
        update_roles,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let hooks = if config.emit_event_logs { logging_hooks() } else { EventHooks::default() };
    let handlers = EventHandlers::new(config.event_buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// A default set of event hooks that logs every marketplace event. A deployment that feeds a
/// notification inbox would replace these with its own handlers.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_placed(|ev| Box::pin(async move { info!("📬️ Order #{} placed ({})", ev.order.id, ev.order.status) }))
        .on_order_paid(|ev| Box::pin(async move { info!("📬️ Order #{} paid, cost {}", ev.order.id, ev.order.cost) }))
        .on_order_shipped(|ev| Box::pin(async move { info!("📬️ Order #{} shipped", ev.order.id) }))
        .on_payment_released(|ev| {
            Box::pin(async move { info!("📬️ Payment of {} released for order #{}", ev.amount, ev.order.id) })
        })
        .on_withdrawal_requested(|ev| {
            Box::pin(async move {
                info!("📬️ Withdrawal #{} of {} requested", ev.withdrawal.id, ev.withdrawal.amount)
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    type B = SqliteDatabase;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let wallet_api = WalletApi::new(db.clone(), producers.clone());
        let auth_api = AuthApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tts::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(wallet_api))
            .app_data(web::Data::new(auth_api));
        let any_role = [Role::Supplier, Role::Dropshipper, Role::Admin];
        // Every /api route sits behind bearer-token auth; each resource then names the roles that
        // may call it. Ownership checks happen in the engine.
        let api_scope = web::scope("/api")
            .wrap(TokenAuthMiddlewareFactory::new(db.clone()))
            .service(
                web::resource("/orders")
                    .route(web::post().to(place_order::<B>))
                    .route(web::get().to(search_orders::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Dropshipper, Role::Admin])),
            )
            .service(
                web::resource("/orders/mine")
                    .route(web::get().to(my_orders::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Dropshipper, Role::Admin])),
            )
            .service(
                web::resource("/orders/{id}/pay")
                    .route(web::post().to(pay_order::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Dropshipper, Role::Admin])),
            )
            .service(
                web::resource("/orders/{id}/fulfill")
                    .route(web::post().to(fulfill_order::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Supplier])),
            )
            .service(
                web::resource("/orders/{id}/release")
                    .route(web::post().to(release_order::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/balance")
                    .route(web::get().to(my_balance::<B>))
                    .wrap(AclMiddlewareFactory::new(&any_role)),
            )
            .service(
                web::resource("/balance/{user_id}")
                    .route(web::get().to(balance_for_user::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/history")
                    .route(web::get().to(my_history::<B>))
                    .wrap(AclMiddlewareFactory::new(&any_role)),
            )
            .service(
                web::resource("/deposits")
                    .route(web::post().to(record_deposit::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/withdrawals")
                    .route(web::post().to(create_withdrawal::<B>))
                    .route(web::get().to(my_withdrawals::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Supplier])),
            )
            .service(
                web::resource("/withdrawals/{id}/process")
                    .route(web::post().to(process_withdrawal::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/products")
                    .route(web::post().to(create_product::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Supplier])),
            )
            .service(
                web::resource("/products/{id}/price-change")
                    .route(web::post().to(request_price_change::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Supplier])),
            )
            .service(
                web::resource("/price-changes/{id}/approve")
                    .route(web::post().to(approve_price_change::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/price-changes/{id}/reject")
                    .route(web::post().to(reject_price_change::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/settings/commission")
                    .route(web::get().to(get_commission::<B>))
                    .route(web::post().to(set_commission::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/roles")
                    .route(web::post().to(update_roles::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            )
            .service(
                web::resource("/tokens")
                    .route(web::post().to(issue_token::<B>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Admin])),
            );
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
