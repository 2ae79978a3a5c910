//! HTTP-level tests for the route table: token auth, role ACL and the JSON bodies.
use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use serde_json::json;
use taptosell_engine::{
    db_types::{NewProduct, Order, OrderStatus, Role},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AuthApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};
use tts_common::Money;

use crate::{
    auth::TokenAuthMiddlewareFactory,
    middleware::AclMiddlewareFactory,
    routes::{health, my_balance, place_order},
};

async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn token_for(db: &SqliteDatabase, user_id: i64, roles: &[Role]) -> String {
    let auth = AuthApi::new(db.clone());
    auth.assign_roles(user_id, roles).await.expect("Error assigning roles");
    auth.issue_token(user_id).await.expect("Error issuing token")
}

/// A minimal copy of the production route table: just the resources under test, behind the same
/// middleware stack.
macro_rules! test_app {
    ($db:expr) => {{
        let orders_api = OrderFlowApi::new($db.clone(), EventProducers::default());
        let wallet_api = WalletApi::new($db.clone(), EventProducers::default());
        let api_scope = web::scope("/api")
            .wrap(TokenAuthMiddlewareFactory::new($db.clone()))
            .service(
                web::resource("/orders")
                    .route(web::post().to(place_order::<SqliteDatabase>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Dropshipper, Role::Admin])),
            )
            .service(
                web::resource("/balance")
                    .route(web::get().to(my_balance::<SqliteDatabase>))
                    .wrap(AclMiddlewareFactory::new(&[Role::Supplier, Role::Dropshipper, Role::Admin])),
            );
        test::init_service(
            App::new()
                .app_data(web::Data::new(orders_api))
                .app_data(web::Data::new(wallet_api))
                .service(health)
                .service(api_scope),
        )
        .await
    }};
}

#[actix_web::test]
async fn health_is_public() {
    let db = test_db().await;
    let app = test_app!(db);
    let req = TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn api_routes_require_a_bearer_token() {
    let db = test_db().await;
    let app = test_app!(db);
    let req = TestRequest::get().uri("/api/balance").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri("/api/balance").insert_header(("Authorization", "Bearer bogus")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn the_acl_rejects_callers_without_a_required_role() {
    let db = test_db().await;
    let token = token_for(&db, 5, &[Role::Supplier]).await;
    let app = test_app!(db);
    // Suppliers cannot place orders
    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "product_id": 1 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn orders_can_be_placed_over_http() {
    let db = test_db().await;
    let orders_api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let wallet_api = WalletApi::new(db.clone(), EventProducers::default());
    let product = orders_api
        .create_product(NewProduct {
            supplier_id: 1,
            name: "Widget".into(),
            price: Money::from_rm(10),
            stock: 3,
            is_variable: false,
        })
        .await
        .expect("Error creating product");
    wallet_api.deposit(5, Money::from_rm(20), "top up").await.expect("Error depositing");
    let token = token_for(&db, 5, &[Role::Dropshipper]).await;
    let app = test_app!(db);

    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "product_id": product.id }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let order: Order = test::read_body_json(res).await;
    assert_eq!(order.buyer_id, 5);
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.cost, Money::from_cents(1050));
}
