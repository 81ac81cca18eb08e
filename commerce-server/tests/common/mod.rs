//! 集成测试公共工具
#![allow(dead_code)]

use std::sync::Arc;

use commerce_server::checkout::{CheckoutRequest, CheckoutSource};
use commerce_server::db::DbService;
use commerce_server::db::repository::catalog;
use commerce_server::payments::{LocalProofStorage, ProofFile, ProofStorage, ProofSubmission};
use commerce_server::{Config, CurrentUser, Role, ServerState};
use shared::models::{CheckoutLine, ItemKind, OrderDetail};
use tempfile::TempDir;

pub struct TestContext {
    pub state: ServerState,
    /// 工作目录（凭证文件）；drop 时删除
    pub dir: TempDir,
}

/// 内存库 + 本地凭证存储
pub async fn setup() -> TestContext {
    setup_with(|_| {}).await
}

pub async fn setup_with(adjust: impl FnOnce(&mut Config)) -> TestContext {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::for_tests(dir.path().to_string_lossy());
    adjust(&mut config);
    let db = DbService::in_memory().await.expect("Failed to open in-memory db");
    let storage = Arc::new(LocalProofStorage::new(
        config.proofs_dir(),
        config.public_base_url.clone(),
    ));
    let state = ServerState::with_pool(config, db.pool, storage);
    TestContext { state, dir }
}

/// 自定义凭证存储（故障注入）
pub async fn setup_with_storage(storage: Arc<dyn ProofStorage>, upload_timeout_ms: u64) -> TestContext {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::for_tests(dir.path().to_string_lossy());
    config.upload_timeout_ms = upload_timeout_ms;
    let db = DbService::in_memory().await.expect("Failed to open in-memory db");
    let state = ServerState::with_pool(config, db.pool, storage);
    TestContext { state, dir }
}

/// 文件库（WAL，多连接），用于并发测试
pub async fn setup_file_backed() -> TestContext {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::for_tests(dir.path().to_string_lossy());
    config.database_file = "commerce.db".into();
    let state = ServerState::initialize(&config)
        .await
        .expect("Failed to initialize server state");
    TestContext { state, dir }
}

pub fn user(id: i64, role: Role) -> CurrentUser {
    CurrentUser {
        id,
        name: format!("user-{id}"),
        role,
    }
}

pub fn customer(id: i64) -> CurrentUser {
    user(id, Role::Customer)
}

pub fn finance(id: i64) -> CurrentUser {
    user(id, Role::Finance)
}

pub fn admin(id: i64) -> CurrentUser {
    user(id, Role::Admin)
}

pub fn token(state: &ServerState, user: &CurrentUser) -> String {
    state
        .jwt_service
        .generate_token(user.id, &user.name, user.role)
        .expect("Failed to generate token")
}

pub async fn product(state: &ServerState, name: &str, price: f64, stock: i64) -> i64 {
    catalog::create_product(&state.pool, name, price, stock)
        .await
        .expect("Failed to create product")
        .id
}

pub async fn service(state: &ServerState, name: &str, price: f64) -> i64 {
    catalog::create_service(&state.pool, name, price)
        .await
        .expect("Failed to create service")
        .id
}

pub async fn stock_of(state: &ServerState, product_id: i64) -> i64 {
    catalog::find_product(&state.pool, product_id)
        .await
        .expect("Failed to read product")
        .expect("Product missing")
        .stock
}

pub async fn count(state: &ServerState, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(&state.pool)
        .await
        .expect("Count query failed")
}

pub fn line(item_type: ItemKind, item_id: i64, quantity: i64) -> CheckoutLine {
    CheckoutLine {
        item_type,
        item_id,
        quantity,
    }
}

pub fn items_request(user_id: i64, lines: Vec<CheckoutLine>, payment_method: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        user_id,
        source: CheckoutSource::Items(lines),
        payment_method: payment_method.map(str::to_string),
        shipping_address: Some("Jl. Merdeka 1".into()),
        notes: None,
        client_total: None,
    }
}

/// 下单：一件商品，银行转账
pub async fn place_order(state: &ServerState, user_id: i64, product_id: i64, quantity: i64) -> OrderDetail {
    state
        .checkout
        .checkout(items_request(
            user_id,
            vec![line(ItemKind::Product, product_id, quantity)],
            Some("BANK_TRANSFER"),
        ))
        .await
        .expect("Checkout failed")
}

pub fn png_proof(order_id: i64, amount: f64) -> ProofSubmission {
    ProofSubmission {
        order_id,
        amount,
        method: Some("BANK_TRANSFER".into()),
        file: ProofFile {
            bytes: format!("\u{89}PNG transfer receipt for {order_id}").into_bytes(),
            content_type: Some("image/png".into()),
            file_name: Some("receipt.png".into()),
        },
    }
}
