//! Axum router and all HTTP handlers for drk-web.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Customer pages carry their identity (phone + order id)
//! in query strings and hidden form fields; staff pages carry the store id
//! and the signed pass issued at staff login the same way. A staff request
//! whose pass does not verify for its store goes back to `/admin/login`.
//!
//! Validation failures re-render the originating page with an inline message
//! and HTTP 200. Ids that cannot be numbers are a 400, ids that do not exist
//! are a 404.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Redirect, Response,
    },
    routing::{get, post},
    Form, Json, Router,
};
use drk_config::StaffLoginMode;
use drk_db::{ItemEdit, OrderFilter};
use drk_order::{
    compute_totals, parse_quantity, validate_phone, ItemOptions, OrderStatus, UuidCodeSource,
};
use drk_schemas::{NewItem, OrderListRow, Store};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::{
    api_types::HealthResponse,
    error::AppError,
    state::{AppState, BusMsg},
    views,
};

type HandlerResult = Result<Response, AppError>;

const MSG_PICK_STORE: &str = "請先選擇店家再結帳";
const MSG_STORE_EMPTY: &str = "請輸入店家編號";
const MSG_STORE_NOT_NUMERIC: &str = "店家編號必須是數字";
const MSG_STORE_UNKNOWN: &str = "查無此店家編號";
const MSG_STORE_WRONG: &str = "店家編號錯誤";
const MSG_PICK_PRODUCT: &str = "請選擇要加入的飲料";
const MSG_QTY_NOT_INT: &str = "數量必須是整數";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// The tracing layer is **not** applied here; `main.rs` attaches it after
/// this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/", get(index))
        .route("/index", get(index))
        .route("/health", get(health))
        .route(
            "/customer/login",
            get(customer_login_page).post(customer_login_submit),
        )
        .route("/order/drink", get(order_drink))
        .route("/order/items", post(order_add_item))
        .route("/order/items/:item_id/quantity", post(order_item_quantity))
        .route("/order/items/:item_id/delete", post(order_item_delete))
        .route("/order/summary", get(order_summary))
        .route("/order/checkout", post(order_checkout))
        .route("/order/success", get(order_success))
        .route("/order/again", post(order_again))
        .route("/admin/login", get(admin_login_page).post(admin_login_submit))
        .route("/admin/orders", get(admin_orders))
        .route("/admin/orders/:order_id", get(admin_order_detail))
        .route("/admin/orders/:order_id/complete", post(admin_complete))
        .route("/admin/stream", get(admin_stream))
        .nest_service("/static", static_files)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

// Every field defaults to "" so a missing field reaches validation instead of
// failing extraction.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PhoneForm {
    phone: String,
}

/// Customer identity: the phone and the order being built.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OrderRef {
    phone: String,
    order_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AddItemForm {
    phone: String,
    order_id: String,
    product_id: String,
    size: String,
    ice: String,
    sweet: String,
    topping: String,
    quantity: String,
    note: String,
    store_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct QuantityForm {
    phone: String,
    order_id: String,
    quantity: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CheckoutForm {
    phone: String,
    order_id: String,
    store_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StoreRef {
    store_id: String,
}

/// Staff identity: the store and the pass issued for it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StaffRef {
    store_id: String,
    pass: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AdminOrdersQuery {
    store_id: String,
    pass: String,
    show: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_id(raw: &str, field: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::BadRequest(format!("{field} must be numeric")))
}

fn order_url(path: &str, phone: &str, order_id: i32) -> String {
    format!("{path}?phone={phone}&order_id={order_id}")
}

fn to_customer_login() -> Response {
    Redirect::to("/customer/login").into_response()
}

fn to_admin_login() -> Response {
    Redirect::to("/admin/login").into_response()
}

/// Resolve the order a customer page refers to.
///
/// `Ok(None)` when either half of the identity is missing (the caller sends
/// the customer back to login). The order must exist and belong to `phone`.
async fn load_order(
    st: &AppState,
    phone: &str,
    order_id: &str,
) -> Result<Option<(String, OrderListRow)>, AppError> {
    let phone = phone.trim();
    if phone.is_empty() || order_id.trim().is_empty() {
        return Ok(None);
    }
    let id = parse_id(order_id, "order_id")?;

    let order = drk_db::fetch_order_summary(&st.pool, &st.caps, id)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.customer_phone != phone {
        return Err(AppError::NotFound);
    }
    Ok(Some((phone.to_string(), order)))
}

/// Store a staff request acts for.
///
/// `Ok(None)` when the store is absent or the pass does not verify for it
/// (the caller sends the request back to staff login).
fn staff_store(st: &AppState, store_id: &str, pass: &str) -> Result<Option<i32>, AppError> {
    if store_id.trim().is_empty() {
        return Ok(None);
    }
    let id = parse_id(store_id, "store_id")?;
    if !st.staff_key.verify(id, pass) {
        if !pass.trim().is_empty() {
            warn!(store_id = id, "staff pass rejected");
        }
        return Ok(None);
    }
    Ok(Some(id))
}

fn staff_orders_url(st: &AppState, store_id: i32) -> String {
    format!(
        "/admin/orders?store_id={store_id}&pass={}",
        st.staff_key.issue(store_id)
    )
}

/// Stores for the picker, or `None` when orders do not track a store.
async fn picker_stores(st: &AppState) -> Result<Option<Vec<Store>>, AppError> {
    if !st.caps.has_store_id {
        return Ok(None);
    }
    Ok(Some(drk_db::list_stores(&st.pool).await?))
}

enum StoreChoice {
    Unchanged,
    Picked(i32),
    Invalid(&'static str),
}

/// Interpret an optional `store_id` form field on customer pages.
async fn choose_store(st: &AppState, raw: &str) -> Result<StoreChoice, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || !st.caps.has_store_id {
        return Ok(StoreChoice::Unchanged);
    }
    let Ok(id) = raw.parse::<i32>() else {
        return Ok(StoreChoice::Invalid(MSG_STORE_NOT_NUMERIC));
    };
    match drk_db::fetch_store(&st.pool, id).await? {
        Some(_) => Ok(StoreChoice::Picked(id)),
        None => Ok(StoreChoice::Invalid(MSG_STORE_UNKNOWN)),
    }
}

async fn render_drink(
    st: &AppState,
    phone: &str,
    order: &OrderListRow,
    error: Option<&str>,
) -> HandlerResult {
    let products = drk_db::list_products(&st.pool).await?;
    let stores = picker_stores(st).await?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    Ok(views::drink(&views::DrinkPage {
        today: &today,
        phone,
        order_id: order.order_id,
        products: &products,
        stores: stores.as_deref(),
        selected_store: order.store_id,
        error,
    })
    .into_response())
}

async fn render_summary(
    st: &AppState,
    phone: &str,
    order: &OrderListRow,
    error: Option<&str>,
) -> HandlerResult {
    let items = drk_db::fetch_line_items(&st.pool, &st.caps, order.order_id).await?;
    let totals = compute_totals(&items);
    drk_db::persist_total(&st.pool, &st.caps, order.order_id, &totals).await;
    let stores = picker_stores(st).await?;

    Ok(views::summary(&views::SummaryPage {
        phone,
        order_id: order.order_id,
        items: &items,
        totals,
        stores: stores.as_deref(),
        selected_store: order.store_id,
        error,
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// GET /  /index  /health
// ---------------------------------------------------------------------------

pub(crate) async fn index() -> impl IntoResponse {
    views::index()
}

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Customer login
// ---------------------------------------------------------------------------

pub(crate) async fn customer_login_page() -> impl IntoResponse {
    views::customer_login("", None)
}

/// Validate the phone, resolve (or create) the customer, open a new order.
pub(crate) async fn customer_login_submit(
    State(st): State<Arc<AppState>>,
    Form(form): Form<PhoneForm>,
) -> HandlerResult {
    let phone = match validate_phone(&form.phone, st.config.ordering.phone_rule) {
        Ok(p) => p,
        Err(e) => {
            return Ok(views::customer_login(&form.phone, Some(&e.to_string())).into_response())
        }
    };

    let resolved = drk_db::resolve_customer(&st.pool, &phone).await?;
    let order = drk_db::create_order(
        &st.pool,
        &st.caps,
        resolved.customer.customer_id,
        st.config.ordering.default_store_id,
    )
    .await?;

    info!(
        customer_id = resolved.customer.customer_id,
        new_customer = resolved.created,
        order_id = order.order_id,
        "customer login"
    );

    Ok(Redirect::to(&order_url("/order/drink", &phone, order.order_id)).into_response())
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

pub(crate) async fn order_drink(
    State(st): State<Arc<AppState>>,
    Query(q): Query<OrderRef>,
) -> HandlerResult {
    let Some((phone, order)) = load_order(&st, &q.phone, &q.order_id).await? else {
        return Ok(to_customer_login());
    };
    render_drink(&st, &phone, &order, None).await
}

/// Append one customized product. A quantity ≤ 0 adds nothing.
pub(crate) async fn order_add_item(
    State(st): State<Arc<AppState>>,
    Form(form): Form<AddItemForm>,
) -> HandlerResult {
    let Some((phone, order)) = load_order(&st, &form.phone, &form.order_id).await? else {
        return Ok(to_customer_login());
    };

    let product = match form.product_id.trim().parse::<i32>() {
        Ok(id) => drk_db::fetch_product(&st.pool, id).await?,
        Err(_) => None,
    };
    let Some(product) = product else {
        return render_drink(&st, &phone, &order, Some(MSG_PICK_PRODUCT)).await;
    };

    let opts = match ItemOptions::parse(&form.size, &form.ice, &form.sweet, &form.topping) {
        Ok(o) => o,
        Err(field) => {
            let msg = format!("選項不正確：{field}");
            return render_drink(&st, &phone, &order, Some(&msg)).await;
        }
    };

    let Some(quantity) = parse_quantity(&form.quantity) else {
        return render_drink(&st, &phone, &order, Some(MSG_QTY_NOT_INT)).await;
    };

    match choose_store(&st, &form.store_id).await? {
        StoreChoice::Unchanged => {}
        StoreChoice::Picked(sid) => {
            drk_db::set_order_store(&st.pool, &st.caps, order.order_id, sid).await?
        }
        StoreChoice::Invalid(msg) => return render_drink(&st, &phone, &order, Some(msg)).await,
    }

    if quantity > 0 {
        let note = form.note.trim();
        drk_db::add_item(
            &st.pool,
            &st.caps,
            &NewItem {
                order_id: order.order_id,
                product_id: product.product_id,
                size: opts.size.label().to_string(),
                ice: opts.ice.label().to_string(),
                sweet: opts.sweet.label().to_string(),
                topping: opts.topping.label().to_string(),
                quantity,
                note: (!note.is_empty()).then(|| note.to_string()),
            },
        )
        .await?;
        drk_db::recompute_total(&st.pool, &st.caps, order.order_id).await?;
    }

    Ok(Redirect::to(&order_url("/order/summary", &phone, order.order_id)).into_response())
}

pub(crate) async fn order_summary(
    State(st): State<Arc<AppState>>,
    Query(q): Query<OrderRef>,
) -> HandlerResult {
    let Some((phone, order)) = load_order(&st, &q.phone, &q.order_id).await? else {
        return Ok(to_customer_login());
    };
    render_summary(&st, &phone, &order, None).await
}

/// Set a line item's quantity; ≤ 0 removes it.
pub(crate) async fn order_item_quantity(
    State(st): State<Arc<AppState>>,
    Path(item_id): Path<i32>,
    Form(form): Form<QuantityForm>,
) -> HandlerResult {
    let Some((phone, order)) = load_order(&st, &form.phone, &form.order_id).await? else {
        return Ok(to_customer_login());
    };
    let Some(quantity) = parse_quantity(&form.quantity) else {
        return render_summary(&st, &phone, &order, Some(MSG_QTY_NOT_INT)).await;
    };

    if drk_db::update_item_quantity(&st.pool, order.order_id, item_id, quantity).await?
        == ItemEdit::NotFound
    {
        return Err(AppError::NotFound);
    }
    drk_db::recompute_total(&st.pool, &st.caps, order.order_id).await?;

    Ok(Redirect::to(&order_url("/order/summary", &phone, order.order_id)).into_response())
}

pub(crate) async fn order_item_delete(
    State(st): State<Arc<AppState>>,
    Path(item_id): Path<i32>,
    Form(form): Form<OrderRef>,
) -> HandlerResult {
    let Some((phone, order)) = load_order(&st, &form.phone, &form.order_id).await? else {
        return Ok(to_customer_login());
    };

    if drk_db::delete_item(&st.pool, order.order_id, item_id).await? == ItemEdit::NotFound {
        return Err(AppError::NotFound);
    }
    drk_db::recompute_total(&st.pool, &st.caps, order.order_id).await?;

    Ok(Redirect::to(&order_url("/order/summary", &phone, order.order_id)).into_response())
}

/// Finalize the order and announce it to the store's staff feed.
pub(crate) async fn order_checkout(
    State(st): State<Arc<AppState>>,
    Form(form): Form<CheckoutForm>,
) -> HandlerResult {
    let Some((phone, order)) = load_order(&st, &form.phone, &form.order_id).await? else {
        return Ok(to_customer_login());
    };

    let store_id = match choose_store(&st, &form.store_id).await? {
        StoreChoice::Unchanged => None,
        StoreChoice::Picked(sid) => Some(sid),
        StoreChoice::Invalid(msg) => return render_summary(&st, &phone, &order, Some(msg)).await,
    };
    if st.caps.has_store_id && store_id.or(order.store_id).is_none() {
        return render_summary(&st, &phone, &order, Some(MSG_PICK_STORE)).await;
    }

    let outcome = drk_db::checkout(
        &st.pool,
        &st.caps,
        st.config.ordering.status_match,
        order.order_id,
        store_id,
        &mut UuidCodeSource,
    )
    .await?
    .ok_or(AppError::NotFound)?;

    st.publish(BusMsg::OrderPlaced {
        order_id: outcome.order_id,
        store_id: outcome.store_id,
        order_code: outcome.order_code.map(|c| c.to_string()),
        total_amount: outcome.totals.total_price,
    });

    Ok(Redirect::to(&order_url("/order/success", &phone, order.order_id)).into_response())
}

pub(crate) async fn order_success(
    State(st): State<Arc<AppState>>,
    Query(q): Query<OrderRef>,
) -> HandlerResult {
    let Some((phone, order)) = load_order(&st, &q.phone, &q.order_id).await? else {
        return Ok(to_customer_login());
    };
    let items = drk_db::fetch_line_items(&st.pool, &st.caps, order.order_id).await?;
    let status = OrderStatus::classify(order.status.as_deref(), st.config.ordering.status_match);

    Ok(views::success(&views::SuccessPage {
        phone: &phone,
        order: &order,
        items: &items,
        totals: compute_totals(&items),
        status_label: status.label(),
    })
    .into_response())
}

/// Start another order for the same customer, keeping the store.
pub(crate) async fn order_again(
    State(st): State<Arc<AppState>>,
    Form(form): Form<OrderRef>,
) -> HandlerResult {
    let Some((phone, previous)) = load_order(&st, &form.phone, &form.order_id).await? else {
        return Ok(to_customer_login());
    };

    let order = drk_db::create_order(
        &st.pool,
        &st.caps,
        previous.customer_id,
        previous.store_id.or(st.config.ordering.default_store_id),
    )
    .await?;

    Ok(Redirect::to(&order_url("/order/drink", &phone, order.order_id)).into_response())
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

pub(crate) async fn admin_login_page() -> impl IntoResponse {
    views::admin_login("", None)
}

pub(crate) async fn admin_login_submit(
    State(st): State<Arc<AppState>>,
    Form(form): Form<StoreRef>,
) -> HandlerResult {
    let input = form.store_id.trim();

    let checked: Result<i32, &'static str> = if input.is_empty() {
        Err(MSG_STORE_EMPTY)
    } else {
        match &st.config.staff.login {
            StaffLoginMode::Fixed { id, store_id } => {
                if input == id.trim() {
                    Ok(*store_id)
                } else {
                    Err(MSG_STORE_WRONG)
                }
            }
            StaffLoginMode::Database => match input.parse::<i32>() {
                Err(_) => Err(MSG_STORE_NOT_NUMERIC),
                Ok(id) => match drk_db::fetch_store(&st.pool, id).await? {
                    Some(_) => Ok(id),
                    None => Err(MSG_STORE_UNKNOWN),
                },
            },
        }
    };

    match checked {
        Ok(store_id) => {
            info!(store_id, "staff login");
            Ok(Redirect::to(&staff_orders_url(&st, store_id)).into_response())
        }
        Err(msg) => Ok(views::admin_login(&form.store_id, Some(msg)).into_response()),
    }
}

pub(crate) async fn admin_orders(
    State(st): State<Arc<AppState>>,
    Query(q): Query<AdminOrdersQuery>,
) -> HandlerResult {
    let Some(store_id) = staff_store(&st, &q.store_id, &q.pass)? else {
        return Ok(to_admin_login());
    };
    let show_all = q.show.trim() == "all";
    let filter = if show_all {
        OrderFilter::All
    } else {
        OrderFilter::Open
    };
    let rule = st.config.ordering.status_match;

    let store = drk_db::fetch_store(&st.pool, store_id).await?;
    let rows: Vec<(OrderListRow, bool)> =
        drk_db::list_store_orders(&st.pool, &st.caps, rule, Some(store_id), filter)
            .await?
            .into_iter()
            .map(|r| {
                let finished = OrderStatus::classify(r.status.as_deref(), rule).is_finished();
                (r, finished)
            })
            .collect();

    Ok(views::admin_orders(&views::AdminOrdersPage {
        store_id,
        pass: q.pass.trim(),
        store_name: store.as_ref().map(|s| s.name.as_str()),
        rows: &rows,
        show_all,
    })
    .into_response())
}

/// Fetch an order as seen by staff of `store_id`; other stores' orders are 404.
async fn staff_order(st: &AppState, order_id: i32, store_id: i32) -> Result<OrderListRow, AppError> {
    let order = drk_db::fetch_order_summary(&st.pool, &st.caps, order_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if st.caps.has_store_id && order.store_id != Some(store_id) {
        return Err(AppError::NotFound);
    }
    Ok(order)
}

pub(crate) async fn admin_order_detail(
    State(st): State<Arc<AppState>>,
    Path(order_id): Path<i32>,
    Query(q): Query<StaffRef>,
) -> HandlerResult {
    let Some(store_id) = staff_store(&st, &q.store_id, &q.pass)? else {
        return Ok(to_admin_login());
    };
    let order = staff_order(&st, order_id, store_id).await?;
    let items = drk_db::fetch_line_items(&st.pool, &st.caps, order_id).await?;
    let status = OrderStatus::classify(order.status.as_deref(), st.config.ordering.status_match);

    Ok(views::admin_order_detail(&views::AdminOrderDetailPage {
        store_id,
        pass: q.pass.trim(),
        order: &order,
        items: &items,
        totals: compute_totals(&items),
        status_label: status.label(),
    })
    .into_response())
}

/// Mark an order finished. Repeating it is harmless.
pub(crate) async fn admin_complete(
    State(st): State<Arc<AppState>>,
    Path(order_id): Path<i32>,
    Form(form): Form<StaffRef>,
) -> HandlerResult {
    let Some(store_id) = staff_store(&st, &form.store_id, &form.pass)? else {
        return Ok(to_admin_login());
    };

    let found = drk_db::complete_order(
        &st.pool,
        &st.caps,
        st.config.ordering.status_match,
        order_id,
        Some(store_id),
    )
    .await?;
    if !found {
        return Err(AppError::NotFound);
    }

    st.publish(BusMsg::OrderCompleted {
        order_id,
        store_id: Some(store_id),
    });

    Ok(Redirect::to(&staff_orders_url(&st, store_id)).into_response())
}

// ---------------------------------------------------------------------------
// GET /admin/stream  (SSE)
// ---------------------------------------------------------------------------

/// Live order feed for one store; order events of other stores are dropped.
pub(crate) async fn admin_stream(
    State(st): State<Arc<AppState>>,
    Query(q): Query<StaffRef>,
) -> HandlerResult {
    let Some(store_id) = staff_store(&st, &q.store_id, &q.pass)? else {
        return Ok(to_admin_login());
    };

    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx, store_id);

    Ok((headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response())
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
    only_store: i32,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(move |msg| async move {
        match msg {
            Ok(m) => {
                if m.store_id().is_some_and(|got| got != only_store) {
                    return None;
                }
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(m.event_name()).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
