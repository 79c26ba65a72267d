//! Server-rendered HTML pages.
//!
//! Pages are assembled from plain strings. Every value that came from a
//! request or the database goes through [`escape`] before it is embedded.

use axum::response::Html;
use drk_order::{Ice, Size, Sweetness, Topping};
use drk_schemas::{LineItem, OrderListRow, OrderTotals, Product, Store};

/// HTML-escape text for element content and quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Public URL of a product photo. Catalog rows store paths like
/// `static/product_images/x.jpg`; the leading `static/` is dropped and the
/// rest is served under `/static/`.
pub fn photo_src(photo_url: &str) -> String {
    let t = photo_url.trim().trim_start_matches('/');
    let rel = t.strip_prefix("static/").unwrap_or(t);
    format!("/static/{rel}")
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="zh-Hant">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
    ))
}

fn hidden(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        name,
        escape(value)
    )
}

fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(msg) => format!(r#"<p class="error">{}</p>"#, escape(msg)),
        None => String::new(),
    }
}

fn select(name: &str, labels: impl IntoIterator<Item = &'static str>) -> String {
    let mut s = format!(r#"<select name="{name}">"#);
    for l in labels {
        s.push_str(&format!(r#"<option value="{l}">{l}</option>"#));
    }
    s.push_str("</select>");
    s
}

/// Store picker, or nothing when the schema does not track stores.
fn store_select(stores: Option<&[Store]>, selected: Option<i32>) -> String {
    let Some(stores) = stores else {
        return String::new();
    };
    let mut s = String::from(r#"<label>店家 <select name="store_id"><option value="">請選擇店家</option>"#);
    for st in stores {
        let sel = if Some(st.store_id) == selected {
            " selected"
        } else {
            ""
        };
        s.push_str(&format!(
            r#"<option value="{}"{sel}>{}</option>"#,
            st.store_id,
            escape(&st.name)
        ));
    }
    s.push_str("</select></label>");
    s
}

fn items_table(items: &[LineItem]) -> String {
    let mut s = String::from(
        "<table><tr><th>品項</th><th>尺寸</th><th>冰塊</th><th>甜度</th><th>配料</th>\
         <th>數量</th><th>單價</th><th>小計</th><th>備註</th></tr>",
    );
    for it in items {
        s.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&it.product_name),
            escape(&it.size),
            escape(&it.ice),
            escape(&it.sweet),
            escape(&it.topping),
            it.quantity,
            it.price,
            it.subtotal(),
            escape(it.note.as_deref().unwrap_or("")),
        ));
    }
    s.push_str("</table>");
    s
}

fn totals_line(totals: &OrderTotals) -> String {
    format!(
        "<p>共 {} 杯，總金額 ${}</p>",
        totals.total_cups, totals.total_price
    )
}

// ---------------------------------------------------------------------------
// Landing + logins
// ---------------------------------------------------------------------------

pub fn index() -> Html<String> {
    page(
        "飲料店",
        r#"<h1>飲料店點餐系統</h1>
<p><a href="/admin/login">我是店家</a></p>
<p><a href="/customer/login">我是客人</a></p>"#,
    )
}

pub fn customer_login(phone: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>客人登入</h1>
{}
<form method="post" action="/customer/login">
<label>手機號碼 <input name="phone" value="{}" maxlength="10"></label>
<button type="submit">開始點餐</button>
</form>"#,
        error_banner(error),
        escape(phone)
    );
    page("客人登入", &body)
}

pub fn admin_login(store_input: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>店家登入</h1>
{}
<form method="post" action="/admin/login">
<label>店家編號 <input name="store_id" value="{}"></label>
<button type="submit">登入</button>
</form>"#,
        error_banner(error),
        escape(store_input)
    );
    page("店家登入", &body)
}

// ---------------------------------------------------------------------------
// Customer pages
// ---------------------------------------------------------------------------

pub struct DrinkPage<'a> {
    pub today: &'a str,
    pub phone: &'a str,
    pub order_id: i32,
    pub products: &'a [Product],
    /// `None` when the schema has no `order.store_id`.
    pub stores: Option<&'a [Store]>,
    pub selected_store: Option<i32>,
    pub error: Option<&'a str>,
}

pub fn drink(p: &DrinkPage<'_>) -> Html<String> {
    let mut body = format!(
        r#"<h1>點飲料</h1>
<p>日期：{} ／ 電話：{} ／ 訂單編號：{}</p>
{}
<p><a href="/order/summary?phone={}&amp;order_id={}">查看訂單</a></p>
"#,
        escape(p.today),
        escape(p.phone),
        p.order_id,
        error_banner(p.error),
        escape(p.phone),
        p.order_id,
    );

    for prod in p.products {
        body.push_str(&format!(
            r#"<form class="product" method="post" action="/order/items">
<img src="{}" alt="{}" width="160">
<h3>{}</h3><p>${}</p>
{}{}{}
{} {} {} {}
<label>數量 <input name="quantity" value="1" size="3"></label>
<label>備註 <input name="note"></label>
{}
<button type="submit">加入訂單</button>
</form>
"#,
            escape(&photo_src(&prod.photo_url)),
            escape(&prod.name),
            escape(&prod.name),
            prod.price,
            hidden("phone", p.phone),
            hidden("order_id", &p.order_id.to_string()),
            hidden("product_id", &prod.product_id.to_string()),
            select("size", Size::ALL.iter().map(|o| o.label())),
            select("ice", Ice::ALL.iter().map(|o| o.label())),
            select("sweet", Sweetness::ALL.iter().map(|o| o.label())),
            select("topping", Topping::ALL.iter().map(|o| o.label())),
            store_select(p.stores, p.selected_store),
        ));
    }

    page("點飲料", &body)
}

pub struct SummaryPage<'a> {
    pub phone: &'a str,
    pub order_id: i32,
    pub items: &'a [LineItem],
    pub totals: OrderTotals,
    pub stores: Option<&'a [Store]>,
    pub selected_store: Option<i32>,
    pub error: Option<&'a str>,
}

pub fn summary(p: &SummaryPage<'_>) -> Html<String> {
    let ids = format!(
        "{}{}",
        hidden("phone", p.phone),
        hidden("order_id", &p.order_id.to_string())
    );

    let mut body = format!(
        "<h1>訂單明細</h1>\n<p>訂單編號：{}</p>\n{}\n",
        p.order_id,
        error_banner(p.error)
    );

    if p.items.is_empty() {
        body.push_str("<p>尚未加入任何飲料。</p>\n");
    } else {
        body.push_str(&items_table(p.items));
        for it in p.items {
            body.push_str(&format!(
                r#"<div class="edit">{} × {}
<form method="post" action="/order/items/{}/quantity">{ids}<input name="quantity" value="{}" size="3"><button type="submit">修改數量</button></form>
<form method="post" action="/order/items/{}/delete">{ids}<button type="submit">刪除</button></form>
</div>
"#,
                escape(&it.product_name),
                it.quantity,
                it.item_id,
                it.quantity,
                it.item_id,
            ));
        }
    }

    body.push_str(&totals_line(&p.totals));
    body.push_str(&format!(
        r#"<form method="post" action="/order/checkout">{ids}{}<button type="submit">結帳</button></form>
<p><a href="/order/drink?phone={}&amp;order_id={}">繼續點餐</a></p>"#,
        store_select(p.stores, p.selected_store),
        escape(p.phone),
        p.order_id,
    ));

    page("訂單明細", &body)
}

pub struct SuccessPage<'a> {
    pub phone: &'a str,
    pub order: &'a OrderListRow,
    pub items: &'a [LineItem],
    pub totals: OrderTotals,
    pub status_label: &'a str,
}

pub fn success(p: &SuccessPage<'_>) -> Html<String> {
    let body = format!(
        r#"<h1>訂單已送出</h1>
<p>取餐號碼：<strong>{}</strong></p>
<p>店家：{} ／ 狀態：{}</p>
{}
{}
<form method="post" action="/order/again">{}{}<button type="submit">再點一單</button></form>"#,
        escape(p.order.order_code.as_deref().unwrap_or("-")),
        escape(p.order.store_name.as_deref().unwrap_or("-")),
        escape(p.status_label),
        items_table(p.items),
        totals_line(&p.totals),
        hidden("phone", p.phone),
        hidden("order_id", &p.order.order_id.to_string()),
    );
    page("訂單已送出", &body)
}

// ---------------------------------------------------------------------------
// Staff pages
// ---------------------------------------------------------------------------

/// `store_id=..&amp;pass=..` for staff links.
fn staff_query(store_id: i32, pass: &str) -> String {
    format!("store_id={store_id}&amp;pass={}", escape(pass))
}

/// Hidden staff identity fields for staff forms.
fn staff_fields(store_id: i32, pass: &str) -> String {
    format!("{}{}", hidden("store_id", &store_id.to_string()), hidden("pass", pass))
}

pub struct AdminOrdersPage<'a> {
    pub store_id: i32,
    pub pass: &'a str,
    pub store_name: Option<&'a str>,
    /// Rows paired with whether they are finished.
    pub rows: &'a [(OrderListRow, bool)],
    pub show_all: bool,
}

pub fn admin_orders(p: &AdminOrdersPage<'_>) -> Html<String> {
    let who = staff_query(p.store_id, p.pass);
    let toggle = if p.show_all {
        format!(r#"<a href="/admin/orders?{who}">只看未完成</a>"#)
    } else {
        format!(r#"<a href="/admin/orders?{who}&amp;show=all">顯示全部</a>"#)
    };

    let mut body = format!(
        "<h1>{} 訂單</h1>\n<p>{toggle}</p>\n\
         <table><tr><th>取餐號碼</th><th>電話</th><th>金額</th><th>狀態</th><th></th></tr>\n",
        escape(p.store_name.unwrap_or("店家")),
    );

    for (row, finished) in p.rows {
        let action = if *finished {
            String::new()
        } else {
            format!(
                r#"<form method="post" action="/admin/orders/{}/complete">{}<button type="submit">完成</button></form>"#,
                row.order_id,
                staff_fields(p.store_id, p.pass),
            )
        };
        body.push_str(&format!(
            r#"<tr><td><a href="/admin/orders/{}?{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>
"#,
            row.order_id,
            who,
            escape(row.order_code.as_deref().unwrap_or("-")),
            escape(&row.customer_phone),
            row.total_amount.map(|t| t.to_string()).unwrap_or_default(),
            escape(row.status.as_deref().unwrap_or("")),
            action,
        ));
    }
    body.push_str("</table>");

    page("店家訂單", &body)
}

pub struct AdminOrderDetailPage<'a> {
    pub store_id: i32,
    pub pass: &'a str,
    pub order: &'a OrderListRow,
    pub items: &'a [LineItem],
    pub totals: OrderTotals,
    pub status_label: &'a str,
}

pub fn admin_order_detail(p: &AdminOrderDetailPage<'_>) -> Html<String> {
    let body = format!(
        r#"<h1>訂單 {}</h1>
<p>電話：{} ／ 狀態：{}</p>
{}
{}
<p><a href="/admin/orders?{}">返回訂單列表</a></p>"#,
        escape(p.order.order_code.as_deref().unwrap_or("-")),
        escape(&p.order.customer_phone),
        escape(p.status_label),
        items_table(p.items),
        totals_line(&p.totals),
        staff_query(p.store_id, p.pass),
    );
    page("訂單明細", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_and_quotes() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn photo_src_strips_static_prefix() {
        assert_eq!(
            photo_src("static/product_images/black_tea.jpg"),
            "/static/product_images/black_tea.jpg"
        );
        assert_eq!(
            photo_src("/static/product_images/a.jpg"),
            "/static/product_images/a.jpg"
        );
        assert_eq!(photo_src("product_images/a.jpg"), "/static/product_images/a.jpg");
    }

    #[test]
    fn customer_login_echoes_rejected_input() {
        let Html(s) = customer_login("<script>", Some("電話不得為空，請重新輸入。"));
        assert!(s.contains("&lt;script&gt;"));
        assert!(!s.contains("<script>"));
        assert!(s.contains("電話不得為空"));
    }

    #[test]
    fn staff_links_and_forms_carry_the_pass() {
        let row = OrderListRow {
            order_id: 9,
            customer_id: 1,
            customer_phone: "0912345678".to_string(),
            store_id: Some(3),
            store_name: Some("一號店".to_string()),
            order_code: Some("042".to_string()),
            total_amount: Some(150),
            status: Some("未完成".to_string()),
        };
        let rows = [(row, false)];
        let Html(s) = admin_orders(&AdminOrdersPage {
            store_id: 3,
            pass: "abc123",
            store_name: Some("一號店"),
            rows: &rows,
            show_all: false,
        });
        assert!(s.contains(r#"href="/admin/orders/9?store_id=3&amp;pass=abc123""#));
        assert!(s.contains(r#"href="/admin/orders?store_id=3&amp;pass=abc123&amp;show=all""#));
        assert!(s.contains(r#"<input type="hidden" name="pass" value="abc123">"#));
    }
}
