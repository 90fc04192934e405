mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{num, shipping, TestApp};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "service": "appareldesk-commerce"}));
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = TestApp::new();
    let (token, contact_id) = app.customer("asha").await;

    let (status, me) = app.get("/api/v1/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["username"], "asha");
    assert_eq!(me["contact"]["id"], contact_id.as_str());
    assert_eq!(me["contact"]["contact_type"], "customer");
    assert_eq!(me["is_vendor"], false);
    assert!(me["user"].get("password_hash").is_none());

    let (status, body) = app.post("/api/v1/auth/register", None, json!({
        "username": "ASHA", "email": "other@example.com", "password": "correct-horse", "contact_name": "Asha",
    })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Username already taken");

    let (status, _) = app.post("/api/v1/auth/login", None, json!({"username": "asha", "password": "wrong-pass"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_short_password_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app.post("/api/v1/auth/register", None, json!({
        "username": "ravi", "email": "ravi@example.com", "password": "short", "contact_name": "Ravi",
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storefront_lists_published_products_only() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;
    app.product(&vendor, "KUR-002", "1500", "5").await;
    let (status, draft) = app.post("/api/v1/vendor/products", Some(&vendor), json!({
        "product_code": "JNS-001", "product_name": "Slim Jeans", "product_category": "women",
        "product_type": "jeans", "sales_price": "1800",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["is_published"], false);

    let (status, page) = app.get("/api/v1/products?sort=price_asc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["data"][0]["product_code"], "KUR-001");

    let (_, page) = app.get("/api/v1/products?group=bottomwear", None).await;
    assert_eq!(page["total"], 0);
    let (_, page) = app.get("/api/v1/products?min_price=1200&colors=indigo", None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["product_code"], "KUR-002");

    let id = kurta["id"].as_str().unwrap();
    let (status, _) = app.send(Method::DELETE, &format!("/api/v1/vendor/products/{id}"), Some(&vendor), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_cannot_use_vendor_dashboard() {
    let app = TestApp::new();
    let (token, _) = app.customer("asha").await;
    let (status, body) = app.get("/api/v1/vendor/products", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Vendor access required");
}

#[tokio::test]
async fn test_cart_quote_charges_delivery_on_small_orders() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let tee = app.product(&vendor, "TEE-001", "150", "10").await;
    let (customer, _) = app.customer("asha").await;

    let (status, quote) = app.post("/api/v1/cart/items", Some(&customer), json!({
        "product_id": tee["id"], "quantity": 1, "selected_size": "M",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(num(&quote["subtotal"]), dec!(150));
    assert_eq!(num(&quote["tax_amount"]), dec!(7.50));
    assert_eq!(num(&quote["delivery_fee"]), dec!(20));
    assert_eq!(num(&quote["total_amount"]), dec!(177.50));

    // same product in another size is a separate line
    app.post("/api/v1/cart/items", Some(&customer), json!({"product_id": tee["id"], "quantity": 1, "selected_size": "L"})).await;
    let (_, quote) = app.post("/api/v1/cart/items", Some(&customer), json!({"product_id": tee["id"], "quantity": 2, "selected_size": "M"})).await;
    assert_eq!(quote["item_count"], 2);
    assert_eq!(num(&quote["subtotal"]), dec!(600));
    assert_eq!(num(&quote["delivery_fee"]), dec!(0));

    let uri = format!("/api/v1/cart/items?product_id={}&selected_size=L", tee["id"].as_str().unwrap());
    let (status, quote) = app.send(Method::DELETE, &uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["item_count"], 1);

    let (status, _) = app.put("/api/v1/cart/items", Some(&customer), json!({
        "product_id": tee["id"], "selected_size": "XL", "quantity": 1,
    })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_with_coupon_then_pay_invoice() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;
    let today = Utc::now().date_naive();

    let (status, offer) = app.post("/api/v1/vendor/offers", Some(&vendor), json!({
        "offer_name": "Festive 10", "discount_percentage": "10",
        "start_date": today - Duration::days(1), "end_date": today + Duration::days(10), "available_on": "website",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, coupons) = app.post("/api/v1/vendor/coupons/generate", Some(&vendor), json!({
        "offer_id": offer["id"], "count": 1, "prefix": "fest",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    let code = coupons[0]["coupon_code"].as_str().unwrap().to_string();
    assert!(code.starts_with("FEST-"));

    let (status, valid) = app.post("/api/v1/pricing/coupons/validate", None, json!({"coupon_code": code.to_lowercase()})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(valid["valid"], true);

    let (customer, contact_id) = app.customer("asha").await;
    app.post("/api/v1/cart/items", Some(&customer), json!({"product_id": kurta["id"], "quantity": 2})).await;
    let term = app.term_id("Net 30").await;
    let (status, placed) = app.post("/api/v1/checkout", Some(&customer), json!({
        "payment_term_id": term, "coupon_code": code, "shipping_address": shipping(),
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");

    let order = &placed["order"];
    assert_eq!(order["so_number"], "SO-000001");
    assert_eq!(order["order_status"], "confirmed");
    assert_eq!(order["order_source"], "website");
    assert_eq!(order["customer_id"], contact_id.as_str());
    assert_eq!(num(&order["subtotal"]), dec!(2000));
    assert_eq!(num(&order["discount_amount"]), dec!(200));
    assert_eq!(num(&order["tax_amount"]), dec!(100));
    assert_eq!(num(&order["total_amount"]), dec!(1900));

    let invoice = &placed["invoice"];
    assert_eq!(invoice["invoice_number"], "INV-000001");
    assert_eq!(num(&invoice["remaining_amount"]), dec!(1900));
    assert_eq!(invoice["due_date"], json!(today + Duration::days(30)));

    let (_, product) = app.get(&format!("/api/v1/products/{}", kurta["id"].as_str().unwrap()), None).await;
    assert_eq!(num(&product["current_stock"]), dec!(38));
    let (_, cart) = app.get("/api/v1/cart", Some(&customer)).await;
    assert_eq!(cart["item_count"], 0);

    // single-use coupon is spent
    let (status, body) = app.post("/api/v1/pricing/coupons/validate", None, json!({"coupon_code": code})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Coupon already used");

    let invoice_id = invoice["id"].as_str().unwrap();
    let (status, paid) = app.post("/api/v1/payments", Some(&customer), json!({"invoice_id": invoice_id, "amount": "900"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(paid["payment"]["payment_number"], "PAY-000001");
    assert_eq!(paid["payment"]["payment_method"], "upi");
    assert_eq!(paid["invoice"]["invoice_status"], "partially_paid");
    assert_eq!(num(&paid["invoice"]["remaining_amount"]), dec!(1000));

    let (status, _) = app.post("/api/v1/payments", Some(&customer), json!({"invoice_id": invoice_id, "amount": "1000.01"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, paid) = app.post("/api/v1/payments", Some(&customer), json!({
        "invoice_id": invoice_id, "amount": "1000", "payment_method": "bank_transfer",
    })).await;
    assert_eq!(paid["invoice"]["invoice_status"], "paid");
    assert_eq!(num(&paid["invoice"]["remaining_amount"]), dec!(0));

    let (_, payments) = app.get("/api/v1/payments", Some(&customer)).await;
    assert_eq!(payments.as_array().unwrap().len(), 2);

    // another customer cannot see or pay it
    let (other, _) = app.customer("ravi").await;
    let (status, _) = app.get(&format!("/api/v1/orders/{}", order["id"].as_str().unwrap()), Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post("/api/v1/payments", Some(&other), json!({"invoice_id": invoice_id, "amount": "1"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_rejects_short_stock_and_empty_cart() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "3").await;
    let (customer, _) = app.customer("asha").await;
    let term = app.term_id("Immediate Payment").await;

    let (status, body) = app.post("/api/v1/checkout", Some(&customer), json!({
        "payment_term_id": term, "shipping_address": shipping(),
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Cart is empty");

    let (status, body) = app.post("/api/v1/checkout", Some(&customer), json!({
        "payment_term_id": term, "shipping_address": shipping(),
        "items": [{"product_id": kurta["id"], "quantity": "4"}],
    })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("KUR-001"));

    let (status, _) = app.post("/api/v1/checkout", Some(&customer), json!({
        "payment_term_id": term, "items": [{"product_id": kurta["id"], "quantity": "1"}],
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_uses_default_saved_address() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "10").await;
    let (customer, _) = app.customer("asha").await;

    let (status, first) = app.post("/api/v1/addresses", Some(&customer), json!({
        "label": "Home", "address_line1": "12 MG Road", "city": "Pune",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["is_default_shipping"], true);
    let (_, second) = app.post("/api/v1/addresses", Some(&customer), json!({
        "label": "Office", "address_line1": "4 FC Road", "city": "Pune", "is_default_shipping": true,
    })).await;
    let (_, addresses) = app.get("/api/v1/addresses", Some(&customer)).await;
    let home = addresses.as_array().unwrap().iter().find(|a| a["id"] == first["id"]).unwrap();
    assert_eq!(home["is_default_shipping"], false);
    assert_eq!(home["is_default_billing"], true);

    let term = app.term_id("Net 15").await;
    let (status, placed) = app.post("/api/v1/checkout", Some(&customer), json!({
        "payment_term_id": term, "items": [{"product_id": kurta["id"], "quantity": "1"}],
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["order"]["shipping_address"]["address_line1"], second["address_line1"]);

    let (status, _) = app.send(
        Method::DELETE, &format!("/api/v1/addresses/{}", first["id"].as_str().unwrap()), Some(&customer), None,
    ).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
