mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::{num, shipping, TestApp};

/// Places a Net 30 order for `quantity` of `product` and returns the checkout body.
async fn place_order(app: &TestApp, customer: &str, product: &Value, quantity: &str) -> Value {
    let term = app.term_id("Net 30").await;
    let (status, placed) = app.post("/api/v1/checkout", Some(customer), json!({
        "payment_term_id": term, "shipping_address": shipping(),
        "items": [{"product_id": product["id"], "quantity": quantity}],
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    placed
}

async fn stock_of(app: &TestApp, vendor: &str, product: &Value) -> rust_decimal::Decimal {
    let (_, products) = app.get("/api/v1/vendor/products", Some(vendor)).await;
    let found = products.as_array().unwrap().iter().find(|p| p["id"] == product["id"]).unwrap();
    num(&found["current_stock"])
}

#[tokio::test]
async fn test_cancel_order_returns_stock_and_voids_invoice() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;
    let (customer, _) = app.customer("asha").await;
    let placed = place_order(&app, &customer, &kurta, "3").await;
    assert_eq!(stock_of(&app, &vendor, &kurta).await, dec!(37));

    let uri = format!("/api/v1/vendor/orders/{}/status", placed["order"]["id"].as_str().unwrap());
    let (status, order) = app.put(&uri, Some(&vendor), json!({"order_status": "cancelled", "note": "customer request"})).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["order_status"], "cancelled");
    assert_eq!(stock_of(&app, &vendor, &kurta).await, dec!(40));

    let (_, invoices) = app.get("/api/v1/invoices", Some(&customer)).await;
    assert_eq!(invoices[0]["invoice_status"], "cancelled");

    // a cancelled order is terminal
    let (status, _) = app.put(&uri, Some(&vendor), json!({"order_status": "completed"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, movements) = app.get(
        &format!("/api/v1/vendor/stock-movements?product_id={}", kurta["id"].as_str().unwrap()), Some(&vendor),
    ).await;
    let types: Vec<&str> = movements.as_array().unwrap().iter().map(|m| m["movement_type"].as_str().unwrap()).collect();
    assert!(types.contains(&"sale"));
    assert!(types.contains(&"return"));
}

#[tokio::test]
async fn test_cannot_cancel_order_with_payments() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;
    let (customer, _) = app.customer("asha").await;
    let placed = place_order(&app, &customer, &kurta, "1").await;

    let (status, _) = app.post("/api/v1/payments", Some(&customer), json!({
        "invoice_id": placed["invoice"]["id"], "amount": "100",
    })).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/vendor/orders/{}/status", placed["order"]["id"].as_str().unwrap());
    let (status, body) = app.put(&uri, Some(&vendor), json!({"order_status": "cancelled"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invoice already has payments and cannot be cancelled");
    assert_eq!(stock_of(&app, &vendor, &kurta).await, dec!(39));

    let (_, orders) = app.get("/api/v1/vendor/orders?status=confirmed", Some(&vendor)).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_purchase_order_receipt_and_bill_payment() {
    let app = TestApp::new();
    let (vendor, vendor_contact) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;

    let (status, po) = app.post("/api/v1/vendor/purchase-orders", Some(&vendor), json!({
        "vendor_id": vendor_contact, "lines": [{"product_id": kurta["id"], "quantity": "10"}],
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{po}");
    assert_eq!(po["po_number"], "PO-000001");
    assert_eq!(po["po_status"], "draft");
    assert_eq!(num(&po["subtotal"]), dec!(6000));
    assert_eq!(num(&po["tax_amount"]), dec!(300));
    assert_eq!(num(&po["total_amount"]), dec!(6300));

    let id = po["id"].as_str().unwrap();
    let (status, _) = app.post(&format!("/api/v1/vendor/purchase-orders/{id}/receive"), Some(&vendor), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, po) = app.post(&format!("/api/v1/vendor/purchase-orders/{id}/confirm"), Some(&vendor), json!({})).await;
    assert_eq!(po["po_status"], "confirmed");
    let (status, po) = app.post(&format!("/api/v1/vendor/purchase-orders/{id}/receive"), Some(&vendor), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(po["po_status"], "received");
    assert_eq!(stock_of(&app, &vendor, &kurta).await, dec!(50));

    let (_, movements) = app.get("/api/v1/vendor/stock-movements", Some(&vendor)).await;
    let receipt = &movements[0];
    assert_eq!(receipt["movement_type"], "purchase");
    assert_eq!(receipt["direction"], "in");
    assert_eq!(receipt["reference_type"], "purchase_order");
    assert_eq!(num(&receipt["stock_after"]), dec!(50));

    let (status, _) = app.post(&format!("/api/v1/vendor/purchase-orders/{id}/cancel"), Some(&vendor), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let today = Utc::now().date_naive();
    let (status, _) = app.post(&format!("/api/v1/vendor/purchase-orders/{id}/bill"), Some(&vendor), json!({
        "invoice_date": today, "due_date": today - Duration::days(1),
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bill) = app.post(&format!("/api/v1/vendor/purchase-orders/{id}/bill"), Some(&vendor), json!({
        "vendor_reference": "LW/INV/77",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bill["bill_number"], "BILL-000001");
    assert_eq!(bill["due_date"], json!(today + Duration::days(30)));
    assert_eq!(num(&bill["remaining_amount"]), dec!(6300));

    let bill_uri = format!("/api/v1/vendor/bills/{}/payments", bill["id"].as_str().unwrap());
    let (status, paid) = app.post(&bill_uri, Some(&vendor), json!({"amount": "6300", "payment_method": "bank_transfer"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(paid["bill"]["bill_status"], "paid");
    assert_eq!(paid["payment"]["contact_id"], vendor_contact.as_str());

    let (status, _) = app.post(&bill_uri, Some(&vendor), json!({"amount": "1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, payments) = app.get(&format!("/api/v1/vendor/payments?contact_id={vendor_contact}"), Some(&vendor)).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_purchase_order_needs_a_vendor_contact() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;
    let (_, customer_contact) = app.customer("asha").await;

    let (status, body) = app.post("/api/v1/vendor/purchase-orders", Some(&vendor), json!({
        "vendor_id": customer_contact, "lines": [{"product_id": kurta["id"], "quantity": "1"}],
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Contact is not a vendor");
}

#[tokio::test]
async fn test_stock_adjustment() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "12").await;

    let (status, movement) = app.post("/api/v1/vendor/stock-adjustments", Some(&vendor), json!({
        "product_id": kurta["id"], "quantity": "-4", "notes": "damaged in storage",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movement["movement_type"], "adjustment");
    assert_eq!(movement["direction"], "out");
    assert_eq!(num(&movement["quantity"]), dec!(4));
    assert_eq!(num(&movement["stock_after"]), dec!(8));

    let (status, _) = app.post("/api/v1/vendor/stock-adjustments", Some(&vendor), json!({
        "product_id": kurta["id"], "quantity": "-9", "notes": "stock count",
    })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.post("/api/v1/vendor/stock-adjustments", Some(&vendor), json!({
        "product_id": kurta["id"], "quantity": "0", "notes": "noop",
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stock_of(&app, &vendor, &kurta).await, dec!(8));
}

#[tokio::test]
async fn test_simulate_profit() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;
    let term = app.term_id("Immediate Payment").await;

    let (status, sim) = app.post("/api/v1/simulate-profit", Some(&vendor), json!({
        "product_id": kurta["id"], "payment_term_id": term,
    })).await;
    assert_eq!(status, StatusCode::OK, "{sim}");
    let w = &sim["waterfall"];
    assert_eq!(num(&w["gross_revenue"]), dec!(1000));
    assert_eq!(num(&w["sales_tax"]), dec!(50));
    assert_eq!(num(&w["operational_fees"]), dec!(25));
    assert_eq!(num(&w["net_profit"]), dec!(325));
    assert_eq!(num(&w["profit_margin_percentage"]), dec!(32.50));
    assert_eq!(sim["margin_analysis"]["health_status"], "healthy");
    assert_eq!(sim["margin_analysis"]["strategy_insight"], "premium_pricing");
    assert_eq!(sim["product_info"]["payment_term"], "Immediate Payment");
    assert_eq!(sim["scenarios"].as_array().unwrap().len(), 3);

    let (status, body) = app.post("/api/v1/simulate-profit", Some(&vendor), json!({
        "product_id": kurta["id"], "payment_term_id": term, "coupon_code": "NOPE-1234",
    })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Coupon 'NOPE-1234' not found or expired");

    let (customer, _) = app.customer("asha").await;
    let (status, _) = app.post("/api/v1/simulate-profit", Some(&customer), json!({
        "product_id": kurta["id"], "payment_term_id": term,
    })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_report_summary() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "12").await;
    let (customer, _) = app.customer("asha").await;
    place_order(&app, &customer, &kurta, "3").await;

    let (status, summary) = app.get("/api/v1/vendor/reports/summary", Some(&vendor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["order_count"], 1);
    assert_eq!(num(&summary["sales_total"]), dec!(3150));
    assert_eq!(num(&summary["receivables_outstanding"]), dec!(3150));
    assert_eq!(summary["low_stock"][0]["code"], "KUR-001");
    assert_eq!(num(&summary["top_products"][0]["quantity_sold"]), dec!(3));

    let today = Utc::now().date_naive();
    let uri = format!("/api/v1/vendor/reports/summary?from={}&to={}", today + Duration::days(1), today);
    let (status, _) = app.get(&uri, Some(&vendor)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vendor_contacts() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    app.customer("asha").await;

    let (status, contact) = app.post("/api/v1/vendor/contacts", Some(&vendor), json!({
        "contact_name": "Threadline Mills", "contact_type": "vendor", "email": "sales@threadline.example",
    })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, vendors) = app.get("/api/v1/vendor/contacts?contact_type=vendor", Some(&vendor)).await;
    assert_eq!(vendors.as_array().unwrap().len(), 2);

    let (status, updated) = app.put(
        &format!("/api/v1/vendor/contacts/{}", contact["id"].as_str().unwrap()), Some(&vendor),
        json!({"mobile": "+91 98200 12345"}),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["mobile"], "+91 98200 12345");
    assert_eq!(updated["contact_name"], "Threadline Mills");
}

#[tokio::test]
async fn test_payment_term_rules() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let (customer, _) = app.customer("asha").await;
    let term = json!({
        "term_name": "2/10 Net 30", "net_days": 30, "early_payment_discount": true,
        "discount_percentage": "2", "discount_days": 10, "early_pay_discount_computation": "base_amount",
    });

    let (status, _) = app.post("/api/v1/pricing/payment-terms", Some(&customer), term.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, created) = app.post("/api/v1/pricing/payment-terms", Some(&vendor), term).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(app.term_id("2/10 Net 30").await, created["id"].as_str().unwrap());

    let (status, body) = app.post("/api/v1/pricing/payment-terms", Some(&vendor), json!({
        "term_name": "Net 30", "net_days": 30,
    })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Payment term 'Net 30' already exists");

    let (status, body) = app.post("/api/v1/pricing/payment-terms", Some(&vendor), json!({
        "term_name": "Odd", "net_days": 30, "early_payment_discount": true, "discount_percentage": "2", "discount_days": 40,
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "discount_days must not exceed net_days");

    let (status, _) = app.post("/api/v1/pricing/payment-terms", Some(&vendor), json!({
        "term_name": "Greedy", "net_days": 30, "early_payment_discount": true, "discount_percentage": "120", "discount_days": 10,
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post("/api/v1/pricing/payment-terms", Some(&vendor), json!({
        "term_name": "Backwards", "net_days": -1,
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_early_payment_discount_settles_invoice() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let kurta = app.product(&vendor, "KUR-001", "1000", "40").await;
    let (customer, _) = app.customer("asha").await;
    let (_, term) = app.post("/api/v1/pricing/payment-terms", Some(&vendor), json!({
        "term_name": "2/10 Net 30", "net_days": 30, "early_payment_discount": true,
        "discount_percentage": "2", "discount_days": 10,
    })).await;

    let (status, placed) = app.post("/api/v1/checkout", Some(&customer), json!({
        "payment_term_id": term["id"], "shipping_address": shipping(),
        "items": [{"product_id": kurta["id"], "quantity": "1"}],
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    let invoice = &placed["invoice"];
    let today = Utc::now().date_naive();
    assert_eq!(num(&invoice["total_amount"]), dec!(1050));
    assert_eq!(invoice["early_payment_discount_applicable"], true);
    assert_eq!(num(&invoice["early_payment_discount_amount"]), dec!(20));
    assert_eq!(invoice["early_payment_deadline"], (today + Duration::days(10)).to_string());

    let (status, paid) = app.post("/api/v1/payments", Some(&customer), json!({
        "invoice_id": invoice["id"], "amount": "1030", "payment_method": "bank_transfer",
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{paid}");
    assert_eq!(paid["invoice"]["invoice_status"], "paid");
    assert_eq!(num(&paid["invoice"]["remaining_amount"]), dec!(0));
    assert_eq!(num(&paid["payment"]["payment_amount"]), dec!(1030));
    let allocation = &paid["payment"]["allocations"][0];
    assert_eq!(allocation["early_payment_discount_applied"], true);
    assert_eq!(num(&allocation["discount_amount_applied"]), dec!(20));
}

#[tokio::test]
async fn test_coupon_batch_bounds() {
    let app = TestApp::new();
    let (vendor, _) = app.vendor("loomworks").await;
    let today = Utc::now().date_naive();
    let (_, offer) = app.post("/api/v1/vendor/offers", Some(&vendor), json!({
        "offer_name": "Clearance", "discount_percentage": "15",
        "start_date": today, "end_date": today + Duration::days(5), "available_on": "both",
    })).await;

    for count in [0, 501] {
        let (status, _) = app.post("/api/v1/vendor/coupons/generate", Some(&vendor), json!({
            "offer_id": offer["id"], "count": count, "prefix": "CLR",
        })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "count {count}");
    }
    let (status, _) = app.post("/api/v1/vendor/coupons/generate", Some(&vendor), json!({
        "offer_id": offer["id"], "count": 2, "prefix": "CLR", "max_usage_count": 0,
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, coupons) = app.post("/api/v1/vendor/coupons/generate", Some(&vendor), json!({
        "offer_id": offer["id"], "count": 3, "prefix": "clr",
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    let codes: Vec<&str> = coupons.as_array().unwrap().iter().map(|c| c["coupon_code"].as_str().unwrap()).collect();
    assert_eq!(codes.len(), 3);
    assert!(codes.iter().all(|c| c.starts_with("CLR-") && c.len() == 12));
    assert_eq!(coupons[0]["expiration_date"], (today + Duration::days(5)).to_string());

    let (_, listed) = app.get(&format!("/api/v1/vendor/coupons?offer_id={}", offer["id"].as_str().unwrap()), Some(&vendor)).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);
}
