#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use appareldesk_commerce::infrastructure::{LogPublisher, MemoryStore};
use appareldesk_commerce::{app, AppState, Config};

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(LogPublisher), Config::default());
        Self { router: app(state) }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    /// Registers through `path` and logs in; returns the bearer token and the contact id.
    async fn account(&self, path: &str, username: &str) -> (String, String) {
        let (status, _) = self.post(path, None, json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct-horse",
            "contact_name": username,
        })).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.post("/api/v1/auth/login", None, json!({
            "username": username,
            "password": "correct-horse",
        })).await;
        assert_eq!(status, StatusCode::OK);
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["contact"]["id"].as_str().unwrap().to_string(),
        )
    }

    pub async fn customer(&self, username: &str) -> (String, String) {
        self.account("/api/v1/auth/register", username).await
    }

    pub async fn vendor(&self, username: &str) -> (String, String) {
        self.account("/api/v1/auth/vendor-register", username).await
    }

    /// A published kurta: sales price `price`, purchase price 600, 5% tax both ways.
    pub async fn product(&self, vendor: &str, code: &str, price: &str, stock: &str) -> Value {
        let (status, body) = self.post("/api/v1/vendor/products", Some(vendor), json!({
            "product_code": code,
            "product_name": format!("Kurta {code}"),
            "product_category": "men",
            "product_type": "kurta",
            "current_stock": stock,
            "minimum_stock": "10",
            "sales_price": price,
            "sales_tax_percentage": "5",
            "purchase_price": "600",
            "purchase_tax_percentage": "5",
            "colors": [{ "color_name": "Indigo" }],
            "is_published": true,
        })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn term_id(&self, name: &str) -> String {
        let (_, terms) = self.get("/api/v1/pricing/payment-terms", None).await;
        terms.as_array().unwrap().iter()
            .find(|t| t["term_name"] == name)
            .map(|t| t["id"].as_str().unwrap().to_string())
            .unwrap()
    }
}

pub fn num(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

pub fn shipping() -> Value {
    json!({ "address_line1": "12 MG Road", "city": "Pune", "country": "India" })
}
