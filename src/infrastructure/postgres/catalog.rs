use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::rows::{
    convert, AddressRow, CartRow, ContactRow, CouponRow, OfferRow, PaymentTermRow, ProductRow, UserRow,
};
use super::PgStore;
use crate::domain::aggregates::{Address, Cart, Contact, ContactType, Coupon, DiscountOffer, PaymentTerm, Product, User};
use crate::domain::ports::{
    CartRepository, ContactRepository, PricingRepository, ProductRepository, StoreError, StoreResult, UserRepository,
};

#[async_trait]
impl ProductRepository for PgStore {
    async fn insert_product(&self, p: &Product) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products (id, product_code, product_name, product_category, product_type, material, description, \
             current_stock, minimum_stock, sales_price, sales_tax_percentage, purchase_price, purchase_tax_percentage, \
             colors, images, is_published, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(p.id)
        .bind(p.code.as_str())
        .bind(&p.name)
        .bind(p.category.as_str())
        .bind(p.product_type.as_str())
        .bind(&p.material)
        .bind(&p.description)
        .bind(p.current_stock)
        .bind(p.minimum_stock)
        .bind(p.sales_price)
        .bind(p.sales_tax_percentage.value())
        .bind(p.purchase_price)
        .bind(p.purchase_tax_percentage.value())
        .bind(Json(&p.colors))
        .bind(Json(&p.images))
        .bind(p.is_published)
        .bind(p.is_active)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE products SET product_name = $2, product_category = $3, product_type = $4, material = $5, \
             description = $6, minimum_stock = $7, sales_price = $8, sales_tax_percentage = $9, purchase_price = $10, \
             purchase_tax_percentage = $11, colors = $12, images = $13, is_published = $14, is_active = $15, \
             updated_at = $16 WHERE id = $1",
        )
        .bind(p.id)
        .bind(&p.name)
        .bind(p.category.as_str())
        .bind(p.product_type.as_str())
        .bind(&p.material)
        .bind(&p.description)
        .bind(p.minimum_stock)
        .bind(p.sales_price)
        .bind(p.sales_tax_percentage.value())
        .bind(p.purchase_price)
        .bind(p.purchase_tax_percentage.value())
        .bind(Json(&p.colors))
        .bind(Json(&p.images))
        .bind(p.is_published)
        .bind(p.is_active)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Product"));
        }
        Ok(())
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        convert(rows)
    }

    async fn catalog(&self, published_only: bool) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT * FROM products WHERE NOT $1 OR (is_active AND is_published) ORDER BY created_at DESC",
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }
}

async fn insert_contact(conn: &mut sqlx::PgConnection, c: &Contact) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO contacts (id, contact_name, contact_type, email, mobile, address_line1, address_line2, city, state, \
         pincode, country, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(c.id)
    .bind(&c.contact_name)
    .bind(c.contact_type.as_str())
    .bind(&c.email)
    .bind(&c.mobile)
    .bind(&c.address_line1)
    .bind(&c.address_line2)
    .bind(&c.city)
    .bind(&c.state)
    .bind(&c.pincode)
    .bind(&c.country)
    .bind(c.is_active)
    .bind(c.created_at)
    .bind(c.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl ContactRepository for PgStore {
    async fn insert_contact(&self, contact: &Contact) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_contact(&mut conn, contact).await
    }

    async fn update_contact(&self, c: &Contact) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE contacts SET contact_name = $2, contact_type = $3, email = $4, mobile = $5, address_line1 = $6, \
             address_line2 = $7, city = $8, state = $9, pincode = $10, country = $11, is_active = $12, updated_at = $13 \
             WHERE id = $1",
        )
        .bind(c.id)
        .bind(&c.contact_name)
        .bind(c.contact_type.as_str())
        .bind(&c.email)
        .bind(&c.mobile)
        .bind(&c.address_line1)
        .bind(&c.address_line2)
        .bind(&c.city)
        .bind(&c.state)
        .bind(&c.pincode)
        .bind(&c.country)
        .bind(c.is_active)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Contact"));
        }
        Ok(())
    }

    async fn contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        let row: Option<ContactRow> = sqlx::query_as("SELECT * FROM contacts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Contact::try_from).transpose()
    }

    async fn contacts(&self, kind: Option<ContactType>) -> StoreResult<Vec<Contact>> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            "SELECT * FROM contacts WHERE $1::text IS NULL OR contact_type IN ($1, 'both') ORDER BY contact_name",
        )
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }

    async fn addresses(&self, contact_id: Uuid) -> StoreResult<Vec<Address>> {
        let rows: Vec<AddressRow> = sqlx::query_as("SELECT * FROM addresses WHERE contact_id = $1 ORDER BY created_at")
            .bind(contact_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn address(&self, id: Uuid) -> StoreResult<Option<Address>> {
        let row: Option<AddressRow> = sqlx::query_as("SELECT * FROM addresses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Address::from))
    }

    async fn save_address(&self, a: &Address) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        if a.is_default_shipping {
            sqlx::query("UPDATE addresses SET is_default_shipping = FALSE WHERE contact_id = $1 AND id <> $2")
                .bind(a.contact_id)
                .bind(a.id)
                .execute(&mut *tx)
                .await?;
        }
        if a.is_default_billing {
            sqlx::query("UPDATE addresses SET is_default_billing = FALSE WHERE contact_id = $1 AND id <> $2")
                .bind(a.contact_id)
                .bind(a.id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(
            "INSERT INTO addresses (id, contact_id, label, address_line1, address_line2, city, state, pincode, country, \
             is_default_shipping, is_default_billing, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (id) DO UPDATE SET label = EXCLUDED.label, address_line1 = EXCLUDED.address_line1, \
             address_line2 = EXCLUDED.address_line2, city = EXCLUDED.city, state = EXCLUDED.state, \
             pincode = EXCLUDED.pincode, country = EXCLUDED.country, \
             is_default_shipping = EXCLUDED.is_default_shipping, is_default_billing = EXCLUDED.is_default_billing",
        )
        .bind(a.id)
        .bind(a.contact_id)
        .bind(&a.label)
        .bind(&a.address_line1)
        .bind(&a.address_line2)
        .bind(&a.city)
        .bind(&a.state)
        .bind(&a.pincode)
        .bind(&a.country)
        .bind(a.is_default_shipping)
        .bind(a.is_default_billing)
        .bind(a.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_address(&self, contact_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND contact_id = $2")
            .bind(id)
            .bind(contact_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn register(&self, user: &User, contact: &Contact) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_contact(&mut tx, contact).await?;
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, contact_id, is_active, last_login, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.contact_id)
        .bind(user.is_active)
        .bind(user.last_login)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn touch_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PricingRepository for PgStore {
    async fn insert_payment_term(&self, t: &PaymentTerm) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO payment_terms (id, term_name, net_days, early_payment_discount, discount_percentage, \
             discount_days, early_pay_discount_computation, is_active) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(t.id)
        .bind(&t.term_name)
        .bind(t.net_days)
        .bind(t.early_payment_discount)
        .bind(t.discount_percentage.value())
        .bind(t.discount_days)
        .bind(t.early_pay_discount_computation.as_str())
        .bind(t.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn payment_terms(&self, active_only: bool) -> StoreResult<Vec<PaymentTerm>> {
        let rows: Vec<PaymentTermRow> =
            sqlx::query_as("SELECT * FROM payment_terms WHERE NOT $1 OR is_active ORDER BY net_days, term_name")
                .bind(active_only)
                .fetch_all(&self.pool)
                .await?;
        convert(rows)
    }

    async fn payment_term(&self, id: Uuid) -> StoreResult<Option<PaymentTerm>> {
        let row: Option<PaymentTermRow> = sqlx::query_as("SELECT * FROM payment_terms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PaymentTerm::try_from).transpose()
    }

    async fn insert_offer(&self, o: &DiscountOffer) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO discount_offers (id, offer_name, discount_percentage, start_date, end_date, available_on, \
             is_active, created_by, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(o.id)
        .bind(&o.offer_name)
        .bind(o.discount_percentage.value())
        .bind(o.start_date)
        .bind(o.end_date)
        .bind(o.available_on.as_str())
        .bind(o.is_active)
        .bind(o.created_by)
        .bind(o.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn offers(&self) -> StoreResult<Vec<DiscountOffer>> {
        let rows: Vec<OfferRow> = sqlx::query_as("SELECT * FROM discount_offers ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        convert(rows)
    }

    async fn offer(&self, id: Uuid) -> StoreResult<Option<DiscountOffer>> {
        let row: Option<OfferRow> = sqlx::query_as("SELECT * FROM discount_offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(DiscountOffer::try_from).transpose()
    }

    async fn insert_coupons(&self, coupons: &[Coupon]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for c in coupons {
            sqlx::query(
                "INSERT INTO coupon_codes (id, offer_id, coupon_code, expiration_date, coupon_status, contact_id, \
                 usage_count, max_usage_count, is_active, used_at, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(c.id)
            .bind(c.offer_id)
            .bind(&c.coupon_code)
            .bind(c.expiration_date)
            .bind(c.coupon_status.as_str())
            .bind(c.contact_id)
            .bind(c.usage_count)
            .bind(c.max_usage_count)
            .bind(c.is_active)
            .bind(c.used_at)
            .bind(c.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn coupons(&self, offer_id: Option<Uuid>) -> StoreResult<Vec<Coupon>> {
        let rows: Vec<CouponRow> = sqlx::query_as(
            "SELECT * FROM coupon_codes WHERE $1::uuid IS NULL OR offer_id = $1 ORDER BY created_at DESC",
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }

    async fn coupon_by_code(&self, code: &str) -> StoreResult<Option<(Coupon, DiscountOffer)>> {
        let row: Option<CouponRow> = sqlx::query_as("SELECT * FROM coupon_codes WHERE coupon_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        let Some(coupon) = row.map(Coupon::try_from).transpose()? else { return Ok(None) };
        Ok(self.offer(coupon.offer_id).await?.map(|offer| (coupon, offer)))
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>> {
        let row: Option<CartRow> = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Cart::from))
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO carts (user_id, id, items, created_at, updated_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at",
        )
        .bind(cart.user_id)
        .bind(cart.id)
        .bind(Json(&cart.items))
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
