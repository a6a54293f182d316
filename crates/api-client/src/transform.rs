//! Raw webservice records to normalized models
//!
//! Every transformer is infallible. A missing or malformed field degrades to
//! a fallback (empty string, zero, the context's `now`, a placeholder image)
//! so a partial record still renders.
//!
//! PrestaShop is inconsistent about value types: numbers arrive as strings
//! or numbers, flags as `"1"`, `1` or `true`, and translated fields either as
//! plain strings or as `[{"id": "1", "value": "..."}]` language lists. The
//! helpers at the bottom of this module accept all of them.

use crate::models::{Cart, CartItem, Category, CategoryNode, Customer, NewCustomer, NewOrder, Order, OrderRow, Product};
use chrono::{DateTime, NaiveDateTime, Utc};
use farmacia_core::slug::{self, EntityKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Image shown when a product has none
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder-product.svg";

/// Image shown when a category has none
pub const PLACEHOLDER_CATEGORY_IMAGE: &str = "/images/placeholder-category.svg";

/// PrestaShop's timestamp format
const PRESTASHOP_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Inputs a transformer needs besides the record itself
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Shop origin image URLs are built from
    pub image_base_url: String,
    /// Image used when a product has none
    pub placeholder_image: String,
    /// Preferred language id for translated fields
    pub language_id: String,
    /// Substitute for missing or unparsable timestamps
    pub now: DateTime<Utc>,
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new("")
    }
}

impl TransformContext {
    /// Context for the given image origin, stamped with the current time
    pub fn new(image_base_url: impl Into<String>) -> Self {
        Self {
            image_base_url: image_base_url.into(),
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            language_id: "1".to_string(),
            now: Utc::now(),
        }
    }

    /// Fix the fallback timestamp
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Prefer another language for translated fields
    #[must_use]
    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = language_id.into();
        self
    }

    fn image_url(&self, kind_prefix: &str, image_id: &str, format: &str, slug: &str) -> String {
        let name = match slug::sanitize(slug) {
            s if s.is_empty() => "image".to_string(),
            s => s,
        };
        format!(
            "{}/{kind_prefix}{image_id}-{format}/{name}.jpg",
            self.image_base_url.trim_end_matches('/')
        )
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Map a raw product record
#[must_use]
pub fn transform_product(raw: &Value, ctx: &TransformContext) -> Product {
    let id = id_field(raw, "id");
    let name = text(raw.get("name"), ctx);
    let slug = entity_slug(raw, &name, ctx);

    let price = number(raw.get("price"));
    let original_price = raw
        .get("original_price")
        .or_else(|| raw.get("price_without_reduction"))
        .map(|v| number(Some(v)))
        .filter(|&p| p > price);

    let stock_quantity = integer(raw.get("quantity"));
    let (image, images) = product_images(raw, &slug, ctx);

    Product {
        href: slug::build_url(EntityKind::Product, &id, Some(&slug)),
        id,
        description: text(raw.get("description"), ctx),
        short_description: text(raw.get("description_short"), ctx),
        price,
        original_price,
        category_id: id_field(raw, "id_category_default"),
        brand: text(raw.get("manufacturer_name"), ctx),
        image,
        images,
        in_stock: stock_quantity > 0,
        stock_quantity,
        rating: number(raw.get("rating").or_else(|| raw.get("average_rating"))),
        review_count: clamp_u32(integer(raw.get("review_count").or_else(|| raw.get("nb_reviews")))),
        requires_prescription: flag(raw.get("requires_prescription").or_else(|| raw.get("prescription"))),
        tags: tags(raw, ctx),
        specifications: specifications(raw, ctx),
        reference: text(raw.get("reference"), ctx),
        created_at: timestamp(raw.get("date_add"), ctx),
        updated_at: timestamp(raw.get("date_upd"), ctx),
        name,
        slug,
    }
}

/// Map a raw category record
#[must_use]
pub fn transform_category(raw: &Value, ctx: &TransformContext) -> Category {
    let id = id_field(raw, "id");
    let name = text(raw.get("name"), ctx);
    let slug = entity_slug(raw, &name, ctx);

    let image = match raw.get("image").and_then(Value::as_str) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => match id_field(raw, "id_image") {
            image_id if is_present_id(&image_id) => ctx.image_url("c/", &image_id, "category_default", &slug),
            _ => PLACEHOLDER_CATEGORY_IMAGE.to_string(),
        },
    };

    let parent_id = match id_field(raw, "id_parent") {
        p if p == "0" => String::new(),
        p => p,
    };

    Category {
        href: slug::build_url(EntityKind::Category, &id, Some(&slug)),
        id,
        description: text(raw.get("description"), ctx),
        image,
        product_count: clamp_u32(integer(
            raw.get("nb_products_recursive").or_else(|| raw.get("product_count")),
        )),
        parent_id,
        level_depth: clamp_u32(integer(raw.get("level_depth"))),
        active: raw.get("active").is_none_or(|v| flag(Some(v))),
        is_root_category: flag(raw.get("is_root_category")),
        name,
        slug,
    }
}

/// Assemble a flat category list into trees.
///
/// A category whose parent is not in the list becomes a root. Siblings keep
/// their input order.
#[must_use]
pub fn build_category_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let ids: HashSet<String> = categories.iter().map(|c| c.id.clone()).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<String, Vec<Category>> = HashMap::new();
    for category in categories {
        if category.parent_id != category.id && ids.contains(&category.parent_id) {
            children
                .entry(category.parent_id.clone())
                .or_default()
                .push(category);
        } else {
            roots.push(category);
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &mut children))
        .collect()
}

fn attach_children(category: Category, children: &mut HashMap<String, Vec<Category>>) -> CategoryNode {
    let kids = children.remove(&category.id).unwrap_or_default();
    CategoryNode {
        children: kids
            .into_iter()
            .map(|child| attach_children(child, children))
            .collect(),
        category,
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Records of one resource in a response.
///
/// Accepts `{"products": [...]}`, `{"product": {...}}`, a bare array (the
/// webservice answers `[]` when nothing matches) and a bare record.
#[must_use]
pub fn records<'a>(response: &'a Value, plural: &str, singular: &str) -> Vec<&'a Value> {
    match response {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get(plural).or_else(|| map.get(singular)) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(record @ Value::Object(_)) => vec![record],
            Some(_) => Vec::new(),
            None if map.contains_key("id") => vec![response],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// First record of one resource in a response
#[must_use]
pub fn first_record<'a>(response: &'a Value, plural: &str, singular: &str) -> Option<&'a Value> {
    records(response, plural, singular).into_iter().next()
}

/// All products in a response
#[must_use]
pub fn products_from_response(response: &Value, ctx: &TransformContext) -> Vec<Product> {
    records(response, "products", "product")
        .into_iter()
        .map(|raw| transform_product(raw, ctx))
        .collect()
}

/// All categories in a response
#[must_use]
pub fn categories_from_response(response: &Value, ctx: &TransformContext) -> Vec<Category> {
    records(response, "categories", "category")
        .into_iter()
        .map(|raw| transform_category(raw, ctx))
        .collect()
}

// ============================================================================
// Customers, carts, orders
// ============================================================================

/// Map a raw customer record
#[must_use]
pub fn transform_customer(raw: &Value, ctx: &TransformContext) -> Customer {
    Customer {
        id: id_field(raw, "id"),
        email: text(raw.get("email"), ctx),
        firstname: text(raw.get("firstname"), ctx),
        lastname: text(raw.get("lastname"), ctx),
        active: flag(raw.get("active")),
        password_hash: text(raw.get("passwd"), ctx),
    }
}

/// Request body creating a customer. The webservice hashes `passwd` itself.
#[must_use]
pub fn customer_to_raw(customer: &NewCustomer) -> Value {
    json!({
        "customer": {
            "email": customer.email,
            "passwd": customer.password,
            "firstname": customer.firstname,
            "lastname": customer.lastname,
            "newsletter": if customer.newsletter { "1" } else { "0" },
            "active": "1",
        }
    })
}

/// Map a raw cart record
#[must_use]
pub fn transform_cart(raw: &Value, ctx: &TransformContext) -> Cart {
    let items = association(raw, "cart_rows")
        .iter()
        .map(|row| CartItem {
            product_id: id_field(row, "id_product"),
            product_attribute_id: match id_field(row, "id_product_attribute") {
                a if a.is_empty() => "0".to_string(),
                a => a,
            },
            quantity: clamp_u32(integer(row.get("quantity"))),
        })
        .filter(|item| !item.product_id.is_empty() && item.quantity > 0)
        .collect();

    Cart {
        id: id_field(raw, "id"),
        customer_id: id_field(raw, "id_customer"),
        currency_id: id_field(raw, "id_currency"),
        lang_id: match text(raw.get("id_lang"), ctx) {
            l if l.is_empty() => ctx.language_id.clone(),
            l => l,
        },
        items,
    }
}

/// Request body for creating or replacing a cart
#[must_use]
pub fn cart_to_raw(cart: &Cart) -> Value {
    let rows: Vec<Value> = cart
        .items
        .iter()
        .map(|item| {
            json!({
                "id_product": item.product_id,
                "id_product_attribute": item.product_attribute_id,
                "id_address_delivery": "0",
                "quantity": item.quantity.to_string(),
            })
        })
        .collect();

    let mut record = Map::new();
    if !cart.id.is_empty() {
        record.insert("id".into(), json!(cart.id));
    }
    record.insert("id_customer".into(), json!(cart.customer_id));
    record.insert("id_currency".into(), json!(cart.currency_id));
    record.insert("id_lang".into(), json!(cart.lang_id));
    record.insert("associations".into(), json!({ "cart_rows": rows }));

    json!({ "cart": record })
}

/// Map a raw order record
#[must_use]
pub fn transform_order(raw: &Value, ctx: &TransformContext) -> Order {
    let rows = association(raw, "order_rows")
        .iter()
        .map(|row| OrderRow {
            product_id: id_field(row, "product_id"),
            product_name: text(row.get("product_name"), ctx),
            quantity: clamp_u32(integer(row.get("product_quantity"))),
            unit_price: number(row.get("unit_price_tax_incl").or_else(|| row.get("product_price"))),
        })
        .collect();

    Order {
        id: id_field(raw, "id"),
        reference: text(raw.get("reference"), ctx),
        customer_id: id_field(raw, "id_customer"),
        cart_id: id_field(raw, "id_cart"),
        current_state: id_field(raw, "current_state"),
        payment: text(raw.get("payment"), ctx),
        total_paid: number(raw.get("total_paid")),
        total_products: number(raw.get("total_products")),
        rows,
        created_at: timestamp(raw.get("date_add"), ctx),
    }
}

/// Request body creating an order from a cart
#[must_use]
pub fn order_to_raw(order: &NewOrder) -> Value {
    json!({
        "order": {
            "id_cart": order.cart_id,
            "id_customer": order.customer_id,
            "id_address_delivery": order.address_delivery_id,
            "id_address_invoice": order.address_invoice_id,
            "id_currency": order.currency_id,
            "id_lang": order.lang_id,
            "id_carrier": order.carrier_id,
            "payment": order.payment,
            "module": order.module,
            "conversion_rate": "1",
            "total_paid": format_amount(order.total_paid),
            "total_paid_real": format_amount(order.total_paid),
            "total_products": format_amount(order.total_products),
            "total_products_wt": format_amount(order.total_products),
        }
    })
}

// ============================================================================
// Field helpers
// ============================================================================

/// Slug from `link_rewrite`, else the lowercased name with whitespace runs
/// turned into hyphens. The synthesized form is not passed through
/// [`slug::sanitize`], so it keeps punctuation from the name.
fn entity_slug(raw: &Value, name: &str, ctx: &TransformContext) -> String {
    let link_rewrite = text(raw.get("link_rewrite"), ctx);
    if link_rewrite.is_empty() {
        WHITESPACE_RUN.replace_all(&name.to_lowercase(), "-").into_owned()
    } else {
        link_rewrite
    }
}

fn product_images(raw: &Value, slug: &str, ctx: &TransformContext) -> (String, Vec<String>) {
    let mut images: Vec<String> = association(raw, "images")
        .iter()
        .filter_map(|entry| match entry {
            Value::String(url) if !url.is_empty() => Some(url.clone()),
            Value::Object(_) => {
                let image_id = id_field(entry, "id");
                is_present_id(&image_id).then(|| ctx.image_url("", &image_id, "large_default", slug))
            }
            _ => None,
        })
        .collect();

    let cover = Some(id_field(raw, "id_default_image"))
        .filter(|id| is_present_id(id))
        .map(|id| ctx.image_url("", &id, "large_default", slug));

    let image = cover
        .clone()
        .or_else(|| images.first().cloned())
        .unwrap_or_else(|| ctx.placeholder_image.clone());

    if let Some(cover) = cover {
        if !images.contains(&cover) {
            images.insert(0, cover);
        }
    }
    if images.is_empty() {
        images.push(image.clone());
    }

    (image, images)
}

/// Entries of `associations.<name>`, falling back to a top-level `<name>`
/// array for pre-assembled records.
fn association<'a>(raw: &'a Value, name: &str) -> &'a [Value] {
    raw.get("associations")
        .and_then(|a| a.get(name))
        .or_else(|| raw.get(name))
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn tags(raw: &Value, ctx: &TransformContext) -> Vec<String> {
    let split = |s: &str| -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    };

    match raw.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text(Some(item), ctx))
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::String(s)) => split(s),
        _ => split(&text(raw.get("meta_keywords"), ctx)),
    }
}

fn specifications(raw: &Value, ctx: &TransformContext) -> BTreeMap<String, String> {
    raw.get("specifications")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), text(Some(value), ctx)))
                .collect()
        })
        .unwrap_or_default()
}

/// Plain or translated text. Language lists prefer the context's language
/// and fall back to the first entry.
fn text(value: Option<&Value>, ctx: &TransformContext) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(entries)) => entries
            .iter()
            .find(|entry| id_field(entry, "id") == ctx.language_id)
            .or_else(|| entries.first())
            .map(|entry| match entry {
                Value::Object(_) => text(entry.get("value"), ctx),
                other => text(Some(other), ctx),
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn id_field(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn is_present_id(id: &str) -> bool {
    !id.is_empty() && id != "0"
}

/// Decimal from a string or number; unparsable gives 0
fn number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<f64>()
                .ok()
                .or_else(|| s.replace(',', ".").parse::<f64>().ok())
        }
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

#[allow(clippy::cast_possible_truncation)]
fn integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| number(value) as i64),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or_else(|_| number(value) as i64),
        _ => 0,
    }
}

fn clamp_u32(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

fn timestamp(value: Option<&Value>, ctx: &TransformContext) -> DateTime<Utc> {
    let Some(Value::String(s)) = value else {
        return ctx.now;
    };
    let s = s.trim();

    NaiveDateTime::parse_from_str(s, PRESTASHOP_DATETIME)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)))
        .unwrap_or(ctx.now)
}

fn format_amount(amount: f64) -> String {
    format!("{amount:.6}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn ctx() -> TransformContext {
        TransformContext::new("https://farmacia.example")
            .with_now(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn raw_product() -> Value {
        json!({
            "id": 123,
            "id_default_image": "45",
            "id_category_default": "7",
            "manufacturer_name": "Cinfa",
            "reference": "IBU400",
            "quantity": "12",
            "price": "4.950000",
            "name": [{"id": "1", "value": "Ibuprofeno 400mg"}, {"id": "2", "value": "Ibuprofen 400mg"}],
            "link_rewrite": [{"id": "1", "value": "ibuprofeno-400mg"}],
            "description": [{"id": "1", "value": "<p>Analgésico</p>"}],
            "date_add": "2024-01-15 10:30:00",
            "date_upd": "0000-00-00 00:00:00",
            "associations": {
                "images": [{"id": "45"}, {"id": "46"}]
            }
        })
    }

    #[test]
    fn test_transform_full_product() {
        let product = transform_product(&raw_product(), &ctx());

        assert_eq!(product.id, "123");
        assert_eq!(product.name, "Ibuprofeno 400mg");
        assert_eq!(product.slug, "ibuprofeno-400mg");
        assert_eq!(product.href, "/producto/ibuprofeno-400mg-123");
        assert!((product.price - 4.95).abs() < 1e-9);
        assert_eq!(product.stock_quantity, 12);
        assert!(product.in_stock);
        assert_eq!(product.brand, "Cinfa");
        assert_eq!(
            product.image,
            "https://farmacia.example/45-large_default/ibuprofeno-400mg.jpg"
        );
        assert_eq!(product.images.len(), 2);
        assert_eq!(
            product.created_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(product.updated_at, ctx().now);
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let product = transform_product(&json!({"id": "9", "name": "Gasas"}), &ctx());

        assert!(product.price.abs() < f64::EPSILON);
        assert!(!product.in_stock);
        assert_eq!(product.image, PLACEHOLDER_IMAGE);
        assert_eq!(product.images, vec![PLACEHOLDER_IMAGE.to_string()]);
        assert_eq!(product.created_at, ctx().now);
        assert!(product.original_price.is_none());
    }

    #[test]
    fn test_unparsable_price_is_zero() {
        let product = transform_product(&json!({"price": "gratis"}), &ctx());
        assert!(product.price.abs() < f64::EPSILON);

        let product = transform_product(&json!({"price": "3,20"}), &ctx());
        assert!((product.price - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_first_association_image_without_cover() {
        let raw = json!({"id": "5", "link_rewrite": "tiritas", "associations": {"images": [{"id": "8"}]}});
        let product = transform_product(&raw, &ctx());
        assert_eq!(product.image, "https://farmacia.example/8-large_default/tiritas.jpg");
    }

    #[test]
    fn test_synthesized_slug_keeps_punctuation() {
        let product = transform_product(&json!({"id": "3", "name": "Crema  Solar SPF50+"}), &ctx());
        assert_eq!(product.slug, "crema-solar-spf50+");
        assert_eq!(product.href, "/producto/crema-solar-spf50-3");
    }

    #[test]
    fn test_original_price_only_when_higher() {
        let raw = json!({"price": "10", "price_without_reduction": "12.5"});
        assert_eq!(transform_product(&raw, &ctx()).original_price, Some(12.5));

        let raw = json!({"price": "10", "price_without_reduction": "10"});
        assert_eq!(transform_product(&raw, &ctx()).original_price, None);
    }

    #[test]
    fn test_transform_category() {
        let raw = json!({
            "id": "7",
            "id_parent": "2",
            "level_depth": "2",
            "nb_products_recursive": "34",
            "active": "1",
            "is_root_category": "0",
            "name": [{"id": "1", "value": "Medicamentos"}],
            "link_rewrite": [{"id": "1", "value": "medicamentos"}]
        });
        let category = transform_category(&raw, &ctx());

        assert_eq!(category.href, "/categoria/medicamentos-7");
        assert_eq!(category.parent_id, "2");
        assert_eq!(category.product_count, 34);
        assert_eq!(category.level_depth, 2);
        assert!(category.active);
        assert!(!category.is_root_category);
        assert_eq!(category.image, PLACEHOLDER_CATEGORY_IMAGE);
    }

    #[test]
    fn test_root_category_has_no_parent() {
        let category = transform_category(&json!({"id": "1", "id_parent": "0"}), &ctx());
        assert_eq!(category.parent_id, "");
    }

    #[test]
    fn test_language_preference() {
        let ctx = ctx().with_language("2");
        let product = transform_product(&raw_product(), &ctx);
        assert_eq!(product.name, "Ibuprofen 400mg");
        // falls back to the first entry when the language is missing
        assert_eq!(product.slug, "ibuprofeno-400mg");
    }

    #[test]
    fn test_envelopes() {
        let ctx = ctx();
        let list = json!({"products": [{"id": 1}, {"id": 2}]});
        assert_eq!(products_from_response(&list, &ctx).len(), 2);

        let single = json!({"product": {"id": 1}});
        assert_eq!(products_from_response(&single, &ctx).len(), 1);

        assert!(products_from_response(&json!([]), &ctx).is_empty());
        assert!(categories_from_response(&json!({}), &ctx).is_empty());
        assert!(first_record(&json!({"customers": []}), "customers", "customer").is_none());
    }

    #[test]
    fn test_build_category_tree() {
        let ctx = ctx();
        let categories = categories_from_response(
            &json!({"categories": [
                {"id": "3", "id_parent": "2", "name": "Medicamentos"},
                {"id": "2", "id_parent": "1", "name": "Inicio"},
                {"id": "4", "id_parent": "3", "name": "Analgésicos"},
                {"id": "5", "id_parent": "2", "name": "Higiene"},
                {"id": "9", "id_parent": "99", "name": "Huérfana"}
            ]}),
            &ctx,
        );

        let tree = build_category_tree(categories);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.id, "2");
        assert_eq!(tree[1].category.id, "9");

        let home = &tree[0];
        assert_eq!(home.size(), 4);
        let ids: Vec<_> = home.children.iter().map(|c| c.category.id.as_str()).collect();
        assert_eq!(ids, ["3", "5"]);
        assert!(home.find("4").is_some());
    }

    #[test]
    fn test_cart_roundtrip_rows() {
        let raw = json!({
            "id": "11",
            "id_customer": "5",
            "id_currency": "1",
            "id_lang": "1",
            "associations": {"cart_rows": [
                {"id_product": "10", "id_product_attribute": "0", "quantity": "2"},
                {"id_product": "12", "id_product_attribute": "3", "quantity": 1}
            ]}
        });
        let cart = transform_cart(&raw, &ctx());
        assert_eq!(cart.item_count(), 3);

        let body = cart_to_raw(&cart);
        assert_eq!(body["cart"]["id"], "11");
        assert_eq!(body["cart"]["associations"]["cart_rows"][1]["id_product_attribute"], "3");
    }

    #[test]
    fn test_new_cart_body_has_no_id() {
        let cart = Cart {
            id: String::new(),
            customer_id: "5".into(),
            currency_id: "1".into(),
            lang_id: "1".into(),
            items: Vec::new(),
        };
        assert!(cart_to_raw(&cart)["cart"].get("id").is_none());
    }

    #[test]
    fn test_transform_order() {
        let raw = json!({
            "id": 30,
            "reference": "XKBKNABJK",
            "id_customer": "5",
            "id_cart": "11",
            "current_state": "2",
            "payment": "Transferencia bancaria",
            "total_paid": "19.900000",
            "total_products": "16.450000",
            "date_add": "2024-03-02 09:00:00",
            "associations": {"order_rows": [
                {"product_id": "10", "product_name": "Ibuprofeno", "product_quantity": "2", "unit_price_tax_incl": "4.95"}
            ]}
        });
        let order = transform_order(&raw, &ctx());

        assert_eq!(order.id, "30");
        assert!((order.total_paid - 19.9).abs() < 1e-9);
        assert_eq!(order.rows.len(), 1);
        assert_eq!(order.rows[0].quantity, 2);
    }

    #[test]
    fn test_transform_customer() {
        let raw = json!({"id": 5, "email": "ana@example.com", "firstname": "Ana", "lastname": "López", "active": "1", "passwd": "$2y$10$abc"});
        let customer = transform_customer(&raw, &ctx());
        assert!(customer.active);
        assert_eq!(customer.password_hash, "$2y$10$abc");
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>().prop_map(|n| json!(n)),
            ".{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::hash_map(
                    prop_oneof![
                        Just("id".to_string()),
                        Just("name".to_string()),
                        Just("price".to_string()),
                        Just("quantity".to_string()),
                        Just("associations".to_string()),
                        Just("images".to_string()),
                        Just("id_parent".to_string()),
                        Just("date_add".to_string()),
                        "[a-z_]{1,8}",
                    ],
                    inner,
                    0..6
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_transformers_never_panic(raw in arb_json()) {
            let ctx = ctx();
            let product = transform_product(&raw, &ctx);
            prop_assert!(!product.image.is_empty());
            prop_assert!(!product.images.is_empty());
            prop_assert_eq!(product.in_stock, product.stock_quantity > 0);

            let _ = transform_category(&raw, &ctx);
            let _ = transform_cart(&raw, &ctx);
            let _ = transform_order(&raw, &ctx);
            let _ = products_from_response(&raw, &ctx);
        }
    }
}
