//! Normalized storefront models
//!
//! These are the shapes the rest of the application works with. Raw
//! webservice records are mapped into them by [`crate::transform`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Webservice id
    pub id: String,
    /// Display name
    pub name: String,
    /// Long HTML description
    pub description: String,
    /// Summary shown on listings
    pub short_description: String,
    /// Current price, tax included
    pub price: f64,
    /// Price before a reduction, when one applies
    pub original_price: Option<f64>,
    /// Default category id
    pub category_id: String,
    /// Manufacturer name, empty when unknown
    pub brand: String,
    /// Main image URL, never empty
    pub image: String,
    /// All image URLs, main image first
    pub images: Vec<String>,
    /// `link_rewrite` slug
    pub slug: String,
    /// Canonical storefront path, `/producto/<slug>-<id>`
    pub href: String,
    /// Whether any units are available
    pub in_stock: bool,
    /// Units available; negative when oversold
    pub stock_quantity: i64,
    /// Average review score, 0.0 without reviews
    pub rating: f64,
    /// Number of reviews
    pub review_count: u32,
    /// Sold only against a prescription
    pub requires_prescription: bool,
    /// Storefront tags
    pub tags: Vec<String>,
    /// Feature name to value
    pub specifications: BTreeMap<String, String>,
    /// Shop SKU
    pub reference: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Catalog category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Webservice id
    pub id: String,
    /// Display name
    pub name: String,
    /// HTML description
    pub description: String,
    /// `link_rewrite` slug
    pub slug: String,
    /// Canonical storefront path, `/categoria/<slug>-<id>`
    pub href: String,
    /// Category image URL
    pub image: String,
    /// Products linked to the category
    pub product_count: u32,
    /// Empty for the shop root
    pub parent_id: String,
    /// Depth in the shop tree, 0 for the root
    pub level_depth: u32,
    /// Visible in the storefront
    pub active: bool,
    /// PrestaShop's own root/home flag
    pub is_root_category: bool,
}

/// Category with its children, as returned by the category tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    /// The category itself
    #[serde(flatten)]
    pub category: Category,
    /// Direct subcategories
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Number of nodes in this subtree, this one included
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }

    /// Depth-first search by category id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&CategoryNode> {
        if self.category.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Shop customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Webservice id
    pub id: String,
    /// Login email
    pub email: String,
    /// Given name
    pub firstname: String,
    /// Family name
    pub lastname: String,
    /// Whether the account may log in
    pub active: bool,
    /// Stored password hash; never serialized back out
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl Customer {
    /// "Firstname Lastname"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }
}

/// Login form input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Plain-text password as typed
    pub password: String,
}

/// Registration form input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Login email
    pub email: String,
    /// Plain-text password, hashed by the shop
    pub password: String,
    /// Given name
    pub firstname: String,
    /// Family name
    pub lastname: String,
    /// Newsletter opt-in
    #[serde(default)]
    pub newsletter: bool,
}

/// Cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product id
    pub product_id: String,
    /// Combination id, `"0"` when the product has no variants
    pub product_attribute_id: String,
    /// Units on the line
    pub quantity: u32,
}

impl CartItem {
    /// Line for a product without combinations
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            product_attribute_id: "0".to_string(),
            quantity,
        }
    }

    fn same_line(&self, product_id: &str, product_attribute_id: &str) -> bool {
        self.product_id == product_id && self.product_attribute_id == product_attribute_id
    }
}

/// Shopping cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Webservice id
    pub id: String,
    /// Owning customer
    pub customer_id: String,
    /// Shop currency id
    pub currency_id: String,
    /// Shop language id
    pub lang_id: String,
    /// Lines in insertion order
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Total number of units across lines
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .map(|item| item.quantity)
            .fold(0u32, u32::saturating_add)
    }

    /// Add units of a product, merging with an existing line
    pub fn add(&mut self, product_id: &str, product_attribute_id: &str, quantity: u32) {
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|item| item.same_line(product_id, product_attribute_id))
        {
            line.quantity = line.quantity.saturating_add(quantity);
        } else if quantity > 0 {
            self.items.push(CartItem {
                product_id: product_id.to_string(),
                product_attribute_id: product_attribute_id.to_string(),
                quantity,
            });
        }
    }

    /// Set the quantity of a line; zero removes it. Returns whether the line
    /// existed.
    pub fn set_quantity(&mut self, product_id: &str, product_attribute_id: &str, quantity: u32) -> bool {
        let Some(index) = self
            .items
            .iter()
            .position(|item| item.same_line(product_id, product_attribute_id))
        else {
            return false;
        };

        if quantity == 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = quantity;
        }
        true
    }

    /// Remove a line. Returns whether it existed.
    pub fn remove(&mut self, product_id: &str, product_attribute_id: &str) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| !item.same_line(product_id, product_attribute_id));
        self.items.len() != before
    }
}

/// Order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    /// Product id
    pub product_id: String,
    /// Product name at order time
    pub product_name: String,
    /// Units ordered
    pub quantity: u32,
    /// Price per unit, tax included
    pub unit_price: f64,
}

/// Placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Webservice id
    pub id: String,
    /// Shop order reference, e.g. "XKBKNABJK"
    pub reference: String,
    /// Ordering customer
    pub customer_id: String,
    /// Cart the order was placed from
    pub cart_id: String,
    /// Order state id
    pub current_state: String,
    /// Payment method display name
    pub payment: String,
    /// Amount paid, tax included
    pub total_paid: f64,
    /// Products subtotal
    pub total_products: f64,
    /// Ordered lines
    pub rows: Vec<OrderRow>,
    /// Placement time
    pub created_at: DateTime<Utc>,
}

/// Checkout input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// Cart to check out
    pub cart_id: String,
    /// Ordering customer
    pub customer_id: String,
    /// Delivery address id
    pub address_delivery_id: String,
    /// Invoice address id
    pub address_invoice_id: String,
    /// Shop currency id
    pub currency_id: String,
    /// Shop language id
    pub lang_id: String,
    /// Carrier id
    pub carrier_id: String,
    /// Payment module display name, e.g. "Transferencia bancaria"
    pub payment: String,
    /// Payment module technical name, e.g. "ps_wirepayment"
    pub module: String,
    /// Amount to charge, tax included
    pub total_paid: f64,
    /// Products subtotal
    pub total_products: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart {
            id: "1".into(),
            customer_id: "5".into(),
            currency_id: "1".into(),
            lang_id: "1".into(),
            items: vec![CartItem::new("10", 2)],
        }
    }

    #[test]
    fn test_cart_add_merges_lines() {
        let mut cart = cart();
        cart.add("10", "0", 3);
        cart.add("11", "0", 1);

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_cart_set_quantity_zero_removes() {
        let mut cart = cart();
        assert!(cart.set_quantity("10", "0", 0));
        assert!(cart.items.is_empty());
        assert!(!cart.set_quantity("10", "0", 4));
    }

    #[test]
    fn test_cart_remove() {
        let mut cart = cart();
        assert!(!cart.remove("10", "3"));
        assert!(cart.remove("10", "0"));
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_cart_item_count_saturates() {
        let mut cart = cart();
        cart.items = vec![CartItem::new("10", u32::MAX), CartItem::new("11", u32::MAX)];
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_customer_password_hash_not_serialized() {
        let customer = Customer {
            id: "1".into(),
            email: "ana@example.com".into(),
            firstname: "Ana".into(),
            lastname: "López".into(),
            active: true,
            password_hash: "$2y$10$secret".into(),
        };

        let json = serde_json::to_string(&customer).unwrap();
        assert!(!json.contains("secret"));
        assert_eq!(customer.full_name(), "Ana López");
    }
}
