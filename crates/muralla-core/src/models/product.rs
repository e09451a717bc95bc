use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{as_number, first_number, first_str};

/// A menu item as rendered by the site.
///
/// Built from the admin API (`sku`, `unitPrice`), the bundled JSON files
/// (`id`, `price`) and older backends (`_id`, `precio`, `img`, `ig`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub sku: String,
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn slug(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Product {
    pub fn from_value(raw: &Value) -> Self {
        let name = first_str(raw, &["name"]).unwrap_or("Producto").to_string();
        let sku = first_str(raw, &["sku"]).map(str::to_string);
        let id = ["id", "_id"]
            .iter()
            .find_map(|key| raw.get(*key).and_then(id_string))
            .or_else(|| sku.clone())
            .unwrap_or_else(|| slug(&name));

        let tags = raw
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .map(|t| match t {
                        Value::String(s) => normalize_tag(s),
                        Value::Null => String::new(),
                        other => normalize_tag(&other.to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            sku: sku.unwrap_or_else(|| id.clone()),
            id,
            name,
            description: first_str(raw, &["description", "desc"]).unwrap_or_default().to_string(),
            category: first_str(raw, &["category"]).unwrap_or_default().to_string(),
            price: first_number(raw, &["unitPrice", "price", "precio"]).or_else(|| {
                // An explicit zero price is still a price
                ["unitPrice", "price", "precio"]
                    .iter()
                    .find_map(|key| raw.get(*key).and_then(as_number))
            }),
            image: first_str(raw, &["image", "img"]).unwrap_or_default().to_string(),
            instagram: first_str(raw, &["instagram", "ig"]).unwrap_or_default().to_string(),
            tags,
            kind: first_str(raw, &["type"]).unwrap_or_default().to_string(),
        }
    }
}

/// The two shapes a product listing arrives in.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductsPayload {
    /// Admin API: `{ "data": [...], "pagination": {...} }`
    Paginated { data: Vec<Value> },
    /// Bundled JSON and fallback server: `[...]`
    List(Vec<Value>),
}

impl ProductsPayload {
    /// Resolve any accepted shape into normalized products, `None` if the
    /// payload is neither shape.
    pub fn normalize(value: &Value) -> Option<Vec<Product>> {
        let payload: ProductsPayload = serde_json::from_value(value.clone()).ok()?;
        let items = match payload {
            ProductsPayload::Paginated { data } => data,
            ProductsPayload::List(items) => items,
        };
        Some(items.iter().map(Product::from_value).collect())
    }
}

/// Today's specials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Today {
    /// `YYYY-MM-DD`
    pub date: String,
    pub items: Vec<Product>,
}

impl Today {
    pub fn from_value(raw: &Value) -> Self {
        let date = first_str(raw, &["date"])
            .map(str::to_string)
            .unwrap_or_else(today_iso);
        let items = raw
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Product::from_value).collect())
            .unwrap_or_default();
        Self { date, items }
    }

    pub fn empty() -> Self {
        Self {
            date: today_iso(),
            items: Vec::new(),
        }
    }
}

pub(crate) fn today_iso() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_admin_shape() {
        let p = Product::from_value(&json!({
            "sku": "CAF-01",
            "name": "Café Americano",
            "unitPrice": 2000,
            "category": "Café",
            "type": "bebida",
            "tags": [" Vegano ", "SIN GLUTEN"]
        }));
        assert_eq!(p.id, "CAF-01");
        assert_eq!(p.sku, "CAF-01");
        assert_eq!(p.price, Some(2000.0));
        assert_eq!(p.kind, "bebida");
        assert_eq!(p.tags, vec!["vegano", "sin gluten"]);
    }

    #[test]
    fn test_normalize_legacy_shape() {
        let p = Product::from_value(&json!({
            "_id": 17,
            "name": "Jugo de Naranja",
            "precio": "2800",
            "img": "/img/jugo.jpg",
            "ig": "https://instagram.com/p/x",
            "desc": "Recién exprimido."
        }));
        assert_eq!(p.id, "17");
        assert_eq!(p.sku, "17");
        assert_eq!(p.price, Some(2800.0));
        assert_eq!(p.image, "/img/jugo.jpg");
        assert_eq!(p.instagram, "https://instagram.com/p/x");
        assert_eq!(p.description, "Recién exprimido.");
    }

    #[test]
    fn test_normalize_missing_fields() {
        let p = Product::from_value(&json!({"name": "Pizza  Margarita"}));
        assert_eq!(p.id, "pizza-margarita");
        assert_eq!(p.price, None);
        assert!(p.tags.is_empty());

        let unnamed = Product::from_value(&json!({}));
        assert_eq!(unnamed.name, "Producto");
    }

    #[test]
    fn test_payload_shapes() {
        let paginated = json!({"data": [{"id": "1", "name": "A"}], "pagination": {"page": 1}});
        let bare = json!([{"id": "1", "name": "A"}]);
        assert_eq!(ProductsPayload::normalize(&paginated), ProductsPayload::normalize(&bare));
        assert_eq!(ProductsPayload::normalize(&bare).unwrap().len(), 1);
        assert!(ProductsPayload::normalize(&json!({"error": "nope"})).is_none());
    }

    #[test]
    fn test_today_defaults_date() {
        let today = Today::from_value(&json!({
            "items": [{"id": "lasana", "name": "Lasaña", "price": 6900}]
        }));
        assert_eq!(today.date.len(), 10);
        assert_eq!(today.items[0].price, Some(6900.0));
    }
}
