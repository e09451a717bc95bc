//! Built-in datasets shown when every tier misses.

use serde_json::json;

use crate::models::{Event, MapConfig, Product, SiteConfig, Today};

pub const PLACE_ID: &str = "ChIJ2Wmo--LFYpYRjjZvjlHBkYg";
pub const PLACE_URL: &str = "https://maps.app.goo.gl/hkvftZnfX1sZZ2ucA";

pub const CATEGORIES: [&str; 7] = [
    "Comidas",
    "Dulces",
    "Bebidas Calientes",
    "Ice Coffee",
    "Frapés",
    "Mocktails",
    "Jugos y Limonadas",
];

pub fn map() -> MapConfig {
    serde_json::from_value(json!({
        "provider": "google",
        "apiKey": "",
        "mapId": "73f23a273562e2f19d1560a3",
        "placeId": PLACE_ID,
        "lat": -33.443023,
        "lng": -70.6374082,
        "zoom": 17,
        "placeUrl": PLACE_URL
    }))
    .unwrap_or_default()
}

pub fn config() -> SiteConfig {
    let mut config: SiteConfig = serde_json::from_value(json!({
        "instagram": "https://instagram.com/muralla.cafe",
        "mapsUrl": "https://maps.google.com/?q=Muralla",
        "email": "hola@muralla.cl",
        "providers": { "whatsapp": "+56900000000", "email": "proveedores@muralla.cl" },
        "booking": {
            "mode": "whatsapp",
            "whatsapp": "+56900000000",
            "message": "Hola! Quiero reservar/comprar: {item} para hoy {date}."
        }
    }))
    .unwrap_or_default();
    config.map = Some(map());
    config
}

pub fn today() -> Today {
    Today::from_value(&json!({
        "items": [
            {
                "id": "lasana",
                "name": "Lasaña Casera",
                "tags": ["sin procesar"],
                "price": 6900,
                "image": "/assets/img/prod-01.svg"
            },
            {
                "id": "pizza",
                "name": "Pizza Margarita",
                "tags": ["sin procesar"],
                "price": 5500,
                "image": "/assets/img/prod-02.svg"
            },
            {
                "id": "veggie",
                "name": "Bowl Veggie",
                "tags": ["vegano"],
                "price": 6200,
                "image": "/assets/img/prod-03.svg"
            }
        ]
    }))
}

pub fn products() -> Vec<Product> {
    let raw = json!([
        {
            "id": "01",
            "name": "Pastel de Chocolate",
            "category": "Pasteles",
            "price": 3200,
            "tags": ["sin gluten"],
            "description": "Húmedo y rico en cacao."
        },
        {
            "id": "02",
            "name": "Galletas de Avena",
            "category": "Galletas",
            "price": 1800,
            "tags": ["vegano", "sin procesar"],
            "description": "Crujientes y caseras."
        },
        {
            "id": "04",
            "name": "Croissant de Almendras",
            "category": "Bollería",
            "price": 2500,
            "tags": ["sin procesar"],
            "description": "Hojaldrado y dulce."
        },
        {
            "id": "07",
            "name": "Empanadas de Pino",
            "category": "Empanadas",
            "price": 2200,
            "tags": ["sin procesar"],
            "description": "Relleno jugoso."
        },
        {
            "id": "10",
            "name": "Ensalada César",
            "category": "Ensaladas",
            "price": 5200,
            "tags": ["low carb / sin azúcar"],
            "description": "Con pollo grillé."
        },
        {
            "id": "11",
            "name": "Café Americano",
            "category": "Café",
            "price": 2000,
            "tags": [],
            "description": "Intenso y aromático."
        },
        {
            "id": "12",
            "name": "Matcha Latte",
            "category": "Matcha",
            "price": 3500,
            "tags": ["vegano"],
            "description": "Cremoso y verde."
        },
        {
            "id": "14",
            "name": "Ice Coffee Vainilla",
            "category": "Ice Coffee",
            "price": 3200,
            "tags": [],
            "description": "Frío y dulce."
        },
        {
            "id": "15",
            "name": "Frapé de Chocolate",
            "category": "Frapés",
            "price": 3800,
            "tags": [],
            "description": "Cremoso y helado."
        },
        {
            "id": "18",
            "name": "Limonada Menta",
            "category": "Limonadas",
            "price": 2500,
            "tags": ["vegano", "sin azúcar"],
            "description": "Refrescante natural."
        },
        {
            "id": "19",
            "name": "Kombucha de Jengibre",
            "category": "Kombucha",
            "price": 3200,
            "tags": ["vegano", "sin procesar"],
            "description": "Probiótico artesanal."
        }
    ]);
    raw.as_array()
        .map(|items| items.iter().map(Product::from_value).collect())
        .unwrap_or_default()
}

pub fn categories() -> Vec<String> {
    CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Events listed when no data source is configured.
pub fn events() -> Vec<Event> {
    serde_json::from_value(json!([
        {
            "id": "feria-negrx",
            "title": "Feria Negrx",
            "description": "Música en vivo con artistas locales. Ambiente íntimo y acogedor.",
            "date": "2025-10-25",
            "start_time": "12:00",
            "end_time": "23:00",
            "place": "Carmen 1235",
            "image": "/assets/img/eventos/venta-garage.jpg",
            "category": "fashion y música",
            "bookingUrl": "https://ig.me/m/muralla.cafe?ref=feria-negrx"
        },
        {
            "id": "venta-garage",
            "title": "Venta de Garage",
            "description": "Remate de artículos de librería y ropa",
            "date": "2025-11-02",
            "time": "18:00",
            "image": "/assets/img/eventos/venta-garage.jpg",
            "category": "mercado",
            "bookingUrl": "https://ig.me/m/muralla.cafe?ref=venta-garage"
        },
        {
            "id": "inaeg",
            "title": "Inauguración Muralla Café",
            "description": "Musiquita y celebración de este gran comienzo",
            "date": "2025-11-22",
            "time": "19:30",
            "image": "/assets/img/eventos/dino.jpg",
            "category": "evento",
            "bookingUrl": "https://ig.me/m/muralla.cafe?ref=inauguracion"
        }
    ]))
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_decode() {
        assert_eq!(map().place_id.as_deref(), Some(PLACE_ID));
        assert!(config().extra.contains_key("booking"));
        assert_eq!(today().items.len(), 3);
        assert_eq!(products().len(), 11);
        assert_eq!(events().len(), 3);
    }
}
