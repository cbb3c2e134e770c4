use serde::{Deserialize, Serialize};

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub dimensions: String,
    pub weight: String,
    pub os: String,
    pub connectivity: String,
    pub camera: String,
    pub app: String,
    pub storage: String,
    pub ram: String,
    pub battery: String,
    pub gps: String,
    pub accessories: String,
    pub processor: String,
    pub design: String,
    pub description: String,
    pub price: f64,
}

/// Insert payload for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub manufacturer: String,
    pub dimensions: String,
    pub weight: String,
    pub os: String,
    pub connectivity: String,
    pub camera: String,
    pub app: String,
    pub storage: String,
    pub ram: String,
    pub battery: String,
    pub gps: String,
    pub accessories: String,
    pub processor: String,
    pub design: String,
    pub description: String,
    pub price: f64,
}

impl NewProduct {
    pub fn with_id(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            manufacturer: self.manufacturer,
            dimensions: self.dimensions,
            weight: self.weight,
            os: self.os,
            connectivity: self.connectivity,
            camera: self.camera,
            app: self.app,
            storage: self.storage,
            ram: self.ram,
            battery: self.battery,
            gps: self.gps,
            accessories: self.accessories,
            processor: self.processor,
            design: self.design,
            description: self.description,
            price: self.price,
        }
    }
}
