use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Food,
    Water,
    Medical,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Food, Resource::Water, Resource::Medical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Water => "water",
            Resource::Medical => "medical",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::Food => "Food",
            Resource::Water => "Water",
            Resource::Medical => "Medical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLevels {
    pub food: f64,
    pub water: f64,
    pub medical: f64,
}

impl ResourceLevels {
    pub fn get(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Food => self.food,
            Resource::Water => self.water,
            Resource::Medical => self.medical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityTemplate {
    pub name: &'static str,
    pub base_population: u64,
    pub base_resources: ResourceLevels,
    pub coordinates: Coordinates,
}

pub const CITY_COUNT: usize = 5;

pub const CITY_TEMPLATES: [CityTemplate; CITY_COUNT] = [
    CityTemplate {
        name: "Delhi",
        base_population: 250_000,
        base_resources: ResourceLevels { food: 1000.0, water: 2000.0, medical: 500.0 },
        coordinates: Coordinates { lat: 28.6139, lon: 77.2090 },
    },
    CityTemplate {
        name: "Mumbai",
        base_population: 300_000,
        base_resources: ResourceLevels { food: 1200.0, water: 2500.0, medical: 600.0 },
        coordinates: Coordinates { lat: 19.0760, lon: 72.8777 },
    },
    CityTemplate {
        name: "Chennai",
        base_population: 150_000,
        base_resources: ResourceLevels { food: 800.0, water: 1500.0, medical: 400.0 },
        coordinates: Coordinates { lat: 13.0827, lon: 80.2707 },
    },
    CityTemplate {
        name: "Hyderabad",
        base_population: 180_000,
        base_resources: ResourceLevels { food: 900.0, water: 1800.0, medical: 450.0 },
        coordinates: Coordinates { lat: 17.3850, lon: 78.4867 },
    },
    CityTemplate {
        name: "Bangalore",
        base_population: 200_000,
        base_resources: ResourceLevels { food: 1000.0, water: 1900.0, medical: 500.0 },
        coordinates: Coordinates { lat: 12.9716, lon: 77.5946 },
    },
];

pub fn find_city(name: &str) -> Option<&'static CityTemplate> {
    CITY_TEMPLATES.iter().find(|city| city.name == name)
}
