use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Loop,
    OutAndBack,
    PointToPoint,
    Lollipop,
}

/// §3 RoutePattern: a target used to filter candidate routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePattern {
    pub name: String,
    pub target_distance_km: f64,
    pub target_elevation_gain_m: f64,
    pub shape: Shape,
    pub tolerance_percent: f64,
}

impl RoutePattern {
    pub fn tol_distance_km(&self) -> f64 {
        self.target_distance_km * self.tolerance_percent / 100.0
    }

    pub fn tol_elevation_m(&self) -> f64 {
        self.target_elevation_gain_m * self.tolerance_percent / 100.0
    }

    pub fn matches(&self, distance_km: f64, gain_m: f64) -> bool {
        (distance_km - self.target_distance_km).abs() <= self.tol_distance_km()
            && (gain_m - self.target_elevation_gain_m).abs() <= self.tol_elevation_m()
    }
}
