/// Maximum points per score component. A component may award less than its
/// weight even on a full match (distance and urgency do).
pub const DEFAULT_WEIGHTS: Weights = Weights {
    skills: 40.0,
    wage: 15.0,
    distance: 25.0,
    urgency: 20.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub wage: f64,
    pub distance: f64,
    pub urgency: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skills + self.wage + self.distance + self.urgency
    }
}

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}
