use tabmap::{
    planner::types::FieldList,
    types::{
        row::Row,
        value::{FieldType, Value},
    },
};

const STATES: &[&str] = &["GA", "MA", "NY", "CA", "TX", "WA"];

#[derive(Debug, Clone, Copy)]
pub enum RingShape {
    Line,
    Square,
    Star,
}

pub struct DataGenerator {
    seed: u64,
}

impl DataGenerator {
    pub fn new() -> Self {
        Self { seed: 42 }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    // xorshift64
    fn next(&mut self) -> u64 {
        self.seed ^= self.seed << 13;
        self.seed ^= self.seed >> 7;
        self.seed ^= self.seed << 17;
        self.seed
    }

    pub fn fields() -> FieldList {
        FieldList::from_pairs(&[
            ("name", FieldType::String),
            ("state", FieldType::String),
            ("pop", FieldType::Integer),
            ("area", FieldType::Float),
        ])
    }

    pub fn generate_row(&mut self, id: i64) -> Row {
        let state = STATES[(self.next() % STATES.len() as u64) as usize];
        let pop = (self.next() % 2_000_000) as i64;
        let area = (self.next() % 100_000) as f64 / 100.0;
        let values = vec![
            Value::String(format!("city_{}", id)),
            Value::String(state.to_string()),
            if id % 50 == 0 { Value::Null } else { Value::Integer(pop) },
            Value::Float(area),
        ];
        Row::with_feature_id(id, values)
    }

    pub fn generate_rows(&mut self, count: usize) -> Vec<Row> {
        (1..=count).map(|i| self.generate_row(i as i64)).collect()
    }

    /// Vertices inside a 1000 x 1000 extent.
    pub fn generate_vertices(&mut self, count: usize, shape: RingShape) -> Vec<(f64, f64)> {
        (0..count)
            .map(|i| {
                let t = i as f64 / count.max(1) as f64;
                match shape {
                    RingShape::Line => (t * 1000.0, (self.next() % 1000) as f64),
                    RingShape::Square => {
                        let side = (t * 4.0) as u32;
                        let f = (t * 4.0).fract() * 900.0 + 50.0;
                        match side {
                            0 => (f, 50.0),
                            1 => (950.0, f),
                            2 => (1000.0 - f, 950.0),
                            _ => (50.0, 1000.0 - f),
                        }
                    }
                    RingShape::Star => {
                        let angle = t * std::f64::consts::TAU;
                        let radius = if i % 2 == 0 { 450.0 } else { 150.0 };
                        (500.0 + radius * angle.cos(), 500.0 + radius * angle.sin())
                    }
                }
            })
            .collect()
    }
}

impl Default for DataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
