use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;

/// Strategy picking one endpoint from a list. Both built-in strategies
/// return an empty string on an empty input.
pub trait LoadBalancer: Send + Sync {
    fn take(&self, endpoints: &[String]) -> String;
}

#[derive(Default)]
pub struct RoundRobin {
    acc: AtomicI64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn take(&self, endpoints: &[String]) -> String {
        if endpoints.is_empty() {
            return String::new();
        }
        let n = self.acc.fetch_add(1, Ordering::Relaxed) + 1;
        let index = (n.rem_euclid(endpoints.len() as i64)) as usize;
        endpoints[index].clone()
    }
}

#[derive(Default)]
pub struct RandomSelect;

impl RandomSelect {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomSelect {
    fn take(&self, endpoints: &[String]) -> String {
        if endpoints.is_empty() {
            return String::new();
        }
        let index = rand::thread_rng().gen_range(0..endpoints.len());
        endpoints[index].clone()
    }
}
