// Copyright @yucwang 2021

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique default name for a scene node ("roughMetal_12").
pub fn generate_node_id(kind: &str) -> String {
    let seq = NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", kind, seq)
}

/// Anything that lives in the scene description: BSDFs, lights, shapes.
pub trait ComputationNode {
    fn id(&self) -> &str;

    fn to_string(&self) -> String {
        format!("[id={}]", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::generate_node_id;

    #[test]
    fn test_node_ids_are_unique() {
        let a = generate_node_id("diffuse");
        let b = generate_node_id("diffuse");
        assert_ne!(a, b);
        assert!(a.starts_with("diffuse_"));
    }
}
