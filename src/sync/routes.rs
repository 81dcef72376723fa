use std::collections::HashMap;

use crate::model::EntityKind;

/// Lookup table from registered route pattern to the entity kind it writes.
///
/// Patterns are recorded when routes are registered on the router, so
/// resolution is an exact match against axum's matched path rather than a
/// guess from the request URI.
#[derive(Debug, Clone, Default)]
pub struct ReplicationRoutes {
  targets: HashMap<String, EntityKind>,
}

impl ReplicationRoutes {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record that writes through `pattern` touch `kind`.
  pub fn register(&mut self, pattern: impl Into<String>, kind: EntityKind) {
    self.targets.insert(pattern.into(), kind);
  }

  /// Entity kind for a matched route pattern, `None` when it is not mirrored.
  pub fn resolve(&self, pattern: &str) -> Option<EntityKind> {
    self.targets.get(pattern).copied()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_resolve_only_registered_patterns() {
    let mut routes = ReplicationRoutes::new();
    routes.register("/api/products", EntityKind::Product);
    routes.register("/api/products/{id}", EntityKind::Product);

    assert_eq!(routes.resolve("/api/products/{id}"), Some(EntityKind::Product));
    assert_eq!(routes.resolve("/api/products"), Some(EntityKind::Product));
    assert_eq!(routes.resolve("/api/brands/{id}"), None);
    // Exact match only, no substring guessing
    assert_eq!(routes.resolve("/api/products-archive"), None);
    assert_eq!(routes.len(), 2);
  }
}
