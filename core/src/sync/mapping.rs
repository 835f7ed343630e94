//! Built-in [`StateMapping`] combinators.

use std::sync::Arc;

use crate::error::{StateError, StateResult};
use crate::state::traits::StateMapping;
use crate::state::value::StateValue;

type MapFn = Arc<dyn Fn(StateValue) -> StateResult<StateValue> + Send + Sync>;

/// Passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapping;

impl StateMapping for IdentityMapping {
    fn map_state(&self, source: StateValue) -> StateResult<StateValue> {
        Ok(source)
    }

    fn supports_reverse(&self) -> bool {
        true
    }

    fn reverse_map(&self, target: StateValue) -> StateResult<StateValue> {
        Ok(target)
    }
}

/// Mapping backed by closures. Reversible only when a reverse closure is set.
#[derive(Clone)]
pub struct FnMapping {
    forward: MapFn,
    reverse: Option<MapFn>,
}

impl FnMapping {
    pub fn new<F>(forward: F) -> Self
    where
        F: Fn(StateValue) -> StateResult<StateValue> + Send + Sync + 'static,
    {
        Self {
            forward: Arc::new(forward),
            reverse: None,
        }
    }

    pub fn with_reverse<F>(mut self, reverse: F) -> Self
    where
        F: Fn(StateValue) -> StateResult<StateValue> + Send + Sync + 'static,
    {
        self.reverse = Some(Arc::new(reverse));
        self
    }
}

impl StateMapping for FnMapping {
    fn map_state(&self, source: StateValue) -> StateResult<StateValue> {
        (self.forward)(source)
    }

    fn supports_reverse(&self) -> bool {
        self.reverse.is_some()
    }

    fn reverse_map(&self, target: StateValue) -> StateResult<StateValue> {
        match &self.reverse {
            Some(reverse) => reverse(target),
            None => Err(StateError::MappingNotReversible),
        }
    }
}

/// Applies mappings in sequence. Reverse runs the links' reverses back to front.
#[derive(Clone, Default)]
pub struct CompositeMapping {
    links: Vec<Arc<dyn StateMapping>>,
}

impl CompositeMapping {
    pub fn new(links: Vec<Arc<dyn StateMapping>>) -> Self {
        Self { links }
    }

    pub fn then(mut self, link: Arc<dyn StateMapping>) -> Self {
        self.links.push(link);
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl StateMapping for CompositeMapping {
    fn map_state(&self, source: StateValue) -> StateResult<StateValue> {
        self.links
            .iter()
            .try_fold(source, |value, link| link.map_state(value))
    }

    fn supports_reverse(&self) -> bool {
        self.links.iter().all(|link| link.supports_reverse())
    }

    fn reverse_map(&self, target: StateValue) -> StateResult<StateValue> {
        if !self.supports_reverse() {
            return Err(StateError::MappingNotReversible);
        }
        self.links
            .iter()
            .rev()
            .try_fold(target, |value, link| link.reverse_map(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add(n: i64) -> FnMapping {
        let shift = move |value: StateValue, delta: i64| match value.as_json().and_then(|v| v.as_i64()) {
            Some(x) => Ok(StateValue::Global(json!(x + delta))),
            None => Err(StateError::MappingFailed("expected integer".into())),
        };
        FnMapping::new(move |v| shift(v, n)).with_reverse(move |v| shift(v, -n))
    }

    fn double() -> FnMapping {
        FnMapping::new(|v| {
            let x = v.as_json().and_then(|v| v.as_i64()).unwrap_or(0);
            Ok(StateValue::Global(json!(x * 2)))
        })
    }

    #[test]
    fn test_identity_round_trip() {
        let value = StateValue::Tool(json!({"k": "v"}));
        let mapping = IdentityMapping;
        let forward = mapping.map_state(value.clone()).unwrap();
        assert_eq!(mapping.reverse_map(forward).unwrap(), value);
    }

    #[test]
    fn test_composite_reverse_runs_back_to_front() {
        let composite = CompositeMapping::default()
            .then(Arc::new(add(3)))
            .then(Arc::new(IdentityMapping))
            .then(Arc::new(add(10)));
        assert!(composite.supports_reverse());

        let start = StateValue::Global(json!(1));
        let mapped = composite.map_state(start.clone()).unwrap();
        assert_eq!(mapped, StateValue::Global(json!(14)));
        assert_eq!(composite.reverse_map(mapped).unwrap(), start);
    }

    #[test]
    fn test_composite_not_reversible_with_one_way_link() {
        let composite = CompositeMapping::new(vec![Arc::new(add(1)), Arc::new(double())]);
        assert!(!composite.supports_reverse());
        assert_eq!(
            composite.map_state(StateValue::Global(json!(2))).unwrap(),
            StateValue::Global(json!(6))
        );
        assert!(matches!(
            composite.reverse_map(StateValue::Global(json!(6))),
            Err(StateError::MappingNotReversible)
        ));
        assert!(matches!(
            double().reverse_map(StateValue::Global(json!(1))),
            Err(StateError::MappingNotReversible)
        ));
    }

    #[test]
    fn test_forward_errors_propagate() {
        let composite = CompositeMapping::new(vec![Arc::new(add(1))]);
        let err = composite.map_state(StateValue::Global(json!("x"))).unwrap_err();
        assert!(matches!(err, StateError::MappingFailed(_)));
    }
}
