use crate::model::granite::GraniteAdapter;
use crate::model::inference::InferenceAdapter;
use crate::model::structured::StructuredAdapter;
use crate::model::ModelAdapter;
use crate::types::ServiceKind;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
pub struct AdapterFactory {
    adapters: BTreeMap<ServiceKind, Arc<dyn ModelAdapter>>,
}

impl AdapterFactory {
    pub fn with_defaults() -> Self {
        let mut this = Self::default();
        this.register(Arc::new(GraniteAdapter));
        this.register(Arc::new(InferenceAdapter));
        this.register(Arc::new(StructuredAdapter));
        this
    }

    pub fn register(&mut self, adapter: Arc<dyn ModelAdapter>) {
        self.adapters.insert(adapter.backend(), adapter);
    }

    pub fn get(&self, backend: ServiceKind) -> Option<Arc<dyn ModelAdapter>> {
        self.adapters.get(&backend).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::AdapterFactory;
    use crate::types::ServiceKind;

    #[test]
    fn factory_registers_every_backend() {
        let factory = AdapterFactory::with_defaults();
        for kind in [
            ServiceKind::Granite,
            ServiceKind::Inference,
            ServiceKind::Structured,
        ] {
            let adapter = factory.get(kind).expect("registered");
            assert_eq!(adapter.backend(), kind);
        }
    }

    #[test]
    fn empty_factory_has_no_adapters() {
        assert!(AdapterFactory::default().get(ServiceKind::Granite).is_none());
    }
}
