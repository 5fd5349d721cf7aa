//! Providers that record how often they compile.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rulesets::{FnProvider, PassthroughProvider, Provider, ProviderArtifact, ProviderHandshake};

/// Shared compile-call counter
#[derive(Debug, Clone, Default)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Passthrough compile step behind `handshake`, counting each call
pub fn counting(handshake: ProviderHandshake) -> (FnProvider, CallCount) {
    let calls = CallCount::default();
    let counter = Arc::clone(&calls.0);
    let provider = FnProvider::new(handshake, move |input| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderArtifact::new(input.rendered.contents.clone()).into())
    });
    (provider, calls)
}

/// Counting provider with the full passthrough capability set
pub fn counting_passthrough(provider_id: &str) -> (FnProvider, CallCount) {
    counting(PassthroughProvider::new(provider_id).handshake().clone())
}
