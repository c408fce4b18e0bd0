// src/services/routing.rs
use std::sync::Arc;
use tracing::{info, warn};
use crate::traits::RoutingSource;

/// Picks the endpoint an inbound call is offered to.
pub struct CallRouter {
    source: Arc<dyn RoutingSource>,
    endpoint_tech: String,
}

impl CallRouter {
    pub fn new(source: Arc<dyn RoutingSource>, endpoint_tech: &str) -> Self {
        Self {
            source,
            endpoint_tech: endpoint_tech.to_string(),
        }
    }

    /// Never fails: an unmapped number, an empty group or a routing lookup
    /// error all fall back to dialing the number itself as an extension.
    ///
    /// The first operator of the group always wins; there is no busy or
    /// presence check.
    pub async fn resolve(&self, dialed_number: &str) -> String {
        match self.source.operator_extensions(dialed_number).await {
            Ok(extensions) => {
                if let Some(extension) = extensions.first() {
                    info!("🔀 Routing {} to operator extension {}", dialed_number, extension);
                    return self.endpoint(extension);
                }
                info!("🔀 No operator group for {}, dialing it directly", dialed_number);
            }
            Err(e) => {
                warn!("⚠️  Routing lookup failed for {}: {} - dialing it directly", dialed_number, e);
            }
        }

        self.endpoint(dialed_number)
    }

    fn endpoint(&self, extension: &str) -> String {
        format!("{}/{}", self.endpoint_tech, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallControlError;
    use crate::traits::MockRoutingSource;

    fn router(source: MockRoutingSource) -> CallRouter {
        CallRouter::new(Arc::new(source), "PJSIP")
    }

    #[tokio::test]
    async fn test_first_operator_wins() {
        let mut source = MockRoutingSource::new();
        source
            .expect_operator_extensions()
            .withf(|dialed| dialed == "1000")
            .times(1)
            .returning(|_| Ok(vec!["101".to_string(), "102".to_string()]));

        assert_eq!(router(source).resolve("1000").await, "PJSIP/101");
    }

    #[tokio::test]
    async fn test_unmapped_number_falls_back() {
        let mut source = MockRoutingSource::new();
        source.expect_operator_extensions().returning(|_| Ok(Vec::new()));

        assert_eq!(router(source).resolve("2002").await, "PJSIP/2002");
    }

    #[tokio::test]
    async fn test_lookup_error_falls_back() {
        let mut source = MockRoutingSource::new();
        source
            .expect_operator_extensions()
            .returning(|_| Err(CallControlError::Pool("timed out".into())));

        assert_eq!(router(source).resolve("3003").await, "PJSIP/3003");
    }

    #[tokio::test]
    async fn test_custom_technology() {
        let mut source = MockRoutingSource::new();
        source.expect_operator_extensions().returning(|_| Ok(vec!["7".to_string()]));

        let router = CallRouter::new(Arc::new(source), "SIP");
        assert_eq!(router.resolve("1000").await, "SIP/7");
    }
}
