//! Request options carried alongside a request description.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use kiota_core::Result;

use crate::error_mappings::ErrorMappings;
use crate::transport::HttpResponse;

/// An option attached to a request.
///
/// The adapter only acts on [`ResponseHandlerOption`]; every other option
/// is passed to the transport untouched.
pub trait RequestOption: fmt::Debug + Send + Sync + 'static {
    /// Returns `self` as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Takes over response processing from the adapter.
///
/// The handler receives the raw response and the error mappings; status
/// classification and body decoding are skipped. The returned value must
/// have the type the calling `send_*` method produces.
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    /// Processes the response.
    async fn handle_response(
        &self,
        response: HttpResponse,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<Option<Box<dyn Any + Send>>>;
}

/// Installs a custom [`ResponseHandler`] for one request.
#[derive(Clone)]
pub struct ResponseHandlerOption {
    handler: Arc<dyn ResponseHandler>,
}

impl ResponseHandlerOption {
    /// Wraps `handler`.
    pub fn new(handler: impl ResponseHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Returns the handler.
    pub fn handler(&self) -> &Arc<dyn ResponseHandler> {
        &self.handler
    }
}

impl fmt::Debug for ResponseHandlerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseHandlerOption").finish_non_exhaustive()
    }
}

impl RequestOption for ResponseHandlerOption {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Returns the response handler installed among `options`, if any.
pub(crate) fn find_response_handler(
    options: &[Arc<dyn RequestOption>],
) -> Option<Arc<dyn ResponseHandler>> {
    options.iter().find_map(|o| {
        o.as_any()
            .downcast_ref::<ResponseHandlerOption>()
            .map(|opt| Arc::clone(opt.handler()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiota_core::Headers;

    struct StatusEcho;

    #[async_trait]
    impl ResponseHandler for StatusEcho {
        async fn handle_response(
            &self,
            response: HttpResponse,
            _: Option<&ErrorMappings>,
        ) -> Result<Option<Box<dyn Any + Send>>> {
            Ok(Some(Box::new(response.status())))
        }
    }

    #[derive(Debug)]
    struct Tracing;

    impl RequestOption for Tracing {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_find_response_handler() {
        let options: Vec<Arc<dyn RequestOption>> = vec![
            Arc::new(Tracing),
            Arc::new(ResponseHandlerOption::new(StatusEcho)),
        ];
        assert!(find_response_handler(&options).is_some());
        assert!(find_response_handler(&options[..1]).is_none());
    }

    #[tokio::test]
    async fn test_handler_receives_raw_response() {
        let option = ResponseHandlerOption::new(StatusEcho);
        let response = HttpResponse::new(418, Headers::new(), None);
        let out = option
            .handler()
            .handle_response(response, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.downcast_ref::<u16>(), Some(&418));
    }

    #[test]
    fn test_debug_hides_handler() {
        let option = ResponseHandlerOption::new(StatusEcho);
        assert_eq!(format!("{option:?}"), "ResponseHandlerOption { .. }");
    }
}
