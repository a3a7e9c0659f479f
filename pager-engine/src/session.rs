use crate::emitter::PageEmitter;
use crate::error::PagerError;
use crate::http_client::{ClientSettings, HttpApi};
use crate::paginator::{Paginator, Summary};
use crate::request::RequestContext;
use crate::CloudApi;

use log::info;
use serde_json::Value;
use std::sync::Arc;

/// One logical session against the cloud API.
///
/// The client handle is built once and shared by every request made through
/// the session; nothing is kept between requests.
#[derive(Clone)]
pub struct Session {
    api: Arc<dyn CloudApi>,
}

impl Session {
    pub fn new(api: Arc<dyn CloudApi>) -> Self {
        Self { api }
    }

    /// Builds a session backed by an [`HttpApi`].
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, PagerError> {
        info!("Using endpoint {}", settings.endpoint);
        Ok(Self::new(Arc::new(HttpApi::new(settings)?)))
    }

    pub fn api(&self) -> &dyn CloudApi {
        self.api.as_ref()
    }

    /// A lazy paginator over `request`
    pub fn paginate<'a>(&'a self, request: &'a RequestContext) -> Paginator<'a> {
        Paginator::new(self.api.as_ref(), request)
    }

    /// Runs a describe/list request, emitting each page as it arrives.
    pub async fn describe<E: PageEmitter + ?Sized>(
        &self,
        request: &RequestContext,
        emitter: &mut E,
    ) -> Result<Summary, PagerError> {
        self.paginate(request).drive(emitter).await
    }

    /// Runs a one-shot operation and emits its response.
    pub async fn invoke<E: PageEmitter + ?Sized>(
        &self,
        request: &RequestContext,
        emitter: &mut E,
    ) -> Result<Value, PagerError> {
        if request.has_pagination_options() {
            return Err(PagerError::InvalidRequest(format!(
                "{} is not paginated; drop the pagination options",
                request.operation()
            )));
        }
        let value = self
            .api
            .invoke(request.operation(), request.fields())
            .await?;
        emitter.emit_value(&value)?;
        Ok(value)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
