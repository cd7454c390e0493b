use http::{Extensions, StatusCode};
use server_apm::segment;
use server_middleware::{Error, Handler, Request, Response, Result};

pub fn get(uri: &str) -> Request {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Default::default())
        .unwrap()
}

/// Answers with the given status.
pub struct Respond(pub StatusCode);

#[async_trait::async_trait]
impl Handler for Respond {
    async fn call(&self, _req: Request, _extensions: &mut Extensions) -> Result<Response> {
        let mut res = Response::new("ok".into());
        *res.status_mut() = self.0;
        Ok(res)
    }
}

/// Fails with a structured status error.
pub struct FailWith(pub StatusCode);

#[async_trait::async_trait]
impl Handler for FailWith {
    async fn call(&self, _req: Request, _extensions: &mut Extensions) -> Result<Response> {
        Err(Error::status(self.0, "handler failed"))
    }
}

/// Fails with an error that carries no status.
pub struct FailOpaque;

#[async_trait::async_trait]
impl Handler for FailOpaque {
    async fn call(&self, _req: Request, _extensions: &mut Extensions) -> Result<Response> {
        Err(anyhow::anyhow!("database unreachable").into())
    }
}

/// Panics mid-request.
pub struct Panics;

#[async_trait::async_trait]
impl Handler for Panics {
    async fn call(&self, _req: Request, _extensions: &mut Extensions) -> Result<Response> {
        panic!("handler panicked");
    }
}

/// Opens a segment on the request's transaction, then answers `200 OK`.
pub struct WithSegment(pub &'static str);

#[async_trait::async_trait]
impl Handler for WithSegment {
    async fn call(&self, _req: Request, extensions: &mut Extensions) -> Result<Response> {
        segment::send(extensions, self.0);
        Ok(Response::new("ok".into()))
    }
}

/// Answers `200 OK` if the request carries a transaction, `412` otherwise.
pub struct RequireTransaction;

#[async_trait::async_trait]
impl Handler for RequireTransaction {
    async fn call(&self, _req: Request, extensions: &mut Extensions) -> Result<Response> {
        let status = match segment::from_extensions(extensions) {
            Some(_) => StatusCode::OK,
            None => StatusCode::PRECONDITION_FAILED,
        };
        let mut res = Response::new(Default::default());
        *res.status_mut() = status;
        Ok(res)
    }
}

/// Does its work inside its own `tracing` span, then answers `200 OK`.
pub struct OpensSpan(pub &'static str);

#[async_trait::async_trait]
impl Handler for OpensSpan {
    async fn call(&self, _req: Request, _extensions: &mut Extensions) -> Result<Response> {
        tracing::info_span!("handler_work", work = self.0).in_scope(|| {
            tracing::info!("working");
        });
        Ok(Response::new("ok".into()))
    }
}
